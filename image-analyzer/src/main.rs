use clap::Parser;
use image_analyzer::{DEFAULT_THRESHOLD, analyze_directory};
use log::{error, info};
use std::{path::PathBuf, process::ExitCode};

/// Sky camera brightness analyzer
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory of images to analyze
    #[arg(default_value = "images")]
    directory: PathBuf,

    /// Pixels whose R+G+B is at most this are treated as background
    #[arg(short, long, default_value_t = DEFAULT_THRESHOLD)]
    threshold: u16,
}

fn main() -> ExitCode {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let args = Args::parse();
    info!("Analyzing images in {}", args.directory.display());

    match analyze_directory(&args.directory, args.threshold) {
        Ok(results) => {
            for (path, brightness) in results {
                let name = path.file_name().unwrap_or(path.as_os_str());
                println!("{}: Brightness level = {brightness:.2}%", name.to_string_lossy());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
