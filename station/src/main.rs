use anyhow::Context;
use clap::Parser;
use log::{error, info};
use station::{
    Config, MainLoop, Station,
    capture::ImageCapture,
    clock::SystemClock,
    hardware,
    listener::{DecoderCommand, WeatherStationListener},
    local_log::LocalLog,
    sensor::SensorReader,
    shutdown, snapshot,
    uploader::Uploader,
};

/// Field telemetry station daemon
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file (TOML), extension optional
    #[arg(short, long, default_value = "station/config")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let args = Args::parse();
    let config = Config::load(&args.config)
        .with_context(|| format!("failed to load configuration from {}", args.config))?;

    info!("Loaded configuration:");
    info!("  Data: {} every {}s", config.upload.data_url, config.schedule.data_interval_seconds);
    info!("  Images: {} every {}s", config.upload.image_url, config.schedule.image_interval_seconds);
    info!("  Local log: {}", config.paths.data_file.display());

    config
        .paths
        .create_dirs()
        .context("failed to create image/data directories")?;

    let (trigger, shutdown) = shutdown::channel();
    let (writer, reader) = snapshot::shared();

    let listener = config.weather_station.enabled.then(|| {
        let command = DecoderCommand {
            program: config.weather_station.program.clone(),
            args: config.weather_station.args.clone(),
        };

        WeatherStationListener::new(command, config.weather_station.refresh(), writer)
            .spawn(shutdown.clone())
    });

    let station = Station {
        sensor: SensorReader::new(hardware::environment_sensor(&config.sensor), config.sensor.retry()),
        analog: hardware::analog_channel(&config.adc),
        camera: ImageCapture::new(hardware::camera(&config.camera)),
        image_dir: config.paths.image_dir.clone(),
        snapshot: reader,
        local_log: LocalLog::new(&config.paths.data_file),
        uploader: Uploader::new(&config.upload).context("failed to build HTTP client")?,
    };

    let main_loop = tokio::spawn(MainLoop::new(station, &config.schedule, SystemClock).run(shutdown));

    wait_for_termination().await;
    info!("Shutting down");
    trigger.trigger();

    if let Err(e) = main_loop.await {
        error!("Main loop task failed: {e}");
    }
    if let Some(listener) = listener {
        if let Err(e) = listener.await {
            error!("Weather-station listener task failed: {e}");
        }
    }

    Ok(())
}

async fn wait_for_termination() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                error!("Cannot listen for SIGTERM: {e}");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
