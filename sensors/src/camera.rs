use std::{
    ffi::OsString,
    io,
    path::Path,
    process::{Command, Stdio},
};

use log::debug;

use crate::{Camera, DriverError};

/// Replaced by the destination path in the argument list.
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

/// A camera driven by a still-capture program such as `rpicam-still`.
///
/// The program is run once per capture with `args`, where every
/// [`OUTPUT_PLACEHOLDER`] is substituted with the destination path.
#[derive(Debug, Clone)]
pub struct StillCommandCamera {
    program: String,
    args: Vec<String>,
}

impl StillCommandCamera {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    fn command_args(&self, path: &Path) -> Vec<OsString> {
        self.args
            .iter()
            .map(|arg| {
                if arg == OUTPUT_PLACEHOLDER {
                    path.as_os_str().to_owned()
                } else {
                    OsString::from(arg.replace(OUTPUT_PLACEHOLDER, &path.to_string_lossy()))
                }
            })
            .collect()
    }
}

impl Camera for StillCommandCamera {
    fn capture_to(&mut self, path: &Path) -> Result<(), DriverError> {
        let args = self.command_args(path);
        debug!("[CAMERA] {} {:?}", self.program, args);

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => {
                    DriverError::Unavailable(format!("`{}` not found", self.program))
                }
                _ => DriverError::Io(e),
            })?;

        if !output.status.success() {
            return Err(DriverError::Command {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        if !path.exists() {
            return Err(DriverError::Unavailable(format!(
                "`{}` wrote no image to {}",
                self.program,
                path.display()
            )));
        }

        Ok(())
    }
}
