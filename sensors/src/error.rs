use std::process::ExitStatus;

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("device unavailable: {0}")]
    Unavailable(String),
    #[error("bus error: {0}")]
    Bus(String),
    #[error("sample is missing {0}")]
    Incomplete(&'static str),
    #[error("channel {0} out of range")]
    InvalidChannel(u8),
    #[error("`{program}` exited with {status}: {stderr}")]
    Command {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
