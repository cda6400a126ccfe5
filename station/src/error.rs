use reqwest::StatusCode;
use sensors::DriverError;
use std::{io, path::PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum SensorError {
    /// The driver could not be opened at startup; the station runs degraded.
    #[error("sensor hardware unavailable: {0}")]
    HardwareUnavailable(String),
    #[error("sensor read failed after {attempts} attempts: {source}")]
    ReadFailed { attempts: u32, source: DriverError },
}

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("camera unavailable: {0}")]
    HardwareUnavailable(String),
    #[error("capture to {path} failed: {source}")]
    Driver { path: PathBuf, source: DriverError },
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("send failed after {attempts} attempts: {last}")]
    SendFailed { attempts: u32, last: String },
    #[error("rejected with {status}: {body}")]
    Rejected { status: StatusCode, body: String },
    #[error("cannot read image {path}: {source}")]
    Image { path: PathBuf, source: io::Error },
    #[error("cannot build payload: {0}")]
    Payload(#[from] serde_json::Error),
    #[error(transparent)]
    Request(#[from] reqwest::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error("cannot start `{program}`: {source}")]
    Spawn { program: String, source: io::Error },
    #[error("malformed weather-station event: {0}")]
    MalformedEvent(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum LocalLogError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("invalid log contents: {0}")]
    Json(#[from] serde_json::Error),
}
