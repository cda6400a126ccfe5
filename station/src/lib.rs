//! Field telemetry station: polls a BME280 (and optionally an MCP3008
//! channel), merges in the latest reading of an RF weather station, keeps a
//! local JSON log and uploads records and camera stills to a remote API.

pub mod capture;
pub mod clock;
pub mod config;
pub mod error;
pub mod hardware;
pub mod listener;
pub mod local_log;
pub mod main_loop;
pub mod retry;
pub mod schedule;
pub mod sensor;
pub mod shutdown;
pub mod snapshot;
pub mod uploader;

pub use config::Config;
pub use main_loop::{CycleReport, MainLoop, Station};
