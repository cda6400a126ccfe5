//! Data model shared by the station daemon: sensor readings, weather-station
//! snapshots decoded from the RF receiver, and the composed telemetry record
//! that is logged locally and uploaded.

pub mod reading;
pub mod record;
pub mod weather;

pub use reading::SensorReading;
pub use record::{TelemetryRecord, format_timestamp};
pub use weather::{WeatherEvent, WeatherSnapshot};
