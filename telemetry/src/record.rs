use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{SensorReading, WeatherSnapshot};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Formats an instant the way records carry it: local time, second precision.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format(TIMESTAMP_FORMAT).to_string()
}

/// # Telemetry Record
///
/// A flat snapshot composed once per data cycle from the latest sensor
/// reading and the latest weather-station snapshot.
///
/// Serialized shape:
/// ```json
/// {
///   "temperature_c": 21.0,
///   "temperature_f": 69.8,
///   "humidity": 45.0,
///   "pressure": 1013.25,
///   "timestamp": "2024-05-01 12:00:00",
///   "ambientWeatherTemp": 18.4
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub temperature_c: f64,
    pub temperature_f: f64,
    pub humidity: f64,
    /// Pressure in hPa.
    pub pressure: f64,
    /// Voltage on the configured ADC channel, when one is attached.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analog_voltage: Option<f64>,
    pub timestamp: String,
    #[serde(flatten)]
    pub weather: WeatherSnapshot,
}

impl TelemetryRecord {
    pub fn compose(
        reading: SensorReading,
        analog_voltage: Option<f64>,
        weather: Option<&WeatherSnapshot>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            temperature_c: reading.temperature_c,
            temperature_f: reading.temperature_f,
            humidity: reading.humidity,
            pressure: reading.pressure_hpa,
            analog_voltage,
            timestamp: format_timestamp(at),
            weather: weather.cloned().unwrap_or_default(),
        }
    }

    /// Flattens the record into text form fields. Weather keys are always
    /// present here, zero-defaulted when the station has not reported them.
    pub fn form_fields(&self) -> Result<Vec<(String, String)>, serde_json::Error> {
        let zeroed = Self {
            weather: self.weather.zero_filled(),
            ..self.clone()
        };

        let Value::Object(map) = serde_json::to_value(&zeroed)? else {
            return Ok(Vec::new());
        };

        Ok(map
            .into_iter()
            .filter_map(|(key, value)| {
                let text = match value {
                    Value::Null => return None,
                    Value::String(s) => s,
                    Value::Bool(b) => b.to_string(),
                    other => other.to_string(),
                };
                Some((key, text))
            })
            .collect())
    }
}
