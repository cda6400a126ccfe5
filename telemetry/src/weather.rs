use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lux to W/m² factor used for the solar radiation estimate.
pub const LUX_TO_SOLAR_RADIATION: f64 = 0.0079;

/// # Weather Event
///
/// One JSON object as printed by the RF decoder (`rtl_433 -F json`), one per
/// line. Only the fields the station forwards are declared; anything else in
/// the line (`mic`, protocol specific extras) is ignored.
///
/// ```json
/// {"time":"2024-05-01 12:00:00","model":"Fineoffset-WH65B","id":89,
///  "battery_ok":1,"temperature_C":18.4,"humidity":72,"wind_dir_deg":225,
///  "wind_avg_m_s":1.4,"wind_max_m_s":2.1,"rain_mm":12.3,"uv":45,"uvi":1,
///  "light_lux":10432.0,"mic":"CRC"}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WeatherEvent {
    pub time: Option<String>,
    pub model: Option<String>,
    pub id: Option<Value>,
    pub battery_ok: Option<u8>,
    #[serde(rename = "temperature_C")]
    pub temperature_c: Option<f64>,
    pub humidity: Option<f64>,
    pub wind_dir_deg: Option<f64>,
    pub wind_avg_m_s: Option<f64>,
    pub wind_max_m_s: Option<f64>,
    pub rain_mm: Option<f64>,
    pub uv: Option<f64>,
    pub uvi: Option<f64>,
    pub light_lux: Option<f64>,
}

/// The most recent weather-station event, remapped to the keys the ingestion
/// API expects. Absent decoder fields stay absent here; zero-defaulting is a
/// payload concern (see [`WeatherSnapshot::zero_filled`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    #[serde(rename = "ambientWeatherTemp", default, skip_serializing_if = "Option::is_none")]
    pub temperature_c: Option<f64>,
    #[serde(rename = "ambientWeatherHumidity", default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(rename = "ambientWeatherSolarRadiation", default, skip_serializing_if = "Option::is_none")]
    pub solar_radiation: Option<f64>,
    #[serde(rename = "ambientWeatherLightLux", default, skip_serializing_if = "Option::is_none")]
    pub light_lux: Option<f64>,
    #[serde(rename = "ambientWeatherWindSpeed", default, skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<f64>,
    #[serde(rename = "ambientWeatherWindDirection", default, skip_serializing_if = "Option::is_none")]
    pub wind_direction: Option<f64>,
    #[serde(rename = "ambientWeatherWindMax", default, skip_serializing_if = "Option::is_none")]
    pub wind_max: Option<f64>,
    #[serde(rename = "ambientWeatherRain", default, skip_serializing_if = "Option::is_none")]
    pub rain: Option<f64>,
    #[serde(rename = "ambientWeatherUv", default, skip_serializing_if = "Option::is_none")]
    pub uv: Option<f64>,
    #[serde(rename = "ambientWeatherUvIndex", default, skip_serializing_if = "Option::is_none")]
    pub uv_index: Option<f64>,
    #[serde(rename = "ambientWeatherBatteryOk", default, skip_serializing_if = "Option::is_none")]
    pub battery_ok: Option<u8>,
    #[serde(rename = "ambientWeatherModel", default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(rename = "ambientWeatherId", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(rename = "ambientWeatherTimestamp", default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl From<WeatherEvent> for WeatherSnapshot {
    fn from(event: WeatherEvent) -> Self {
        Self {
            temperature_c: event.temperature_c,
            humidity: event.humidity,
            solar_radiation: event.light_lux.map(|lux| lux * LUX_TO_SOLAR_RADIATION),
            light_lux: event.light_lux,
            wind_speed: event.wind_avg_m_s,
            wind_direction: event.wind_dir_deg,
            wind_max: event.wind_max_m_s,
            rain: event.rain_mm,
            uv: event.uv,
            uv_index: event.uvi,
            battery_ok: event.battery_ok,
            model: event.model,
            id: event.id,
            timestamp: event.time,
        }
    }
}

impl WeatherSnapshot {
    /// Parses one decoder output line and remaps it.
    pub fn parse_line(line: &str) -> Result<Self, serde_json::Error> {
        let event: WeatherEvent = serde_json::from_str(line.trim())?;
        Ok(event.into())
    }

    /// Copy with every missing field set to zero (numbers) or the empty
    /// string (text), for payloads whose contract requires every key.
    pub fn zero_filled(&self) -> Self {
        let zero = |v: Option<f64>| Some(v.unwrap_or(0.0));

        Self {
            temperature_c: zero(self.temperature_c),
            humidity: zero(self.humidity),
            solar_radiation: zero(self.solar_radiation),
            light_lux: zero(self.light_lux),
            wind_speed: zero(self.wind_speed),
            wind_direction: zero(self.wind_direction),
            wind_max: zero(self.wind_max),
            rain: zero(self.rain),
            uv: zero(self.uv),
            uv_index: zero(self.uv_index),
            battery_ok: Some(self.battery_ok.unwrap_or(0)),
            model: Some(self.model.clone().unwrap_or_default()),
            id: Some(self.id.clone().unwrap_or_else(|| Value::from(0))),
            timestamp: Some(self.timestamp.clone().unwrap_or_default()),
        }
    }
}
