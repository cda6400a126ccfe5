use serde::{Deserialize, Serialize};
use std::{io, path::PathBuf, time::Duration};

use crate::retry::RetryPolicy;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub schedule: ScheduleConfig,
    pub sensor: SensorConfig,
    pub adc: AdcConfig,
    pub camera: CameraConfig,
    pub weather_station: WeatherStationConfig,
    pub upload: UploadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub image_dir: PathBuf,
    pub data_file: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub poll_interval_seconds: u64,
    pub data_interval_seconds: u64,
    pub image_interval_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    pub enabled: bool,
    pub i2c_bus: String,
    pub address: u8,
    pub retries: u32,
    pub retry_delay_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdcConfig {
    pub enabled: bool,
    pub spi_device: String,
    pub channel: u8,
    pub reference_voltage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub enabled: bool,
    pub program: String,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherStationConfig {
    pub enabled: bool,
    pub program: String,
    pub args: Vec<String>,
    pub refresh_seconds: u64,
}

/// Which remote contract the uploader speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadShape {
    /// JSON record to the data endpoint, images as a separate multipart
    /// upload (part `file`) to the image endpoint.
    #[default]
    Split,
    /// One multipart request to the data endpoint: record fields as text
    /// parts plus an optional `image` part.
    Combined,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub shape: UploadShape,
    pub data_url: String,
    pub image_url: String,
    pub retries: u32,
    pub retry_delay_seconds: u64,
    pub timeout_seconds: u64,
}

impl Config {
    /// Load configuration from a TOML file, overridden by `STATION_*`
    /// environment variables (`STATION_UPLOAD__DATA_URL=...`).
    ///
    /// A missing file is not an error: every setting has a default.
    pub fn load(path: &str) -> Result<Self, config::ConfigError> {
        Self::load_with(path, environment())
    }

    fn load_with(path: &str, env: config::Environment) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(env)
            .build()?;

        settings.try_deserialize()
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix("STATION")
        .prefix_separator("_")
        .separator("__")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            image_dir: PathBuf::from("images"),
            data_file: PathBuf::from("data/data.json"),
        }
    }
}

impl PathsConfig {
    /// Creates the image directory and the data file's parent if absent.
    pub fn create_dirs(&self) -> io::Result<()> {
        std::fs::create_dir_all(&self.image_dir)?;

        if let Some(parent) = self.data_file.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        Ok(())
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: 5,
            data_interval_seconds: 60,
            image_interval_seconds: 30 * 60,
        }
    }
}

impl ScheduleConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    pub fn data_interval(&self) -> Duration {
        Duration::from_secs(self.data_interval_seconds)
    }

    pub fn image_interval(&self) -> Duration {
        Duration::from_secs(self.image_interval_seconds)
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            i2c_bus: "/dev/i2c-1".to_string(),
            address: 0x76,
            retries: 5,
            retry_delay_seconds: 2,
        }
    }
}

impl SensorConfig {
    pub fn retry(&self) -> RetryPolicy {
        RetryPolicy::new(self.retries, Duration::from_secs(self.retry_delay_seconds))
    }
}

impl Default for AdcConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            spi_device: "/dev/spidev0.0".to_string(),
            channel: 0,
            reference_voltage: 3.3,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: "rpicam-still".to_string(),
            args: ["--nopreview", "--timeout", "1", "--output", "{output}"]
                .map(String::from)
                .to_vec(),
        }
    }
}

impl Default for WeatherStationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: "rtl_433".to_string(),
            args: [
                "-M", "utc", "-F", "json", "-R", "78", "-f", "914980000", "-s", "250000",
            ]
            .map(String::from)
            .to_vec(),
            refresh_seconds: 30,
        }
    }
}

impl WeatherStationConfig {
    pub fn refresh(&self) -> Duration {
        Duration::from_secs(self.refresh_seconds)
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            shape: UploadShape::Split,
            data_url: "http://127.0.0.1/data".to_string(),
            image_url: "http://127.0.0.1/upload_image".to_string(),
            retries: 3,
            retry_delay_seconds: 5,
            timeout_seconds: 30,
        }
    }
}

impl UploadConfig {
    pub fn retry(&self) -> RetryPolicy {
        RetryPolicy::new(self.retries, Duration::from_secs(self.retry_delay_seconds))
    }

    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent");

        let config = Config::load(path.to_str().unwrap()).unwrap();

        assert_eq!(config.schedule.data_interval(), Duration::from_secs(60));
        assert_eq!(config.schedule.image_interval(), Duration::from_secs(1800));
        assert_eq!(config.schedule.poll_interval(), Duration::from_secs(5));
        assert_eq!(config.sensor.address, 0x76);
        assert_eq!(config.sensor.retry().attempts, 5);
        assert_eq!(config.upload.retry().attempts, 3);
        assert_eq!(config.upload.shape, UploadShape::Split);
        assert_eq!(config.weather_station.refresh(), Duration::from_secs(30));
        assert_eq!(config.weather_station.args[0], "-M");
    }

    #[test]
    fn partial_file_overrides_only_given_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("station.toml");
        std::fs::write(
            &path,
            r#"
            [schedule]
            data_interval_seconds = 300

            [upload]
            shape = "combined"
            data_url = "http://example.invalid/data"
            "#,
        )
        .unwrap();

        let config = Config::load(path.to_str().unwrap()).unwrap();

        assert_eq!(config.schedule.data_interval_seconds, 300);
        assert_eq!(config.schedule.image_interval_seconds, 1800);
        assert_eq!(config.upload.shape, UploadShape::Combined);
        assert_eq!(config.upload.data_url, "http://example.invalid/data");
        assert_eq!(config.upload.retries, 3);
    }

    #[test]
    fn environment_overrides_file_and_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("station.toml");
        std::fs::write(&path, "[upload]\ndata_url = \"http://from-file/data\"\n").unwrap();

        let vars: config::Map<String, String> = [
            ("STATION_UPLOAD__DATA_URL", "http://from-env/data"),
            ("STATION_SCHEDULE__DATA_INTERVAL_SECONDS", "300"),
            ("STATION_UPLOAD__SHAPE", "combined"),
            ("OTHER_SCHEDULE__POLL_INTERVAL_SECONDS", "1"),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();

        let config =
            Config::load_with(path.to_str().unwrap(), environment().source(Some(vars))).unwrap();

        assert_eq!(config.upload.data_url, "http://from-env/data");
        assert_eq!(config.upload.shape, UploadShape::Combined);
        assert_eq!(config.schedule.data_interval_seconds, 300);
        assert_eq!(config.schedule.poll_interval_seconds, 5);
        assert_eq!(config.upload.image_url, "http://127.0.0.1/upload_image");
    }

    #[test]
    fn create_dirs_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PathsConfig {
            image_dir: dir.path().join("images"),
            data_file: dir.path().join("data").join("data.json"),
        };

        paths.create_dirs().unwrap();
        paths.create_dirs().unwrap();

        assert!(dir.path().join("images").is_dir());
        assert!(dir.path().join("data").is_dir());
    }
}
