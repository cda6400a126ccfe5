//! Opens the real drivers described by the configuration and runs their
//! blocking calls off the async runtime.

use log::warn;
use sensors::{Camera, DriverError, EnvironmentSensor, StillCommandCamera};
use std::{
    io,
    sync::{Arc, Mutex, PoisonError},
};

use crate::{
    config::{AdcConfig, CameraConfig, SensorConfig},
    sensor::AnalogChannel,
};

pub fn environment_sensor(
    config: &SensorConfig,
) -> Result<Box<dyn EnvironmentSensor + Send>, DriverError> {
    if !config.enabled {
        return Err(DriverError::Unavailable("disabled in configuration".to_string()));
    }

    #[cfg(feature = "rpi")]
    {
        let sensor = sensors::bme280::Bme280Sensor::open(&config.i2c_bus, config.address)?;
        Ok(Box::new(sensor))
    }

    #[cfg(not(feature = "rpi"))]
    {
        Err(DriverError::Unavailable(format!(
            "{} at {:#04x}: built without the `rpi` feature",
            config.i2c_bus, config.address
        )))
    }
}

pub fn camera(config: &CameraConfig) -> Result<Box<dyn Camera + Send>, DriverError> {
    if !config.enabled {
        return Err(DriverError::Unavailable("disabled in configuration".to_string()));
    }

    Ok(Box::new(StillCommandCamera::new(
        config.program.clone(),
        config.args.clone(),
    )))
}

/// `None` when the ADC is disabled or cannot be opened.
pub fn analog_channel(config: &AdcConfig) -> Option<AnalogChannel> {
    if !config.enabled {
        return None;
    }

    #[cfg(feature = "rpi")]
    {
        match sensors::mcp3008::open(&config.spi_device) {
            Ok(adc) => Some(AnalogChannel::new(
                Box::new(adc),
                config.channel,
                config.reference_voltage,
            )),
            Err(e) => {
                warn!("[ADC] Unavailable, analog_voltage will be omitted: {e}");
                None
            }
        }
    }

    #[cfg(not(feature = "rpi"))]
    {
        warn!(
            "[ADC] {} requested but built without the `rpi` feature",
            config.spi_device
        );
        None
    }
}

/// A driver shared with the blocking thread pool.
pub type Shared<D> = Arc<Mutex<D>>;

/// Runs `call` on the driver in a blocking thread.
///
/// Dropping the returned future does not interrupt the call; the driver stays
/// locked until it returns, so the next caller waits for it.
pub async fn run_blocking<D, T, F>(driver: &Shared<D>, call: F) -> Result<T, DriverError>
where
    D: Send + 'static,
    T: Send + 'static,
    F: FnOnce(&mut D) -> Result<T, DriverError> + Send + 'static,
{
    let driver = driver.clone();

    tokio::task::spawn_blocking(move || {
        let mut driver = driver.lock().unwrap_or_else(PoisonError::into_inner);
        call(&mut *driver)
    })
    .await
    .map_err(|e| DriverError::Io(io::Error::other(format!("driver call aborted: {e}"))))?
}
