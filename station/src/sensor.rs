use log::{info, warn};
use sensors::{AnalogInput, DriverError, EnvironmentSensor};
use std::sync::{Arc, Mutex};
use telemetry::SensorReading;

use crate::{
    error::SensorError,
    hardware::{Shared, run_blocking},
    retry::RetryPolicy,
};

/// Bounded-retry front end of the environment sensor. Bus transactions run on
/// the blocking thread pool.
pub struct SensorReader {
    driver: Result<Shared<Box<dyn EnvironmentSensor + Send>>, String>,
    retry: RetryPolicy,
}

impl SensorReader {
    /// Takes the result of opening the driver. A failed open leaves the
    /// reader permanently uninitialized.
    pub fn new(
        driver: Result<Box<dyn EnvironmentSensor + Send>, DriverError>,
        retry: RetryPolicy,
    ) -> Self {
        let driver = driver
            .map(|driver| Arc::new(Mutex::new(driver)))
            .map_err(|e| {
                warn!("[SENSOR] Hardware unavailable, readings will be zeroed: {e}");
                e.to_string()
            });

        Self { driver, retry }
    }

    pub fn is_available(&self) -> bool {
        self.driver.is_ok()
    }

    /// Returns the first successful sample out of at most `retry.attempts`.
    pub async fn read(&mut self) -> Result<SensorReading, SensorError> {
        let driver = match &self.driver {
            Ok(driver) => driver,
            Err(reason) => return Err(SensorError::HardwareUnavailable(reason.clone())),
        };

        let mut attempt = 0;
        loop {
            attempt += 1;

            match run_blocking(driver, |sensor| sensor.sample()).await {
                Ok(sample) => {
                    return Ok(SensorReading::from_celsius(
                        sample.temperature_c,
                        sample.humidity,
                        sample.pressure_hpa,
                    ));
                }
                Err(e) => {
                    warn!("[SENSOR] Read attempt {attempt}/{} failed: {e}", self.retry.attempts);

                    if self.retry.is_last(attempt) {
                        return Err(SensorError::ReadFailed {
                            attempts: attempt,
                            source: e,
                        });
                    }
                }
            }

            self.retry.pause().await;
        }
    }
}

/// One ADC channel scaled to volts.
pub struct AnalogChannel {
    adc: Shared<Box<dyn AnalogInput + Send>>,
    channel: u8,
    reference_voltage: f64,
}

impl AnalogChannel {
    pub fn new(adc: Box<dyn AnalogInput + Send>, channel: u8, reference_voltage: f64) -> Self {
        info!("[ADC] Reading channel {channel} against {reference_voltage} V");

        Self {
            adc: Arc::new(Mutex::new(adc)),
            channel,
            reference_voltage,
        }
    }

    pub async fn read_volts(&mut self) -> Result<f64, DriverError> {
        let channel = self.channel;
        let (raw, full_scale) =
            run_blocking(&self.adc, move |adc| Ok((adc.read_raw(channel)?, adc.full_scale())))
                .await?;

        Ok(f64::from(raw) / f64::from(full_scale.max(1)) * self.reference_voltage)
    }
}
