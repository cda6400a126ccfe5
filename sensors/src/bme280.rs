use bme280_rs::{Bme280, Configuration, Oversampling, SensorMode};
use linux_embedded_hal::{Delay, I2cdev};
use log::info;

use crate::{DriverError, EnvironmentSensor, Sample};

/// Bosch BME280 on a Linux I²C bus.
pub struct Bme280Sensor {
    device: Bme280<I2cdev, Delay>,
}

impl Bme280Sensor {
    /// Opens `bus` (e.g. `/dev/i2c-1`) and configures the sensor at `address`.
    pub fn open(bus: &str, address: u8) -> Result<Self, DriverError> {
        let i2c = I2cdev::new(bus).map_err(|e| DriverError::Unavailable(format!("{bus}: {e:?}")))?;
        let mut device = Bme280::new_with_address(i2c, address, Delay);

        device
            .init()
            .map_err(|e| DriverError::Unavailable(format!("BME280 at {address:#04x}: {e:?}")))?;

        device
            .set_sampling_configuration(
                Configuration::default()
                    .with_temperature_oversampling(Oversampling::Oversample1)
                    .with_pressure_oversampling(Oversampling::Oversample1)
                    .with_humidity_oversampling(Oversampling::Oversample1)
                    .with_sensor_mode(SensorMode::Normal),
            )
            .map_err(bus_error)?;

        info!("[BME280] Initialized at {address:#04x} on {bus}");

        Ok(Self { device })
    }
}

impl EnvironmentSensor for Bme280Sensor {
    fn sample(&mut self) -> Result<Sample, DriverError> {
        let temperature = self.device.read_temperature().map_err(bus_error)?;
        let humidity = self.device.read_humidity().map_err(bus_error)?;
        let pressure = self.device.read_pressure().map_err(bus_error)?;

        Ok(Sample {
            temperature_c: f64::from(temperature.ok_or(DriverError::Incomplete("temperature"))?),
            humidity: f64::from(humidity.ok_or(DriverError::Incomplete("humidity"))?),
            // Pa to hPa
            pressure_hpa: f64::from(pressure.ok_or(DriverError::Incomplete("pressure"))?) / 100.0,
        })
    }
}

fn bus_error<E: std::fmt::Debug>(e: E) -> DriverError {
    DriverError::Bus(format!("{e:?}"))
}
