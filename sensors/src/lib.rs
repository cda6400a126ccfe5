//! Hardware seams for the station: the environment sensor, the still camera
//! and the analog-to-digital converter. Real drivers live next to mocks so the
//! daemon can be exercised without a Pi attached.

pub mod camera;
pub mod error;
pub mod mcp3008;
pub mod mock;

#[cfg(feature = "rpi")]
pub mod bme280;

use std::path::Path;

pub use camera::StillCommandCamera;
pub use error::DriverError;
pub use mcp3008::Mcp3008;

/// Raw output of a temperature/humidity/pressure sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub temperature_c: f64,
    pub humidity: f64,
    pub pressure_hpa: f64,
}

pub trait EnvironmentSensor {
    /// Takes one measurement from the device.
    fn sample(&mut self) -> Result<Sample, DriverError>;
}

pub trait Camera {
    /// Writes a still image to `path`.
    fn capture_to(&mut self, path: &Path) -> Result<(), DriverError>;
}

pub trait AnalogInput {
    /// Reads the raw conversion result of a single-ended channel.
    fn read_raw(&mut self, channel: u8) -> Result<u16, DriverError>;

    /// Largest value `read_raw` can return.
    fn full_scale(&self) -> u16;
}

impl<T: EnvironmentSensor + ?Sized> EnvironmentSensor for Box<T> {
    fn sample(&mut self) -> Result<Sample, DriverError> {
        (**self).sample()
    }
}

impl<T: Camera + ?Sized> Camera for Box<T> {
    fn capture_to(&mut self, path: &Path) -> Result<(), DriverError> {
        (**self).capture_to(path)
    }
}

impl<T: AnalogInput + ?Sized> AnalogInput for Box<T> {
    fn read_raw(&mut self, channel: u8) -> Result<u16, DriverError> {
        (**self).read_raw(channel)
    }

    fn full_scale(&self) -> u16 {
        (**self).full_scale()
    }
}
