/// One sample from the temperature/humidity/pressure sensor.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SensorReading {
    pub temperature_c: f64,
    pub temperature_f: f64,
    /// Relative humidity in percent.
    pub humidity: f64,
    /// Pressure in hPa.
    pub pressure_hpa: f64,
}

impl SensorReading {
    pub fn from_celsius(temperature_c: f64, humidity: f64, pressure_hpa: f64) -> Self {
        Self {
            temperature_c,
            temperature_f: celsius_to_fahrenheit(temperature_c),
            humidity,
            pressure_hpa,
        }
    }

    /// Placeholder used when the sensor is unavailable for a cycle. Every
    /// field is zero, including Fahrenheit.
    pub fn zeroed() -> Self {
        Self::default()
    }
}

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}
