use std::{
    collections::VecDeque,
    fs,
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use crate::{AnalogInput, Camera, DriverError, EnvironmentSensor, Sample};

/// A sensor that replays a script of results, then keeps returning the
/// fallback sample (or an error when there is none).
pub struct MockSensor {
    script: VecDeque<Result<Sample, DriverError>>,
    fallback: Option<Sample>,
    attempts: Arc<AtomicUsize>,
}

impl MockSensor {
    pub fn always(sample: Sample) -> Self {
        Self::scripted(Vec::new(), Some(sample))
    }

    pub fn failing() -> Self {
        Self::scripted(Vec::new(), None)
    }

    pub fn scripted(script: Vec<Result<Sample, DriverError>>, fallback: Option<Sample>) -> Self {
        Self {
            script: script.into(),
            fallback,
            attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared counter of `sample` calls, usable after the mock is boxed.
    pub fn attempts(&self) -> Arc<AtomicUsize> {
        self.attempts.clone()
    }
}

impl EnvironmentSensor for MockSensor {
    fn sample(&mut self) -> Result<Sample, DriverError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        match self.script.pop_front() {
            Some(result) => result,
            None => self
                .fallback
                .ok_or_else(|| DriverError::Bus("mock sensor has no sample".to_string())),
        }
    }
}

/// A camera that writes a fixed payload instead of a real still.
pub struct MockCamera {
    payload: Vec<u8>,
    fail: bool,
    captures: Arc<AtomicUsize>,
}

impl MockCamera {
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: payload.into(),
            fail: false,
            captures: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn captures(&self) -> Arc<AtomicUsize> {
        self.captures.clone()
    }
}

impl Camera for MockCamera {
    fn capture_to(&mut self, path: &Path) -> Result<(), DriverError> {
        self.captures.fetch_add(1, Ordering::SeqCst);

        if self.fail {
            return Err(DriverError::Unavailable("mock camera".to_string()));
        }

        fs::write(path, &self.payload)?;
        Ok(())
    }
}

/// An ADC that reports the same raw value on every channel.
pub struct MockAdc {
    pub raw: Option<u16>,
    pub full_scale: u16,
}

impl MockAdc {
    pub fn new(raw: u16) -> Self {
        Self {
            raw: Some(raw),
            full_scale: 1023,
        }
    }

    pub fn failing() -> Self {
        Self {
            raw: None,
            full_scale: 1023,
        }
    }
}

impl AnalogInput for MockAdc {
    fn read_raw(&mut self, channel: u8) -> Result<u16, DriverError> {
        self.raw.ok_or(DriverError::InvalidChannel(channel))
    }

    fn full_scale(&self) -> u16 {
        self.full_scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: Sample = Sample {
        temperature_c: 21.0,
        humidity: 45.0,
        pressure_hpa: 1013.25,
    };

    #[test]
    fn scripted_sensor_replays_then_falls_back() {
        let mut sensor = MockSensor::scripted(
            vec![Err(DriverError::Bus("nack".to_string()))],
            Some(SAMPLE),
        );
        let attempts = sensor.attempts();

        assert!(sensor.sample().is_err());
        assert_eq!(sensor.sample().unwrap(), SAMPLE);
        assert_eq!(sensor.sample().unwrap(), SAMPLE);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn boxed_sensor_delegates() {
        let mut sensor: Box<dyn EnvironmentSensor + Send> = Box::new(MockSensor::always(SAMPLE));
        assert_eq!(sensor.sample().unwrap(), SAMPLE);
    }

    #[test]
    fn mock_camera_writes_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.jpg");
        let mut camera = MockCamera::new(b"jpeg".to_vec());

        camera.capture_to(&path).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"jpeg");
        assert_eq!(camera.captures().load(Ordering::SeqCst), 1);
    }
}
