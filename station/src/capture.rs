use chrono::{DateTime, Local, Utc};
use log::{info, warn};
use sensors::{Camera, DriverError};
use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use crate::{
    error::CaptureError,
    hardware::{Shared, run_blocking},
};

/// `image_YYYYmmdd_HHMMSS.jpg`, local time.
pub fn image_file_name(taken_at: DateTime<Utc>) -> String {
    format!(
        "image_{}.jpg",
        taken_at.with_timezone(&Local).format("%Y%m%d_%H%M%S")
    )
}

/// Still capture into a directory. The camera program runs on the blocking
/// thread pool.
pub struct ImageCapture {
    camera: Result<Shared<Box<dyn Camera + Send>>, String>,
}

impl ImageCapture {
    pub fn new(camera: Result<Box<dyn Camera + Send>, DriverError>) -> Self {
        let camera = camera
            .map(|camera| Arc::new(Mutex::new(camera)))
            .map_err(|e| {
                warn!("[CAMERA] Unavailable, no images will be taken: {e}");
                e.to_string()
            });

        Self { camera }
    }

    pub fn is_available(&self) -> bool {
        self.camera.is_ok()
    }

    /// Takes one still into `directory` and returns its path.
    pub async fn capture(
        &mut self,
        directory: &Path,
        taken_at: DateTime<Utc>,
    ) -> Result<PathBuf, CaptureError> {
        let camera = match &self.camera {
            Ok(camera) => camera,
            Err(reason) => return Err(CaptureError::HardwareUnavailable(reason.clone())),
        };

        let path = directory.join(image_file_name(taken_at));

        let target = path.clone();
        run_blocking(camera, move |camera| camera.capture_to(&target))
            .await
            .map_err(|source| CaptureError::Driver {
                path: path.clone(),
                source,
            })?;

        info!("[CAMERA] Captured {}", path.display());
        Ok(path)
    }
}
