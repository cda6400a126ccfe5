use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};
use telemetry::{SensorReading, TelemetryRecord};
use tokio::{select, time::sleep};

use crate::{
    capture::ImageCapture,
    clock::Clock,
    config::{ScheduleConfig, UploadShape},
    error::SensorError,
    local_log::LocalLog,
    schedule::SendTimer,
    sensor::{AnalogChannel, SensorReader},
    shutdown::ShutdownSignal,
    snapshot::SnapshotReader,
    uploader::Uploader,
};

/// Everything the main loop drives.
pub struct Station {
    pub sensor: SensorReader,
    pub analog: Option<AnalogChannel>,
    pub camera: ImageCapture,
    pub image_dir: PathBuf,
    pub snapshot: SnapshotReader,
    pub local_log: LocalLog,
    pub uploader: Uploader,
}

/// What a single iteration did.
#[derive(Debug, Default)]
pub struct CycleReport {
    /// `None` when zeroed placeholders were used.
    pub reading: Option<SensorReading>,
    pub record: Option<TelemetryRecord>,
    pub logged: bool,
    /// `None` when no record upload was due.
    pub record_sent: Option<bool>,
    pub image: Option<PathBuf>,
    /// `None` when no image upload was attempted.
    pub image_sent: Option<bool>,
}

/// Polls the sensor every `poll_interval` and sends records and images
/// whenever their intervals have elapsed on `clock`.
///
/// Nothing that happens inside an iteration stops the loop; failures are
/// logged and the next poll proceeds as usual.
pub struct MainLoop<C: Clock> {
    station: Station,
    clock: C,
    poll_interval: Duration,
    data_timer: SendTimer,
    image_timer: SendTimer,
}

impl<C: Clock> MainLoop<C> {
    /// The first record and image are due one interval after construction.
    pub fn new(station: Station, schedule: &ScheduleConfig, clock: C) -> Self {
        let start = clock.now();

        Self {
            station,
            poll_interval: schedule.poll_interval(),
            data_timer: SendTimer::new(schedule.data_interval(), start),
            image_timer: SendTimer::new(schedule.image_interval(), start),
            clock,
        }
    }

    pub async fn run(mut self, mut shutdown: ShutdownSignal) {
        info!(
            "[STATION] Polling every {:?}, sending records every {:?} ({:?} shape)",
            self.poll_interval,
            self.data_timer.interval(),
            self.station.uploader.shape()
        );

        loop {
            select! {
                _ = shutdown.wait() => break,
                report = self.tick() => debug!("[STATION] {report:?}"),
            }

            select! {
                _ = shutdown.wait() => break,
                _ = sleep(self.poll_interval) => {}
            }
        }

        info!("[STATION] Main loop stopped");
    }

    /// One iteration: read the sensor, then send whatever is due.
    pub async fn tick(&mut self) -> CycleReport {
        let mut report = CycleReport::default();

        let reading = match self.station.sensor.read().await {
            Ok(reading) => {
                info!(
                    "[SENSOR] Temp={:.1} C, Temp={:.1} F, Humidity={:.1}%, Pressure={:.2} hPa",
                    reading.temperature_c,
                    reading.temperature_f,
                    reading.humidity,
                    reading.pressure_hpa
                );
                report.reading = Some(reading);
                reading
            }
            Err(SensorError::HardwareUnavailable(reason)) => {
                debug!("[SENSOR] Unavailable ({reason}), using zeroed readings");
                SensorReading::zeroed()
            }
            Err(e) => {
                warn!("[SENSOR] {e}; using zeroed readings");
                SensorReading::zeroed()
            }
        };

        let now = self.clock.now();
        let data_due = self.data_timer.poll(now);

        match self.station.uploader.shape() {
            UploadShape::Split => {
                if data_due {
                    let record = self.compose(reading, now, &mut report).await;
                    let sent = self.station.uploader.send_record(&record, None).await;
                    report.record_sent = Some(log_send("record", sent));
                    report.record = Some(record);
                }

                if self.image_timer.poll(now) {
                    if let Some(path) = self.capture(now).await {
                        let sent = self.station.uploader.send_image(&path).await;
                        report.image_sent = Some(log_send("image", sent));
                        report.image = Some(path);
                    }
                }
            }
            UploadShape::Combined => {
                if data_due {
                    let record = self.compose(reading, now, &mut report).await;
                    let image = if self.image_timer.poll(now) {
                        self.capture(now).await
                    } else {
                        None
                    };

                    let sent = self
                        .station
                        .uploader
                        .send_record(&record, image.as_deref())
                        .await;
                    let sent = log_send("record", sent);

                    report.record_sent = Some(sent);
                    report.image_sent = image.as_ref().map(|_| sent);
                    report.image = image;
                    report.record = Some(record);
                }
            }
        }

        report
    }

    /// Builds the record and appends it to the local log before any upload.
    async fn compose(
        &mut self,
        reading: SensorReading,
        now: DateTime<Utc>,
        report: &mut CycleReport,
    ) -> TelemetryRecord {
        let analog = match self.station.analog.as_mut() {
            Some(channel) => channel
                .read_volts()
                .await
                .map_err(|e| warn!("[ADC] Read failed, omitting analog_voltage: {e}"))
                .ok(),
            None => None,
        };

        let weather = self.station.snapshot.latest();
        let record = TelemetryRecord::compose(reading, analog, weather.as_deref(), now);

        match self.station.local_log.append(&record) {
            Ok(_) => report.logged = true,
            Err(e) => error!(
                "[LOG] Could not append to {}: {e}",
                self.station.local_log.path().display()
            ),
        }

        record
    }

    async fn capture(&mut self, now: DateTime<Utc>) -> Option<PathBuf> {
        let dir: &Path = &self.station.image_dir;

        self.station
            .camera
            .capture(dir, now)
            .await
            .map_err(|e| warn!("[CAMERA] Skipping image: {e}"))
            .ok()
    }
}

fn log_send<E: std::fmt::Display>(what: &str, result: Result<String, E>) -> bool {
    match result {
        Ok(_) => true,
        Err(e) => {
            error!("[UPLOAD] Dropping {what}: {e}");
            false
        }
    }
}
