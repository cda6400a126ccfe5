use std::sync::Arc;
use telemetry::WeatherSnapshot;
use tokio::sync::watch;

/// Creates the single-writer handle for the weather-station listener and the
/// reader handle for the main loop.
///
/// The writer swaps in a whole new snapshot; readers always see either the
/// old or the new one, never a mix.
pub fn shared() -> (SnapshotWriter, SnapshotReader) {
    let (tx, rx) = watch::channel(None);
    (SnapshotWriter(tx), SnapshotReader(rx))
}

pub struct SnapshotWriter(watch::Sender<Option<Arc<WeatherSnapshot>>>);

impl SnapshotWriter {
    pub fn replace(&self, snapshot: WeatherSnapshot) {
        self.0.send_replace(Some(Arc::new(snapshot)));
    }
}

#[derive(Clone)]
pub struct SnapshotReader(watch::Receiver<Option<Arc<WeatherSnapshot>>>);

impl SnapshotReader {
    /// The most recent snapshot, however old, or `None` if nothing arrived yet.
    pub fn latest(&self) -> Option<Arc<WeatherSnapshot>> {
        self.0.borrow().clone()
    }
}
