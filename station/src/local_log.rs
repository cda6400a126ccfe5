use log::{debug, warn};
use serde::Serialize;
use serde_json::{Value, ser::PrettyFormatter};
use std::{
    fs,
    io::{BufWriter, ErrorKind, Write},
    path::{Path, PathBuf},
};
use telemetry::TelemetryRecord;
use tempfile::NamedTempFile;

use crate::error::LocalLogError;

/// Append-only record log stored as one JSON array.
///
/// Each append rewrites the whole array through a temporary file in the same
/// directory that is then renamed over the log, so a crash mid-write leaves
/// either the old or the new array on disk. Only one writer is supported.
pub struct LocalLog {
    path: PathBuf,
}

impl LocalLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `record` and returns the number of entries now in the log.
    pub fn append(&self, record: &TelemetryRecord) -> Result<usize, LocalLogError> {
        let mut entries = self.load_entries()?;
        entries.push(serde_json::to_value(record)?);

        self.write_entries(&entries)?;
        debug!("[LOG] {} entries in {}", entries.len(), self.path.display());

        Ok(entries.len())
    }

    /// Every record in insertion order.
    pub fn read_all(&self) -> Result<Vec<TelemetryRecord>, LocalLogError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn load_entries(&self) -> Result<Vec<Value>, LocalLogError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice(&bytes) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                let aside = self.corrupt_path();
                warn!(
                    "[LOG] {} is not a JSON array ({e}), moving it to {} and starting over",
                    self.path.display(),
                    aside.display()
                );
                fs::rename(&self.path, &aside)?;
                Ok(Vec::new())
            }
        }
    }

    fn write_entries(&self, entries: &[Value]) -> Result<(), LocalLogError> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));

        let mut tmp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            let mut ser =
                serde_json::Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(b"    "));
            entries.serialize(&mut ser)?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;

        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    fn corrupt_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".corrupt");
        PathBuf::from(name)
    }
}
