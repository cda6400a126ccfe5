use log::{debug, error, info, warn};
use std::{process::Stdio, time::Duration};
use telemetry::WeatherSnapshot;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    process::Command,
    select,
    task::JoinHandle,
    time::sleep,
};

use crate::{error::ListenerError, shutdown::ShutdownSignal, snapshot::SnapshotWriter};

/// The RF decoder process, e.g. `rtl_433 -F json ...`.
#[derive(Debug, Clone)]
pub struct DecoderCommand {
    pub program: String,
    pub args: Vec<String>,
}

/// Background task that keeps the shared weather snapshot up to date from the
/// decoder's newline-delimited JSON output.
///
/// After every line it waits `refresh` before reading the next one, which
/// rate-limits snapshot updates. When the decoder exits or cannot be
/// started the task ends and is not restarted; the station keeps running
/// with whatever snapshot it last had.
pub struct WeatherStationListener {
    command: DecoderCommand,
    refresh: Duration,
    snapshot: SnapshotWriter,
}

impl WeatherStationListener {
    pub fn new(command: DecoderCommand, refresh: Duration, snapshot: SnapshotWriter) -> Self {
        Self {
            command,
            refresh,
            snapshot,
        }
    }

    pub fn spawn(self, shutdown: ShutdownSignal) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    /// Runs until the decoder's output ends or shutdown is signalled. The
    /// decoder is killed and reaped before returning.
    pub async fn run(self, mut shutdown: ShutdownSignal) {
        let program = &self.command.program;

        let mut child = match Command::new(program)
            .args(&self.command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(source) => {
                let err = ListenerError::Spawn {
                    program: program.clone(),
                    source,
                };
                error!("[WEATHER] {err}; continuing without weather-station data");
                return;
            }
        };

        info!("[WEATHER] Started `{}` (pid {:?})", program, child.id());

        if let Some(stdout) = child.stdout.take() {
            let mut lines = BufReader::new(stdout).lines();

            loop {
                let line = select! {
                    _ = shutdown.wait() => break,
                    line = lines.next_line() => line,
                };

                match line {
                    Ok(Some(line)) => {
                        if let Err(e) = self.handle_line(&line) {
                            warn!("[WEATHER] {e}");
                        }
                    }
                    Ok(None) => {
                        warn!("[WEATHER] `{program}` closed its output, snapshot will no longer refresh");
                        break;
                    }
                    Err(e) => {
                        error!("[WEATHER] {}", ListenerError::Io(e));
                        break;
                    }
                }

                select! {
                    _ = shutdown.wait() => break,
                    _ = sleep(self.refresh) => {}
                }
            }
        }

        if let Err(e) = child.start_kill() {
            debug!("[WEATHER] `{program}` already exited: {e}");
        }

        match child.wait().await {
            Ok(status) => info!("[WEATHER] `{program}` stopped ({status})"),
            Err(e) => warn!("[WEATHER] Could not reap `{program}`: {e}"),
        }
    }

    /// Parses one decoder line and, if it is a valid event, replaces the
    /// shared snapshot. A malformed line leaves the snapshot untouched.
    pub fn handle_line(&self, line: &str) -> Result<(), ListenerError> {
        if line.trim().is_empty() {
            return Ok(());
        }

        let snapshot = WeatherSnapshot::parse_line(line)?;
        debug!("[WEATHER] {snapshot:?}");

        self.snapshot.replace(snapshot);
        Ok(())
    }
}
