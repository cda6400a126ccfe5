use chrono::{DateTime, TimeDelta, Utc};
use log::warn;
use std::time::Duration;

/// Decides when a periodic send is due, against wall-clock time.
///
/// A send fires when at least `interval` has elapsed since the previous one;
/// the timer then restarts from the instant it fired. Polling again at the
/// same instant never fires twice.
///
/// # Example
///
/// ```
/// use chrono::{DateTime, TimeDelta};
/// use station::schedule::SendTimer;
/// use std::time::Duration;
///
/// let start = DateTime::from_timestamp(0, 0).unwrap();
/// let mut timer = SendTimer::new(Duration::from_secs(60), start);
///
/// assert!(!timer.poll(start + TimeDelta::seconds(59)));
/// assert!(timer.poll(start + TimeDelta::seconds(60)));
/// assert!(!timer.poll(start + TimeDelta::seconds(60)));
/// ```
#[derive(Debug, Clone)]
pub struct SendTimer {
    interval: TimeDelta,
    last: DateTime<Utc>,
}

impl SendTimer {
    /// Create a timer whose first send is due one `interval` after `start`.
    pub fn new(interval: Duration, start: DateTime<Utc>) -> Self {
        Self {
            interval: TimeDelta::from_std(interval).unwrap_or(TimeDelta::MAX),
            last: start,
        }
    }

    /// Returns `true` exactly once per elapsed interval.
    ///
    /// If the wall clock stepped backwards (NTP sync after boot on a Pi
    /// without RTC), the timer restarts from `now` instead of waiting for the
    /// clock to catch up with the old timestamp.
    pub fn poll(&mut self, now: DateTime<Utc>) -> bool {
        if now < self.last {
            warn!(
                "[SCHEDULE] Clock went back by {}s, restarting interval",
                (self.last - now).num_seconds()
            );
            self.last = now;
            return false;
        }

        if now - self.last >= self.interval {
            self.last = now;
            return true;
        }

        false
    }

    pub fn interval(&self) -> Duration {
        self.interval.to_std().unwrap_or(Duration::MAX)
    }

    pub fn last_fired(&self) -> DateTime<Utc> {
        self.last
    }
}
