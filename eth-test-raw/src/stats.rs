//! Exchange counters and throughput.
//!
//! Two [`Stats`] windows run side by side inside a [`StatsAggregator`]:
//! - **total** lives for the whole session and feeds the final report;
//! - **interval** is reset every time it is flushed, giving live throughput.
//!
//! Every [`StatsAggregator::record`] applies the same [`Delta`] to both, so
//! the two only ever differ by what happened before the last flush.
//!
//! Time comes from `tokio::time::Instant`, which follows tokio's paused
//! clock in tests.

use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

/// Change applied by one exchange attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Delta {
    pub sent: bool,
    pub confirmed: bool,
    pub errored: bool,
    pub retried: bool,
}

impl Delta {
    /// An echo was validated.
    pub const CONFIRMED: Delta = Delta {
        sent: true,
        confirmed: true,
        errored: false,
        retried: false,
    };
    /// A foreign frame forced a resend.
    pub const RETRIED: Delta = Delta {
        sent: true,
        confirmed: false,
        errored: false,
        retried: true,
    };
    /// The exchange failed (timeout or protocol violation).
    pub const ERRORED: Delta = Delta {
        sent: true,
        confirmed: false,
        errored: true,
        retried: false,
    };
}

/// Counters for one statistics window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stats {
    pub packets_sent: u64,
    pub packets_confirmed: u64,
    pub error_count: u64,
    pub retry_count: u64,
    pub window_start: Instant,
}

impl Stats {
    pub fn new(window_start: Instant) -> Self {
        Self {
            packets_sent: 0,
            packets_confirmed: 0,
            error_count: 0,
            retry_count: 0,
            window_start,
        }
    }

    fn apply(&mut self, delta: Delta) {
        self.packets_sent += u64::from(delta.sent);
        self.packets_confirmed += u64::from(delta.confirmed);
        self.error_count += u64::from(delta.errored);
        self.retry_count += u64::from(delta.retried);
    }

    pub fn elapsed_at(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.window_start)
    }

    /// Freeze the counters as seen at `now`.
    pub fn snapshot_at(&self, now: Instant, frame_len: usize) -> Snapshot {
        Snapshot {
            packets_sent: self.packets_sent,
            packets_confirmed: self.packets_confirmed,
            error_count: self.error_count,
            retry_count: self.retry_count,
            elapsed: self.elapsed_at(now),
            frame_len,
        }
    }
}

/// Immutable view of a [`Stats`] window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    pub packets_sent: u64,
    pub packets_confirmed: u64,
    pub error_count: u64,
    pub retry_count: u64,
    pub elapsed: Duration,
    /// Bytes per confirmed frame, used for throughput.
    pub frame_len: usize,
}

impl Snapshot {
    /// Confirmed bytes per second; `0.0` for a window with no elapsed time.
    pub fn bytes_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs <= f64::EPSILON {
            return 0.0;
        }
        (self.packets_confirmed as f64 * self.frame_len as f64) / secs
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sent pkts: {:5}, errors/lost pkts: {:3}, retry pkts: {:3}, {:6.2} MByte/s",
            self.packets_sent,
            self.error_count,
            self.retry_count,
            self.bytes_per_second() / 1e6
        )
    }
}

/// Cumulative and interval statistics, updated together.
#[derive(Debug, Clone)]
pub struct StatsAggregator {
    total: Stats,
    interval: Stats,
    frame_len: usize,
}

impl StatsAggregator {
    /// Start both windows now.
    pub fn new(frame_len: usize) -> Self {
        Self::starting_at(Instant::now(), frame_len)
    }

    pub fn starting_at(start: Instant, frame_len: usize) -> Self {
        Self {
            total: Stats::new(start),
            interval: Stats::new(start),
            frame_len,
        }
    }

    /// Apply one attempt's delta to both windows.
    pub fn record(&mut self, delta: Delta) {
        self.total.apply(delta);
        self.interval.apply(delta);
    }

    pub fn total(&self) -> &Stats {
        &self.total
    }

    pub fn interval(&self) -> &Stats {
        &self.interval
    }

    /// Session time so far.
    pub fn elapsed(&self) -> Duration {
        self.total.elapsed_at(Instant::now())
    }

    /// If the interval window is older than `interval`, return its snapshot
    /// and start a fresh one.
    pub fn flush_if_due(&mut self, interval: Duration) -> Option<Snapshot> {
        self.flush_if_due_at(Instant::now(), interval)
    }

    pub fn flush_if_due_at(&mut self, now: Instant, interval: Duration) -> Option<Snapshot> {
        if self.interval.elapsed_at(now) <= interval {
            return None;
        }
        let snapshot = self.interval.snapshot_at(now, self.frame_len);
        self.interval = Stats::new(now);
        Some(snapshot)
    }

    /// Cumulative snapshot for the end-of-session report.
    pub fn final_snapshot(&self) -> Snapshot {
        self.total.snapshot_at(Instant::now(), self.frame_len)
    }
}
