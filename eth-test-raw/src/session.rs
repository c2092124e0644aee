//! Client session loop.
//!
//! A [`Session`] owns the link, the [`ExchangeEngine`], and the
//! [`StatsAggregator`], and turns exchange outcomes into policy:
//!
//! - `Accepted` → count it, move on to the next sequence number.
//! - `Retry`    → count a retry; stop once the *cumulative* retry count
//!   reaches `max_retries`, otherwise resend the **same** sequence number.
//! - `Failed`   → count an error; stop once the error threshold is reached,
//!   otherwise absorb it and move on to the **next** sequence number.
//!
//! Between iterations the loop checks the runtime bound and the cooperative
//! stop flag, flushes interval statistics, and applies the optional delay.
//! Whatever ends the session, the cumulative report is printed last.
//!
//! The loop is strictly sequential: one frame in flight, the receive timeout
//! being the only thing that can unstick an exchange.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::SessionConfig;
use crate::exchange::{ExchangeEngine, Outcome};
use crate::link::{Link, LinkError};
use crate::state::SessionState;
use crate::stats::{Delta, Snapshot, StatsAggregator};

// ---------------------------------------------------------------------------
// Termination
// ---------------------------------------------------------------------------

/// Why a session ended.
#[derive(Debug)]
pub enum Termination {
    /// The configured runtime elapsed.
    RuntimeElapsed,
    /// The stop flag was raised (Ctrl-C).
    Interrupted,
    /// Cumulative retries reached the configured maximum.
    MaxRetries(u64),
    /// Cumulative errors reached the configured threshold.
    ErrorThreshold(u64),
    /// The link itself failed; no further exchange is possible.
    LinkFailure(LinkError),
}

impl Termination {
    /// Process exit code: `0` for a clean or interrupted stop, `1` otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::RuntimeElapsed | Self::Interrupted => 0,
            Self::MaxRetries(_) | Self::ErrorThreshold(_) | Self::LinkFailure(_) => 1,
        }
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RuntimeElapsed => write!(f, "Runtime elapsed"),
            Self::Interrupted => write!(f, "Stopped"),
            Self::MaxRetries(n) => write!(f, "Stopped because max retries {n} reached"),
            Self::ErrorThreshold(n) => write!(f, "Stopped because error threshold {n} reached"),
            Self::LinkFailure(e) => write!(f, "Stopped because of link failure: {e}"),
        }
    }
}

/// Outcome of [`Session::run`].
#[derive(Debug)]
pub struct SessionReport {
    pub termination: Termination,
    /// Cumulative statistics at the moment the session ended.
    pub total: Snapshot,
}

impl SessionReport {
    pub fn exit_code(&self) -> i32 {
        self.termination.exit_code()
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// The client loop for one peer.
pub struct Session<L: Link> {
    link: L,
    engine: ExchangeEngine,
    stats: StatsAggregator,
    config: SessionConfig,
    stop: Arc<AtomicBool>,
    state: SessionState,
    /// Sequence number of the next fresh exchange.
    next_seq: u32,
}

impl<L: Link> Session<L> {
    pub fn new(link: L, engine: ExchangeEngine, config: SessionConfig) -> Self {
        let stats = StatsAggregator::new(engine.codec().frame_len());
        Self {
            link,
            engine,
            stats,
            config,
            stop: Arc::new(AtomicBool::new(false)),
            state: SessionState::default(),
            next_seq: 0,
        }
    }

    /// Flag that, once set, ends the session at the next iteration boundary.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn engine(&self) -> &ExchangeEngine {
        &self.engine
    }

    pub fn stats(&self) -> &StatsAggregator {
        &self.stats
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn next_sequence(&self) -> u32 {
        self.next_seq
    }

    /// Run until a stop condition, print the final report, and return it.
    pub async fn run(&mut self) -> SessionReport {
        let termination = loop {
            if let Some(t) = self.step().await {
                break t;
            }
        };
        self.state = SessionState::Terminated(termination.exit_code());

        match &termination {
            Termination::RuntimeElapsed => log::info!("{termination}"),
            other => println!("{other}"),
        }
        let total = self.stats.final_snapshot();
        println!("Total Stats: {total}");

        SessionReport { termination, total }
    }

    /// One outer iteration: one logical ping, possibly with retries.
    async fn step(&mut self) -> Option<Termination> {
        if self.stop.load(Ordering::Relaxed) {
            return Some(Termination::Interrupted);
        }
        if let Some(runtime) = self.config.runtime {
            if self.stats.elapsed() > runtime {
                return Some(Termination::RuntimeElapsed);
            }
        }

        self.state = SessionState::Running;
        let seq = self.next_seq;
        if let Some(t) = self.exchange(seq).await {
            return Some(t);
        }
        self.next_seq = seq.wrapping_add(1);

        if let Some(snapshot) = self.stats.flush_if_due(self.config.interval) {
            println!("{snapshot}");
        }
        if let Some(delay) = self.config.delay {
            tokio::time::sleep(delay).await;
        }
        None
    }

    /// Attempt `seq` until it is accepted, fails, or a threshold stops us.
    async fn exchange(&mut self, seq: u32) -> Option<Termination> {
        loop {
            let outcome = match self.engine.attempt(&mut self.link, seq).await {
                Ok(outcome) => outcome,
                Err(e) => return Some(Termination::LinkFailure(e)),
            };

            match outcome {
                Outcome::Accepted => {
                    self.stats.record(Delta::CONFIRMED);
                    self.state = SessionState::Running;
                    return None;
                }
                Outcome::Retry => {
                    self.state = SessionState::Retrying;
                    self.stats.record(Delta::RETRIED);
                    let retries = self.stats.total().retry_count;
                    log::debug!("seq {seq}: retry {retries}/{}", self.config.max_retries);
                    if retries >= self.config.max_retries {
                        return Some(Termination::MaxRetries(self.config.max_retries));
                    }
                    if let Some(delay) = self.config.delay {
                        tokio::time::sleep(delay).await;
                    }
                }
                Outcome::Failed(failure) => {
                    self.state = SessionState::ErrorCounting;
                    log::debug!("seq {seq}: Rx error: {failure}");
                    self.stats.record(Delta::ERRORED);
                    let threshold = self.config.error_threshold;
                    if threshold.is_reached(self.stats.total().error_count) {
                        return Some(Termination::ErrorThreshold(
                            threshold.0.unwrap_or_default(),
                        ));
                    }
                    return None;
                }
            }
        }
    }
}
