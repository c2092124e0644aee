//! Session finite-state machine types.
//!
//! ```text
//!            ┌──────── Accepted ─────────┐
//!            ▼                           │
//!        RUNNING ──Retry──▶ RETRYING ──attempt──┘
//!          │  ▲                 │
//!   Failed │  │ below threshold │ max retries
//!          ▼  │                 ▼
//!    ERROR_COUNTING ──threshold──▶ TERMINATED(exit code)
//! ```
//!
//! Runtime expiry and interrupts also lead from `Running` to `Terminated`.
//! Transitions are driven by [`crate::session::Session`]; this module only
//! names the states.

use std::fmt;

/// All states a [`crate::session::Session`] can occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Sending a fresh sequence number.
    #[default]
    Running,
    /// Re-sending the same sequence number after a foreign frame.
    Retrying,
    /// An exchange failed; checking the error threshold.
    ErrorCounting,
    /// The session is over; carries the process exit code.
    Terminated(i32),
}

impl SessionState {
    pub fn is_terminated(&self) -> bool {
        matches!(self, Self::Terminated(_))
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Retrying => write!(f, "retrying"),
            Self::ErrorCounting => write!(f, "error-counting"),
            Self::Terminated(code) => write!(f, "terminated({code})"),
        }
    }
}
