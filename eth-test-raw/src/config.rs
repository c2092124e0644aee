//! Session parameters.
//!
//! [`SessionConfig`] carries everything the client loop needs besides the
//! link and the two addresses.  `Default` matches the CLI defaults.  The
//! small parsers at the bottom are used as clap value parsers so bad input
//! is rejected before a socket is ever opened.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::frame::PAYLOAD_LEN;

/// Stop after this many errors, or never.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorThreshold(pub Option<u64>);

impl ErrorThreshold {
    /// Never stop because of errors (`-1` on the command line).
    pub const NEVER: ErrorThreshold = ErrorThreshold(None);

    pub fn at(limit: u64) -> Self {
        Self(Some(limit))
    }

    /// `true` once `errors` has reached the limit.
    pub fn is_reached(&self, errors: u64) -> bool {
        self.0.is_some_and(|limit| errors >= limit)
    }
}

impl Default for ErrorThreshold {
    fn default() -> Self {
        Self::at(1)
    }
}

impl fmt::Display for ErrorThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(limit) => write!(f, "{limit}"),
            None => write!(f, "-1"),
        }
    }
}

impl FromStr for ErrorThreshold {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "-1" => Ok(Self::NEVER),
            other => other
                .parse::<u64>()
                .map(Self::at)
                .map_err(|_| format!("expected a non-negative count or -1, got {s:?}")),
        }
    }
}

/// Client loop configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Stop cleanly after this long (`None` = run until interrupted).
    pub runtime: Option<Duration>,
    /// Pause after every exchange and before every retry.
    pub delay: Option<Duration>,
    /// How long to wait for each echo.
    pub reply_timeout: Duration,
    pub error_threshold: ErrorThreshold,
    /// Stop once the cumulative retry count reaches this.
    pub max_retries: u64,
    /// Cadence of interval statistics.
    pub interval: Duration,
    pub payload_len: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            runtime: None,
            delay: None,
            reply_timeout: Duration::from_millis(100),
            error_threshold: ErrorThreshold::default(),
            max_retries: 50,
            interval: Duration::from_millis(500),
            payload_len: PAYLOAD_LEN,
        }
    }
}

/// Parse a non-negative, possibly fractional number of seconds.
pub fn parse_seconds(s: &str) -> Result<Duration, String> {
    let secs: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("expected seconds, got {s:?}"))?;
    Duration::try_from_secs_f64(secs).map_err(|e| format!("invalid duration {s:?}: {e}"))
}

/// Parse a whole number of microseconds.
pub fn parse_micros(s: &str) -> Result<Duration, String> {
    s.trim()
        .parse::<u64>()
        .map(Duration::from_micros)
        .map_err(|_| format!("expected microseconds, got {s:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_cli() {
        let cfg = SessionConfig::default();
        assert_eq!(cfg.reply_timeout, Duration::from_millis(100));
        assert_eq!(cfg.error_threshold, ErrorThreshold::at(1));
        assert_eq!(cfg.max_retries, 50);
        assert_eq!(cfg.interval, Duration::from_millis(500));
        assert_eq!(cfg.payload_len, 1500);
        assert!(cfg.runtime.is_none());
        assert!(cfg.delay.is_none());
    }

    #[test]
    fn error_threshold_parsing() {
        assert_eq!("-1".parse::<ErrorThreshold>().unwrap(), ErrorThreshold::NEVER);
        assert_eq!("0".parse::<ErrorThreshold>().unwrap(), ErrorThreshold::at(0));
        assert_eq!("25".parse::<ErrorThreshold>().unwrap(), ErrorThreshold::at(25));
        assert!("-2".parse::<ErrorThreshold>().is_err());
        assert!("many".parse::<ErrorThreshold>().is_err());
    }

    #[test]
    fn never_is_never_reached() {
        assert!(!ErrorThreshold::NEVER.is_reached(u64::MAX));
        assert!(ErrorThreshold::at(3).is_reached(3));
        assert!(!ErrorThreshold::at(3).is_reached(2));
    }

    #[test]
    fn seconds_parser() {
        assert_eq!(parse_seconds("0.1").unwrap(), Duration::from_millis(100));
        assert_eq!(parse_seconds("2").unwrap(), Duration::from_secs(2));
        assert!(parse_seconds("-1").is_err());
        assert!(parse_seconds("soon").is_err());
    }

    #[test]
    fn micros_parser() {
        assert_eq!(parse_micros("1500").unwrap(), Duration::from_micros(1500));
        assert!(parse_micros("-5").is_err());
    }
}
