//! `eth-test-raw` — a raw Ethernet link exerciser.
//!
//! The client sends sequence-numbered frames of fixed size straight onto a
//! NIC (no IP), an echo peer bounces each one back with the addresses
//! swapped, and the client validates the echo, counts losses, errors and
//! retries, and reports throughput.  It is meant for shaking out cabling,
//! NICs and drivers under controlled load.
//!
//! # Architecture
//!
//! ```text
//!  ┌───────────────────────────────────────┐
//!  │               Session                 │  policy: thresholds, runtime,
//!  │  ┌────────────────┐ ┌───────────────┐ │  interval reports, stop flag
//!  │  │ ExchangeEngine │ │StatsAggregator│ │
//!  │  └───────┬────────┘ └───────────────┘ │
//!  └──────────┼────────────────────────────┘
//!             │ encode / decode (FrameCodec)
//!  ┌──────────▼──────────┐
//!  │     impl Link       │  RawLink (AF_PACKET) or SimLink (tests)
//!  └─────────────────────┘
//! ```
//!
//! Each module has a single responsibility:
//! - [`mac`]        — link-layer addresses and local address lookup
//! - [`frame`]      — wire format (encode / decode, echo swap)
//! - [`link`]       — the send/receive abstraction and its errors
//! - [`socket`]     — raw `AF_PACKET` socket (Linux)
//! - [`exchange`]   — one send/echo/validate exchange, sequence resync
//! - [`stats`]      — cumulative and interval counters, throughput
//! - [`state`]      — session finite-state-machine types
//! - [`config`]     — session parameters and CLI value parsers
//! - [`session`]    — the client loop and its stop conditions
//! - [`echo`]       — the echo responder run on the peer
//! - [`simulator`]  — scripted in-memory peer for testing

pub mod config;
pub mod echo;
pub mod exchange;
pub mod frame;
pub mod link;
pub mod mac;
pub mod session;
pub mod simulator;
#[cfg(target_os = "linux")]
pub mod socket;
pub mod state;
pub mod stats;

pub use config::{ErrorThreshold, SessionConfig};
pub use exchange::{ExchangeEngine, Failure, Outcome};
pub use frame::{FrameCodec, ETHER_TYPE};
pub use link::{Link, LinkError};
pub use mac::MacAddr;
pub use session::{Session, SessionReport, Termination};
