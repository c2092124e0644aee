//! Frame transport abstraction.
//!
//! The exchange engine and the echo responder never touch a socket directly;
//! they talk to a [`Link`], which offers exactly two primitives: send one
//! frame, and wait for the next one.  Bounding the wait is the caller's job
//! (`tokio::time::timeout`), so implementations stay trivial.
//!
//! Implementations:
//! - [`crate::socket::RawLink`] — an `AF_PACKET` raw socket on a real NIC.
//! - [`crate::simulator::SimLink`] — an in-memory peer used by tests.

use thiserror::Error;

/// Errors raised by a [`Link`] or while setting one up.
#[derive(Debug, Error)]
pub enum LinkError {
    /// Creating or binding the raw socket failed (usually missing privileges).
    #[error("cannot open raw socket on {ifname}: {source}")]
    Open {
        ifname: String,
        #[source]
        source: std::io::Error,
    },
    #[error("no such interface: {0}")]
    UnknownInterface(String),
    #[error("cannot determine MAC address of {ifname}: {source}")]
    AddressDiscovery {
        ifname: String,
        #[source]
        source: std::io::Error,
    },
    #[error("link I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("short write: {written} of {expected} bytes")]
    ShortWrite { written: usize, expected: usize },
    /// The other end of the link is gone.
    #[error("link closed")]
    Closed,
}

/// A bidirectional link-layer frame transport.
///
/// `recv` may wait forever; callers wrap it in a timeout.  Both methods take
/// `&mut self`: a link is owned by exactly one loop.
#[allow(async_fn_in_trait)]
pub trait Link {
    /// Transmit one complete frame.
    async fn send(&mut self, frame: &[u8]) -> Result<(), LinkError>;

    /// Wait for the next frame and return its bytes.
    async fn recv(&mut self) -> Result<Vec<u8>, LinkError>;
}
