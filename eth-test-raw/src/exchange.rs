//! One send/echo/validate exchange.
//!
//! [`ExchangeEngine`] sends a single sequence-numbered frame, waits a bounded
//! time for the echo, and classifies what came back.  It owns the only piece
//! of protocol state on the client side: the sequence number it expects the
//! peer to report next.
//!
//! # Validation order
//!
//! 1. No reply within the timeout        → `Failed(Timeout)`
//! 2. Buffer too short to decode         → `Failed(Malformed)`
//! 3. Destination is not us              → `Retry` (foreign frame, no resync)
//! 4. Source is not the peer             → `Failed(UnexpectedPeer)`
//! 5. Ether type is not ours             → `Failed(WrongType)`
//! 6. Resync: expected := received + 1   (always, once 3–5 pass)
//! 7. Received != expected *before* 6    → `Failed(SequenceMismatch)`
//! 8. Otherwise                          → `Accepted`
//!
//! A foreign destination says nothing about our exchange, so the same frame
//! is simply sent again.  Everything past step 3 is about *our* exchange and
//! is reported as a failure.  Step 6 re-anchors on whatever a correctly
//! addressed peer reports, so one lost or restarted peer costs one error
//! rather than an endless run of mismatches.

use std::time::Duration;

use thiserror::Error;
use tokio::time::timeout;

use crate::frame::{FrameCodec, FrameError, ETHER_TYPE};
use crate::link::{Link, LinkError};
use crate::mac::MacAddr;

/// Result of one [`ExchangeEngine::attempt`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The echo matched in every respect.
    Accepted,
    /// The reply was not addressed to us; send the same sequence again.
    Retry,
    /// The exchange failed for the given reason.
    Failed(Failure),
}

/// Why an exchange failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Failure {
    #[error("no reply within timeout")]
    Timeout,
    #[error("{0}")]
    Malformed(FrameError),
    #[error("bad src mac {received} received, expected {expected}")]
    UnexpectedPeer { expected: MacAddr, received: MacAddr },
    #[error("bad eth type {received:#06x} received, expected {:#06x}", ETHER_TYPE)]
    WrongType { received: u16 },
    #[error("bad seq number {received} received, expected {expected}")]
    SequenceMismatch { expected: u32, received: u32 },
}

/// Client-side exchange state for one peer.
#[derive(Debug)]
pub struct ExchangeEngine {
    local: MacAddr,
    peer: MacAddr,
    codec: FrameCodec,
    reply_timeout: Duration,
    /// Sequence number the next validly addressed reply should carry.
    expected_sequence: u32,
}

impl ExchangeEngine {
    pub fn new(local: MacAddr, peer: MacAddr, codec: FrameCodec, reply_timeout: Duration) -> Self {
        Self {
            local,
            peer,
            codec,
            reply_timeout,
            expected_sequence: 0,
        }
    }

    pub fn local(&self) -> MacAddr {
        self.local
    }

    pub fn peer(&self) -> MacAddr {
        self.peer
    }

    pub fn codec(&self) -> &FrameCodec {
        &self.codec
    }

    pub fn expected_sequence(&self) -> u32 {
        self.expected_sequence
    }

    /// Send `seq` to the peer, wait for the echo, and classify it.
    ///
    /// Only link I/O errors are returned as `Err`; every protocol-level
    /// problem is an [`Outcome`].
    pub async fn attempt<L: Link>(&mut self, link: &mut L, seq: u32) -> Result<Outcome, LinkError> {
        let frame = self.codec.encode(self.local, self.peer, seq);
        link.send(&frame).await?;
        log::trace!("→ seq={seq} len={}", frame.len());

        let reply = match timeout(self.reply_timeout, link.recv()).await {
            Ok(result) => result?,
            Err(_elapsed) => return Ok(Outcome::Failed(Failure::Timeout)),
        };

        Ok(self.validate(&reply))
    }

    /// Classify a received buffer, updating the expected sequence number.
    pub fn validate(&mut self, reply: &[u8]) -> Outcome {
        let hdr = match self.codec.decode(reply) {
            Ok(hdr) => hdr,
            Err(e) => return Outcome::Failed(Failure::Malformed(e)),
        };

        if hdr.destination != self.local {
            log::warn!(
                "bad dst mac {} received, expected {}; ignoring",
                hdr.destination,
                self.local
            );
            return Outcome::Retry;
        }

        if hdr.source != self.peer {
            return Outcome::Failed(Failure::UnexpectedPeer {
                expected: self.peer,
                received: hdr.source,
            });
        }

        if hdr.ether_type != ETHER_TYPE {
            return Outcome::Failed(Failure::WrongType {
                received: hdr.ether_type,
            });
        }

        let expected = self.expected_sequence;
        self.expected_sequence = hdr.sequence.wrapping_add(1);

        if hdr.sequence != expected {
            return Outcome::Failed(Failure::SequenceMismatch {
                expected,
                received: hdr.sequence,
            });
        }

        log::trace!("← seq={} ok", hdr.sequence);
        Outcome::Accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOCAL: MacAddr = MacAddr::new([0x02, 0, 0, 0, 0, 0x01]);
    const PEER: MacAddr = MacAddr::new([0x02, 0, 0, 0, 0, 0x02]);
    const STRANGER: MacAddr = MacAddr::new([0x02, 0, 0, 0, 0, 0x99]);

    fn engine() -> ExchangeEngine {
        ExchangeEngine::new(LOCAL, PEER, FrameCodec::new(64), Duration::from_millis(100))
    }

    /// A reply as the peer would send it: from PEER to LOCAL.
    fn reply(seq: u32) -> Vec<u8> {
        FrameCodec::new(64).encode(PEER, LOCAL, seq)
    }

    #[test]
    fn matching_reply_is_accepted() {
        let mut e = engine();
        assert_eq!(e.validate(&reply(0)), Outcome::Accepted);
        assert_eq!(e.expected_sequence(), 1);
        assert_eq!(e.validate(&reply(1)), Outcome::Accepted);
        assert_eq!(e.expected_sequence(), 2);
    }

    #[test]
    fn runt_is_malformed() {
        let mut e = engine();
        assert!(matches!(
            e.validate(&reply(0)[..10]),
            Outcome::Failed(Failure::Malformed(FrameError::TooShort { len: 10 }))
        ));
        assert_eq!(e.expected_sequence(), 0);
    }

    #[test]
    fn foreign_destination_is_retry_without_resync() {
        let mut e = engine();
        let foreign = FrameCodec::new(64).encode(PEER, STRANGER, 17);
        assert_eq!(e.validate(&foreign), Outcome::Retry);
        assert_eq!(e.expected_sequence(), 0);
    }

    #[test]
    fn wrong_source_is_unexpected_peer_without_resync() {
        let mut e = engine();
        let bad = FrameCodec::new(64).encode(STRANGER, LOCAL, 0);
        assert_eq!(
            e.validate(&bad),
            Outcome::Failed(Failure::UnexpectedPeer {
                expected: PEER,
                received: STRANGER,
            })
        );
        assert_eq!(e.expected_sequence(), 0);
    }

    #[test]
    fn wrong_type_is_reported() {
        let mut e = engine();
        let mut bad = reply(0);
        bad[12..14].copy_from_slice(&0x0800u16.to_be_bytes());
        assert_eq!(
            e.validate(&bad),
            Outcome::Failed(Failure::WrongType { received: 0x0800 })
        );
        assert_eq!(e.expected_sequence(), 0);
    }

    #[test]
    fn sequence_mismatch_still_resyncs() {
        let mut e = engine();
        assert_eq!(
            e.validate(&reply(5)),
            Outcome::Failed(Failure::SequenceMismatch {
                expected: 0,
                received: 5,
            })
        );
        assert_eq!(e.expected_sequence(), 6);
        assert_eq!(e.validate(&reply(6)), Outcome::Accepted);
    }

    #[test]
    fn sequence_wraps() {
        let mut e = engine();
        e.validate(&reply(u32::MAX));
        assert_eq!(e.expected_sequence(), 0);
        assert_eq!(e.validate(&reply(0)), Outcome::Accepted);
    }

    #[test]
    fn failure_messages_carry_values() {
        let f = Failure::SequenceMismatch {
            expected: 3,
            received: 9,
        };
        assert_eq!(f.to_string(), "bad seq number 9 received, expected 3");
        assert_eq!(
            Failure::WrongType { received: 0x0800 }.to_string(),
            "bad eth type 0x0800 received, expected 0xccdd"
        );
    }
}
