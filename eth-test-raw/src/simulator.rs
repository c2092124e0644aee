//! In-memory link with a scripted echo peer.
//!
//! Real links drop frames, pick up stray traffic, and talk to peers that
//! restart.  To exercise the exchange and session logic deterministically,
//! [`SimLink`] stands in for [`crate::socket::RawLink`]: every frame sent
//! through it is answered according to the next [`PeerAction`] in a script,
//! falling back to a default action once the script runs out.
//!
//! | Action            | Reply the client sees                          |
//! |-------------------|------------------------------------------------|
//! | `Echo`            | faithful echo                                  |
//! | `Drop`            | nothing (the client times out)                 |
//! | `FromAddress(m)`  | echo with source forged to `m`                 |
//! | `ToAddress(m)`    | echo addressed to `m` (foreign frame)          |
//! | `WithSequence(s)` | echo reporting sequence `s`                    |
//! | `WithEtherType(t)`| echo with ether type `t`                       |
//! | `Truncate(n)`     | first `n` bytes of the echo                    |
//! | `Fail`            | the send itself fails with [`LinkError::Closed`] |
//!
//! `recv` never completes while nothing is queued, so the caller's timeout
//! decides; under tokio's paused clock that costs no wall time.
//!
//! The simulator is only used by tests; production builds talk to the raw
//! socket.

use std::collections::VecDeque;

use crate::frame::{echo_reply, MIN_FRAME_LEN};
use crate::link::{Link, LinkError};
use crate::mac::MacAddr;

/// How the simulated peer answers one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerAction {
    Echo,
    Drop,
    FromAddress(MacAddr),
    ToAddress(MacAddr),
    WithSequence(u32),
    WithEtherType(u16),
    Truncate(usize),
    Fail,
}

/// A [`Link`] backed by a scripted peer.
#[derive(Debug)]
pub struct SimLink {
    script: VecDeque<PeerAction>,
    default_action: PeerAction,
    /// Frames waiting to be received.
    inbound: VecDeque<Vec<u8>>,
    /// Every frame handed to `send`, in order.
    sent: Vec<Vec<u8>>,
    /// Report [`LinkError::Closed`] instead of waiting once `inbound` is empty.
    close_when_drained: bool,
}

impl SimLink {
    /// A peer that echoes everything.
    pub fn echoing() -> Self {
        Self::with_script(Vec::<PeerAction>::new())
    }

    /// A peer that never answers.
    pub fn silent() -> Self {
        Self::echoing().then(PeerAction::Drop)
    }

    /// A peer that follows `script`, then echoes.
    pub fn with_script(script: impl IntoIterator<Item = PeerAction>) -> Self {
        Self {
            script: script.into_iter().collect(),
            default_action: PeerAction::Echo,
            inbound: VecDeque::new(),
            sent: Vec::new(),
            close_when_drained: false,
        }
    }

    /// A link that delivers `frames`, swallows whatever is sent, and then
    /// reports itself closed.  Used to drive the echo responder.
    pub fn inbound(frames: impl IntoIterator<Item = Vec<u8>>) -> Self {
        let mut link = Self::silent();
        link.inbound = frames.into_iter().collect();
        link.close_when_drained = true;
        link
    }

    /// Action used once the script is exhausted.
    pub fn then(mut self, action: PeerAction) -> Self {
        self.default_action = action;
        self
    }

    pub fn sent(&self) -> &[Vec<u8>] {
        &self.sent
    }

    /// Sequence numbers of every sent frame long enough to carry one.
    pub fn sent_sequences(&self) -> Vec<u32> {
        self.sent
            .iter()
            .filter(|f| f.len() >= MIN_FRAME_LEN)
            .map(|f| u32::from_be_bytes([f[14], f[15], f[16], f[17]]))
            .collect()
    }

    fn respond(action: PeerAction, frame: &[u8]) -> Result<Option<Vec<u8>>, LinkError> {
        if action == PeerAction::Fail {
            return Err(LinkError::Closed);
        }
        let Some(mut reply) = echo_reply(frame) else {
            return Ok(None);
        };

        match action {
            PeerAction::Echo => {}
            PeerAction::Drop => return Ok(None),
            PeerAction::FromAddress(mac) => reply[6..12].copy_from_slice(&mac.octets()),
            PeerAction::ToAddress(mac) => reply[0..6].copy_from_slice(&mac.octets()),
            PeerAction::WithSequence(seq) if reply.len() >= MIN_FRAME_LEN => {
                reply[14..18].copy_from_slice(&seq.to_be_bytes())
            }
            PeerAction::WithSequence(_) => {}
            PeerAction::WithEtherType(ty) => reply[12..14].copy_from_slice(&ty.to_be_bytes()),
            PeerAction::Truncate(n) => reply.truncate(n),
            PeerAction::Fail => unreachable!("handled above"),
        }
        Ok(Some(reply))
    }
}

impl Link for SimLink {
    async fn send(&mut self, frame: &[u8]) -> Result<(), LinkError> {
        let action = self.script.pop_front().unwrap_or(self.default_action);
        let reply = Self::respond(action, frame)?;
        self.sent.push(frame.to_vec());
        self.inbound.extend(reply);
        Ok(())
    }

    async fn recv(&mut self) -> Result<Vec<u8>, LinkError> {
        match self.inbound.pop_front() {
            Some(frame) => Ok(frame),
            None if self.close_when_drained => Err(LinkError::Closed),
            None => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameCodec;

    const LOCAL: MacAddr = MacAddr::new([0x02, 0, 0, 0, 0, 0x01]);
    const PEER: MacAddr = MacAddr::new([0x02, 0, 0, 0, 0, 0x02]);

    #[tokio::test]
    async fn echo_then_script_exhausted() {
        let codec = FrameCodec::new(32);
        let mut link = SimLink::with_script([PeerAction::WithSequence(9)]);

        link.send(&codec.encode(LOCAL, PEER, 1)).await.unwrap();
        let first = codec.decode(&link.recv().await.unwrap()).unwrap();
        assert_eq!(first.sequence, 9);
        assert_eq!(first.destination, LOCAL);

        link.send(&codec.encode(LOCAL, PEER, 2)).await.unwrap();
        let second = codec.decode(&link.recv().await.unwrap()).unwrap();
        assert_eq!(second.sequence, 2);
        assert_eq!(second.source, PEER);

        assert_eq!(link.sent_sequences(), vec![1, 2]);
    }

    #[tokio::test]
    async fn fail_action_errors_without_recording() {
        let mut link = SimLink::with_script([PeerAction::Fail]);
        let err = link.send(&FrameCodec::new(32).encode(LOCAL, PEER, 0)).await;
        assert!(matches!(err, Err(LinkError::Closed)));
        assert!(link.sent().is_empty());
    }

    #[tokio::test]
    async fn inbound_link_closes_when_drained() {
        let mut link = SimLink::inbound([vec![1, 2, 3]]);
        assert_eq!(link.recv().await.unwrap(), vec![1, 2, 3]);
        assert!(matches!(link.recv().await, Err(LinkError::Closed)));
    }
}
