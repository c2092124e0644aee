//! Echo responder (the `server` side).
//!
//! Receives test frames on the bound interface and sends each one straight
//! back with destination and source swapped.  It keeps no protocol state and
//! validates nothing beyond the ether type; all checking happens on the
//! client.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use crate::frame::echo_reply;
use crate::link::{Link, LinkError};

/// How often the receive wait is interrupted to look at the stop flag.
pub const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Counters kept by a [`Responder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EchoStats {
    pub received: u64,
    pub echoed: u64,
    /// Runts and frames of a foreign ether type.
    pub ignored: u64,
}

/// The echo loop.
#[derive(Debug)]
pub struct Responder {
    stop: Arc<AtomicBool>,
    poll: Duration,
}

impl Default for Responder {
    fn default() -> Self {
        Self::new()
    }
}

impl Responder {
    pub fn new() -> Self {
        Self {
            stop: Arc::new(AtomicBool::new(false)),
            poll: POLL_INTERVAL,
        }
    }

    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Echo frames until the stop flag is raised or the link closes.
    pub async fn serve<L: Link>(&self, link: &mut L) -> Result<EchoStats, LinkError> {
        let mut stats = EchoStats::default();

        while !self.stop.load(Ordering::Relaxed) {
            let frame = match timeout(self.poll, link.recv()).await {
                Err(_elapsed) => continue,
                Ok(Err(LinkError::Closed)) => break,
                Ok(result) => result?,
            };
            stats.received += 1;

            match echo_reply(&frame) {
                Some(reply) => {
                    link.send(&reply).await?;
                    stats.echoed += 1;
                    log::debug!("echoed {} byte frame", reply.len());
                }
                None => {
                    stats.ignored += 1;
                    log::debug!("ignoring {} byte frame", frame.len());
                }
            }
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameCodec;
    use crate::mac::MacAddr;
    use crate::simulator::SimLink;

    const CLIENT: MacAddr = MacAddr::new([0x02, 0, 0, 0, 0, 0x01]);
    const SERVER: MacAddr = MacAddr::new([0x02, 0, 0, 0, 0, 0x02]);

    #[tokio::test]
    async fn echoes_each_frame_with_swapped_addresses() {
        let codec = FrameCodec::default();
        let frames: Vec<Vec<u8>> = (0..3).map(|s| codec.encode(CLIENT, SERVER, s)).collect();
        let mut link = SimLink::inbound(frames.clone());

        let stats = Responder::new().serve(&mut link).await.unwrap();
        assert_eq!(
            stats,
            EchoStats {
                received: 3,
                echoed: 3,
                ignored: 0
            }
        );

        for (sent, original) in link.sent().iter().zip(&frames) {
            let hdr = codec.decode(sent).unwrap();
            assert_eq!(hdr.destination, CLIENT);
            assert_eq!(hdr.source, SERVER);
            assert_eq!(&sent[12..], &original[12..]);
        }
        assert_eq!(link.sent_sequences(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn skips_runts_and_foreign_types() {
        let mut foreign = FrameCodec::default().encode(CLIENT, SERVER, 0);
        foreign[12..14].copy_from_slice(&0x86ddu16.to_be_bytes());
        let mut link = SimLink::inbound([vec![0u8; 5], foreign]);

        let stats = Responder::new().serve(&mut link).await.unwrap();
        assert_eq!(stats.received, 2);
        assert_eq!(stats.ignored, 2);
        assert!(link.sent().is_empty());
    }

    #[tokio::test]
    async fn raised_stop_flag_returns_immediately() {
        let responder = Responder::new();
        responder.stop_handle().store(true, Ordering::Relaxed);
        let mut link = SimLink::inbound([FrameCodec::default().encode(CLIENT, SERVER, 0)]);

        let stats = responder.serve(&mut link).await.unwrap();
        assert_eq!(stats, EchoStats::default());
    }
}
