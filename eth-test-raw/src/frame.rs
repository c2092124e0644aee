//! Wire format of test frames.
//!
//! Every datagram exchanged with the echo peer is a raw Ethernet II frame.
//! This module is responsible for:
//! - Defining the on-wire binary layout (addresses, ether type, sequence).
//! - Encoding a sequence number into a fixed-length frame.
//! - Decoding a received buffer back into its header fields, rejecting
//!   buffers too short to carry a sequence number.
//!
//! No I/O happens here, and no semantic validation either: whether the
//! addresses or the ether type are the ones we expect is decided by
//! [`crate::exchange`].
//!
//! # Wire format
//!
//! All multi-byte integers are **big-endian**.
//!
//! ```text
//!  offset  0..6    destination address
//!  offset  6..12   source address
//!  offset 12..14   ether type (ETHER_TYPE = 0xccdd)
//!  offset 14..18   sequence number
//!  offset 18..     zero padding up to the payload length
//! ```
//!
//! With the default payload of [`PAYLOAD_LEN`] = 1500 bytes a frame is
//! [`FRAME_LEN`] = 1514 bytes on the wire.

use thiserror::Error;

use crate::mac::{MacAddr, MAC_LEN};

/// Ether type reserved for test frames.
pub const ETHER_TYPE: u16 = 0xccdd;

/// Destination + source + ether type.
pub const ETH_HEADER_LEN: usize = 14;

/// Size of the sequence number at the start of the payload.
pub const SEQ_LEN: usize = 4;

/// Shortest buffer [`FrameCodec::decode`] accepts.
pub const MIN_FRAME_LEN: usize = ETH_HEADER_LEN + SEQ_LEN;

/// Default payload length (a full standard Ethernet MTU).
pub const PAYLOAD_LEN: usize = 1500;

/// Total frame length with the default payload.
pub const FRAME_LEN: usize = ETH_HEADER_LEN + PAYLOAD_LEN;

/// Receive buffer size; larger than any frame we send.
pub const MAX_FRAME_LEN: usize = 2048;

// Byte offsets of each header field.
const OFF_DST: usize = 0;
const OFF_SRC: usize = 6;
const OFF_TYPE: usize = 12;
const OFF_SEQ: usize = 14;

/// Header fields of a received frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub destination: MacAddr,
    pub source: MacAddr,
    pub ether_type: u16,
    pub sequence: u32,
}

/// Errors that can arise when decoding a received buffer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Buffer shorter than header + sequence number.
    #[error("malformed frame: {len} bytes, need at least {}", MIN_FRAME_LEN)]
    TooShort { len: usize },
}

/// Encoder/decoder for frames of one fixed payload length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameCodec {
    payload_len: usize,
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(PAYLOAD_LEN)
    }
}

impl FrameCodec {
    /// Create a codec producing frames with `payload_len` payload bytes.
    ///
    /// The payload must at least hold the sequence number; shorter values
    /// are raised to [`SEQ_LEN`].
    pub fn new(payload_len: usize) -> Self {
        Self {
            payload_len: payload_len.max(SEQ_LEN),
        }
    }

    pub fn payload_len(&self) -> usize {
        self.payload_len
    }

    /// Total encoded frame length (header + payload).
    pub fn frame_len(&self) -> usize {
        ETH_HEADER_LEN + self.payload_len
    }

    /// Build a frame from `source` to `destination` carrying `sequence`.
    pub fn encode(&self, source: MacAddr, destination: MacAddr, sequence: u32) -> Vec<u8> {
        let mut buf = vec![0u8; self.frame_len()];

        buf[OFF_DST..OFF_DST + MAC_LEN].copy_from_slice(&destination.octets());
        buf[OFF_SRC..OFF_SRC + MAC_LEN].copy_from_slice(&source.octets());
        buf[OFF_TYPE..OFF_TYPE + 2].copy_from_slice(&ETHER_TYPE.to_be_bytes());
        buf[OFF_SEQ..OFF_SEQ + SEQ_LEN].copy_from_slice(&sequence.to_be_bytes());
        // Remainder stays zero.

        buf
    }

    /// Parse the header fields out of a received buffer.
    ///
    /// Only the length is checked.  Trailing bytes beyond the sequence
    /// number are ignored, so frames of any payload size decode.
    pub fn decode(&self, buf: &[u8]) -> Result<FrameHeader, FrameError> {
        if buf.len() < MIN_FRAME_LEN {
            return Err(FrameError::TooShort { len: buf.len() });
        }

        Ok(FrameHeader {
            destination: read_mac(&buf[OFF_DST..OFF_DST + MAC_LEN]),
            source: read_mac(&buf[OFF_SRC..OFF_SRC + MAC_LEN]),
            ether_type: u16::from_be_bytes([buf[OFF_TYPE], buf[OFF_TYPE + 1]]),
            sequence: u32::from_be_bytes([
                buf[OFF_SEQ],
                buf[OFF_SEQ + 1],
                buf[OFF_SEQ + 2],
                buf[OFF_SEQ + 3],
            ]),
        })
    }
}

/// Build the echo of `frame`: destination and source swapped, ether type and
/// payload untouched.
///
/// Returns `None` for buffers shorter than an Ethernet header or frames of a
/// foreign ether type.
pub fn echo_reply(frame: &[u8]) -> Option<Vec<u8>> {
    if frame.len() < ETH_HEADER_LEN {
        return None;
    }
    if u16::from_be_bytes([frame[OFF_TYPE], frame[OFF_TYPE + 1]]) != ETHER_TYPE {
        return None;
    }

    let mut reply = frame.to_vec();
    reply[OFF_DST..OFF_DST + MAC_LEN].copy_from_slice(&frame[OFF_SRC..OFF_SRC + MAC_LEN]);
    reply[OFF_SRC..OFF_SRC + MAC_LEN].copy_from_slice(&frame[OFF_DST..OFF_DST + MAC_LEN]);
    Some(reply)
}

fn read_mac(bytes: &[u8]) -> MacAddr {
    let mut octets = [0u8; MAC_LEN];
    octets.copy_from_slice(bytes);
    MacAddr::new(octets)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOCAL: MacAddr = MacAddr::new([0x02, 0, 0, 0, 0, 0x01]);
    const PEER: MacAddr = MacAddr::new([0x02, 0, 0, 0, 0, 0x02]);

    #[test]
    fn encode_decode_roundtrip() {
        let codec = FrameCodec::default();
        let hdr = codec.decode(&codec.encode(LOCAL, PEER, 42)).unwrap();
        assert_eq!(
            hdr,
            FrameHeader {
                destination: PEER,
                source: LOCAL,
                ether_type: ETHER_TYPE,
                sequence: 42,
            }
        );
    }

    #[test]
    fn default_frame_is_1514_bytes() {
        let bytes = FrameCodec::default().encode(LOCAL, PEER, 0);
        assert_eq!(bytes.len(), FRAME_LEN);
        assert_eq!(FRAME_LEN, 1514);
    }

    #[test]
    fn header_layout_on_wire() {
        let bytes = FrameCodec::new(64).encode(LOCAL, PEER, 0x0102_0304);
        assert_eq!(&bytes[0..6], &PEER.octets());
        assert_eq!(&bytes[6..12], &LOCAL.octets());
        assert_eq!(&bytes[12..14], &[0xcc, 0xdd]);
        assert_eq!(&bytes[14..18], &[0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn padding_is_zero() {
        let bytes = FrameCodec::default().encode(LOCAL, PEER, u32::MAX);
        assert!(bytes[MIN_FRAME_LEN..].iter().all(|&b| b == 0));
    }

    #[test]
    fn tiny_payload_still_holds_sequence() {
        let codec = FrameCodec::new(0);
        assert_eq!(codec.payload_len(), SEQ_LEN);
        assert_eq!(codec.decode(&codec.encode(LOCAL, PEER, 7)).unwrap().sequence, 7);
    }

    #[test]
    fn decode_empty_buffer_returns_error() {
        assert_eq!(
            FrameCodec::default().decode(&[]),
            Err(FrameError::TooShort { len: 0 })
        );
    }

    #[test]
    fn decode_one_byte_short_returns_error() {
        assert_eq!(
            FrameCodec::default().decode(&[0u8; MIN_FRAME_LEN - 1]),
            Err(FrameError::TooShort { len: MIN_FRAME_LEN - 1 })
        );
    }

    #[test]
    fn decode_minimum_length_succeeds() {
        let mut bytes = FrameCodec::default().encode(LOCAL, PEER, 9);
        bytes.truncate(MIN_FRAME_LEN);
        assert_eq!(FrameCodec::default().decode(&bytes).unwrap().sequence, 9);
    }

    #[test]
    fn decode_does_not_validate_type() {
        let mut bytes = FrameCodec::default().encode(LOCAL, PEER, 1);
        bytes[12] = 0x08;
        bytes[13] = 0x00;
        assert_eq!(FrameCodec::default().decode(&bytes).unwrap().ether_type, 0x0800);
    }

    #[test]
    fn echo_swaps_addresses_only() {
        let frame = FrameCodec::default().encode(LOCAL, PEER, 77);
        let reply = echo_reply(&frame).unwrap();
        assert_eq!(reply.len(), frame.len());
        assert_eq!(&reply[0..6], &LOCAL.octets());
        assert_eq!(&reply[6..12], &PEER.octets());
        assert_eq!(&reply[12..], &frame[12..]);
    }

    #[test]
    fn echo_ignores_foreign_type_and_runts() {
        let mut frame = FrameCodec::default().encode(LOCAL, PEER, 1);
        assert!(echo_reply(&frame[..ETH_HEADER_LEN - 1]).is_none());
        frame[13] = 0x00;
        assert!(echo_reply(&frame).is_none());
    }
}
