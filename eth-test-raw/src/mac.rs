//! Link-layer (MAC) addresses.
//!
//! [`MacAddr`] is the 6-byte hardware address carried in the first twelve
//! bytes of every frame.  Equality is byte-exact; the textual form is
//! lowercase, colon-separated hex (`00:11:22:aa:bb:cc`), and parsing accepts
//! either case so a peer address typed in uppercase still compares equal.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::link::LinkError;

/// Length of a MAC address in bytes.
pub const MAC_LEN: usize = 6;

/// A 6-byte link-layer address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MacAddr(pub [u8; MAC_LEN]);

impl MacAddr {
    /// The all-ones broadcast address.
    pub const BROADCAST: MacAddr = MacAddr([0xff; MAC_LEN]);

    pub const fn new(octets: [u8; MAC_LEN]) -> Self {
        Self(octets)
    }

    pub fn octets(&self) -> [u8; MAC_LEN] {
        self.0
    }

    /// Look up the hardware address of a local interface.
    ///
    /// Reads `/sys/class/net/<ifname>/address`, which the kernel exposes for
    /// every interface regardless of whether `ioctl`-style tooling is present.
    pub fn of_interface(ifname: &str) -> Result<Self, LinkError> {
        let path = format!("/sys/class/net/{ifname}/address");
        let text = std::fs::read_to_string(&path).map_err(|source| LinkError::AddressDiscovery {
            ifname: ifname.to_string(),
            source,
        })?;
        text.trim().parse::<MacAddr>().map_err(|e| LinkError::AddressDiscovery {
            ifname: ifname.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })
    }
}

impl From<[u8; MAC_LEN]> for MacAddr {
    fn from(octets: [u8; MAC_LEN]) -> Self {
        Self(octets)
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

/// Errors produced when parsing a textual MAC address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MacParseError {
    #[error("malformed mac {0:?}: expected 6 colon-separated octets")]
    OctetCount(String),
    #[error("malformed mac {0:?}: bad octet {1:?}")]
    BadOctet(String, String),
}

impl FromStr for MacAddr {
    type Err = MacParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != MAC_LEN {
            return Err(MacParseError::OctetCount(s.to_string()));
        }

        let mut octets = [0u8; MAC_LEN];
        for (slot, part) in octets.iter_mut().zip(&parts) {
            if part.is_empty() || part.len() > 2 || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(MacParseError::BadOctet(s.to_string(), part.to_string()));
            }
            *slot = u8::from_str_radix(part, 16)
                .map_err(|_| MacParseError::BadOctet(s.to_string(), part.to_string()))?;
        }
        Ok(Self(octets))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_lowercase_colon_hex() {
        let mac = MacAddr::new([0x00, 0x1A, 0x2b, 0xC3, 0x04, 0xff]);
        assert_eq!(mac.to_string(), "00:1a:2b:c3:04:ff");
    }

    #[test]
    fn parse_accepts_uppercase() {
        let mac: MacAddr = "AA:BB:CC:00:11:22".parse().unwrap();
        assert_eq!(mac.octets(), [0xaa, 0xbb, 0xcc, 0x00, 0x11, 0x22]);
    }

    #[test]
    fn parse_format_roundtrip() {
        for octets in [[0u8; 6], [0xff; 6], [1, 2, 3, 4, 5, 6], [0x10, 0x0a, 0, 0xfe, 0x7f, 0x80]] {
            let mac = MacAddr::new(octets);
            assert_eq!(mac.to_string().parse::<MacAddr>().unwrap(), mac);
        }
    }

    #[test]
    fn parse_single_digit_octets() {
        let mac: MacAddr = "0:1:2:a:b:c".parse().unwrap();
        assert_eq!(mac.octets(), [0, 1, 2, 0xa, 0xb, 0xc]);
    }

    #[test]
    fn parse_rejects_wrong_octet_count() {
        assert!(matches!(
            "00:11:22:33:44".parse::<MacAddr>(),
            Err(MacParseError::OctetCount(_))
        ));
        assert!(matches!(
            "00:11:22:33:44:55:66".parse::<MacAddr>(),
            Err(MacParseError::OctetCount(_))
        ));
    }

    #[test]
    fn parse_rejects_bad_octets() {
        assert!(matches!("00:11:22:33:44:zz".parse::<MacAddr>(), Err(MacParseError::BadOctet(..))));
        assert!(matches!("00:11:22:33:44:".parse::<MacAddr>(), Err(MacParseError::BadOctet(..))));
        assert!(matches!("00:11:22:33:44:123".parse::<MacAddr>(), Err(MacParseError::BadOctet(..))));
    }

    #[test]
    fn missing_interface_is_discovery_error() {
        let err = MacAddr::of_interface("definitely-not-an-iface0").unwrap_err();
        assert!(matches!(err, LinkError::AddressDiscovery { .. }));
    }
}
