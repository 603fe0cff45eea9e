//! STA/BSSID address type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A 6-byte IEEE 802 MAC address, used both as the STA primary key and as a
/// BSSID.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    pub const ZERO: MacAddr = MacAddr([0; 6]);
    pub const BROADCAST: MacAddr = MacAddr([0xff; 6]);

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    pub fn from_bytes(bytes: &[u8; 6]) -> Self {
        MacAddr(*bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl fmt::Debug for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MacAddr({self})")
    }
}

/// Error parsing a colon-hex MAC string, e.g. via configuration ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid MAC address string")]
pub struct ParseMacError;

impl FromStr for MacAddr {
    type Err = ParseMacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut out = [0u8; 6];
        let mut parts = s.split(':');
        for slot in out.iter_mut() {
            let part = parts.next().ok_or(ParseMacError)?;
            *slot = u8::from_str_radix(part, 16).map_err(|_| ParseMacError)?;
        }
        if parts.next().is_some() {
            return Err(ParseMacError);
        }
        Ok(MacAddr(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_round_trips_through_from_str() {
        let mac = MacAddr([0x02, 0x11, 0xaa, 0xbb, 0x00, 0xff]);
        let s = mac.to_string();
        assert_eq!(s, "02:11:aa:bb:00:ff");
        assert_eq!(s.parse::<MacAddr>().unwrap(), mac);
    }

    #[test]
    fn rejects_malformed_strings() {
        assert!("not-a-mac".parse::<MacAddr>().is_err());
        assert!("02:11:aa:bb:00".parse::<MacAddr>().is_err());
        assert!("02:11:aa:bb:00:ff:ff".parse::<MacAddr>().is_err());
    }

    #[test]
    fn zero_and_broadcast_are_distinct() {
        assert!(MacAddr::ZERO.is_zero());
        assert!(!MacAddr::BROADCAST.is_zero());
    }
}
