//! Configuration ingestion (§6): the three keys consumed from the host AP
//! configuration, plus validation matching §4.7's init rules.

use crate::error::ConfigError;
use crate::mac::MacAddr;
use std::str::FromStr;

/// `net_steering_mode`. Unknown strings default to `Force` per §6 — this
/// is deliberate, not an oversight: a typo in the config should steer
/// harder, not silently disable steering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SteeringMode {
    Off,
    Suggest,
    #[default]
    Force,
}

impl FromStr for SteeringMode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "off" => SteeringMode::Off,
            "suggest" => SteeringMode::Suggest,
            "force" => SteeringMode::Force,
            _ => SteeringMode::Force,
        })
    }
}

/// `net_steering_mode` + `bridge` + `r0kh_list`, reproduced here as the
/// embedder-supplied config this crate consumes. `r0kh_list` on the real
/// AP stack also carries FT key material; only the MAC list matters here.
/// `local_bssid` and `channel` are not among §6's three named config keys —
/// they are the AP's own hardware state (own MAC, operating channel), read
/// from the same place `local_bssid` already is, needed so outgoing
/// CLOSE_CLIENT TLVs can advertise a real channel for the BTM target
/// instead of a placeholder.
#[derive(Debug, Clone)]
pub struct SteeringConfig {
    pub mode: SteeringMode,
    pub bridge: String,
    pub peers: Vec<MacAddr>,
    pub local_bssid: MacAddr,
    pub channel: u8,
}

impl SteeringConfig {
    /// Mirrors §4.7's init validation: an empty bridge name or empty peer
    /// list is a config error. Callers treat `mode == Off` as "don't even
    /// call validate" — §4.7 says `off` disables initialisation outright,
    /// before any of these checks matter.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bridge.is_empty() {
            return Err(ConfigError::EmptyBridge);
        }
        if self.peers.is_empty() {
            return Err(ConfigError::EmptyPeerList);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_mode_string_defaults_to_force() {
        assert_eq!("off".parse::<SteeringMode>().unwrap(), SteeringMode::Off);
        assert_eq!("suggest".parse::<SteeringMode>().unwrap(), SteeringMode::Suggest);
        assert_eq!("force".parse::<SteeringMode>().unwrap(), SteeringMode::Force);
        assert_eq!("bogus".parse::<SteeringMode>().unwrap(), SteeringMode::Force);
    }

    #[test]
    fn validate_rejects_empty_bridge_or_peers() {
        let base = SteeringConfig {
            mode: SteeringMode::Force,
            bridge: "br-steer".into(),
            peers: vec![MacAddr([1; 6])],
            local_bssid: MacAddr([0; 6]),
            channel: 36,
        };
        assert!(base.validate().is_ok());

        let mut no_bridge = base.clone();
        no_bridge.bridge = String::new();
        assert_eq!(no_bridge.validate().unwrap_err(), ConfigError::EmptyBridge);

        let mut no_peers = base;
        no_peers.peers.clear();
        assert_eq!(no_peers.validate().unwrap_err(), ConfigError::EmptyPeerList);
    }
}
