//! Error taxonomy for the steering core (see §7 of the design: never panic,
//! never block, prefer to drop and re-synchronise over local consistency).

use thiserror::Error;

/// Failures decoding an inbound frame. Every variant is handled the same
/// way by callers: log at `debug!` and drop the packet. The FSM never sees
/// these.
#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
pub enum WireError {
    #[error("bad magic byte")]
    BadMagic,
    #[error("unsupported version")]
    BadVersion,
    #[error("header truncated")]
    TruncatedHeader,
    #[error("declared packet_len exceeds buffer")]
    PacketLenOverrun,
    #[error("tlv header truncated")]
    TruncatedTlvHeader,
    #[error("tlv value truncated")]
    TruncatedTlvValue,
    #[error("tlv length runs past packet_len")]
    TlvOverrun,
}

/// Failures validating the host-supplied steering configuration.
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("bridge interface name is empty")]
    EmptyBridge,
    #[error("peer list is empty; steering requires at least one peer")]
    EmptyPeerList,
}

/// Top-level error returned from [`crate::bss::init`]. Everything else
/// the core encounters (resource allocation, external AP-stack calls) is
/// logged and absorbed rather than surfaced here — see §7 points 3 and 4.
#[derive(Error, Debug)]
pub enum SteeringError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to open layer-2 channel on bridge {bridge:?}")]
    L2Open { bridge: String },
}
