//! A cooperative client-steering coordinator for multi-AP wireless
//! networks.
//!
//! Runs inside each access point (AP) and decides, for every wireless
//! station (STA) in range of several APs, which AP should serve it —
//! steering STAs there with blacklisting, disassociation, and 802.11v BSS
//! Transition Management (BTM) hints. APs exchange link-quality scores over
//! a private layer-2 control channel (see [`flood::ETHERTYPE`]) and reach a
//! distributed, eventually-consistent agreement about STA ownership.
//!
//! The core is the per-STA steering state machine ([`fsm`]) together with
//! its two drivers: the inter-AP flood protocol ([`wire`], [`flood`]) and
//! the probe/association observer that converts radio events into FSM
//! events ([`ingress`]). It tolerates lost and reordered control packets,
//! concurrent decisions from multiple APs, STA mobility, and timer races,
//! while never leaving a STA black-holed (blacklisted on every AP at once)
//! or stuck associated to the wrong AP with no demotion path.
//!
//! Everything outside that core — association/probe/disassociation events,
//! blacklist and BTM calls, the layer-2 transport, configuration ingestion
//! — is an external collaborator behind [`apstack`]'s traits, never
//! implemented here.

pub mod apstack;
pub mod bss;
pub mod client;
pub mod config;
pub mod error;
pub mod flood;
pub mod fsm;
pub mod ingress;
pub mod mac;
pub mod timer;
pub mod wire;

pub use apstack::{ApStackOps, InMemoryL2Channel, L2Channel, NullApStack, RecordingApStack};
pub use bss::{init, BssContext, BssHandle, BssRegistry};
pub use client::{ClientInfo, ClientRecord, ClientRegistry};
pub use config::{SteeringConfig, SteeringMode};
pub use error::{ConfigError, SteeringError, WireError};
pub use fsm::{Action, Event, State};
pub use mac::MacAddr;
pub use timer::{TimerFired, TimerKey, TimerKind, TimerService};
pub use wire::{decode, Packet, PacketBuilder, Tlv, SCORE_UNKNOWN};
