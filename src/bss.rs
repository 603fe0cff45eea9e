//! BSS coordinator (C7, §4.7): per-radio context, mode selection, peer
//! list, lifecycle, and the process-wide registry of contexts.

use crate::apstack::{ApStackOps, L2Channel};
use crate::client::ClientRegistry;
use crate::config::{SteeringConfig, SteeringMode};
use crate::error::SteeringError;
use crate::flood::ETHERTYPE;
use crate::ingress::EventCtx;
use crate::mac::MacAddr;
use crate::timer::TimerService;
use crate::wire::{self, Tlv};
use std::time::Instant;
use tracing::{info, warn};

/// Opaque handle standing in for the original's `hapd` pointer — the
/// process-wide context set is looked up by this, never by dereferencing
/// anything AP-stack specific.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BssHandle(pub u64);

/// Per-radio context. Owns the client registry, the peer list, the
/// outgoing frame sequence counter, the configured mode, and the layer-2
/// channel. `frame_sn` is threaded into every outgoing header but never
/// consulted on receive (§9 Q4) — see `Packet::seq`/`DESIGN.md`.
pub struct BssContext<A: ApStackOps, C: L2Channel> {
    pub handle: BssHandle,
    pub local_bssid: MacAddr,
    pub local_channel: u8,
    pub mode: SteeringMode,
    pub peers: Vec<MacAddr>,
    pub registry: ClientRegistry,
    pub timers: TimerService,
    pub apstack: A,
    pub channel: C,
    frame_sn: u16,
}

impl<A: ApStackOps, C: L2Channel> BssContext<A, C> {
    fn event_ctx(&mut self, now: Instant) -> EventCtx<'_> {
        EventCtx {
            registry: &mut self.registry,
            timers: &mut self.timers,
            apstack: &mut self.apstack,
            channel: &mut self.channel,
            local_bssid: self.local_bssid,
            local_channel: self.local_channel,
            peers: &self.peers,
            seq: &mut self.frame_sn,
            mode: self.mode,
            now,
        }
    }

    pub fn on_association(&mut self, mac: MacAddr, rssi: i32, now: Instant) {
        self.event_ctx(now).on_association(mac, rssi);
    }

    pub fn on_disassociation(&mut self, mac: MacAddr, now: Instant) {
        self.event_ctx(now).on_disassociation(mac);
    }

    pub fn on_probe_request(&mut self, directed_at_us: bool, mac: MacAddr, rssi: i32, now: Instant) {
        self.event_ctx(now).on_probe_request(directed_at_us, mac, rssi);
    }

    /// Receives a raw layer-2 frame and dispatches every TLV it decodes to
    /// to the matching ingress handler. Malformed frames are dropped by
    /// `wire::decode` (logged there); this function never sees the error
    /// case directly.
    pub fn on_rx(&mut self, sender_bssid: MacAddr, frame: &[u8], now: Instant) {
        let Ok(packet) = wire::decode(frame) else {
            return;
        };
        for tlv in packet.tlvs {
            match tlv {
                Tlv::Score { sta, score, associated_msecs, bssid: _ } => {
                    self.event_ctx(now).on_rx_score(sender_bssid, sta, score, associated_msecs);
                }
                Tlv::CloseClient { sta, target_bssid, channel, sender_bssid: _ } => {
                    if target_bssid == self.local_bssid {
                        self.event_ctx(now).on_rx_close(sender_bssid, sta, channel);
                    }
                }
                Tlv::ClosedClient { sta, target_bssid } => {
                    if target_bssid == self.local_bssid {
                        self.event_ctx(now).on_rx_closed(sta);
                    }
                }
            }
        }
    }

    /// Flushes every pending timer event queued since the last drain,
    /// re-entering the FSM as `TIMEOUT` (client timer), a periodic score
    /// flood (flood timer), or a lost-probe score reset (probe timer).
    pub fn handle_timer(&mut self, key: crate::timer::TimerKey, now: Instant) {
        use crate::timer::TimerKind;
        match key.kind {
            TimerKind::Flood => {
                if let Some(client) = self.registry.find(key.mac) {
                    if client.is_associated() {
                        let seq = {
                            let s = self.frame_sn;
                            self.frame_sn = self.frame_sn.wrapping_add(1);
                            s
                        };
                        let client = self.registry.find(key.mac).unwrap();
                        crate::flood::flood_score(
                            client,
                            self.local_bssid,
                            &self.peers,
                            seq,
                            &mut self.channel,
                            now,
                        );
                    }
                }
            }
            TimerKind::Client => {
                self.event_ctx(now).dispatch_timeout(key.mac);
            }
            TimerKind::Probe => {
                if let Some(client) = self.registry.find_mut(key.mac) {
                    client.local_score = wire::SCORE_UNKNOWN;
                }
            }
        }
    }

    /// Cancels all timers for all clients and empties the registry.
    /// Deinit closes the channel and unlinks from the process-wide set —
    /// both of those steps happen in [`BssRegistry::remove`] and the
    /// embedder's channel-close call respectively, since this type has no
    /// notion of "closing" a generic `L2Channel`.
    pub fn deinit(&mut self) {
        self.registry.delete_all(&mut self.timers);
    }
}

impl<A: ApStackOps, C: L2Channel> std::fmt::Debug for BssContext<A, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BssContext")
            .field("handle", &self.handle)
            .field("local_bssid", &self.local_bssid)
            .field("mode", &self.mode)
            .field("peers", &self.peers.len())
            .field("clients", &self.registry.len())
            .finish()
    }
}

/// Validates configuration, opens the layer-2 channel on the configured
/// bridge, and builds a [`BssContext`]. Returns `Ok(None)` when steering is
/// disabled (mode `Off`) — §4.7: "off -> no-op init" is not an error, it is
/// the normal way to leave steering turned off for a BSS.
pub fn init<A: ApStackOps, C: L2Channel>(
    handle: BssHandle,
    config: &SteeringConfig,
    timer_tx: tokio::sync::mpsc::UnboundedSender<crate::timer::TimerFired>,
    apstack: A,
) -> Result<Option<BssContext<A, C>>, SteeringError> {
    if config.mode == SteeringMode::Off {
        info!(bssid = %config.local_bssid, "steering disabled by configuration");
        return Ok(None);
    }
    if config.peers.is_empty() {
        warn!(bssid = %config.local_bssid, "steering has no configured peers, disabling");
        return Ok(None);
    }
    config.validate()?;

    let channel = C::open(&config.bridge, ETHERTYPE).map_err(|e| {
        warn!(bridge = %config.bridge, error = %e, "failed to open steering control channel");
        SteeringError::L2Open { bridge: config.bridge.clone() }
    })?;

    info!(
        bssid = %config.local_bssid,
        bridge = %config.bridge,
        peers = config.peers.len(),
        mode = ?config.mode,
        ethertype = format!("{ETHERTYPE:#06x}"),
        "steering coordinator initialised"
    );

    Ok(Some(BssContext {
        handle,
        local_bssid: config.local_bssid,
        local_channel: config.channel,
        mode: config.mode,
        peers: config.peers.clone(),
        registry: ClientRegistry::new(),
        timers: TimerService::new(timer_tx),
        apstack,
        channel,
        frame_sn: 0,
    }))
}

/// Process-wide set of active BSS contexts, mutated only during init/deinit
/// (§5). Models the original's `dl_list` of contexts located by `hapd`
/// pointer, here looked up by the opaque [`BssHandle`] instead.
#[derive(Default)]
pub struct BssRegistry<A: ApStackOps, C: L2Channel> {
    contexts: Vec<BssContext<A, C>>,
}

impl<A: ApStackOps, C: L2Channel> BssRegistry<A, C> {
    pub fn new() -> Self {
        BssRegistry { contexts: Vec::new() }
    }

    pub fn insert(&mut self, ctx: BssContext<A, C>) {
        self.contexts.push(ctx);
    }

    pub fn find_mut(&mut self, handle: BssHandle) -> Option<&mut BssContext<A, C>> {
        self.contexts.iter_mut().find(|c| c.handle == handle)
    }

    /// Deinits and unlinks the context for `handle`, if present.
    pub fn remove(&mut self, handle: BssHandle) {
        if let Some(mut ctx) = self
            .contexts
            .iter()
            .position(|c| c.handle == handle)
            .map(|i| self.contexts.remove(i))
        {
            ctx.deinit();
        }
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apstack::{InMemoryL2Channel, RecordingApStack};

    fn mac(b: u8) -> MacAddr {
        MacAddr([b; 6])
    }

    fn test_config() -> SteeringConfig {
        SteeringConfig {
            mode: SteeringMode::Force,
            bridge: "br-steer".into(),
            peers: vec![mac(0xb)],
            local_bssid: mac(0xa),
            channel: 36,
        }
    }

    #[tokio::test]
    async fn off_mode_disables_init() {
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let mut cfg = test_config();
        cfg.mode = SteeringMode::Off;
        let ctx: Option<BssContext<RecordingApStack, InMemoryL2Channel>> =
            init(BssHandle(1), &cfg, tx, RecordingApStack::default()).unwrap();
        assert!(ctx.is_none());
    }

    #[tokio::test]
    async fn empty_peer_list_disables_init_without_error() {
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let mut cfg = test_config();
        cfg.peers.clear();
        let ctx: Option<BssContext<RecordingApStack, InMemoryL2Channel>> =
            init(BssHandle(1), &cfg, tx, RecordingApStack::default()).unwrap();
        assert!(ctx.is_none());
    }

    #[tokio::test]
    async fn basic_claim_scenario_floods_score_to_peer() {
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let cfg = test_config();
        let mut ctx: BssContext<RecordingApStack, InMemoryL2Channel> =
            init(BssHandle(1), &cfg, tx, RecordingApStack::default())
                .unwrap()
                .unwrap();
        ctx.on_association(mac(1), -40, Instant::now());
        assert!(!ctx.channel.sent.is_empty());
        let (dest, ethertype, _payload) = &ctx.channel.sent[0];
        assert_eq!(*dest, mac(0xb));
        assert_eq!(*ethertype, ETHERTYPE);
    }
}
