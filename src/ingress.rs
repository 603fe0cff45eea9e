//! Event ingress (C6, §4.6): turns local radio events and inbound wire
//! packets into FSM events, and carries out the actions the FSM returns.

use crate::apstack::{ApStackOps, L2Channel};
use crate::client::ClientRegistry;
use crate::config::SteeringMode;
use crate::fsm::{self, Action, Event};
use crate::flood;
use crate::mac::MacAddr;
use crate::timer::TimerService;
use crate::wire::SCORE_UNKNOWN;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Every mutable collaborator a handler needs, bundled so call sites don't
/// thread eight parameters through each function individually. Built fresh
/// by [`crate::bss::BssContext`] for each dispatch.
pub struct EventCtx<'a> {
    pub registry: &'a mut ClientRegistry,
    pub timers: &'a mut TimerService,
    pub apstack: &'a mut dyn ApStackOps,
    pub channel: &'a mut dyn L2Channel,
    pub local_bssid: MacAddr,
    pub local_channel: u8,
    pub peers: &'a [MacAddr],
    pub seq: &'a mut u16,
    pub mode: SteeringMode,
    pub now: Instant,
}

/// Bumps a frame sequence number, returning the value to stamp on the
/// outgoing frame. A free function (rather than an `EventCtx` method
/// borrowing all of `self`) so it can be called while a client record
/// borrowed from `self.registry` is still live.
fn bump_seq(seq: &mut u16) -> u16 {
    let s = *seq;
    *seq = seq.wrapping_add(1);
    s
}

impl EventCtx<'_> {
    /// Drives the FSM for `mac` with `event` and carries out the returned
    /// actions against the client record and external collaborators.
    fn dispatch(&mut self, mac: MacAddr, event: Event) {
        let client = self.registry.find_or_create(mac);
        let prev = client.state;
        let (next, actions) = fsm::transition(prev, event);
        client.state = next;

        for action in actions {
            let client = self.registry.find_mut(mac).expect("record exists, dispatch is reentrant-free");
            match action {
                Action::StartFlood => {
                    self.timers.register_flood(mac);
                }
                Action::StopFlood => {
                    self.timers.cancel(crate::timer::TimerKind::Flood, mac);
                }
                Action::FloodClose => {
                    let seq = bump_seq(self.seq);
                    flood::flood_close(
                        client,
                        self.local_bssid,
                        self.local_channel,
                        self.peers,
                        seq,
                        self.channel,
                    );
                }
                Action::FloodClosed => {
                    let seq = bump_seq(self.seq);
                    flood::flood_closed(client, self.local_bssid, self.peers, seq, self.channel);
                    let client = self.registry.find_mut(mac).expect("record exists");
                    client.close_bssid = MacAddr::ZERO;
                }
                Action::BlacklistAdd => {
                    if self.mode == SteeringMode::Force {
                        self.apstack.blacklist_add(mac);
                    }
                }
                Action::BlacklistRemove => {
                    if self.mode == SteeringMode::Force {
                        self.apstack.blacklist_remove(mac);
                    }
                }
                Action::Disassociate => {
                    if self.mode == SteeringMode::Suggest || client.supports_btm {
                        self.apstack.send_btm_request(mac, client.close_bssid, client.remote_channel);
                    } else {
                        self.apstack.disassociate(mac);
                    }
                }
                Action::StartClientTimer | Action::RestartClientTimer => {
                    self.timers.register_client(mac);
                }
                Action::StopClientTimer => {
                    self.timers.cancel(crate::timer::TimerKind::Client, mac);
                }
            }
        }
    }

    /// Local association: create record if needed, record association
    /// time and initial score, clear remote fields, bind `sta_ref`, cache
    /// the STA's BTM capability from the AP stack, cancel the probe timer,
    /// emit `ASSOCIATED`, then flood immediately.
    pub fn on_association(&mut self, mac: MacAddr, rssi: i32) {
        info!(%mac, rssi, "local association");
        let now = self.now;
        let supports_btm = self.apstack.supports_btm(mac);
        let client = self.registry.find_or_create(mac);
        client.sta_ref = Some(());
        client.association_time = Some(now);
        client.local_score = score_from_rssi(rssi);
        client.remote_bssid = MacAddr::ZERO;
        client.remote_time = None;
        client.close_bssid = MacAddr::ZERO;
        client.supports_btm = supports_btm;
        self.timers.cancel(crate::timer::TimerKind::Probe, mac);

        self.dispatch(mac, Event::Associated);

        if let Some(client) = self.registry.find(mac) {
            if client.is_associated() {
                let seq = bump_seq(self.seq);
                let client = self.registry.find(mac).unwrap();
                flood::flood_score(client, self.local_bssid, self.peers, seq, self.channel, now);
            }
        }
    }

    /// Local disassociation: emit `DISASSOCIATED` first so FSM actions can
    /// still see `sta_ref`, then clear local-association fields and start
    /// the probe timer.
    pub fn on_disassociation(&mut self, mac: MacAddr) {
        info!(%mac, "local disassociation");
        self.dispatch(mac, Event::Disassociated);

        if let Some(client) = self.registry.find_mut(mac) {
            client.sta_ref = None;
            client.remote_bssid = MacAddr::ZERO;
            client.remote_time = None;
            client.association_time = None;
        }
        self.timers.register_probe(mac);
    }

    /// Probe request: only processed if directed at us or we already have
    /// a record. A score change here never synthesises an FSM event —
    /// score is reported by flood, never by transition.
    pub fn on_probe_request(&mut self, directed_at_us: bool, mac: MacAddr, rssi: i32) {
        if !directed_at_us && self.registry.find(mac).is_none() {
            return;
        }
        let now = self.now;
        let new_score = score_from_rssi(rssi);
        let client = self.registry.find_or_create(mac);
        let score_changed = client.local_score != new_score;
        client.local_score = new_score;
        let associated = client.is_associated();
        debug!(%mac, rssi, new_score, "probe request");

        if associated && score_changed {
            let seq = bump_seq(self.seq);
            let client = self.registry.find(mac).unwrap();
            flood::flood_score(client, self.local_bssid, self.peers, seq, self.channel, now);
        } else if !associated {
            self.timers.register_probe(mac);
        }
    }

    /// Inbound SCORE from peer `sender_bssid` for STA `mac`.
    pub fn on_rx_score(
        &mut self,
        sender_bssid: MacAddr,
        mac: MacAddr,
        score: u16,
        associated_msecs: u32,
    ) {
        let now = self.now;
        let corrected_time = now - Duration::from_millis(associated_msecs as u64);
        let client = self.registry.find_or_create(mac);

        let mut synth_disassoc = false;
        let mut compare = false;
        if sender_bssid != client.remote_bssid {
            let is_fresher = match client.remote_time {
                Some(prev) => corrected_time > prev,
                None => true,
            };
            if is_fresher {
                if client.is_associated() {
                    // The STA has roamed away behind our back: the peer's
                    // claim is fresher than anything we recorded, so we no
                    // longer believe we serve it. Do not compare scores
                    // this round — the disassociation is unconditional.
                    synth_disassoc = true;
                } else {
                    // Not currently ours to begin with: accept the new
                    // owner-of-record and weigh in with a score comparison.
                    compare = true;
                }
                client.remote_bssid = sender_bssid;
                client.remote_time = Some(corrected_time);
            }
            // Else: a stale report from a BSSID we don't already track as
            // the owner — ignore it entirely (no update, no comparison).
        } else {
            client.remote_time = Some(corrected_time);
            compare = true;
        }

        if synth_disassoc {
            self.dispatch(mac, Event::Disassociated);
            let client = self.registry.find_mut(mac).expect("record exists");
            client.sta_ref = None;
            client.association_time = None;
            self.timers.register_probe(mac);
            return;
        }

        if !compare {
            return;
        }

        let client = self.registry.find(mac).expect("record exists");
        let event = if score == SCORE_UNKNOWN {
            Event::PeerLostClient
        } else if client.local_score < score {
            Event::PeerIsWorse
        } else {
            Event::PeerNotWorse
        };
        self.dispatch(mac, event);
    }

    /// Inbound CLOSE_CLIENT whose `target_bssid` equals ours.
    pub fn on_rx_close(&mut self, sender_bssid: MacAddr, mac: MacAddr, channel: u8) {
        let client = self.registry.find_or_create(mac);
        client.close_bssid = sender_bssid;
        client.remote_channel = channel;
        self.dispatch(mac, Event::CloseClient);
    }

    /// Inbound CLOSED_CLIENT whose `target_bssid` equals ours. Ignored if
    /// we have no record for the STA (§7 peer-identity error policy).
    pub fn on_rx_closed(&mut self, mac: MacAddr) {
        if self.registry.find(mac).is_none() {
            return;
        }
        self.dispatch(mac, Event::ClosedClient);
    }

    /// Client timer expiry, used in REJECTING/REJECTED (§4.2/§4.4).
    pub fn dispatch_timeout(&mut self, mac: MacAddr) {
        if self.registry.find(mac).is_none() {
            return;
        }
        self.dispatch(mac, Event::Timeout);
    }
}

/// Score is `|rssi|`; clamped one below the `SCORE_UNKNOWN` sentinel so a
/// (physically impossible) extreme RSSI can never collide with it.
fn score_from_rssi(rssi: i32) -> u16 {
    let magnitude = rssi.unsigned_abs();
    if magnitude >= SCORE_UNKNOWN as u32 {
        SCORE_UNKNOWN - 1
    } else {
        magnitude as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apstack::{InMemoryL2Channel, RecordingApStack};
    use crate::fsm::State;

    fn mac(b: u8) -> MacAddr {
        MacAddr([b; 6])
    }

    fn ctx<'a>(
        registry: &'a mut ClientRegistry,
        timers: &'a mut TimerService,
        apstack: &'a mut RecordingApStack,
        channel: &'a mut InMemoryL2Channel,
        peers: &'a [MacAddr],
        seq: &'a mut u16,
    ) -> EventCtx<'a> {
        EventCtx {
            registry,
            timers,
            apstack,
            channel,
            local_bssid: mac(0xa),
            local_channel: 36,
            peers,
            seq,
            mode: SteeringMode::Force,
            now: Instant::now(),
        }
    }

    #[tokio::test]
    async fn score_clamps_below_sentinel() {
        assert_eq!(score_from_rssi(-40), 40);
        assert_eq!(score_from_rssi(i32::MIN), SCORE_UNKNOWN - 1);
    }

    #[tokio::test]
    async fn local_association_transitions_to_associated_and_floods() {
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let mut registry = ClientRegistry::new();
        let mut timers = TimerService::new(tx);
        let mut apstack = RecordingApStack::default();
        let mut channel = InMemoryL2Channel::default();
        let peers = [mac(0xb)];
        let mut seq = 0u16;
        let mut c = ctx(&mut registry, &mut timers, &mut apstack, &mut channel, &peers, &mut seq);

        c.on_association(mac(1), -40);

        let rec = registry.find(mac(1)).unwrap();
        assert_eq!(rec.state, State::Associated);
        assert_eq!(rec.local_score, 40);
        assert!(!channel.sent.is_empty(), "association should flood a score immediately");
    }

    #[tokio::test]
    async fn close_client_in_force_mode_blacklists_and_rejects() {
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let mut registry = ClientRegistry::new();
        let mut timers = TimerService::new(tx);
        let mut apstack = RecordingApStack::default();
        let mut channel = InMemoryL2Channel::default();
        let peers = [mac(0xb)];
        let mut seq = 0u16;
        let mut c = ctx(&mut registry, &mut timers, &mut apstack, &mut channel, &peers, &mut seq);

        c.on_association(mac(1), -40);
        c.on_rx_close(mac(0xb), mac(1), 36);

        let rec = registry.find(mac(1)).unwrap();
        assert_eq!(rec.state, State::Rejecting);
        assert!(apstack.blacklisted.contains(&mac(1)));
        assert_eq!(apstack.disassociated, vec![mac(1)]);
    }
}
