//! Client registry (C3, §3, §4.3): one record per known STA, per BSS.

use crate::fsm::State;
use crate::mac::MacAddr;
use crate::timer::TimerService;
use crate::wire::SCORE_UNKNOWN;
use std::time::Instant;
use tracing::debug;

/// One record per known STA. See §3 for the field-by-field invariants;
/// they are enforced by the callers in `ingress.rs`/`bss.rs` that drive
/// state transitions, not by this struct itself (it is plain data).
#[derive(Debug, Clone)]
pub struct ClientRecord {
    pub mac: MacAddr,
    /// Present iff `state == ASSOCIATED` (P1). `()` stands in for the
    /// AP stack's opaque STA handle — this crate never dereferences it,
    /// only threads it back out through [`crate::apstack::ApStackOps`]
    /// calls that need to name the STA.
    pub sta_ref: Option<()>,
    pub state: State,
    pub local_score: u16,
    pub remote_bssid: MacAddr,
    pub remote_time: Option<Instant>,
    pub close_bssid: MacAddr,
    pub remote_channel: u8,
    pub association_time: Option<Instant>,
    pub supports_btm: bool,
}

impl ClientRecord {
    pub fn new(mac: MacAddr) -> Self {
        ClientRecord {
            mac,
            sta_ref: None,
            state: State::Idle,
            local_score: SCORE_UNKNOWN,
            remote_bssid: MacAddr::ZERO,
            remote_time: None,
            close_bssid: MacAddr::ZERO,
            remote_channel: 0,
            association_time: None,
            supports_btm: false,
        }
    }

    pub fn is_associated(&self) -> bool {
        self.state == State::Associated
    }

    /// Milliseconds since local association, for the `associated_msecs`
    /// field of an outbound SCORE TLV. Saturates rather than panicking if
    /// called with no association (callers only do this while ASSOCIATED).
    pub fn associated_msecs(&self, now: Instant) -> u32 {
        match self.association_time {
            Some(t) => now.saturating_duration_since(t).as_millis().min(u32::MAX as u128) as u32,
            None => 0,
        }
    }
}

/// A read-only external view of a client, for diagnostics/status surfaces —
/// mirrors the teacher's `PeerInfo: From<&Peer>` shape.
#[derive(Debug, Clone)]
pub struct ClientInfo {
    pub mac: MacAddr,
    pub state: State,
    pub local_score: u16,
    pub remote_bssid: MacAddr,
}

impl From<&ClientRecord> for ClientInfo {
    fn from(c: &ClientRecord) -> Self {
        ClientInfo {
            mac: c.mac,
            state: c.state,
            local_score: c.local_score,
            remote_bssid: c.remote_bssid,
        }
    }
}

/// Per-BSS collection keyed by MAC. Linear search is intentional: `n` is
/// the number of STAs ever seen by one radio, realistically well under a
/// few hundred.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: Vec<ClientRecord>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        ClientRegistry { clients: Vec::new() }
    }

    pub fn find(&self, mac: MacAddr) -> Option<&ClientRecord> {
        self.clients.iter().find(|c| c.mac == mac)
    }

    pub fn find_mut(&mut self, mac: MacAddr) -> Option<&mut ClientRecord> {
        self.clients.iter_mut().find(|c| c.mac == mac)
    }

    /// Finds the existing record for `mac`, or creates one in `IDLE`.
    /// Records are created lazily — on first local association, first
    /// directed probe, or first inbound score/close referencing the STA.
    pub fn find_or_create(&mut self, mac: MacAddr) -> &mut ClientRecord {
        if self.find(mac).is_none() {
            debug!(%mac, "creating client record");
            self.clients.push(ClientRecord::new(mac));
        }
        self.find_mut(mac).expect("just inserted")
    }

    /// Cancels every timer for this client before removing the record.
    /// Records are destroyed only at BSS teardown (§3 lifecycle).
    pub fn delete(&mut self, mac: MacAddr, timers: &mut TimerService) {
        timers.cancel_all(mac);
        self.clients.retain(|c| c.mac != mac);
    }

    pub fn delete_all(&mut self, timers: &mut TimerService) {
        for client in &self.clients {
            timers.cancel_all(client.mac);
        }
        self.clients.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClientRecord> {
        self.clients.iter()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mac(b: u8) -> MacAddr {
        MacAddr([b; 6])
    }

    #[test]
    fn find_or_create_is_lazy_and_idempotent() {
        let mut reg = ClientRegistry::new();
        assert!(reg.find(mac(1)).is_none());
        reg.find_or_create(mac(1));
        assert_eq!(reg.len(), 1);
        reg.find_or_create(mac(1));
        assert_eq!(reg.len(), 1, "second call must not duplicate the record");
    }

    #[test]
    fn new_record_starts_idle_with_unknown_score() {
        let rec = ClientRecord::new(mac(2));
        assert_eq!(rec.state, State::Idle);
        assert_eq!(rec.local_score, SCORE_UNKNOWN);
        assert!(rec.sta_ref.is_none());
    }

    #[tokio::test]
    async fn delete_cancels_timers_and_removes_record() {
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let mut timers = TimerService::new(tx);
        let mut reg = ClientRegistry::new();
        reg.find_or_create(mac(3));
        timers.register_probe(mac(3));
        reg.delete(mac(3), &mut timers);
        assert!(reg.find(mac(3)).is_none());
        assert!(!timers.is_pending(crate::timer::TimerKind::Probe, mac(3)));
    }
}
