//! Timer service adapter (C2, §4.2).
//!
//! Three timer kinds per client, each keyed by `(kind, mac)` so cancellation
//! is idempotent and re-registration is always cancel-then-register. Timer
//! tasks never call back into the core directly — per §5's single-threaded
//! cooperative event-loop model, a fired timer is reported over a channel
//! and the event loop dequeues and processes it like any other event. This
//! makes the "timer fires after the client record is destroyed" hazard
//! harmless: [`crate::client::ClientRegistry::delete`] cancels every timer
//! for a client before freeing it, and a timer that still manages to race
//! the channel resolves a now-missing client and is a no-op.

use crate::mac::MacAddr;
use std::collections::HashMap;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::trace;

pub const FLOOD_INTERVAL: Duration = Duration::from_secs(1);
pub const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(34);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    Flood,
    Client,
    Probe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerKey {
    pub kind: TimerKind,
    pub mac: MacAddr,
}

/// Delivered to the event loop when a timer fires. The flood timer repeats
/// until cancelled; client/probe timers fire once and are removed.
#[derive(Debug, Clone, Copy)]
pub struct TimerFired {
    pub key: TimerKey,
}

/// Tokio-backed timer service. Every registration spawns a task that sleeps
/// (or ticks, for the flood timer) and sends a [`TimerFired`] on the shared
/// channel; `cancel` aborts the task.
pub struct TimerService {
    tx: tokio::sync::mpsc::UnboundedSender<TimerFired>,
    tasks: HashMap<TimerKey, JoinHandle<()>>,
}

impl TimerService {
    pub fn new(tx: tokio::sync::mpsc::UnboundedSender<TimerFired>) -> Self {
        TimerService { tx, tasks: HashMap::new() }
    }

    /// Cancels any existing timer of this kind for this client, then starts
    /// a new single-shot timer of `duration`.
    pub fn register_once(&mut self, kind: TimerKind, mac: MacAddr, duration: Duration) {
        let key = TimerKey { kind, mac };
        self.cancel(kind, mac);
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            let _ = tx.send(TimerFired { key });
        });
        self.tasks.insert(key, handle);
    }

    /// Cancels any existing flood timer for this client, then starts a
    /// periodic timer that fires every `FLOOD_INTERVAL` until cancelled.
    pub fn register_periodic(&mut self, kind: TimerKind, mac: MacAddr, period: Duration) {
        let key = TimerKey { kind, mac };
        self.cancel(kind, mac);
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await; // first tick fires immediately; skip it
            loop {
                interval.tick().await;
                if tx.send(TimerFired { key }).is_err() {
                    break;
                }
            }
        });
        self.tasks.insert(key, handle);
    }

    pub fn register_flood(&mut self, mac: MacAddr) {
        self.register_periodic(TimerKind::Flood, mac, FLOOD_INTERVAL);
    }

    pub fn register_client(&mut self, mac: MacAddr) {
        self.register_once(TimerKind::Client, mac, CLIENT_TIMEOUT);
    }

    pub fn register_probe(&mut self, mac: MacAddr) {
        self.register_once(TimerKind::Probe, mac, PROBE_TIMEOUT);
    }

    /// Cancellation of a non-pending timer is a no-op.
    pub fn cancel(&mut self, kind: TimerKind, mac: MacAddr) {
        if let Some(handle) = self.tasks.remove(&TimerKey { kind, mac }) {
            handle.abort();
            trace!(?kind, %mac, "cancelled timer");
        }
    }

    pub fn is_pending(&self, kind: TimerKind, mac: MacAddr) -> bool {
        self.tasks.contains_key(&TimerKey { kind, mac })
    }

    /// Cancels all three timer kinds for a client. Called by
    /// [`crate::client::ClientRegistry::delete`] before freeing the record.
    pub fn cancel_all(&mut self, mac: MacAddr) {
        self.cancel(TimerKind::Flood, mac);
        self.cancel(TimerKind::Client, mac);
        self.cancel(TimerKind::Probe, mac);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn client_timer_fires_once_after_duration() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut svc = TimerService::new(tx);
        let mac = MacAddr([1; 6]);
        svc.register_client(mac);
        assert!(svc.is_pending(TimerKind::Client, mac));

        tokio::time::advance(CLIENT_TIMEOUT + Duration::from_millis(1)).await;
        let fired = rx.recv().await.unwrap();
        assert_eq!(fired.key, TimerKey { kind: TimerKind::Client, mac });
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_before_register_is_idempotent() {
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let mut svc = TimerService::new(tx);
        let mac = MacAddr([2; 6]);
        svc.cancel(TimerKind::Probe, mac); // no-op, nothing pending
        svc.register_probe(mac);
        svc.register_probe(mac); // re-register cancels the first internally
        assert!(svc.is_pending(TimerKind::Probe, mac));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_all_stops_every_kind() {
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let mut svc = TimerService::new(tx);
        let mac = MacAddr([3; 6]);
        svc.register_flood(mac);
        svc.register_client(mac);
        svc.register_probe(mac);
        svc.cancel_all(mac);
        assert!(!svc.is_pending(TimerKind::Flood, mac));
        assert!(!svc.is_pending(TimerKind::Client, mac));
        assert!(!svc.is_pending(TimerKind::Probe, mac));
    }
}
