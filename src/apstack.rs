//! External collaborators (§6): everything the steering core consumes from
//! the surrounding AP stack but does not implement itself. §1 names these
//! as explicitly out of scope — association events, RSSI, disassociation,
//! blacklisting, BTM, and the layer-2 transport all live behind these two
//! traits so the core stays free of any real 802.11/driver code.

use crate::mac::MacAddr;

/// Operations the core calls into the host AP stack to perform. All STA
/// naming here is by MAC string, matching the original's string-based
/// control-interface API (`MACSTR`), even though the rest of the crate
/// uses the typed [`MacAddr`] — this is the one place the external string
/// shape leaks through by design.
pub trait ApStackOps {
    /// Blacklist add/remove by STA MAC. Inert (never called) when BSS mode
    /// is SUGGEST — see [`crate::config::SteeringMode`].
    fn blacklist_add(&mut self, sta: MacAddr);
    fn blacklist_remove(&mut self, sta: MacAddr);

    /// Hard disassociate by STA MAC.
    fn disassociate(&mut self, sta: MacAddr);

    /// Send a BTM request naming `target_bssid` on `channel`, with an
    /// immediate (zero) transition timeout per §4.4.
    fn send_btm_request(&mut self, sta: MacAddr, target_bssid: MacAddr, channel: u8);

    /// Does the STA advertise BSS Transition Management capability? Cached
    /// by the caller onto `ClientRecord::supports_btm`.
    fn supports_btm(&self, sta: MacAddr) -> bool;
}

/// Layer-2 raw send/receive bound to an EtherType on a bridge interface.
pub trait L2Channel {
    /// Opens the channel on `bridge` for `ethertype`, per §4.7's init step
    /// "open the layer-2 channel on the configured bridge for EtherType
    /// 0x8267". Mirrors the teacher's `BanList::load`/`save` shape of
    /// returning `std::io::Error` for an I/O-backed resource. Bound to
    /// `Self: Sized` only, not the whole trait, so `dyn L2Channel` stays
    /// usable for `send`.
    fn open(bridge: &str, ethertype: u16) -> std::io::Result<Self>
    where
        Self: Sized;

    fn send(&mut self, dest: MacAddr, ethertype: u16, payload: &[u8]);
}

/// A no-op [`ApStackOps`] for demos/tests that don't need to observe the
/// calls made into it.
#[derive(Debug, Default)]
pub struct NullApStack;

impl ApStackOps for NullApStack {
    fn blacklist_add(&mut self, _sta: MacAddr) {}
    fn blacklist_remove(&mut self, _sta: MacAddr) {}
    fn disassociate(&mut self, _sta: MacAddr) {}
    fn send_btm_request(&mut self, _sta: MacAddr, _target_bssid: MacAddr, _channel: u8) {}
    fn supports_btm(&self, _sta: MacAddr) -> bool {
        false
    }
}

/// A recording [`ApStackOps`] test double: every call is appended to a log
/// so scenario tests can assert on exactly which external actions fired.
#[derive(Debug, Default)]
pub struct RecordingApStack {
    pub blacklisted: std::collections::HashSet<MacAddr>,
    pub disassociated: Vec<MacAddr>,
    pub btm_sent: Vec<(MacAddr, MacAddr, u8)>,
    pub btm_capable: std::collections::HashSet<MacAddr>,
}

impl ApStackOps for RecordingApStack {
    fn blacklist_add(&mut self, sta: MacAddr) {
        self.blacklisted.insert(sta);
    }
    fn blacklist_remove(&mut self, sta: MacAddr) {
        self.blacklisted.remove(&sta);
    }
    fn disassociate(&mut self, sta: MacAddr) {
        self.disassociated.push(sta);
    }
    fn send_btm_request(&mut self, sta: MacAddr, target_bssid: MacAddr, channel: u8) {
        self.btm_sent.push((sta, target_bssid, channel));
    }
    fn supports_btm(&self, sta: MacAddr) -> bool {
        self.btm_capable.contains(&sta)
    }
}

/// An in-memory [`L2Channel`] linking several [`BssContext`]s in one
/// process, for scenario tests and the demo harness — no real bridge
/// interface is touched.
///
/// [`BssContext`]: crate::bss::BssContext
#[derive(Debug, Default)]
pub struct InMemoryL2Channel {
    /// Outbound frames, as `(dest, ethertype, payload)`, for the test to
    /// drain and hand to the intended peer's `on_rx`.
    pub sent: Vec<(MacAddr, u16, Vec<u8>)>,
}

impl L2Channel for InMemoryL2Channel {
    /// Never fails — there is no real bridge to fail to open.
    fn open(_bridge: &str, _ethertype: u16) -> std::io::Result<Self> {
        Ok(InMemoryL2Channel::default())
    }

    fn send(&mut self, dest: MacAddr, ethertype: u16, payload: &[u8]) {
        self.sent.push((dest, ethertype, payload.to_vec()));
    }
}

impl InMemoryL2Channel {
    pub fn drain(&mut self) -> Vec<(MacAddr, u16, Vec<u8>)> {
        std::mem::take(&mut self.sent)
    }
}
