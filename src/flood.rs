//! Flood engine (C5, §4.5): periodic score floods and on-demand close/closed
//! floods, fanned out to every configured peer.

use crate::apstack::L2Channel;
use crate::client::ClientRecord;
use crate::mac::MacAddr;
use crate::wire::{PacketBuilder, Tlv, SCORE_UNKNOWN};
use std::time::Instant;
use tracing::debug;

/// EtherType steering frames are sent under. Lives here rather than in
/// `wire.rs` since it is a property of the channel, not the byte layout.
pub const ETHERTYPE: u16 = 0x8267;

fn fan_out(
    channel: &mut dyn L2Channel,
    peers: &[MacAddr],
    local_bssid: MacAddr,
    seq: u16,
    tlv: Tlv,
) {
    let frame = PacketBuilder::new(seq).push(tlv).build();
    for &peer in peers {
        if peer == local_bssid {
            // Never flood to ourselves — see SUPPLEMENTED note on the
            // original's self-MAC skip in flood_message.
            continue;
        }
        channel.send(peer, ETHERTYPE, &frame);
    }
}

/// Emits SCORE for `(mac, local_bssid, local_score, associated_msecs)`.
/// Suppressed when `local_score == SCORE_UNKNOWN` (P8) — there is nothing
/// useful to tell peers about a STA we have lost sight of.
pub fn flood_score(
    client: &ClientRecord,
    local_bssid: MacAddr,
    peers: &[MacAddr],
    seq: u16,
    channel: &mut dyn L2Channel,
    now: Instant,
) {
    if client.local_score == SCORE_UNKNOWN {
        debug!(mac = %client.mac, "suppressing score flood: score unknown");
        return;
    }
    fan_out(
        channel,
        peers,
        local_bssid,
        seq,
        Tlv::Score {
            sta: client.mac,
            bssid: local_bssid,
            score: client.local_score,
            associated_msecs: client.associated_msecs(now),
        },
    );
}

/// Emits CLOSE_CLIENT for `(mac, local_bssid, remote_bssid, local_channel)`.
/// The receiving peer matches on `target_bssid == remote_bssid`.
pub fn flood_close(
    client: &ClientRecord,
    local_bssid: MacAddr,
    local_channel: u8,
    peers: &[MacAddr],
    seq: u16,
    channel: &mut dyn L2Channel,
) {
    fan_out(
        channel,
        peers,
        local_bssid,
        seq,
        Tlv::CloseClient {
            sta: client.mac,
            sender_bssid: local_bssid,
            target_bssid: client.remote_bssid,
            channel: local_channel,
        },
    );
}

/// Emits CLOSED_CLIENT for `(mac, close_bssid)`. Callers must clear
/// `close_bssid` on the record after this returns — the flood engine only
/// builds and sends the frame, it does not mutate client state.
pub fn flood_closed(
    client: &ClientRecord,
    local_bssid: MacAddr,
    peers: &[MacAddr],
    seq: u16,
    channel: &mut dyn L2Channel,
) {
    fan_out(
        channel,
        peers,
        local_bssid,
        seq,
        Tlv::ClosedClient { sta: client.mac, target_bssid: client.close_bssid },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apstack::InMemoryL2Channel;
    use crate::wire::decode;

    fn mac(b: u8) -> MacAddr {
        MacAddr([b; 6])
    }

    #[test]
    fn flood_score_suppressed_when_score_unknown() {
        let mut client = ClientRecord::new(mac(1));
        client.local_score = SCORE_UNKNOWN;
        let mut ch = InMemoryL2Channel::default();
        flood_score(&client, mac(0xa), &[mac(0xb)], 1, &mut ch, Instant::now());
        assert!(ch.sent.is_empty(), "P8: zero frames when score is unknown");
    }

    #[test]
    fn flood_score_sends_one_frame_per_peer_skipping_self() {
        let mut client = ClientRecord::new(mac(1));
        client.local_score = 40;
        let mut ch = InMemoryL2Channel::default();
        let local = mac(0xa);
        let peers = [mac(0xa), mac(0xb), mac(0xc)];
        flood_score(&client, local, &peers, 9, &mut ch, Instant::now());
        assert_eq!(ch.sent.len(), 2, "self must be skipped, two remaining peers get a frame");
        for (dest, ethertype, payload) in &ch.sent {
            assert_ne!(*dest, local);
            assert_eq!(*ethertype, ETHERTYPE);
            let packet = decode(payload).unwrap();
            assert_eq!(packet.seq, 9);
        }
    }

    #[test]
    fn flood_close_names_remote_bssid_as_target() {
        let mut client = ClientRecord::new(mac(1));
        client.remote_bssid = mac(0xb);
        let mut ch = InMemoryL2Channel::default();
        flood_close(&client, mac(0xa), 36, &[mac(0xb)], 2, &mut ch);
        let (_, _, payload) = &ch.sent[0];
        let packet = decode(payload).unwrap();
        match packet.tlvs[0] {
            crate::wire::Tlv::CloseClient { target_bssid, channel, .. } => {
                assert_eq!(target_bssid, mac(0xb));
                assert_eq!(channel, 36);
            }
            _ => panic!("expected CloseClient tlv"),
        }
    }
}
