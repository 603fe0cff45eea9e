//! Wire codec (C1): the framed TLV packet format exchanged between APs.
//!
//! All multi-byte integers are big-endian. A packet is a 6-byte header
//! followed by one or more TLVs. Frames are sent raw over layer 2 with
//! EtherType `0x8267`; that EtherType constant lives on [`crate::bss`]
//! since it is a property of how the channel is opened, not of the byte
//! layout itself.
//!
//! The decoder rejects truncation at every field boundary — header,
//! individual TLV header, and individual TLV value — rather than only at
//! the outer frame boundary, per the byte-cursor discipline this protocol
//! requires.

use crate::error::WireError;
use crate::mac::MacAddr;
use tracing::debug;

pub const MAGIC: u8 = 0x30;
pub const VERSION: u8 = 0x01;
pub const HEADER_LEN: usize = 6;

/// `0xFFFF` sentinel: "unknown / lost" score. Score is `|rssi|`; smaller is
/// better, so this sentinel is deliberately the worst possible value.
pub const SCORE_UNKNOWN: u16 = 0xFFFF;

const TLV_HEADER_LEN: usize = 2;

const TYPE_SCORE: u8 = 0;
const TYPE_CLOSE_CLIENT: u8 = 1;
const TYPE_CLOSED_CLIENT: u8 = 2;

/// A decoded TLV. Reserved/unknown types are skipped by the decoder and
/// never appear here — see [`decode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tlv {
    Score {
        sta: MacAddr,
        bssid: MacAddr,
        score: u16,
        associated_msecs: u32,
    },
    CloseClient {
        sta: MacAddr,
        sender_bssid: MacAddr,
        target_bssid: MacAddr,
        channel: u8,
    },
    ClosedClient {
        sta: MacAddr,
        target_bssid: MacAddr,
    },
}

/// A decoded packet: the sender's sequence number plus every TLV that
/// parsed successfully and carried a recognised type.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Packet {
    pub seq: u16,
    pub tlvs: Vec<Tlv>,
}

/// Builds a packet into a byte buffer, tracking a write cursor implicitly
/// via `Vec::extend_from_slice`. Bounds are enforced by construction: every
/// push appends a field of known fixed size, so there is no way to write a
/// malformed frame through this type.
pub struct PacketBuilder {
    seq: u16,
    tlvs: Vec<Tlv>,
}

impl PacketBuilder {
    pub fn new(seq: u16) -> Self {
        PacketBuilder { seq, tlvs: Vec::new() }
    }

    pub fn push(mut self, tlv: Tlv) -> Self {
        self.tlvs.push(tlv);
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut body = Vec::new();
        for tlv in &self.tlvs {
            encode_tlv(tlv, &mut body);
        }
        let packet_len = (HEADER_LEN + body.len()) as u16;
        let mut out = Vec::with_capacity(packet_len as usize);
        out.push(MAGIC);
        out.push(VERSION);
        out.extend_from_slice(&packet_len.to_be_bytes());
        out.extend_from_slice(&self.seq.to_be_bytes());
        out.extend_from_slice(&body);
        out
    }
}

fn encode_tlv(tlv: &Tlv, out: &mut Vec<u8>) {
    match tlv {
        Tlv::Score { sta, bssid, score, associated_msecs } => {
            out.push(TYPE_SCORE);
            out.push(18);
            out.extend_from_slice(sta.as_bytes());
            out.extend_from_slice(bssid.as_bytes());
            out.extend_from_slice(&score.to_be_bytes());
            out.extend_from_slice(&associated_msecs.to_be_bytes());
        }
        Tlv::CloseClient { sta, sender_bssid, target_bssid, channel } => {
            out.push(TYPE_CLOSE_CLIENT);
            out.push(19);
            out.extend_from_slice(sta.as_bytes());
            out.extend_from_slice(sender_bssid.as_bytes());
            out.extend_from_slice(target_bssid.as_bytes());
            out.push(*channel);
        }
        Tlv::ClosedClient { sta, target_bssid } => {
            out.push(TYPE_CLOSED_CLIENT);
            out.push(12);
            out.extend_from_slice(sta.as_bytes());
            out.extend_from_slice(target_bssid.as_bytes());
        }
    }
}

/// Decodes a received frame. Fails closed: any truncation or length
/// mismatch returns `Err` and the caller drops the frame with a debug log
/// (done here, at the point of failure, so every call site gets it for
/// free). Unknown TLV types are skipped by their declared length and do not
/// cause a decode failure — this is the protocol's forward-compatibility
/// hook.
pub fn decode(buf: &[u8]) -> Result<Packet, WireError> {
    match decode_inner(buf) {
        Ok(packet) => Ok(packet),
        Err(e) => {
            debug!(error = %e, len = buf.len(), "dropping malformed steering frame");
            Err(e)
        }
    }
}

fn decode_inner(buf: &[u8]) -> Result<Packet, WireError> {
    if buf.len() < HEADER_LEN {
        return Err(WireError::TruncatedHeader);
    }
    if buf[0] != MAGIC {
        return Err(WireError::BadMagic);
    }
    if buf[1] != VERSION {
        return Err(WireError::BadVersion);
    }
    let packet_len = u16::from_be_bytes([buf[2], buf[3]]) as usize;
    let seq = u16::from_be_bytes([buf[4], buf[5]]);
    if packet_len > buf.len() {
        return Err(WireError::PacketLenOverrun);
    }
    let body = &buf[HEADER_LEN..packet_len];

    let mut tlvs = Vec::new();
    let mut cursor = 0usize;
    while cursor < body.len() {
        if body.len() - cursor < TLV_HEADER_LEN {
            return Err(WireError::TruncatedTlvHeader);
        }
        let ty = body[cursor];
        let len = body[cursor + 1] as usize;
        cursor += TLV_HEADER_LEN;
        if body.len() - cursor < len {
            return Err(WireError::TruncatedTlvValue);
        }
        let value = &body[cursor..cursor + len];
        cursor += len;
        match ty {
            TYPE_SCORE => {
                if len != 18 {
                    return Err(WireError::TlvOverrun);
                }
                tlvs.push(Tlv::Score {
                    sta: mac_at(value, 0)?,
                    bssid: mac_at(value, 6)?,
                    score: u16::from_be_bytes([value[12], value[13]]),
                    associated_msecs: u32::from_be_bytes([
                        value[14], value[15], value[16], value[17],
                    ]),
                });
            }
            TYPE_CLOSE_CLIENT => {
                if len != 19 {
                    return Err(WireError::TlvOverrun);
                }
                tlvs.push(Tlv::CloseClient {
                    sta: mac_at(value, 0)?,
                    sender_bssid: mac_at(value, 6)?,
                    target_bssid: mac_at(value, 12)?,
                    channel: value[18],
                });
            }
            TYPE_CLOSED_CLIENT => {
                if len != 12 {
                    return Err(WireError::TlvOverrun);
                }
                tlvs.push(Tlv::ClosedClient {
                    sta: mac_at(value, 0)?,
                    target_bssid: mac_at(value, 6)?,
                });
            }
            _ => {
                // Reserved/unknown type: skip by declared length. Not an
                // error — a version bump is only needed for a new meaning
                // of an *existing* type, never for adding one.
            }
        }
    }
    Ok(Packet { seq, tlvs })
}

fn mac_at(value: &[u8], offset: usize) -> Result<MacAddr, WireError> {
    let slice: &[u8; 6] = value[offset..offset + 6]
        .try_into()
        .map_err(|_| WireError::TruncatedTlvValue)?;
    Ok(MacAddr::from_bytes(slice))
}
