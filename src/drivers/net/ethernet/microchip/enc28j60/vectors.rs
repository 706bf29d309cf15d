//! Hardware status vectors.
//!
//! The controller writes a 6-byte record ahead of every received frame and
//! a 7-byte record after every transmit attempt. Both are little-endian
//! byte streams; they are decoded into named fields here rather than
//! reinterpreted in place.
//!
//! Source: ENC28J60 datasheet (DS39662E), tables 7-1 and 7-3

use bitflags::bitflags;

bitflags! {
    /// Receive status word (vector bits 16..31).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RxStatus: u16 {
        const LONG_DROP_EVENT = 1 << 0;
        const CARRIER_SEEN = 1 << 2;
        const CRC_ERROR = 1 << 4;
        const LENGTH_CHECK_ERROR = 1 << 5;
        const LENGTH_OUT_OF_RANGE = 1 << 6;
        const OK = 1 << 7;
        const MULTICAST = 1 << 8;
        const BROADCAST = 1 << 9;
        const DRIBBLE_NIBBLE = 1 << 10;
        const CONTROL_FRAME = 1 << 11;
        const PAUSE_FRAME = 1 << 12;
        const UNKNOWN_OPCODE = 1 << 13;
        const VLAN = 1 << 14;
    }
}

bitflags! {
    /// Transmit status word (vector bits 16..31, collision count masked
    /// out).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TxStatus: u16 {
        const CRC_ERROR = 1 << 4;
        const LENGTH_CHECK_ERROR = 1 << 5;
        const LENGTH_OUT_OF_RANGE = 1 << 6;
        const DONE = 1 << 7;
        const MULTICAST = 1 << 8;
        const BROADCAST = 1 << 9;
        const DEFERRED = 1 << 10;
        const EXCESSIVE_DEFER = 1 << 11;
        const EXCESSIVE_COLLISION = 1 << 12;
        const LATE_COLLISION = 1 << 13;
        const GIANT = 1 << 14;
    }
}

bitflags! {
    /// Transmit status byte (vector bits 48..55).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TxStatus2: u8 {
        const CONTROL_FRAME = 1 << 0;
        const PAUSE_FRAME = 1 << 1;
        const BACKPRESSURE = 1 << 2;
        const VLAN = 1 << 3;
    }
}

/// Decoded 6-byte receive vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiveVector {
    /// Where the next frame's vector starts in the receive region.
    pub next_packet: u16,
    /// Frame length including CRC.
    pub byte_count: u16,
    pub status: RxStatus,
}

impl ReceiveVector {
    pub fn parse(raw: &[u8; 6]) -> Self {
        Self {
            next_packet: u16::from_le_bytes([raw[0], raw[1]]),
            byte_count: u16::from_le_bytes([raw[2], raw[3]]),
            status: RxStatus::from_bits_retain(u16::from_le_bytes([raw[4], raw[5]])),
        }
    }
}

/// Decoded 7-byte transmit vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransmitVector {
    /// Frame length as queued.
    pub byte_count: u16,
    pub status: TxStatus,
    /// Collision count for the (successful) attempt.
    pub collisions: u8,
    /// Bytes actually put on the wire, padding and retries included.
    pub wire_byte_count: u16,
    pub status2: TxStatus2,
}

impl TransmitVector {
    pub fn parse(raw: &[u8; 7]) -> Self {
        let status_word = u16::from_le_bytes([raw[2], raw[3]]);
        Self {
            byte_count: u16::from_le_bytes([raw[0], raw[1]]),
            status: TxStatus::from_bits_truncate(status_word),
            collisions: (status_word & 0x0F) as u8,
            wire_byte_count: u16::from_le_bytes([raw[4], raw[5]]),
            status2: TxStatus2::from_bits_truncate(raw[6]),
        }
    }
}
