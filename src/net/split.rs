//! Outbound TCP segment splitting.
//!
//! Peers that delay their ACKs stall a single-segment-window connection:
//! one segment in flight, no ACK for 200 ms, nothing more to send. Sending
//! every oversized segment as two back-to-back fragments makes the peer
//! ACK immediately (two segments force it) and keeps the pipe moving.
//!
//! The payload never passes through local memory. The caller streams it
//! into the controller's free region as it arrives, split at the threshold
//! (first fragment's bytes behind the first header slot, the rest behind
//! the second), and accumulates a checksum per fragment. This module only
//! finalizes the two headers in place and fires the transmissions.

use log::debug;
use smoltcp::wire::{Ipv4Packet, TcpPacket};

use crate::drivers::net::netdev::ZeroCopyTx;
use crate::net::checksum;

/// Ethernet + IPv4 + TCP header, no options.
pub const HEADER_LENGTH: usize = 14 + 20 + 20;

/// SRAM footprint of one prepared header: the per-packet control byte
/// plus [`HEADER_LENGTH`]. Payload for a packet assembled at free-region
/// offset `n` starts at `n + TCPIP4_HEADER_LENGTH`.
pub const TCPIP4_HEADER_LENGTH: u16 = 1 + HEADER_LENGTH as u16;

const IP_OFFSET: usize = 14;
const TCP_OFFSET: usize = 34;

/// Rewrite the IP and TCP headers in place for a fragment carrying
/// `payload_len` bytes whose running checksum is `payload_sum`.
fn finalize(header: &mut [u8; HEADER_LENGTH], payload_len: u16, payload_sum: u16) {
    {
        let mut ip = Ipv4Packet::new_unchecked(&mut header[IP_OFFSET..TCP_OFFSET]);
        ip.set_total_len(40 + payload_len);
        ip.fill_checksum();
    }

    {
        let mut tcp = TcpPacket::new_unchecked(&mut header[TCP_OFFSET..]);
        tcp.set_checksum(0);
    }
    // Pseudo-header: TCP length, protocol 6, then both addresses straight
    // out of the IP header.
    let mut acc = checksum::sum(20 + payload_len + 6, &header[IP_OFFSET + 12..TCP_OFFSET]);
    acc = checksum::sum(acc, &header[TCP_OFFSET..]);
    let field = checksum::finish(checksum::combine(acc, payload_sum));

    let mut tcp = TcpPacket::new_unchecked(&mut header[TCP_OFFSET..]);
    tcp.set_checksum(field);
}

/// Splits prepared segments at a fixed payload threshold.
#[derive(Debug, Clone, Copy)]
pub struct SegmentSplitter {
    threshold: u16,
}

impl SegmentSplitter {
    pub const fn new(threshold: u16) -> Self {
        Self { threshold }
    }

    /// First-fragment payload capacity in bytes.
    pub fn threshold(&self) -> u16 {
        self.threshold
    }

    /// Send a prepared segment, split in two when its payload exceeds the
    /// threshold.
    ///
    /// `header` is the segment's header as the stack built it; the total
    /// length, sequence number of the second fragment and both checksums
    /// are filled in here. The payload must already sit in `device`'s free
    /// region: the first `threshold` bytes behind offset
    /// [`TCPIP4_HEADER_LENGTH`], any remainder behind
    /// `2 * TCPIP4_HEADER_LENGTH + threshold`. `first_sum` and
    /// `second_sum` are the running checksums over those two runs;
    /// `second_sum` is ignored when no split happens.
    pub fn send<T: ZeroCopyTx>(
        &self,
        device: &mut T,
        header: &mut [u8; HEADER_LENGTH],
        payload_len: u16,
        first_sum: u16,
        second_sum: u16,
    ) {
        if payload_len <= self.threshold {
            finalize(header, payload_len, first_sum);
            device.transmit_from(0, header, payload_len);
            return;
        }

        let first = self.threshold;
        let second = payload_len - first;
        debug!("split: {} bytes as {} + {}", payload_len, first, second);

        finalize(header, first, first_sum);
        device.transmit_from(0, header, first);

        {
            let mut tcp = TcpPacket::new_unchecked(&mut header[TCP_OFFSET..]);
            let seq = tcp.seq_number();
            tcp.set_seq_number(seq + first as usize);
        }
        finalize(header, second, second_sum);
        device.transmit_from(TCPIP4_HEADER_LENGTH + first, header, second);
    }
}
