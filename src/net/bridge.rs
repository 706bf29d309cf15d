//! Serial-to-TCP bridge.
//!
//! One TCP session at a time carries a raw byte stream to and from a UART.
//! Incoming UART bytes land in one of two buffers from the receive
//! interrupt; the main loop swaps the buffers under a suspended UART
//! interrupt and streams the filled one straight into the Ethernet
//! controller's free region, checksum accumulated on the way past. The
//! stack is only ever handed a byte count and, at header-build time, the
//! accumulated fragment checksums; payload bytes never come back through
//! local memory.
//!
//! A staged block stays in controller SRAM until the peer ACKs it, so
//! retransmission is a re-send of the same region. No new UART data is
//! streamed while a block is in flight.

use bitflags::bitflags;
use log::{debug, info, warn};
use smoltcp::wire::Ipv4Address;

use crate::drivers::net::netdev::ZeroCopyTx;
use crate::hal::InterruptLine;
use crate::net::checksum::ChecksumAccumulator;
use crate::net::split::{SegmentSplitter, HEADER_LENGTH, TCPIP4_HEADER_LENGTH};
use crate::sync::Suspended;

/// Per-buffer UART receive capacity.
pub const UART_BUFFER_LENGTH: usize = 100;

/// Staged bytes that trigger a flush without waiting for a poll.
const FLUSH_THRESHOLD: u16 = 1000;

bitflags! {
    /// Connection events delivered to [`SerialBridge::poll`], one call per
    /// stack activation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PollFlags: u8 {
        /// A new connection to the bridge port was established.
        const CONNECTED = 1 << 0;
        /// The peer closed the connection.
        const CLOSED = 1 << 1;
        /// The connection was aborted.
        const ABORTED = 1 << 2;
        /// The connection timed out.
        const TIMED_OUT = 1 << 3;
        /// Previously sent data was acknowledged.
        const ACKED = 1 << 4;
        /// Periodic poll; the connection is otherwise idle.
        const POLL = 1 << 5;
        /// The last send was lost and must go out again.
        const REXMIT = 1 << 6;
        /// `new_data` carries bytes from the peer.
        const NEWDATA = 1 << 7;
    }
}

/// Outbound side of the session, implemented by the stack glue.
pub trait Connection {
    /// Send `len` payload bytes already staged in the controller. The
    /// implementation builds the segment header and hands it to
    /// [`SerialBridge::flush_segment`].
    fn send_prepared(&mut self, len: u16);

    /// Close the connection this activation belongs to.
    fn close(&mut self);

    /// Stop listening for new connections.
    fn unlisten(&mut self);
}

/// Byte and event counters, readable at any time.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Statistics {
    /// Payload bytes sent more than once.
    pub retransmitted: u32,
    /// UART bytes dropped because both buffers were full.
    pub net_dropped: u32,
    /// UART bytes the hardware lost to receive overruns.
    pub uart_dropped: u32,
    /// Transfers refused because the controller's free region was full.
    pub controller_full: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Connected,
    /// Close requested locally; performed at the next activation.
    Close,
    /// Close and stop listening; performed at the next activation.
    Shutdown,
}

/// The bridge itself. Owns the UART receive buffers and the session state;
/// the Ethernet device and the TCP stack stay outside and are passed in
/// per call.
pub struct SerialBridge<U: InterruptLine> {
    uart_rx: U,
    state: State,
    peer: Option<(Ipv4Address, u16)>,
    buffers: [[u8; UART_BUFFER_LENGTH]; 2],
    fill: [usize; 2],
    /// Index the UART receive handler fills; the other one belongs to the
    /// main loop.
    write: usize,
    /// Set when a poll came and went without anything to send; the next
    /// staged byte flushes immediately instead of waiting for more.
    polled_without_transfer: bool,
    /// Payload bytes staged and handed to the stack, awaiting an ACK.
    /// Zero when the transfer window is open.
    bytes_in_transfer: u16,
    /// Running payload checksums, one per fragment slot.
    sums: [ChecksumAccumulator; 2],
    splitter: SegmentSplitter,
    stats: Statistics,
}

impl<U: InterruptLine> SerialBridge<U> {
    /// `uart_rx` must start disabled; it is enabled while a session is up.
    pub fn new(uart_rx: U, splitter: SegmentSplitter) -> Self {
        Self {
            uart_rx,
            state: State::Idle,
            peer: None,
            buffers: [[0; UART_BUFFER_LENGTH]; 2],
            fill: [0; 2],
            write: 0,
            polled_without_transfer: false,
            bytes_in_transfer: 0,
            sums: [ChecksumAccumulator::new(); 2],
            splitter,
            stats: Statistics::default(),
        }
    }

    pub fn stats(&self) -> Statistics {
        self.stats
    }

    /// Peer of the active session, if any.
    pub fn peer(&self) -> Option<(Ipv4Address, u16)> {
        self.peer
    }

    /// UART receive handler entry: one byte off the wire.
    pub fn incoming(&mut self, byte: u8) {
        let slot = self.write;
        if self.fill[slot] == UART_BUFFER_LENGTH {
            self.stats.net_dropped += 1;
            return;
        }
        self.buffers[slot][self.fill[slot]] = byte;
        self.fill[slot] += 1;
    }

    /// UART receive handler entry: the hardware reported an overrun.
    pub fn uart_overrun(&mut self) {
        self.stats.uart_dropped += 1;
    }

    /// Whether the main loop should move UART bytes into the controller
    /// now. Holds off until half a buffer accumulated unless a poll
    /// already went by empty-handed, and always while a block is in
    /// flight.
    pub fn should_transfer(&self) -> bool {
        self.fill[self.write] > 0
            && self.bytes_in_transfer == 0
            && (self.fill[self.write] > UART_BUFFER_LENGTH / 2 || self.polled_without_transfer)
    }

    /// Swap the UART buffers and stream the filled one into `device`,
    /// split across the two fragment slots at the splitter's threshold.
    pub fn transfer<T: ZeroCopyTx>(&mut self, device: &mut T) {
        let read = {
            let _rx = Suspended::new(&mut self.uart_rx);
            let filled = self.write;
            // Room for the payload and both header slots. Deferring keeps
            // the bytes in the UART buffer; they go out once the staged
            // block is acknowledged and the region drains.
            if self.fill[filled] as u16 + 2 * TCPIP4_HEADER_LENGTH > device.free_capacity() {
                warn!("bridge: controller full, {} bytes deferred", self.fill[filled]);
                self.stats.controller_full += 1;
                return;
            }
            self.write ^= 1;
            filled
        };
        let len = self.fill[read];
        if len == 0 {
            return;
        }

        let threshold = self.splitter.threshold();
        let written = device.written();
        if written >= threshold {
            // Everything lands in the second fragment.
            self.sums[1].add(&self.buffers[read][..len]);
            device.put_payload(2 * TCPIP4_HEADER_LENGTH, &self.buffers[read][..len]);
        } else if written + len as u16 <= threshold {
            self.sums[0].add(&self.buffers[read][..len]);
            device.put_payload(TCPIP4_HEADER_LENGTH, &self.buffers[read][..len]);
        } else {
            // Straddles the threshold.
            let first = (threshold - written) as usize;
            self.sums[0].add(&self.buffers[read][..first]);
            device.put_payload(TCPIP4_HEADER_LENGTH, &self.buffers[read][..first]);
            self.sums[1].add(&self.buffers[read][first..len]);
            device.put_payload(2 * TCPIP4_HEADER_LENGTH, &self.buffers[read][first..len]);
        }
        self.fill[read] = 0;
        debug!("bridge: staged {} bytes, {} total", len, device.written());
    }

    /// Finalize and transmit the block last handed to the stack, using the
    /// checksums accumulated while it was staged. Called by the stack glue
    /// from [`Connection::send_prepared`], and again on retransmission.
    pub fn flush_segment<T: ZeroCopyTx>(
        &self,
        device: &mut T,
        header: &mut [u8; HEADER_LENGTH],
    ) {
        self.splitter.send(
            device,
            header,
            self.bytes_in_transfer,
            self.sums[0].value(),
            self.sums[1].value(),
        );
    }

    /// Request an orderly close of the active session.
    pub fn disconnect(&mut self) {
        if self.state == State::Connected {
            self.state = State::Close;
        }
    }

    /// Close the session and stop accepting new ones.
    pub fn shutdown(&mut self) {
        if self.state != State::Idle {
            self.state = State::Shutdown;
        }
    }

    fn reset_session(&mut self) {
        info!("bridge: session ended");
        self.state = State::Idle;
        self.peer = None;
        self.uart_rx.disable();
        self.fill = [0; 2];
        self.bytes_in_transfer = 0;
        self.polled_without_transfer = false;
        self.sums[0].clear();
        self.sums[1].clear();
    }

    /// Stack activation entry. `remote` identifies the connection this
    /// activation belongs to; `new_data` carries peer bytes when
    /// [`NEWDATA`](PollFlags::NEWDATA) is set; `on_received` forwards them
    /// to the UART transmit side.
    pub fn poll<C, T, F>(
        &mut self,
        conn: &mut C,
        remote: (Ipv4Address, u16),
        flags: PollFlags,
        new_data: &[u8],
        device: &mut T,
        mut on_received: F,
    ) where
        C: Connection,
        T: ZeroCopyTx,
        F: FnMut(&[u8]),
    {
        if self.state == State::Idle {
            if flags.contains(PollFlags::CONNECTED) {
                info!("bridge: connection from {}:{}", remote.0, remote.1);
                self.peer = Some(remote);
                self.state = State::Connected;
                self.uart_rx.enable();
            }
            return;
        }

        // One session at a time; later connections are turned away.
        if self.peer != Some(remote) {
            if flags.intersects(PollFlags::CONNECTED | PollFlags::POLL) {
                conn.close();
            }
            return;
        }

        if flags.intersects(PollFlags::CLOSED | PollFlags::ABORTED | PollFlags::TIMED_OUT) {
            self.reset_session();
            device.restart();
            return;
        }

        match self.state {
            State::Close => {
                conn.close();
                self.reset_session();
                device.restart();
                return;
            }
            State::Shutdown => {
                conn.close();
                conn.unlisten();
                self.reset_session();
                device.restart();
                return;
            }
            _ => {}
        }

        if flags.contains(PollFlags::NEWDATA) && !new_data.is_empty() {
            on_received(new_data);
        }

        if flags.contains(PollFlags::REXMIT) && self.bytes_in_transfer > 0 {
            debug!("bridge: retransmit {} bytes", self.bytes_in_transfer);
            self.stats.retransmitted += self.bytes_in_transfer as u32;
            conn.send_prepared(self.bytes_in_transfer);
            return;
        }

        if flags.contains(PollFlags::ACKED) {
            debug!("bridge: {} bytes acknowledged", self.bytes_in_transfer);
            self.bytes_in_transfer = 0;
            self.sums[0].clear();
            self.sums[1].clear();
        }

        let staged = device.written();
        if staged > FLUSH_THRESHOLD || (staged > 0 && self.polled_without_transfer) {
            if self.bytes_in_transfer == 0 {
                conn.send_prepared(staged);
                self.bytes_in_transfer = staged;
                device.restart();
                self.polled_without_transfer = false;
            }
        } else if flags.contains(PollFlags::POLL) {
            self.polled_without_transfer = true;
        }
    }
}
