//! Network device abstraction.
//!
//! Two seams face the (external) TCP/IP stack. [`NetworkDevice`] is the
//! conventional frame interface: bytes in local memory in, bytes in local
//! memory out. [`ZeroCopyTx`] is the free-region interface: the stack
//! places a segment's payload directly in controller SRAM as it arrives,
//! then later hands over only the 54-byte header to fire the transmission.
//! The driver never reads back bytes it has already written.

use core::fmt;

use smoltcp::wire::EthernetAddress;

/// Errors surfaced by network device operations.
///
/// Failures here are reported, not fatal: a failed `init()` leaves the
/// system running without a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkError {
    /// Hardware is not present or not responding (bad revision id).
    HardwareNotPresent,

    /// A configuration readback did not match what was written.
    VerificationFailed,

    /// Bounded retry loop exhausted.
    Timeout,

    /// Frame exceeds the maximum the controller accepts.
    FrameTooLarge,
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkError::HardwareNotPresent => write!(f, "Hardware not present"),
            NetworkError::VerificationFailed => write!(f, "Readback verification failed"),
            NetworkError::Timeout => write!(f, "Operation timeout"),
            NetworkError::FrameTooLarge => write!(f, "Frame too large"),
        }
    }
}

/// Frame-level interface to an Ethernet controller.
///
/// Synchronization is the caller's concern: the main loop owns the device
/// and the driver internally suspends its own interrupt source around
/// state shared with the handler.
pub trait NetworkDevice {
    /// Reset and configure the controller with the given MAC address.
    fn init(&mut self, mac: EthernetAddress) -> Result<(), NetworkError>;

    /// Whether the link was up at the last link-change interrupt.
    ///
    /// Cheap; no hardware access.
    fn link_up(&self) -> bool;

    /// Number of received frames waiting in the controller.
    fn pending_packets(&mut self) -> u8;

    /// Queue a complete Ethernet frame for transmission.
    ///
    /// Blocks (bounded) until any previous transmission completes, then
    /// returns once the frame is handed to the controller. Does not wait
    /// for the frame to reach the wire.
    fn transmit(&mut self, frame: &[u8]) -> Result<(), NetworkError>;

    /// Drain one frame into `buffer`.
    ///
    /// Returns the frame length, or 0 when nothing is pending or the
    /// frame was rejected (bad status, or larger than `buffer`). A
    /// rejected frame is consumed either way.
    fn receive_next(&mut self, buffer: &mut [u8]) -> u16;
}

/// Zero-copy transmit path over the controller's free SRAM region.
///
/// Payload accumulates at `free region start + offset + written()`, one
/// chunk at a time; `written()` is the epoch cursor shared by all offsets
/// and only [`restart`](ZeroCopyTx::restart) resets it. The checksum over
/// the streamed bytes is the caller's to accumulate (see
/// [`crate::net::checksum`]); nothing is read back.
pub trait ZeroCopyTx {
    /// Bytes streamed since the last [`restart`](ZeroCopyTx::restart).
    fn written(&self) -> u16;

    /// Reset the write cursor to zero. Never happens implicitly.
    fn restart(&mut self);

    /// Stream `payload` to `free region start + offset + written()` and
    /// advance the cursor.
    fn put_payload(&mut self, offset: u16, payload: &[u8]);

    /// Transmit a frame assembled at `free region start + offset`: writes
    /// the control byte and `header` there, then fires a transmission of
    /// `header.len() + payload_len` bytes. The payload must already be in
    /// place.
    fn transmit_from(&mut self, offset: u16, header: &[u8], payload_len: u16);

    /// Free region bytes not yet covered by the write cursor.
    fn free_capacity(&self) -> u16;
}
