//! Hardware seams.
//!
//! The crate never touches hardware directly; board support implements
//! these traits and hands the implementations to the driver at
//! construction time. The shapes mirror what the driver actually needs:
//! a half-duplex SPI exchange with explicit chip select, microsecond and
//! millisecond delays, and per-source interrupt enable control.

/// One SPI peripheral with the controller's chip-select line.
///
/// A transaction is `select()`, one or more `put()`/`get()` exchanges,
/// `deselect()`. The driver never nests transactions.
pub trait SpiDevice {
    /// Assert chip select.
    fn select(&mut self);

    /// De-assert chip select, ending the transaction.
    fn deselect(&mut self);

    /// Clock one byte out to the device.
    fn put(&mut self, byte: u8);

    /// Clock one byte in from the device.
    fn get(&mut self) -> u8;
}

/// Busy-wait delays. Used only in bounded retry loops.
pub trait Delay {
    fn delay_us(&mut self, us: u32);

    fn delay_ms(&mut self, ms: u32);
}

/// Enable control for one named interrupt source.
///
/// Each instance covers exactly one source (the controller INT line, the
/// UART receive interrupt). Suspending a source is how the main loop
/// guards state shared with that source's handler; see
/// [`crate::sync::Suspended`].
pub trait InterruptLine {
    fn enable(&mut self);

    fn disable(&mut self);

    fn is_enabled(&self) -> bool;
}
