//! Microchip ENC28J60 SPI Ethernet controller.
//!
//! The controller owns 8 KiB of packet SRAM, split here into a receive
//! ring, a transmit slot sized for one maximum frame plus its status
//! vector, and the free region in between used for zero-copy outbound
//! assembly (see [`ZeroCopyTx`]). All access goes through the SPI command
//! set; control registers sit in four switchable banks with the interrupt
//! and ECON registers mapped into every bank.
//!
//! Erratum workarounds carried by this driver (ENC28J60 silicon errata
//! rev. B7):
//! - note 2: no CLKRDY polling after a soft reset; fixed 1 ms wait
//! - note 6: EIR.PKTIF is unreliable; pending packets come from EPKTCNT
//! - note 12: transmit logic is reset before every transmission, not just
//!   after an error; error-only resets still lock up under sustained
//!   traffic
//! - note 14: ERXRDPT is only ever written with an odd address
//!
//! Concurrency: the driver is owned by the main loop; [`interrupt`] runs
//! in the controller's interrupt context. Main-loop operations that touch
//! state the handler also touches suspend the INT line for the duration.
//! The `transmitting` flag is atomic because [`wait`] spins on it while
//! the handler is free to clear it.
//!
//! [`interrupt`]: Enc28j60::interrupt
//! [`wait`]: Enc28j60::wait

#[cfg(test)]
mod mock;
mod regs;
pub mod vectors;

use core::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info, trace, warn};
use smoltcp::wire::EthernetAddress;

use crate::drivers::net::netdev::{NetworkDevice, NetworkError, ZeroCopyTx};
use crate::hal::{Delay, InterruptLine, SpiDevice};
use crate::sync::Suspended;

pub use regs::Bank;
use regs::*;
use vectors::{ReceiveVector, RxStatus, TransmitVector};

/// Largest frame the MAC will receive or transmit.
pub const MAX_FRAME_LENGTH: u16 = 1518;

// SRAM partitioning. The receive ring comes first (erratum B7 note 3) and
// RXEND must be odd (note 14). The transmit slot holds the per-packet
// control byte, one maximum frame and the 7-byte status vector; the free
// region is the gap in between.
pub const RXSTART: u16 = 0x0000;
pub const RXEND: u16 = 0x140D; // inclusive
pub const TXSTART: u16 = 0x1A09;
pub const TXEND: u16 = 0x1FFF; // inclusive

pub const FREESTART: u16 = RXEND + 1;
pub const FREEEND: u16 = TXSTART - 1;
pub const FREE_BUFFER_LENGTH: u16 = FREEEND - FREESTART;

const _: () = assert!(RXEND % 2 == 1);
const _: () = assert!(RXSTART < TXSTART);
const _: () = assert!(TXEND - TXSTART >= 1 + MAX_FRAME_LENGTH + 7);

/// How pending received packets are tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxStrategy {
    /// The main loop polls; [`Enc28j60::pending_packets`] re-reads the
    /// hardware counter lazily when its cache hits zero.
    Polled,
    /// The interrupt dispatcher refreshes the count and masks the
    /// packet-pending interrupt until the backlog is drained.
    InterruptDriven,
}

/// SPI register protocol with the cached bank state.
struct Bus<S: SpiDevice, D: Delay> {
    spi: S,
    delay: D,
    bank: Bank,
}

impl<S: SpiDevice, D: Delay> Bus<S, D> {
    fn soft_reset(&mut self) {
        self.spi.select();
        self.spi.put(CMD_SC);
        self.spi.deselect();
        self.bank = Bank::Bank0;
    }

    /// Switch register banks. No-op when `bank` is `None` (register is
    /// reachable from any bank) or already selected.
    fn select_bank(&mut self, bank: Option<Bank>) {
        let Some(bank) = bank else { return };
        if bank == self.bank {
            return;
        }
        trace!("enc28j60: bank {} -> {}", self.bank.bits(), bank.bits());

        // Clear both select bits, then set the target, leaving the rest
        // of ECON1 untouched.
        self.spi.select();
        self.spi.put(CMD_BFC | (ECON1 & REGISTER_MASK));
        self.spi.put(ECON1_BSEL1 | ECON1_BSEL0);
        self.spi.deselect();

        self.spi.select();
        self.spi.put(CMD_BFS | (ECON1 & REGISTER_MASK));
        self.spi.put(bank.bits());
        self.spi.deselect();

        self.bank = bank;
    }

    /// Read one ETH, MAC or MII register from the current bank.
    fn read_control(&mut self, address: u8) -> u8 {
        self.spi.select();
        self.spi.put(CMD_RCR | (address & REGISTER_MASK));
        // MAC and MII registers clock out a dummy byte before the data;
        // whether one is due depends on the bank selected right now.
        if (self.bank == Bank::Bank2 && address < BANK2_MII_END)
            || (self.bank == Bank::Bank3 && address < BANK3_MII_END)
        {
            self.spi.put(0xFF);
        }
        let value = self.spi.get();
        self.spi.deselect();
        value
    }

    /// Write one ETH, MAC or MII register in the current bank.
    fn write_control(&mut self, address: u8, value: u8) {
        self.spi.select();
        self.spi.put(CMD_WCR | (address & REGISTER_MASK));
        self.spi.put(value);
        self.spi.deselect();
    }

    /// Write a little-endian register pair (`low_register` then its high
    /// neighbour).
    fn write_pair(&mut self, low_register: u8, value: u16) {
        self.write_control(low_register, (value & 0xFF) as u8);
        self.write_control(low_register + 1, (value >> 8) as u8);
    }

    /// Set bits through the BFS command. ETH registers only; the MAC/MII
    /// groups do not implement it.
    fn set_bits(&mut self, address: u8, bank: Option<Bank>, mask: u8) {
        self.select_bank(bank);
        self.spi.select();
        self.spi.put(CMD_BFS | (address & REGISTER_MASK));
        self.spi.put(mask);
        self.spi.deselect();
    }

    /// Clear bits through the BFC command. ETH registers only.
    fn clear_bits(&mut self, address: u8, bank: Option<Bank>, mask: u8) {
        self.select_bank(bank);
        self.spi.select();
        self.spi.put(CMD_BFC | (address & REGISTER_MASK));
        self.spi.put(mask);
        self.spi.deselect();
    }

    /// Read one PHY register through the MII shadow registers.
    ///
    /// Returns 0 when the MII interface never leaves busy; PHY reads have
    /// no error channel beyond that sentinel.
    fn read_phy(&mut self, address: u8) -> u16 {
        self.select_bank(Some(Bank::Bank2));
        self.write_control(MIREGADR, address);
        self.write_control(MICMD, MICMD_MIIRD);

        let mut timeout: u8 = 0;
        self.select_bank(Some(Bank::Bank3));
        while self.read_control(MISTAT) & MISTAT_BUSY != 0 {
            self.delay.delay_ms(1);
            timeout += 1;
            if timeout == 255 {
                warn!("enc28j60: PHY read 0x{:02x} timed out", address);
                return 0;
            }
        }
        self.select_bank(Some(Bank::Bank2));
        self.write_control(MICMD, 0);

        ((self.read_control(MIRDH) as u16) << 8) | self.read_control(MIRDL) as u16
    }

    /// Write one PHY register. The hardware gives no completion or
    /// verification signal for writes.
    fn write_phy(&mut self, address: u8, value: u16) {
        self.select_bank(Some(Bank::Bank2));
        self.write_control(MIREGADR, address);
        self.write_control(MIWRL, (value & 0xFF) as u8);
        self.write_control(MIWRH, (value >> 8) as u8);
    }

    /// Stream bytes from SRAM at the read pointer, which auto-advances.
    fn read_buffer(&mut self, data: &mut [u8]) {
        self.spi.select();
        self.spi.put(CMD_RBM);
        for byte in data.iter_mut() {
            *byte = self.spi.get();
        }
        self.spi.deselect();
    }

    /// Stream bytes to SRAM at the write pointer, which auto-advances.
    /// Repeated calls append.
    fn write_buffer(&mut self, data: &[u8]) {
        self.spi.select();
        self.spi.put(CMD_WBM);
        for byte in data {
            self.spi.put(*byte);
        }
        self.spi.deselect();
    }

    /// Point both the transmit-start and write pointers at `location` and
    /// write the per-packet control byte (zero: defer to MACON3).
    fn start_of_packet(&mut self, location: u16) {
        self.select_bank(Some(Bank::Bank0));
        self.write_pair(ETXSTL, location);
        self.write_pair(EWRPTL, location);

        self.spi.select();
        self.spi.put(CMD_WBM);
        self.spi.put(0);
        self.spi.deselect();
        trace!("enc28j60: start of packet at 0x{:04x}", location);
    }

    /// Reposition the SRAM write pointer without touching transmit-start.
    fn set_write_pointer(&mut self, location: u16) {
        self.select_bank(Some(Bank::Bank0));
        self.write_pair(EWRPTL, location);
    }

    /// Reposition the SRAM read pointer.
    fn set_read_pointer(&mut self, location: u16) {
        self.select_bank(Some(Bank::Bank0));
        self.write_pair(ERDPTL, location);
    }
}

/// Transmit-side state shared between the main loop and the interrupt
/// handler.
struct TxState {
    /// Where the hardware will drop the status vector for the transmission
    /// in flight.
    status_location: u16,
    /// Set when a transmission is triggered, cleared by the handler on
    /// completion. Atomic: [`Enc28j60::wait`] spins on it with the
    /// interrupt enabled.
    transmitting: AtomicBool,
    /// Raw copy of the last transmit status vector.
    last_vector: [u8; 7],
}

/// Program the transmission window and fire it.
///
/// Free function over the split-out fields so callers can hold the
/// interrupt suspension guard while calling it.
fn transmit_at<S: SpiDevice, D: Delay>(
    bus: &mut Bus<S, D>,
    tx: &mut TxState,
    location: u16,
    length: u16,
) {
    bus.select_bank(Some(Bank::Bank0));
    // ETXND points at the last payload byte; the control byte at
    // `location` makes up the +1.
    bus.write_pair(ETXNDL, location + length);
    // The status vector lands right after the packet.
    tx.status_location = location + length + 1;

    // Reset the transmit logic before every attempt (erratum B7 note 12),
    // then drop the error flag the reset itself may raise.
    bus.set_bits(ECON1, None, ECON1_TXRST);
    bus.clear_bits(ECON1, None, ECON1_TXRST);
    bus.clear_bits(EIR, None, EIR_TXERIF);

    debug!("enc28j60: transmit {} bytes from 0x{:04x}", length, location);
    tx.transmitting.store(true, Ordering::Release);
    bus.set_bits(ECON1, None, ECON1_TXRTS);
}

/// ENC28J60 driver instance.
///
/// Construct with [`new`](Self::new), then [`init`](Self::init) before
/// anything else. The instance is the single owner of the chip; the board
/// glue calls [`interrupt`](Self::interrupt) from the INT line's handler
/// and everything else from the main loop.
pub struct Enc28j60<S: SpiDevice, D: Delay, L: InterruptLine> {
    bus: Bus<S, D>,
    int_line: L,
    rx_strategy: RxStrategy,
    link_up: bool,
    half_duplex: bool,
    /// Cached EPKTCNT. Refreshed per [`RxStrategy`].
    pending: u8,
    /// Latched on receive overflow until one frame is drained.
    buffer_full: bool,
    /// Where the next frame's status vector starts in the receive ring.
    next_packet: u16,
    last_rx_vector: [u8; 6],
    tx: TxState,
    /// Zero-copy write cursor; reset only by [`Self::freebuffer_restart`].
    freebuffer_written: u16,
}

impl<S: SpiDevice, D: Delay, L: InterruptLine> Enc28j60<S, D, L> {
    pub fn new(spi: S, delay: D, int_line: L, rx_strategy: RxStrategy) -> Self {
        Self {
            bus: Bus {
                spi,
                delay,
                bank: Bank::Bank0,
            },
            int_line,
            rx_strategy,
            link_up: false,
            half_duplex: true,
            pending: 0,
            buffer_full: false,
            next_packet: RXSTART,
            last_rx_vector: [0; 6],
            tx: TxState {
                status_location: 0,
                transmitting: AtomicBool::new(false),
                last_vector: [0; 7],
            },
            freebuffer_written: 0,
        }
    }

    /// Bring the controller up in half-duplex mode with the given MAC
    /// address.
    ///
    /// Failure leaves the system running without a network; the caller
    /// decides whether to retry or carry on degraded.
    pub fn init(&mut self, mac: EthernetAddress) -> Result<(), NetworkError> {
        self.bus.soft_reset();
        // CLKRDY cannot be polled right after a soft reset (erratum B7
        // note 2); a fixed wait stands in.
        self.bus.delay.delay_ms(1);

        self.bus.select_bank(Some(Bank::Bank3));
        let revid = self.bus.read_control(EREVID);
        debug!("enc28j60: REVID=0x{:02x}", revid);
        if revid == 0x00 || revid == 0xFF {
            warn!("enc28j60: invalid revision id, controller not responding");
            return Err(NetworkError::HardwareNotPresent);
        }

        // Receive ring bounds and read pointer.
        self.bus.select_bank(Some(Bank::Bank0));
        self.bus.write_pair(ERXSTL, RXSTART);
        self.bus.write_pair(ERXNDL, RXEND);
        self.bus.write_pair(ERXRDPTL, RXSTART);
        self.next_packet = RXSTART;

        // Accept frames addressed to us or broadcast, with a valid CRC.
        self.bus.select_bank(Some(Bank::Bank1));
        self.bus
            .write_control(ERXFCON, ERXFCON_UCEN | ERXFCON_CRCEN | ERXFCON_BCEN);

        // MAC out of reset, reception enabled, half duplex framing.
        self.bus.select_bank(Some(Bank::Bank2));
        self.bus.write_control(MACON2, 0);
        self.bus.write_control(MACON1, MACON1_MARXEN);
        self.bus
            .write_control(MACON3, MACON3_PADCFG0 | MACON3_TXCRCEN | MACON3_FRMLNEN);
        self.bus.write_control(MACON4, MACON4_PUREPRE);
        self.bus.write_pair(MAMXFLL, MAX_FRAME_LENGTH);
        // Half duplex inter-packet gaps.
        self.bus.write_control(MABBIPG, 0x12);
        self.bus.write_control(MAIPGL, 0x12);
        self.bus.write_control(MAIPGH, 0x0C);

        // MAC address; MAADR1 holds the first byte of the address.
        let octets = mac.as_bytes();
        self.bus.select_bank(Some(Bank::Bank3));
        self.bus.write_control(MAADR0, octets[5]);
        self.bus.write_control(MAADR1, octets[4]);
        self.bus.write_control(MAADR2, octets[3]);
        self.bus.write_control(MAADR3, octets[2]);
        self.bus.write_control(MAADR4, octets[1]);
        self.bus.write_control(MAADR5, octets[0]);

        if self.bus.read_control(MAADR0) != octets[5]
            || self.bus.read_control(MAADR1) != octets[4]
            || self.bus.read_control(MAADR2) != octets[3]
            || self.bus.read_control(MAADR3) != octets[2]
            || self.bus.read_control(MAADR4) != octets[1]
            || self.bus.read_control(MAADR5) != octets[0]
        {
            warn!("enc28j60: MAC readback verification failed");
            return Err(NetworkError::VerificationFailed);
        }

        // PHY: half duplex, no loopback of our own transmissions.
        self.bus.write_phy(PHCON1, 0);
        self.half_duplex = true;
        self.bus.write_phy(PHCON2, PHCON2_HDLDIS);

        self.link_up = false;
        self.pending = 0;
        self.buffer_full = false;
        self.tx.transmitting.store(false, Ordering::Relaxed);
        self.freebuffer_written = 0;

        // Interrupt sources: everything except wake-on-LAN; the
        // packet-pending source only when the dispatcher tracks the count.
        self.bus.write_phy(PHIE, PHIE_PLNKIE | PHIE_PGEIE);
        let mut sources = EIE_INTIE | EIE_DMAIE | EIE_LINKIE | EIE_TXIE | EIE_TXERIE | EIE_RXERIE;
        if self.rx_strategy == RxStrategy::InterruptDriven {
            sources |= EIE_PKTIE;
        }
        self.bus.write_control(EIE, sources);

        // BFS rather than a full ECON1 write: the bank select bits in
        // there must stay in step with the cache.
        self.bus.set_bits(ECON1, None, ECON1_RXEN);

        info!("enc28j60: up, silicon revision 0x{:02x}", revid);
        Ok(())
    }

    /// Switch between half and full duplex.
    ///
    /// MAC and PHY are reprogrammed under a suspended INT line so the
    /// handler never observes the half-configured state.
    pub fn set_duplex(&mut self, full: bool) {
        let _int = Suspended::new(&mut self.int_line);

        self.bus.select_bank(Some(Bank::Bank2));
        if full {
            self.bus.write_control(
                MACON1,
                MACON1_MARXEN | MACON1_TXPAUS | MACON1_RXPAUS,
            );
            self.bus.write_control(
                MACON3,
                MACON3_PADCFG0 | MACON3_TXCRCEN | MACON3_FRMLNEN | MACON3_FULDPX,
            );
            self.bus.write_control(MABBIPG, 0x15);
            self.bus.write_control(MAIPGL, 0x12);
            self.bus.write_phy(PHCON1, PHCON1_PDPXMD);
        } else {
            self.bus.write_control(MACON1, MACON1_MARXEN);
            self.bus
                .write_control(MACON3, MACON3_PADCFG0 | MACON3_TXCRCEN | MACON3_FRMLNEN);
            self.bus.write_control(MABBIPG, 0x12);
            self.bus.write_control(MAIPGH, 0x0C);
            self.bus.write_phy(PHCON1, 0);
        }
        self.half_duplex = !full;
        info!("enc28j60: {} duplex", if full { "full" } else { "half" });
    }

    /// Link state as of the last link-change interrupt.
    pub fn link_up(&self) -> bool {
        self.link_up
    }

    /// Current duplex configuration.
    pub fn full_duplex(&self) -> bool {
        !self.half_duplex
    }

    /// Wait out a transmission still in flight.
    ///
    /// Bounded by a full u16 wrap of 1 us polls; on timeout the
    /// transmission is written off and the caller proceeds, clobbering it.
    fn wait(&mut self) {
        if !self.tx.transmitting.load(Ordering::Acquire) {
            return;
        }
        trace!("enc28j60: waiting for previous transmission");
        let mut spins: u16 = 0;
        while self.tx.transmitting.load(Ordering::Acquire) {
            self.bus.delay.delay_us(1);
            spins = spins.wrapping_add(1);
            if spins == 0 {
                warn!("enc28j60: previous transmission timed out");
                break;
            }
        }
    }

    /// Queue a complete frame from local memory through the transmit slot.
    pub fn put(&mut self, frame: &[u8]) -> Result<(), NetworkError> {
        if frame.len() > MAX_FRAME_LENGTH as usize {
            return Err(NetworkError::FrameTooLarge);
        }
        self.wait();
        let _int = Suspended::new(&mut self.int_line);
        self.bus.start_of_packet(TXSTART);
        self.bus.write_buffer(frame);
        transmit_at(&mut self.bus, &mut self.tx, TXSTART, frame.len() as u16);
        Ok(())
    }

    /// Number of received frames waiting in the ring.
    pub fn pending_packets(&mut self) -> u8 {
        if self.rx_strategy == RxStrategy::Polled && self.pending == 0 {
            let _int = Suspended::new(&mut self.int_line);
            self.bus.select_bank(Some(Bank::Bank1));
            self.pending = self.bus.read_control(EPKTCNT);
            if self.pending > 0 {
                debug!("enc28j60: {} pending packets", self.pending);
            }
        }
        self.pending
    }

    /// Drain one frame from the receive ring into `buffer`.
    ///
    /// Returns the frame length, or 0 when nothing is pending or the frame
    /// was rejected (status not OK, or it does not fit `buffer`). A
    /// rejected frame still frees its ring space.
    pub fn receive_next(&mut self, buffer: &mut [u8]) -> u16 {
        if self.pending == 0 {
            return 0;
        }

        let _int = Suspended::new(&mut self.int_line);

        self.bus.set_read_pointer(self.next_packet);
        trace!("enc28j60: read frame at 0x{:04x}", self.next_packet);

        let mut raw = [0u8; 6];
        self.bus.read_buffer(&mut raw);
        self.last_rx_vector = raw;
        let vector = ReceiveVector::parse(&raw);
        self.next_packet = vector.next_packet;

        let accept = vector.status.contains(RxStatus::OK)
            && vector.byte_count as usize <= buffer.len();
        if accept {
            self.bus
                .read_buffer(&mut buffer[..vector.byte_count as usize]);
        } else {
            debug!(
                "enc28j60: dropping frame, {} bytes, status 0x{:04x}",
                vector.byte_count,
                vector.status.bits()
            );
        }

        // Free the ring space. ERXRDPT must stay odd (erratum B7 note 14):
        // one before the next frame, or RXEND when the next frame wrapped.
        if vector.next_packet == RXSTART {
            self.bus.write_pair(ERXRDPTL, RXEND);
        } else {
            self.bus.write_pair(ERXRDPTL, vector.next_packet - 1);
        }
        self.bus.set_bits(ECON2, None, ECON2_PKTDEC);
        self.pending -= 1;

        if self.buffer_full {
            // One frame drained; rearm the overflow interrupt.
            self.bus.clear_bits(EIR, None, EIR_RXERIF);
            self.bus.set_bits(EIE, None, EIE_RXERIE);
            self.buffer_full = false;
        }

        if self.rx_strategy == RxStrategy::InterruptDriven {
            // Rearm the packet-pending source the dispatcher masked.
            self.bus.set_bits(EIE, None, EIE_PKTIE);
        }

        if accept { vector.byte_count } else { 0 }
    }

    /// Interrupt service entry, to be called on the INT line's falling
    /// edge.
    ///
    /// `on_link_change` fires exactly once per observed link transition.
    pub fn interrupt<F: FnMut(bool)>(&mut self, mut on_link_change: F) {
        // Dropping INTIE de-asserts the INT pin for the duration; setting
        // it again on exit produces a fresh edge if more events arrived.
        self.bus.clear_bits(EIE, None, EIE_INTIE);

        loop {
            let flags = self.bus.read_control(EIR);
            trace!("enc28j60: interrupt flags 0x{:02x}", flags);

            if flags & EIR_DMAIF != 0 {
                self.bus.clear_bits(EIR, None, EIR_DMAIF);
            }
            if flags & EIR_LINKIF != 0 {
                // Reading PHIR clears the PHY-side interrupt.
                self.bus.read_phy(PHIR);
                let up = self.bus.read_phy(PHSTAT2) & PHSTAT2_LSTAT != 0;
                if up != self.link_up {
                    self.link_up = up;
                    info!("enc28j60: link {}", if up { "up" } else { "down" });
                    on_link_change(up);
                }
            }
            if flags & EIR_TXIF != 0 {
                self.bus.clear_bits(EIR, None, EIR_TXIF);
                self.bus.set_read_pointer(self.tx.status_location);
                let mut raw = [0u8; 7];
                self.bus.read_buffer(&mut raw);
                self.tx.last_vector = raw;
                if log::log_enabled!(log::Level::Debug) {
                    let vector = TransmitVector::parse(&raw);
                    debug!(
                        "enc28j60: transmit done, {} bytes in packet, {} on wire",
                        vector.byte_count, vector.wire_byte_count
                    );
                }
                self.tx.transmitting.store(false, Ordering::Release);
            }
            if flags & EIR_TXERIF != 0 {
                debug!("enc28j60: transmit error");
                self.bus
                    .clear_bits(ESTAT, None, ESTAT_LATECOL | ESTAT_TXABRT);
                self.bus.set_bits(ECON1, None, ECON1_TXRST);
                self.bus.clear_bits(ECON1, None, ECON1_TXRST);
                self.bus.clear_bits(EIR, None, EIR_TXERIF);
            }
            if flags & EIR_RXERIF != 0 {
                // Ring overflow. Latch once and mask the source; an
                // interrupt per rejected frame would starve everything
                // else until the consumer catches up.
                if !self.buffer_full {
                    self.buffer_full = true;
                    self.bus.clear_bits(EIE, None, EIE_RXERIE);
                    warn!("enc28j60: receive buffer overflow");
                }
            }
            if self.rx_strategy == RxStrategy::InterruptDriven {
                // EIR.PKTIF cannot be trusted (erratum B7 note 6); EPKTCNT
                // is the authoritative count.
                self.bus.select_bank(Some(Bank::Bank1));
                self.pending = self.bus.read_control(EPKTCNT);
                if self.pending > 0 {
                    self.bus.clear_bits(EIE, None, EIE_PKTIE);
                }
            }

            if self.bus.read_control(ESTAT) & ESTAT_INT == 0 {
                break;
            }
        }

        self.bus.set_bits(EIE, None, EIE_INTIE);
    }

    /// Transmit a frame already assembled in SRAM: `length` bytes starting
    /// at the control byte at `location`.
    pub fn put_transmit(&mut self, location: u16, length: u16) {
        transmit_at(&mut self.bus, &mut self.tx, location, length);
    }

    /// Stream payload into the free region at
    /// `FREESTART + offset + written` and advance the cursor.
    pub fn put_freebuffer_payload(&mut self, offset: u16, payload: &[u8]) {
        {
            let _int = Suspended::new(&mut self.int_line);
            self.bus
                .set_write_pointer(FREESTART + offset + self.freebuffer_written);
            self.bus.write_buffer(payload);
        }
        self.freebuffer_written += payload.len() as u16;
    }

    /// Reset the zero-copy write cursor. Callers do this after handing the
    /// accumulated bytes to the stack; nothing resets it implicitly.
    pub fn freebuffer_restart(&mut self) {
        self.freebuffer_written = 0;
    }

    /// Bytes streamed into the free region since the last restart.
    pub fn freebuffer_written(&self) -> u16 {
        self.freebuffer_written
    }

    /// Transmit a frame assembled in the free region: write the control
    /// byte and `header` at `FREESTART + offset`, then fire a transmission
    /// covering the payload already streamed behind the header.
    pub fn put_freebuffer(&mut self, offset: u16, header: &[u8], payload_len: u16) {
        self.wait();
        let _int = Suspended::new(&mut self.int_line);
        let location = FREESTART + offset;
        self.bus.start_of_packet(location);
        self.bus.write_buffer(header);
        transmit_at(
            &mut self.bus,
            &mut self.tx,
            location,
            header.len() as u16 + payload_len,
        );
    }

    /// Last transmit status vector, as captured by the dispatcher.
    pub fn last_transmit_vector(&self) -> TransmitVector {
        TransmitVector::parse(&self.tx.last_vector)
    }

    /// Status vector of the last drained frame.
    pub fn last_receive_vector(&self) -> ReceiveVector {
        ReceiveVector::parse(&self.last_rx_vector)
    }
}

impl<S: SpiDevice, D: Delay, L: InterruptLine> NetworkDevice for Enc28j60<S, D, L> {
    fn init(&mut self, mac: EthernetAddress) -> Result<(), NetworkError> {
        Enc28j60::init(self, mac)
    }

    fn link_up(&self) -> bool {
        Enc28j60::link_up(self)
    }

    fn pending_packets(&mut self) -> u8 {
        Enc28j60::pending_packets(self)
    }

    fn transmit(&mut self, frame: &[u8]) -> Result<(), NetworkError> {
        self.put(frame)
    }

    fn receive_next(&mut self, buffer: &mut [u8]) -> u16 {
        Enc28j60::receive_next(self, buffer)
    }
}

impl<S: SpiDevice, D: Delay, L: InterruptLine> ZeroCopyTx for Enc28j60<S, D, L> {
    fn written(&self) -> u16 {
        self.freebuffer_written
    }

    fn restart(&mut self) {
        self.freebuffer_restart();
    }

    fn put_payload(&mut self, offset: u16, payload: &[u8]) {
        self.put_freebuffer_payload(offset, payload);
    }

    fn transmit_from(&mut self, offset: u16, header: &[u8], payload_len: u16) {
        self.put_freebuffer(offset, header, payload_len);
    }

    fn free_capacity(&self) -> u16 {
        FREE_BUFFER_LENGTH.saturating_sub(self.freebuffer_written)
    }
}
