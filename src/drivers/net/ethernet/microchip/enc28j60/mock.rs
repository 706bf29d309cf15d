//! Software model of the controller for host tests.
//!
//! Decodes the SPI command stream byte by byte against modelled register
//! banks, 8 KiB of SRAM and a PHY shadow, so the driver under test runs
//! against the same observable protocol the real chip speaks. Knobs cover
//! the failure injections the tests need: revision id, MAC readback
//! corruption, a stuck-busy MII interface, link state.

use std::cell::RefCell;
use std::rc::Rc;

use super::regs::*;
use crate::hal::{Delay, InterruptLine, SpiDevice};

const SRAM_SIZE: usize = 8192;

/// Events worth ordering assertions, in the order the chip saw them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Event {
    TxRstSet,
    TxRstClear,
    TxErifCleared,
    TxRts,
}

enum Xfer {
    Idle,
    /// RCR issued; response bytes queued front to back.
    Read { queued: Vec<u8> },
    Wcr { address: u8 },
    Bfs { address: u8 },
    Bfc { address: u8 },
    Rbm,
    Wbm,
}

pub(super) struct Chip {
    regs: [[u8; 32]; 4],
    pub sram: [u8; SRAM_SIZE],
    pub phy: [u16; 32],

    // Failure injection knobs.
    pub revid: u8,
    /// Bank 3 register whose reads come back bit-flipped.
    pub corrupt_readback: Option<u8>,
    /// MISTAT reads reporting busy before the MII interface settles.
    pub phy_busy_reads: u32,

    // Observation counters.
    pub control_writes: usize,
    pub bank_switches: usize,
    pub epktcnt_reads: usize,
    pub events: Vec<Event>,

    xfer: Xfer,
}

impl Chip {
    fn new() -> Self {
        let mut chip = Self {
            regs: [[0; 32]; 4],
            sram: [0; SRAM_SIZE],
            phy: [0; 32],
            revid: 0x06,
            corrupt_readback: None,
            phy_busy_reads: 0,
            control_writes: 0,
            bank_switches: 0,
            epktcnt_reads: 0,
            events: Vec::new(),
            xfer: Xfer::Idle,
        };
        chip.power_on_defaults();
        chip
    }

    fn power_on_defaults(&mut self) {
        self.regs = [[0; 32]; 4];
        self.regs[0][ECON2 as usize] = ECON2_AUTOINC;
        self.regs[1][ERXFCON as usize] = ERXFCON_UCEN | ERXFCON_CRCEN | ERXFCON_BCEN;
        self.regs[3][EREVID as usize] = self.revid;
    }

    /// Bank currently selected through ECON1.
    fn bank(&self) -> usize {
        (self.regs[0][ECON1 as usize] & 0x03) as usize
    }

    /// The common block (0x1B..0x1F) lives in bank 0's storage.
    fn slot(&mut self, address: u8) -> &mut u8 {
        let bank = if address >= EIE { 0 } else { self.bank() };
        &mut self.regs[bank][address as usize]
    }

    pub fn reg(&self, bank: usize, address: u8) -> u8 {
        let bank = if address >= EIE { 0 } else { bank };
        self.regs[bank][address as usize]
    }

    pub fn set_reg(&mut self, bank: usize, address: u8, value: u8) {
        let bank = if address >= EIE { 0 } else { bank };
        self.regs[bank][address as usize] = value;
    }

    fn reg16(&self, bank: usize, low: u8) -> u16 {
        u16::from_le_bytes([self.reg(bank, low), self.reg(bank, low + 1)])
    }

    fn set_reg16(&mut self, bank: usize, low: u8, value: u16) {
        let [l, h] = value.to_le_bytes();
        self.set_reg(bank, low, l);
        self.set_reg(bank, low + 1, h);
    }

    pub fn erdpt(&self) -> u16 {
        self.reg16(0, ERDPTL)
    }

    pub fn ewrpt(&self) -> u16 {
        self.reg16(0, EWRPTL)
    }

    pub fn etxnd(&self) -> u16 {
        self.reg16(0, ETXNDL)
    }

    pub fn erxrdpt(&self) -> u16 {
        self.reg16(0, ERXRDPTL)
    }

    /// Place a frame plus its 6-byte status vector in the receive ring and
    /// bump the packet counter.
    pub fn inject_frame(&mut self, at: u16, next_packet: u16, status: u16, frame: &[u8]) {
        let mut vector = [0u8; 6];
        vector[0..2].copy_from_slice(&next_packet.to_le_bytes());
        vector[2..4].copy_from_slice(&(frame.len() as u16).to_le_bytes());
        vector[4..6].copy_from_slice(&status.to_le_bytes());
        for (i, byte) in vector.iter().chain(frame.iter()).enumerate() {
            self.sram[(at as usize + i) % SRAM_SIZE] = *byte;
        }
        self.regs[1][EPKTCNT as usize] += 1;
    }

    /// Complete the transmission in flight: status vector written where
    /// the driver expects it, TXIF raised, TXRTS dropped.
    pub fn complete_transmit(&mut self, vector: [u8; 7]) {
        let at = self.etxnd() as usize + 1;
        for (i, byte) in vector.iter().enumerate() {
            self.sram[(at + i) % SRAM_SIZE] = *byte;
        }
        self.regs[0][ECON1 as usize] &= !ECON1_TXRTS;
        self.regs[0][EIR as usize] |= EIR_TXIF;
    }

    fn control_value(&mut self, address: u8) -> u8 {
        let bank = self.bank();
        if bank == 3 {
            if address == MISTAT {
                if self.phy_busy_reads > 0 {
                    self.phy_busy_reads -= 1;
                    return MISTAT_BUSY;
                }
                return 0;
            }
            if address == EREVID {
                return self.revid;
            }
            if address < 0x06 && self.corrupt_readback == Some(address) {
                return !self.reg(bank, address);
            }
        }
        if bank == 1 && address == EPKTCNT {
            self.epktcnt_reads += 1;
        }
        self.reg(bank, address)
    }

    /// Dummy-byte rule for MAC/MII register reads, as the silicon applies
    /// it for the currently selected bank.
    fn needs_dummy(&self, address: u8) -> bool {
        let bank = self.bank();
        (bank == 2 && address < BANK2_MII_END) || (bank == 3 && address < BANK3_MII_END)
    }

    fn start_command(&mut self, byte: u8) {
        self.xfer = match byte >> 5 {
            0 => {
                let address = byte & REGISTER_MASK;
                let value = self.control_value(address);
                let mut queued = Vec::new();
                if self.needs_dummy(address) {
                    queued.push(0x5A);
                }
                queued.push(value);
                Xfer::Read { queued }
            }
            1 => Xfer::Rbm,
            2 => Xfer::Wcr {
                address: byte & REGISTER_MASK,
            },
            3 => Xfer::Wbm,
            4 => Xfer::Bfs {
                address: byte & REGISTER_MASK,
            },
            5 => Xfer::Bfc {
                address: byte & REGISTER_MASK,
            },
            7 => {
                self.power_on_defaults();
                Xfer::Idle
            }
            _ => Xfer::Idle,
        };
    }

    fn write_control(&mut self, address: u8, value: u8) {
        self.control_writes += 1;
        *self.slot(address) = value;

        let bank = self.bank();
        if bank == 2 {
            let mii_address = self.reg(2, MIREGADR) as usize % 32;
            if address == MICMD && value & MICMD_MIIRD != 0 {
                // One-shot PHY read; reading PHIR clears the link-change
                // interrupt.
                self.set_reg16(2, MIRDL, self.phy[mii_address]);
                if mii_address == PHIR as usize {
                    self.regs[0][EIR as usize] &= !EIR_LINKIF;
                    self.phy[PHIR as usize] = 0;
                }
            }
            if address == MIWRH {
                self.phy[mii_address] = self.reg16(2, MIWRL);
            }
        }
    }

    fn bit_field(&mut self, address: u8, mask: u8, set: bool) {
        if address == ECON1 {
            if set && mask & ECON1_TXRST != 0 {
                self.events.push(Event::TxRstSet);
            }
            if !set && mask & ECON1_TXRST != 0 {
                self.events.push(Event::TxRstClear);
            }
            if set && mask & ECON1_TXRTS != 0 {
                self.events.push(Event::TxRts);
            }
            if !set && mask & (ECON1_BSEL1 | ECON1_BSEL0) != 0 {
                self.bank_switches += 1;
            }
        }
        if address == EIR && !set && mask & EIR_TXERIF != 0 {
            self.events.push(Event::TxErifCleared);
        }
        if address == ECON2 && set && mask & ECON2_PKTDEC != 0 {
            let count = &mut self.regs[1][EPKTCNT as usize];
            *count = count.saturating_sub(1);
            return;
        }

        let slot = self.slot(address);
        if set {
            *slot |= mask;
        } else {
            *slot &= !mask;
        }
    }

    fn spi_put(&mut self, byte: u8) {
        // During a read, every byte the master clocks (the throwaway write
        // before a MAC/MII read) advances the response stream by one.
        if let Xfer::Read { queued } = &mut self.xfer {
            if !queued.is_empty() {
                queued.remove(0);
            }
            return;
        }
        match self.xfer {
            Xfer::Idle => self.start_command(byte),
            Xfer::Read { .. } => unreachable!(),
            Xfer::Wcr { address } => self.write_control(address, byte),
            Xfer::Bfs { address } => self.bit_field(address, byte, true),
            Xfer::Bfc { address } => self.bit_field(address, byte, false),
            Xfer::Wbm => {
                let at = self.ewrpt();
                self.sram[at as usize % SRAM_SIZE] = byte;
                self.set_reg16(0, EWRPTL, (at + 1) % SRAM_SIZE as u16);
            }
            Xfer::Rbm => {}
        }
    }

    fn spi_get(&mut self) -> u8 {
        if let Xfer::Read { queued } = &mut self.xfer {
            return if queued.is_empty() { 0 } else { queued.remove(0) };
        }
        if matches!(self.xfer, Xfer::Rbm) {
            let at = self.erdpt();
            let value = self.sram[at as usize % SRAM_SIZE];
            // The read pointer wraps with the receive ring.
            let next = if at == self.reg16(0, ERXNDL) {
                self.reg16(0, ERXSTL)
            } else {
                (at + 1) % SRAM_SIZE as u16
            };
            self.set_reg16(0, ERDPTL, next);
            return value;
        }
        0
    }
}

/// SPI endpoint handed to the driver; shares the chip with the test.
pub(super) struct MockSpi {
    chip: Rc<RefCell<Chip>>,
}

impl MockSpi {
    pub fn new() -> (Self, Rc<RefCell<Chip>>) {
        let chip = Rc::new(RefCell::new(Chip::new()));
        (Self { chip: chip.clone() }, chip)
    }
}

impl SpiDevice for MockSpi {
    fn select(&mut self) {}

    fn deselect(&mut self) {
        self.chip.borrow_mut().xfer = Xfer::Idle;
    }

    fn put(&mut self, byte: u8) {
        self.chip.borrow_mut().spi_put(byte);
    }

    fn get(&mut self) -> u8 {
        self.chip.borrow_mut().spi_get()
    }
}

#[derive(Default)]
pub(super) struct MockDelay {
    pub us_calls: Rc<RefCell<u32>>,
    pub ms_calls: Rc<RefCell<u32>>,
}

impl Delay for MockDelay {
    fn delay_us(&mut self, _us: u32) {
        *self.us_calls.borrow_mut() += 1;
    }

    fn delay_ms(&mut self, _ms: u32) {
        *self.ms_calls.borrow_mut() += 1;
    }
}

pub(super) struct MockLine {
    pub enabled: bool,
}

impl MockLine {
    pub fn new() -> Self {
        Self { enabled: true }
    }
}

impl InterruptLine for MockLine {
    fn enable(&mut self) {
        self.enabled = true;
    }

    fn disable(&mut self) {
        self.enabled = false;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}
