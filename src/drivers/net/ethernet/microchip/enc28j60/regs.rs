//! ENC28J60 register map.
//!
//! Control registers live in four banks of 32, selected through the BSEL
//! bits in ECON1. The last five addresses (0x1B..0x1F) of every bank map
//! to the same registers (EIE, EIR, ESTAT, ECON2, ECON1), so those are
//! reachable without a bank switch. PHY registers are a separate address
//! space reached indirectly through the MII registers in bank 2/3.
//!
//! Source: ENC28J60 datasheet (DS39662E), section 3.1

/// Register addresses are 5 bits wide; everything else in the command byte
/// is opcode.
pub(crate) const REGISTER_MASK: u8 = 0x1F;

/// One of the four control-register banks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bank {
    Bank0 = 0,
    Bank1 = 1,
    Bank2 = 2,
    Bank3 = 3,
}

impl Bank {
    pub(crate) fn bits(self) -> u8 {
        self as u8
    }
}

// ============================================================================
// SPI command set (datasheet section 4.2)
// ============================================================================

pub(crate) const CMD_RCR: u8 = 0x00; // Read Control Register; bits 0-4 are the address
pub(crate) const CMD_WCR: u8 = 0x40; // Write Control Register
pub(crate) const CMD_RBM: u8 = 0x3A; // Read Buffer Memory
pub(crate) const CMD_WBM: u8 = 0x7A; // Write Buffer Memory
pub(crate) const CMD_BFS: u8 = 0x80; // Bit Field Set; ETH registers only
pub(crate) const CMD_BFC: u8 = 0xA0; // Bit Field Clear; ETH registers only
pub(crate) const CMD_SC: u8 = 0xFF; // Soft Reset

// ============================================================================
// Common registers (0x1B..0x1F in every bank)
// ============================================================================

pub(crate) const EIE: u8 = 0x1B;
pub(crate) const EIR: u8 = 0x1C;
pub(crate) const ESTAT: u8 = 0x1D;
pub(crate) const ECON2: u8 = 0x1E;
pub(crate) const ECON1: u8 = 0x1F;

/// EIE: interrupt enables.
pub(crate) const EIE_INTIE: u8 = 1 << 7; // drive the INT pin at all
pub(crate) const EIE_PKTIE: u8 = 1 << 6; // receive packet pending
pub(crate) const EIE_DMAIE: u8 = 1 << 5; // DMA complete
pub(crate) const EIE_LINKIE: u8 = 1 << 4; // PHY link change
pub(crate) const EIE_TXIE: u8 = 1 << 3; // transmit done
pub(crate) const EIE_TXERIE: u8 = 1 << 1; // transmit error
pub(crate) const EIE_RXERIE: u8 = 1 << 0; // receive error (overflow)

/// EIR: interrupt flags.
#[allow(dead_code)] // Hardware spec; unreliable (erratum B7 note 6), EPKTCNT is used instead
pub(crate) const EIR_PKTIF: u8 = 1 << 6;
pub(crate) const EIR_DMAIF: u8 = 1 << 5;
pub(crate) const EIR_LINKIF: u8 = 1 << 4; // cleared by reading PHIR
pub(crate) const EIR_TXIF: u8 = 1 << 3;
pub(crate) const EIR_TXERIF: u8 = 1 << 1;
pub(crate) const EIR_RXERIF: u8 = 1 << 0;

/// ESTAT: status.
pub(crate) const ESTAT_INT: u8 = 1 << 7; // an enabled interrupt is pending
pub(crate) const ESTAT_LATECOL: u8 = 1 << 4;
pub(crate) const ESTAT_TXABRT: u8 = 1 << 1;
#[allow(dead_code)] // Hardware spec; not polled after reset (erratum B7 note 2)
pub(crate) const ESTAT_CLKRDY: u8 = 1 << 0;

/// ECON2.
#[allow(dead_code)] // Hardware spec; set out of reset, never changed
pub(crate) const ECON2_AUTOINC: u8 = 1 << 7;
pub(crate) const ECON2_PKTDEC: u8 = 1 << 6; // decrement EPKTCNT

/// ECON1.
pub(crate) const ECON1_TXRST: u8 = 1 << 7; // transmit logic held in reset
#[allow(dead_code)] // Hardware spec
pub(crate) const ECON1_RXRST: u8 = 1 << 6;
pub(crate) const ECON1_TXRTS: u8 = 1 << 3; // request to send
pub(crate) const ECON1_RXEN: u8 = 1 << 2;
pub(crate) const ECON1_BSEL1: u8 = 1 << 1;
pub(crate) const ECON1_BSEL0: u8 = 1 << 0;

// ============================================================================
// Bank 0: buffer pointers
// ============================================================================

// 16-bit pointers; the high byte sits at the address after the low one.
pub(crate) const ERDPTL: u8 = 0x00; // buffer read pointer
pub(crate) const EWRPTL: u8 = 0x02; // buffer write pointer
pub(crate) const ETXSTL: u8 = 0x04; // transmit start
pub(crate) const ETXNDL: u8 = 0x06; // transmit end (inclusive)
pub(crate) const ERXSTL: u8 = 0x08; // receive buffer start
pub(crate) const ERXNDL: u8 = 0x0A; // receive buffer end (inclusive)
pub(crate) const ERXRDPTL: u8 = 0x0C; // receive read pointer; frees buffer space

// ============================================================================
// Bank 1: filters and packet count
// ============================================================================

pub(crate) const ERXFCON: u8 = 0x18; // receive filter configuration
pub(crate) const EPKTCNT: u8 = 0x19; // pending packet count

pub(crate) const ERXFCON_UCEN: u8 = 1 << 7; // unicast filter
#[allow(dead_code)] // Hardware spec; filters run in OR mode here
pub(crate) const ERXFCON_ANDOR: u8 = 1 << 6; // 1 = AND all enabled filters
pub(crate) const ERXFCON_CRCEN: u8 = 1 << 5; // discard bad CRC
pub(crate) const ERXFCON_BCEN: u8 = 1 << 0; // broadcast filter

// ============================================================================
// Bank 2: MAC and MII (reads need a dummy byte)
// ============================================================================

pub(crate) const MACON1: u8 = 0x00;
pub(crate) const MACON2: u8 = 0x01;
pub(crate) const MACON3: u8 = 0x02;
pub(crate) const MACON4: u8 = 0x03;
pub(crate) const MABBIPG: u8 = 0x04; // back-to-back inter-packet gap
pub(crate) const MAIPGL: u8 = 0x06; // non back-to-back inter-packet gap
pub(crate) const MAIPGH: u8 = 0x07;
pub(crate) const MAMXFLL: u8 = 0x0A; // maximum frame length
pub(crate) const MICMD: u8 = 0x12;
pub(crate) const MIREGADR: u8 = 0x14;
pub(crate) const MIWRL: u8 = 0x16;
pub(crate) const MIWRH: u8 = 0x17; // writing the high byte starts the PHY write
pub(crate) const MIRDL: u8 = 0x18;
pub(crate) const MIRDH: u8 = 0x19;

pub(crate) const MACON1_TXPAUS: u8 = 1 << 3;
pub(crate) const MACON1_RXPAUS: u8 = 1 << 2;
pub(crate) const MACON1_MARXEN: u8 = 1 << 0;

#[allow(dead_code)] // Hardware spec; cleared via a full MACON2 write
pub(crate) const MACON2_MARST: u8 = 1 << 7; // entire MAC held in reset

pub(crate) const MACON3_PADCFG0: u8 = 1 << 5; // pad short frames to 60 + CRC
pub(crate) const MACON3_TXCRCEN: u8 = 1 << 4;
pub(crate) const MACON3_FRMLNEN: u8 = 1 << 1;
pub(crate) const MACON3_FULDPX: u8 = 1 << 0;

pub(crate) const MACON4_PUREPRE: u8 = 1 << 0; // reject frames with damaged preamble

pub(crate) const MICMD_MIIRD: u8 = 1 << 0; // one-shot PHY read

// ============================================================================
// Bank 3: MAC address, MII status, revision
// ============================================================================

// The MAADR registers are numbered against byte order: MAADR1 holds the
// first (most significant) address byte.
pub(crate) const MAADR1: u8 = 0x00;
pub(crate) const MAADR0: u8 = 0x01;
pub(crate) const MAADR3: u8 = 0x02;
pub(crate) const MAADR2: u8 = 0x03;
pub(crate) const MAADR5: u8 = 0x04;
pub(crate) const MAADR4: u8 = 0x05;
pub(crate) const MISTAT: u8 = 0x0A;
pub(crate) const EREVID: u8 = 0x12;

pub(crate) const MISTAT_BUSY: u8 = 1 << 0;

/// Bank 3 MAC/MII registers end at MISTAT; EREVID and up are ETH group.
pub(crate) const BANK3_MII_END: u8 = 0x06;
/// Everything below the common block in bank 2 is MAC/MII.
pub(crate) const BANK2_MII_END: u8 = 0x1B;

// ============================================================================
// PHY registers (indirect)
// ============================================================================

pub(crate) const PHCON1: u8 = 0x00;
pub(crate) const PHCON2: u8 = 0x10;
pub(crate) const PHSTAT2: u8 = 0x11;
pub(crate) const PHIE: u8 = 0x12;
pub(crate) const PHIR: u8 = 0x13; // reading clears the PHY interrupt

pub(crate) const PHCON1_PDPXMD: u16 = 1 << 8; // full duplex

pub(crate) const PHCON2_HDLDIS: u16 = 1 << 8; // no loopback of transmitted frames

pub(crate) const PHSTAT2_LSTAT: u16 = 1 << 10; // link is up

pub(crate) const PHIE_PLNKIE: u16 = 1 << 4; // link change interrupt
pub(crate) const PHIE_PGEIE: u16 = 1 << 1; // PHY global interrupt enable
