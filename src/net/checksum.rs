//! Incremental Internet checksum.
//!
//! The zero-copy transmit path streams payload bytes into controller SRAM
//! and never reads them back, so the TCP checksum over the payload has to
//! be accumulated while the bytes go past. Payloads arrive in arbitrary
//! chunks (whatever the UART delivered between polls), so an accumulator
//! must carry an odd trailing byte across calls: a chunk ending mid-word
//! leaves its last byte as the high half of a word whose low half is the
//! first byte of the next chunk.
//!
//! smoltcp's own checksum helpers are not exposed and work on complete
//! in-memory buffers anyway, hence this module.

/// One's-complement add with end-around carry.
fn add(a: u16, b: u16) -> u16 {
    let (sum, carry) = a.overflowing_add(b);
    sum + carry as u16
}

/// Sum `data` as big-endian 16-bit words into `init`.
///
/// A trailing odd byte is taken as the high half of a final word. Use this
/// for complete runs (headers, pseudo-header fields); use
/// [`ChecksumAccumulator`] when a run is delivered in chunks.
pub fn sum(init: u16, data: &[u8]) -> u16 {
    let mut acc = init;
    let mut chunks = data.chunks_exact(2);
    for word in &mut chunks {
        acc = add(acc, u16::from_be_bytes([word[0], word[1]]));
    }
    if let [last] = chunks.remainder() {
        acc = add(acc, (*last as u16) << 8);
    }
    acc
}

/// Combine two running sums, as if the second's data followed the first's.
///
/// Only valid when the first sum covers an even number of bytes.
pub fn combine(a: u16, b: u16) -> u16 {
    add(a, b)
}

/// Finalize a TCP/UDP checksum field from a running sum.
///
/// A sum of zero folds to 0xFFFF first; one's-complement arithmetic has
/// two encodings of zero and the wire convention uses the all-ones one.
pub fn finish(sum: u16) -> u16 {
    if sum == 0 { !0xFFFF } else { !sum }
}

/// Running one's-complement sum with cross-call byte parity.
///
/// Feeding the same bytes in any chunking yields the same sum.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChecksumAccumulator {
    sum: u16,
    odd: bool,
}

impl ChecksumAccumulator {
    pub const fn new() -> Self {
        Self { sum: 0, odd: false }
    }

    /// Reset to the empty sum.
    pub fn clear(&mut self) {
        self.sum = 0;
        self.odd = false;
    }

    /// Append a chunk to the running sum.
    pub fn add(&mut self, data: &[u8]) {
        let mut data = data;
        if self.odd && !data.is_empty() {
            // pair the dangling high byte with this chunk's first byte
            self.sum = add(self.sum, data[0] as u16);
            self.odd = false;
            data = &data[1..];
        }
        self.sum = sum(self.sum, data);
        self.odd ^= data.len() % 2 == 1;
    }

    /// The running sum. A dangling odd byte is included as a high byte.
    pub fn value(&self) -> u16 {
        self.sum
    }
}
