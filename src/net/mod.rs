//! Protocol-side building blocks: incremental checksums, TCP segment
//! splitting over controller-resident payloads, and the serial bridge.

pub mod bridge;
pub mod checksum;
pub mod split;

use smoltcp::wire::EthernetAddress;

/// Interpret 6 bytes from external storage as a MAC address.
///
/// The EEPROM convention: an all-zero field means no address has been
/// provisioned.
pub fn eui48(bytes: [u8; 6]) -> Option<EthernetAddress> {
    if bytes == [0; 6] {
        None
    } else {
        Some(EthernetAddress(bytes))
    }
}
