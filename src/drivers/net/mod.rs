//! Network device drivers.

pub mod ethernet;
pub mod netdev;
