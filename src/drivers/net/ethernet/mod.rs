//! Ethernet controller drivers, by vendor.

pub mod microchip;
