//! Serial-to-Ethernet bridge core.
//!
//! This crate owns the hard part of a UART-to-TCP bridge built around an
//! SPI-attached ENC28J60 Ethernet controller: the controller driver itself
//! (SRAM layout, register protocol, interrupt-driven packet lifecycle,
//! errata workarounds), a zero-copy transmit path that assembles outgoing
//! TCP segments directly in controller SRAM, a segment splitter with
//! incremental checksums, and the serial bridge that feeds it.
//!
//! The TCP/IP stack itself is an external collaborator; it reaches this
//! crate through the [`drivers::net::netdev::NetworkDevice`] and
//! [`drivers::net::netdev::ZeroCopyTx`] traits. Chip bring-up and interrupt
//! dispatch plumbing stay outside as well, behind the [`hal`] traits.
//!
//! ## Concurrency model
//!
//! Single core, two tiers: interrupt handlers and a cooperative main loop.
//! State shared between the tiers is protected by suspending the one
//! interrupt source that can touch it, via [`sync::Suspended`]. There are
//! no locks and nothing here blocks; every wait is a bounded retry loop.

#![cfg_attr(not(test), no_std)]

pub mod drivers;
pub mod hal;
pub mod net;
pub mod sync;
