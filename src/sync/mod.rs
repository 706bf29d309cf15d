//! Synchronization primitives.

mod suspend;

pub use suspend::Suspended;
