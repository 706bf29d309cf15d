//! Device drivers, organized by class.

pub mod net;
