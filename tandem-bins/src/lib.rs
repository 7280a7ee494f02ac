//! Runners for the tandem engine
//!
//! - `common`: CLI arguments, logging setup, config loading, final report
//! - `venue`: loopback venue answering the engine's commands

pub mod common;
pub mod venue;
