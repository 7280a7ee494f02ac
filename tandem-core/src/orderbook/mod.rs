//! Order book snapshots published by the venue
//!
//! The engine never maintains a book incrementally: every update carries the
//! full top-of-book for one instrument and replaces the previous one.

pub mod depth;
pub mod l2_book;

pub use depth::{competing_price, volume_through};
pub use l2_book::{BookSnapshot, Levels, TradeTicks, TOP_LEVEL_COUNT};
