//! Compile-time defaults for the engine configuration
//!
//! Every value here can be overridden in the TOML config; the constants only
//! decide what an omitted key means. A few can also be flipped with Cargo
//! features for builds that never read a config file.

use crate::core::{ticks, Price};

// ===== POSITION LIMITS =====

/// Maximum absolute position in the primary instrument (lots)
/// Default: 100 lots
#[cfg(not(feature = "position-limit-200"))]
pub const POSITION_LIMIT: u64 = 100;
#[cfg(feature = "position-limit-200")]
pub const POSITION_LIMIT: u64 = 200;

// ===== PRICE GRID =====

/// Price increment in cents
pub const TICK_SIZE: Price = 100;

/// Lowest bid the venue accepts (cents)
pub const MINIMUM_BID: Price = 1;

/// Highest ask the venue accepts (cents)
pub const MAXIMUM_ASK: Price = i32::MAX as Price;

/// Lowest whole-tick bid; sell hedges are priced here
pub const MIN_BID_NEAREST_TICK: Price = ticks::min_bid_tick(MINIMUM_BID, TICK_SIZE);

/// Highest whole-tick ask; buy hedges are priced here
pub const MAX_ASK_NEAREST_TICK: Price = ticks::max_ask_tick(MAXIMUM_ASK, TICK_SIZE);

// ===== QUOTING =====

/// Distance between the reference price and our quote, in ticks
pub const CLEARANCE_TICKS: u64 = 1;

/// Price drift tolerated before a live quote is replaced, in ticks
/// Default: 0 (any move reprices)
pub const REPRICE_TOLERANCE_TICKS: u64 = 0;

// ===== HEDGING =====

/// Net exposure (lots) tolerated without counting toward the hedge timer
pub const HEDGE_TOLERANCE: u64 = 10;

/// Consecutive imbalanced primary ticks before a hedge is sent
pub const MAX_UNHEDGED_TICKS: u64 = 20;
