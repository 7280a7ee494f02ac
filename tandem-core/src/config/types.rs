use super::constants::*;
use crate::core::Price;
use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Maximum absolute primary position (lots)
    pub position_limit: u64,

    /// Price increment in cents
    pub tick_size: Price,

    /// Lowest bid price we will ever send
    pub min_bid_tick: Price,

    /// Highest ask price we will ever send
    pub max_ask_tick: Price,

    pub quote: QuotePolicy,
    pub hedge: HedgePolicy,
    pub arbitrage: ArbitragePolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            position_limit: POSITION_LIMIT,
            tick_size: TICK_SIZE,
            min_bid_tick: MIN_BID_NEAREST_TICK,
            max_ask_tick: MAX_ASK_NEAREST_TICK,
            quote: QuotePolicy::default(),
            hedge: HedgePolicy::default(),
            arbitrage: ArbitragePolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Clearance in cents
    #[inline]
    pub fn clearance(&self) -> Price {
        self.quote.clearance_ticks * self.tick_size
    }

    /// Reprice tolerance in cents
    #[inline]
    pub fn reprice_tolerance(&self) -> Price {
        self.quote.reprice_tolerance_ticks * self.tick_size
    }

    /// Position limit as a signed quantity
    #[inline]
    pub fn limit(&self) -> i64 {
        self.position_limit as i64
    }
}

/// How the quote manager prices its orders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QuotePolicy {
    /// Distance from the reference price, in ticks
    pub clearance_ticks: u64,

    /// Step one tick inside a competing quote when that stays profitable
    pub improve_competitors: bool,

    /// Live quotes within this many ticks of the ideal price are left alone
    pub reprice_tolerance_ticks: u64,
}

impl Default for QuotePolicy {
    fn default() -> Self {
        Self {
            clearance_ticks: CLEARANCE_TICKS,
            improve_competitors: true,
            reprice_tolerance_ticks: REPRICE_TOLERANCE_TICKS,
        }
    }
}

/// When hedge orders are sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HedgeMode {
    /// Hedge once the imbalance persists for `max_unhedged_ticks`
    Timer,
    /// Hedge every primary fill immediately with the same volume
    EveryFill,
}

impl Default for HedgeMode {
    #[cfg(not(feature = "hedge-every-fill"))]
    fn default() -> Self {
        HedgeMode::Timer
    }

    #[cfg(feature = "hedge-every-fill")]
    fn default() -> Self {
        HedgeMode::EveryFill
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HedgePolicy {
    pub mode: HedgeMode,

    /// Net exposure (lots) that does not count as unhedged
    pub tolerance: u64,

    /// Imbalanced primary ticks tolerated before hedging
    pub max_unhedged_ticks: u64,
}

impl Default for HedgePolicy {
    fn default() -> Self {
        Self {
            mode: HedgeMode::default(),
            tolerance: HEDGE_TOLERANCE,
            max_unhedged_ticks: MAX_UNHEDGED_TICKS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArbitragePolicy {
    pub enabled: bool,
}

impl Default for ArbitragePolicy {
    fn default() -> Self {
        Self { enabled: true }
    }
}
