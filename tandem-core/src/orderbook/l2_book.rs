//! L2 book snapshot - top-N levels of one instrument
//!
//! The venue publishes the top [`TOP_LEVEL_COUNT`] levels per side on every
//! update. A price of 0 means the level (and every level after it) is empty.
//!
//! - Bids are sorted descending: `[best, ..., worst]`
//! - Asks are sorted ascending: `[best, ..., worst]`

use crate::core::{Instrument, Price, Side, Volume};
use serde::{Deserialize, Serialize};

/// Number of price levels published per side
pub const TOP_LEVEL_COUNT: usize = 5;

/// One side of the book as parallel price/volume arrays
pub type Levels = [u64; TOP_LEVEL_COUNT];

/// A full book update for one instrument
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSnapshot {
    pub instrument: Instrument,
    pub sequence: u64,
    pub ask_prices: Levels,
    pub ask_volumes: Levels,
    pub bid_prices: Levels,
    pub bid_volumes: Levels,
}

impl BookSnapshot {
    /// Create an empty book (no quotes on either side)
    pub fn empty(instrument: Instrument, sequence: u64) -> Self {
        Self {
            instrument,
            sequence,
            ask_prices: [0; TOP_LEVEL_COUNT],
            ask_volumes: [0; TOP_LEVEL_COUNT],
            bid_prices: [0; TOP_LEVEL_COUNT],
            bid_volumes: [0; TOP_LEVEL_COUNT],
        }
    }

    /// Get best bid price (level 0), 0 if no bids
    #[inline(always)]
    pub fn best_bid_price(&self) -> Price {
        self.bid_prices[0]
    }

    /// Get best ask price (level 0), 0 if no asks
    #[inline(always)]
    pub fn best_ask_price(&self) -> Price {
        self.ask_prices[0]
    }

    /// Get best bid volume (level 0)
    #[inline(always)]
    pub fn best_bid_volume(&self) -> Volume {
        self.bid_volumes[0]
    }

    /// Get best ask volume (level 0)
    #[inline(always)]
    pub fn best_ask_volume(&self) -> Volume {
        self.ask_volumes[0]
    }

    /// Price and volume arrays for the resting orders of `side`
    ///
    /// `Side::Buy` is the bid side, `Side::Sell` the ask side.
    #[inline]
    pub fn side(&self, side: Side) -> (&Levels, &Levels) {
        match side {
            Side::Buy => (&self.bid_prices, &self.bid_volumes),
            Side::Sell => (&self.ask_prices, &self.ask_volumes),
        }
    }

    /// Non-empty levels of one side, best first
    pub fn levels(&self, side: Side) -> impl Iterator<Item = (Price, Volume)> + '_ {
        let (prices, volumes) = self.side(side);
        prices
            .iter()
            .zip(volumes.iter())
            .take_while(|(price, _)| **price != 0)
            .map(|(price, volume)| (*price, *volume))
    }

    /// Mid price, `None` unless both sides are quoted
    ///
    /// Uses overflow-safe calculation: bid/2 + ask/2 + (bid%2 + ask%2)/2
    #[inline]
    pub fn mid_price(&self) -> Option<Price> {
        let bid = self.best_bid_price();
        let ask = self.best_ask_price();
        if bid == 0 || ask == 0 {
            return None;
        }
        Some(bid / 2 + ask / 2 + (bid % 2 + ask % 2) / 2)
    }
}

/// Trades that printed on one instrument since the previous report
///
/// Same layout as a book snapshot: `ask_*` are trades that lifted offers,
/// `bid_*` trades that hit bids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeTicks {
    pub instrument: Instrument,
    pub sequence: u64,
    pub ask_prices: Levels,
    pub ask_volumes: Levels,
    pub bid_prices: Levels,
    pub bid_volumes: Levels,
}

impl TradeTicks {
    /// Total traded volume across both sides
    pub fn total_volume(&self) -> Volume {
        let side = |prices: &Levels, volumes: &Levels| -> Volume {
            prices
                .iter()
                .zip(volumes.iter())
                .take_while(|(price, _)| **price != 0)
                .map(|(_, volume)| *volume)
                .sum()
        };
        side(&self.ask_prices, &self.ask_volumes) + side(&self.bid_prices, &self.bid_volumes)
    }

    /// First reported trade price (asks before bids), `None` if nothing traded
    pub fn last_price(&self) -> Option<Price> {
        [self.ask_prices[0], self.bid_prices[0]]
            .into_iter()
            .find(|p| *p != 0)
    }
}
