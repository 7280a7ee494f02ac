//! Core value types shared by every component
//!
//! All types in this module are small `Copy` values:
//! - Prices are integer cents (`u64`)
//! - Volumes are whole lots (`u64`)
//! - Inventory is signed lots (`i64`)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Price in integer cents
pub type Price = u64;

/// Volume in lots
pub type Volume = u64;

/// Client-assigned order identifier
///
/// Assigned monotonically by the reconciler starting at 1. The value 0 is
/// reserved for errors that do not refer to any order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct ClientOrderId(pub u64);

impl ClientOrderId {
    /// Id carried by errors that are not scoped to an order
    pub const NONE: ClientOrderId = ClientOrderId(0);

    #[inline(always)]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[inline(always)]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// True for the reserved "not an order" id
    #[inline(always)]
    pub const fn is_none(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ClientOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for ClientOrderId {
    #[inline(always)]
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Order side (Buy or Sell)
///
/// Single byte enum for minimal size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[repr(u8)]
pub enum Side {
    Buy = 0,
    Sell = 1,
}

impl Side {
    /// Both sides, bid first
    pub const BOTH: [Side; 2] = [Side::Buy, Side::Sell];

    #[inline(always)]
    pub const fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// Sign of the inventory change a fill on this side causes
    #[inline(always)]
    pub const fn sign(self) -> i64 {
        match self {
            Side::Buy => 1,
            Side::Sell => -1,
        }
    }

    /// Slot index for per-side tables
    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// How long an order may rest on the book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum TimeInForce {
    /// Rests until filled or cancelled
    GoodForDay = 0,
    /// Fills what it can on arrival, remainder is cancelled
    ImmediateOrCancel = 1,
}

impl fmt::Display for TimeInForce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeInForce::GoodForDay => write!(f, "GFD"),
            TimeInForce::ImmediateOrCancel => write!(f, "IOC"),
        }
    }
}

/// The two instruments the engine observes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Instrument {
    /// Correlated instrument used as fair price and hedge venue
    Reference = 0,
    /// The instrument the engine quotes
    Primary = 1,
}

impl Instrument {
    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instrument::Reference => write!(f, "REFERENCE"),
            Instrument::Primary => write!(f, "PRIMARY"),
        }
    }
}

/// Tick arithmetic on integer cent prices
pub mod ticks {
    use super::Price;

    /// Round down to a whole tick (bid rounding)
    #[inline(always)]
    pub const fn floor(price: Price, tick_size: Price) -> Price {
        price / tick_size * tick_size
    }

    /// Round up to a whole tick (ask rounding)
    #[inline(always)]
    pub const fn ceil(price: Price, tick_size: Price) -> Price {
        price.div_ceil(tick_size) * tick_size
    }

    /// Lowest bid price that is a whole tick strictly above `min_bid`
    #[inline(always)]
    pub const fn min_bid_tick(min_bid: Price, tick_size: Price) -> Price {
        (min_bid + tick_size) / tick_size * tick_size
    }

    /// Highest ask price that is a whole tick at or below `max_ask`
    #[inline(always)]
    pub const fn max_ask_tick(max_ask: Price, tick_size: Price) -> Price {
        max_ask / tick_size * tick_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_helpers() {
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.opposite(), Side::Buy);
        assert_eq!(Side::Buy.sign(), 1);
        assert_eq!(Side::Sell.sign(), -1);
        assert_eq!(Side::Buy.index(), 0);
        assert_eq!(Side::Sell.index(), 1);
    }

    #[test]
    fn test_side_size() {
        assert_eq!(std::mem::size_of::<Side>(), 1);
        assert_eq!(std::mem::size_of::<TimeInForce>(), 1);
        assert_eq!(std::mem::size_of::<Instrument>(), 1);
    }

    #[test]
    fn test_client_order_id_display() {
        assert_eq!(format!("{}", ClientOrderId::new(42)), "#42");
        assert!(ClientOrderId::NONE.is_none());
        assert!(!ClientOrderId::from(7).is_none());
    }

    #[test]
    fn test_tick_rounding() {
        assert_eq!(ticks::floor(10_150, 100), 10_100);
        assert_eq!(ticks::ceil(10_150, 100), 10_200);
        assert_eq!(ticks::ceil(10_100, 100), 10_100);
        assert_eq!(ticks::floor(10_100, 100), 10_100);
    }

    #[test]
    fn test_venue_price_bounds() {
        // Venue accepts bids >= 1 and asks <= i32::MAX cents
        assert_eq!(ticks::min_bid_tick(1, 100), 100);
        assert_eq!(ticks::max_ask_tick(2_147_483_647, 100), 2_147_483_600);
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&Side::Buy).unwrap(), "\"BUY\"");
        assert_eq!(
            serde_json::to_string(&TimeInForce::ImmediateOrCancel).unwrap(),
            "\"IMMEDIATE_OR_CANCEL\""
        );
        assert_eq!(serde_json::to_string(&Instrument::Reference).unwrap(), "\"reference\"");
    }
}
