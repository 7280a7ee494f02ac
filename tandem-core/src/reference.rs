//! Reference price tracker
//!
//! Caches the latest book of the reference instrument. Quoting, hedging and
//! arbitrage read it on the next primary update; nothing reacts to a
//! reference update directly.

use crate::core::{Price, Volume};
use crate::orderbook::BookSnapshot;

/// Top of the reference book
///
/// A price of 0 means that side is absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReferenceQuote {
    pub best_bid_price: Price,
    pub best_bid_volume: Volume,
    pub best_ask_price: Price,
    pub best_ask_volume: Volume,
}

impl ReferenceQuote {
    #[inline]
    pub fn has_bid(&self) -> bool {
        self.best_bid_price != 0
    }

    #[inline]
    pub fn has_ask(&self) -> bool {
        self.best_ask_price != 0
    }
}

/// Latest reference book plus its derived top-of-book
#[derive(Debug, Clone, Default)]
pub struct ReferencePriceTracker {
    book: Option<BookSnapshot>,
    quote: ReferenceQuote,
    updates: u64,
}

impl ReferencePriceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a reference book update, replacing the previous one
    pub fn on_reference_book(&mut self, snapshot: &BookSnapshot) {
        self.quote = ReferenceQuote {
            best_bid_price: snapshot.best_bid_price(),
            best_bid_volume: snapshot.best_bid_volume(),
            best_ask_price: snapshot.best_ask_price(),
            best_ask_volume: snapshot.best_ask_volume(),
        };
        self.book = Some(snapshot.clone());
        self.updates += 1;
    }

    /// Current top-of-book (all zero before the first update)
    #[inline]
    pub fn quote(&self) -> ReferenceQuote {
        self.quote
    }

    /// Full book from the last update, for depth walks
    #[inline]
    pub fn book(&self) -> Option<&BookSnapshot> {
        self.book.as_ref()
    }

    /// Number of reference updates seen
    pub fn updates(&self) -> u64 {
        self.updates
    }
}
