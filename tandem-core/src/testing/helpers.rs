//! Test helper utilities for creating events and engines
//!
//! Provides convenient builders for:
//! - Book snapshots and trade ticks
//! - Lifecycle events
//! - Engines wired to a recording gateway

use crate::config::EngineConfig;
use crate::core::{ClientOrderId, Instrument, Price, Volume};
use crate::engine::Engine;
use crate::events::Event;
use crate::execution::{Command, RecordingGateway};
use crate::orderbook::{BookSnapshot, TOP_LEVEL_COUNT};

/// Builder for book snapshots; levels are appended best first
#[derive(Debug, Clone)]
pub struct BookBuilder {
    book: BookSnapshot,
    bids: usize,
    asks: usize,
}

impl BookBuilder {
    pub fn new(instrument: Instrument, sequence: u64) -> Self {
        Self {
            book: BookSnapshot::empty(instrument, sequence),
            bids: 0,
            asks: 0,
        }
    }

    /// Append the next bid level (ignored once all levels are used)
    pub fn bid(mut self, price: Price, volume: Volume) -> Self {
        if self.bids < TOP_LEVEL_COUNT {
            self.book.bid_prices[self.bids] = price;
            self.book.bid_volumes[self.bids] = volume;
            self.bids += 1;
        }
        self
    }

    /// Append the next ask level (ignored once all levels are used)
    pub fn ask(mut self, price: Price, volume: Volume) -> Self {
        if self.asks < TOP_LEVEL_COUNT {
            self.book.ask_prices[self.asks] = price;
            self.book.ask_volumes[self.asks] = volume;
            self.asks += 1;
        }
        self
    }

    pub fn build(self) -> BookSnapshot {
        self.book
    }

    pub fn event(self) -> Event {
        Event::BookUpdate(self.book)
    }
}

/// Reference book with one level per side (0 = side absent)
pub fn reference_book(sequence: u64, bid: Price, ask: Price) -> Event {
    top_of_book(Instrument::Reference, sequence, bid, ask)
}

/// Primary book with one level per side (0 = side absent)
pub fn primary_book(sequence: u64, bid: Price, ask: Price) -> Event {
    top_of_book(Instrument::Primary, sequence, bid, ask)
}

fn top_of_book(instrument: Instrument, sequence: u64, bid: Price, ask: Price) -> Event {
    let mut builder = BookBuilder::new(instrument, sequence);
    if bid != 0 {
        builder = builder.bid(bid, 10);
    }
    if ask != 0 {
        builder = builder.ask(ask, 10);
    }
    builder.event()
}

pub fn order_filled(id: ClientOrderId, price: Price, volume: Volume) -> Event {
    Event::OrderFilled { id, price, volume }
}

pub fn order_status(id: ClientOrderId, filled: Volume, remaining: Volume) -> Event {
    Event::OrderStatus {
        id,
        filled_volume: filled,
        remaining_volume: remaining,
        fees: 0,
    }
}

/// Engine with default config and a recording gateway
pub fn create_test_engine() -> Engine<RecordingGateway> {
    create_engine_with(EngineConfig::default())
}

pub fn create_engine_with(config: EngineConfig) -> Engine<RecordingGateway> {
    Engine::new(config, RecordingGateway::new())
}

/// Hedge commands recorded so far
pub fn hedges(gateway: &RecordingGateway) -> Vec<Command> {
    gateway
        .commands()
        .iter()
        .filter(|c| matches!(c, Command::Hedge { .. }))
        .copied()
        .collect()
}

/// Submit commands recorded so far
pub fn submits(gateway: &RecordingGateway) -> Vec<Command> {
    gateway
        .commands()
        .iter()
        .filter(|c| matches!(c, Command::Submit { .. }))
        .copied()
        .collect()
}
