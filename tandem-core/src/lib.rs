//! Tandem Core - Market-Making Decision Engine
//!
//! Tandem quotes a primary instrument around the price of a correlated
//! reference instrument and lays off the resulting inventory in the reference
//! market. It is a single-threaded state machine: every inbound event is
//! handled to completion, and every outbound command goes through an
//! [`execution::OrderGateway`].
//!
//! ## Architecture
//! - **One owner**: the `Engine` holds all state; no locks, no shared mutation
//! - **Integer units**: prices in cents, volumes in lots, positions signed
//! - **Generic gateway**: `Engine<G: OrderGateway>` is monomorphized per venue
//! - **Explicit lifecycle**: every order walks the `core::order_fsm` states
//!
//! ## Core Modules
//! - `core`: value types, the order state machine and domain errors
//! - `config`: engine configuration (TOML) and compile-time defaults
//! - `orderbook`: top-of-book snapshots and depth queries
//! - `reference`: reference price tracking
//! - `events`: the inbound event stream
//! - `execution`: the outbound gateway trait and a recording implementation
//! - `engine`: the reconciler, quoting, hedging and arbitrage components

pub mod config;
pub mod core;
pub mod engine;
pub mod events;
pub mod execution;
pub mod orderbook;
pub mod reference;

// Mock venue and builders (enabled in tests or with the "testing" feature)
#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export core types
pub use core::{
    ClientOrderId, Instrument, OrderState, Price, RestingOrder, Side, TimeInForce, Volume,
};

pub use config::{EngineConfig, HedgeMode};
pub use engine::{Engine, EngineStats, Position};
pub use events::Event;
pub use execution::{Command, OrderGateway, RecordingGateway};
pub use orderbook::{BookSnapshot, TradeTicks};
pub use reference::{ReferencePriceTracker, ReferenceQuote};

// Re-export error types
pub use anyhow::{Error, Result};

/// Prelude for convenient imports
pub mod prelude {
    // Core types
    pub use crate::core::{ClientOrderId, Instrument, Price, Side, TimeInForce, Volume};

    // Engine
    pub use crate::config::EngineConfig;
    pub use crate::engine::{Engine, EngineStats};

    // Events and execution
    pub use crate::events::Event;
    pub use crate::execution::{Command, OrderGateway};
    pub use crate::orderbook::{BookSnapshot, TradeTicks};

    // Error types
    pub use crate::{Error, Result};
}
