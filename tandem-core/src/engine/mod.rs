//! Decision engine
//!
//! This module contains the engine and the components it owns:
//! - `generic`: the `Engine<G>` aggregate and its event dispatch
//! - `reconciler`: order lifecycle bookkeeping
//! - `quoting`: resting bid/ask management
//! - `hedging`: position ledger and hedge orders
//! - `arbitrage`: IOC orders on crossed books

pub mod arbitrage;
pub mod generic;
pub mod hedging;
pub mod quoting;
pub mod reconciler;

#[cfg(test)]
mod invariant_proptest;

pub use arbitrage::{ArbitrageDetector, ArbitrageOpportunity, ArbitrageStats};
pub use generic::{Engine, EngineStats};
pub use hedging::{HedgeController, HedgeStats, PendingHedge, Position, UnhedgedTimer};
pub use quoting::{QuoteManager, QuoteStats};
pub use reconciler::{Completion, FillOutcome, OrderReconciler};
