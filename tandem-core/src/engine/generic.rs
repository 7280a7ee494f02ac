//! Decision engine - generic over the order gateway
//!
//! One `Engine<G>` value owns every piece of state. Events are handled one at
//! a time to completion; every reaction is a gateway call made before
//! `handle` returns.
//!
//! ## Engine Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  Engine<G: OrderGateway>                                         │
//! │                                                                  │
//! │  ReferencePriceTracker   latest reference book                   │
//! │  OrderReconciler         active orders, side slots, id counter   │
//! │  QuoteManager            one GFD order per side                  │
//! │  HedgeController         unhedged timer, pending hedges          │
//! │  ArbitrageDetector       IOC orders on crossed books             │
//! │  Position                inventory, cash, fees                   │
//! │  G                       outbound commands                       │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Primary Book Pipeline
//!
//! ```text
//!        handle(BookUpdate(primary))
//!                    │
//!                    ▼
//!        ┌──────────────────────┐
//!        │ HedgeController      │  timer tick, maybe hedge
//!        └──────────────────────┘
//!                    │
//!                    ▼
//!        ┌──────────────────────┐
//!        │ ArbitrageDetector    │  crossed books → IOC
//!        └──────────────────────┘
//!                    │
//!                    ▼
//!        ┌──────────────────────┐
//!        │ QuoteManager         │  submit / reprice / amend / cancel
//!        └──────────────────────┘
//! ```
//!
//! Reference updates only refresh the cached reference book; the next
//! primary update acts on it.

use super::arbitrage::{ArbitrageDetector, ArbitrageStats};
use super::hedging::{HedgeController, HedgeStats, Position};
use super::quoting::{QuoteManager, QuoteStats};
use super::reconciler::{Completion, FillOutcome, OrderReconciler};
use crate::config::EngineConfig;
use crate::core::{ClientOrderId, Instrument, Price, Progress, TimeInForce, Volume};
use crate::events::Event;
use crate::execution::OrderGateway;
use crate::orderbook::{BookSnapshot, TradeTicks};
use crate::reference::ReferencePriceTracker;
use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Last sequence number per instrument for one message stream
#[derive(Debug, Clone, Copy, Default)]
struct SequenceTracker {
    last: [Option<u64>; 2],
}

impl SequenceTracker {
    /// Record `sequence`; returns the previous high-water mark on regression
    #[inline]
    fn observe(&mut self, instrument: Instrument, sequence: u64) -> Option<u64> {
        let slot = &mut self.last[instrument.index()];
        match *slot {
            Some(last) if sequence < last => Some(last),
            _ => {
                *slot = Some(sequence);
                None
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Counters {
    events: u64,
    primary_updates: u64,
    reference_updates: u64,
    trade_ticks: u64,
    sequence_regressions: u64,
    venue_errors: u64,
    rejects: u64,
    late_fills: u64,
    traded_volume: [Volume; 2],
    last_trade_price: [Option<Price>; 2],
    last_mid: [Option<Price>; 2],
}

/// Decision engine
///
/// Type parameter:
/// - `G`: order gateway (a real venue connection, or [`RecordingGateway`] in
///   tests and replays)
///
/// [`RecordingGateway`]: crate::execution::RecordingGateway
pub struct Engine<G: OrderGateway> {
    config: EngineConfig,
    gateway: G,
    reference: ReferencePriceTracker,
    reconciler: OrderReconciler,
    quotes: QuoteManager,
    hedging: HedgeController,
    arbitrage: ArbitrageDetector,
    position: Position,
    book_sequences: SequenceTracker,
    trade_sequences: SequenceTracker,
    counters: Counters,
    shutdown: Arc<AtomicBool>,
}

impl<G: OrderGateway> Engine<G> {
    /// Create a new engine
    ///
    /// The config is expected to be validated already (see
    /// [`EngineConfig::validate`]).
    pub fn new(config: EngineConfig, gateway: G) -> Self {
        info!(
            gateway = gateway.name(),
            position_limit = config.position_limit,
            tick_size = config.tick_size,
            hedge_mode = ?config.hedge.mode,
            arbitrage = config.arbitrage.enabled,
            "Initializing engine"
        );

        Self {
            config,
            gateway,
            reference: ReferencePriceTracker::new(),
            reconciler: OrderReconciler::new(),
            quotes: QuoteManager::new(),
            hedging: HedgeController::new(),
            arbitrage: ArbitrageDetector::new(),
            position: Position::new(),
            book_sequences: SequenceTracker::default(),
            trade_sequences: SequenceTracker::default(),
            counters: Counters::default(),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get shutdown signal for graceful termination
    pub fn shutdown_signal(&self) -> Arc<AtomicBool> {
        self.shutdown.clone()
    }

    /// Process one inbound event to completion
    pub fn handle(&mut self, event: &Event) {
        self.counters.events += 1;

        match event {
            Event::BookUpdate(book) => {
                self.check_sequence(book.instrument, book.sequence, false);
                match book.instrument {
                    Instrument::Reference => self.on_reference_book(book),
                    Instrument::Primary => self.on_primary_book(book),
                }
            }
            Event::TradeTicks(ticks) => {
                self.check_sequence(ticks.instrument, ticks.sequence, true);
                self.on_trade_ticks(ticks);
            }
            Event::OrderFilled { id, price, volume } => self.on_order_filled(*id, *price, *volume),
            Event::OrderStatus {
                id,
                filled_volume,
                remaining_volume,
                fees,
            } => self.on_order_status(*id, *filled_volume, *remaining_volume, *fees),
            Event::HedgeFilled { id, price, volume } => self.on_hedge_filled(*id, *price, *volume),
            Event::Error { id, message } => self.on_error(*id, message),
        }
        self.settle_retired_fees();
    }

    /// Run the engine over an event source
    ///
    /// `feed_fn` gets the gateway between events so a loopback venue can turn
    /// the commands just sent into responses. Stops when the feed ends or the
    /// shutdown signal is set.
    pub fn run<F>(&mut self, mut feed_fn: F) -> Result<EngineStats>
    where
        F: FnMut(&mut G) -> Result<Option<Event>>,
    {
        info!("Starting engine main loop");

        while !self.shutdown.load(Ordering::Acquire) {
            match feed_fn(&mut self.gateway)? {
                Some(event) => self.handle(&event),
                None => {
                    info!("Event feed ended");
                    break;
                }
            }
        }

        let stats = self.stats();
        info!(?stats, "Engine stopped");
        Ok(stats)
    }

    /// Cancel every active order and prepare for shutdown
    pub fn shutdown(&mut self) {
        let cancelled = self.reconciler.cancel_all(&mut self.gateway);
        self.settle_retired_fees();
        info!(cancelled, "Shutting down engine");
        self.shutdown.store(true, Ordering::Release);
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn gateway_mut(&mut self) -> &mut G {
        &mut self.gateway
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn reconciler(&self) -> &OrderReconciler {
        &self.reconciler
    }

    pub fn reference(&self) -> &ReferencePriceTracker {
        &self.reference
    }

    pub fn hedging(&self) -> &HedgeController {
        &self.hedging
    }

    /// Snapshot of counters and inventory
    pub fn stats(&self) -> EngineStats {
        let c = &self.counters;
        let mark_to_market = match (
            c.last_mid[Instrument::Primary.index()],
            c.last_mid[Instrument::Reference.index()],
        ) {
            (Some(primary), Some(reference)) => {
                Some(self.position.mark_to_market(primary, reference))
            }
            _ => None,
        };

        EngineStats {
            events_processed: c.events,
            primary_updates: c.primary_updates,
            reference_updates: c.reference_updates,
            trade_ticks: c.trade_ticks,
            sequence_regressions: c.sequence_regressions,
            venue_errors: c.venue_errors,
            rejects: c.rejects,
            late_fills: c.late_fills,
            traded_volume: c.traded_volume,
            last_trade_price: c.last_trade_price,
            active_orders: self.reconciler.active_count(),
            quotes: self.quotes.stats(),
            hedges: self.hedging.stats(),
            arbitrage: self.arbitrage.stats(),
            primary_position: self.position.primary(),
            hedge_position: self.position.hedge(),
            primary_fills: self.position.primary_fills(),
            hedge_fills: self.position.hedge_fills(),
            primary_cash: self.position.primary_cash(),
            hedge_cash: self.position.hedge_cash(),
            fees: self.position.fees(),
            mark_to_market,
        }
    }

    fn settle_retired_fees(&mut self) {
        for id in self.reconciler.drain_retired() {
            self.position.settle_fees(id);
        }
    }

    fn check_sequence(&mut self, instrument: Instrument, sequence: u64, trades: bool) {
        let tracker = if trades {
            &mut self.trade_sequences
        } else {
            &mut self.book_sequences
        };
        if let Some(last) = tracker.observe(instrument, sequence) {
            self.counters.sequence_regressions += 1;
            warn!(%instrument, sequence, last, trades, "Sequence number went backwards");
        }
    }

    fn on_reference_book(&mut self, book: &BookSnapshot) {
        self.counters.reference_updates += 1;
        self.counters.last_mid[Instrument::Reference.index()] = book.mid_price();
        self.reference.on_reference_book(book);
    }

    fn on_primary_book(&mut self, book: &BookSnapshot) {
        self.counters.primary_updates += 1;
        self.counters.last_mid[Instrument::Primary.index()] = book.mid_price();

        let Self {
            config,
            gateway,
            reference,
            reconciler,
            quotes,
            hedging,
            arbitrage,
            position,
            ..
        } = self;

        hedging.on_primary_tick(config, gateway, position, || reconciler.allocate_id());
        arbitrage.on_primary_book(
            config,
            reconciler,
            gateway,
            book,
            reference.book(),
            position.primary(),
        );
        quotes.on_primary_book(
            config,
            reconciler,
            gateway,
            book,
            reference.quote(),
            position.primary(),
        );
    }

    fn on_trade_ticks(&mut self, ticks: &TradeTicks) {
        let slot = ticks.instrument.index();
        self.counters.trade_ticks += 1;
        self.counters.traded_volume[slot] += ticks.total_volume();
        if let Some(price) = ticks.last_price() {
            self.counters.last_trade_price[slot] = Some(price);
        }
    }

    fn on_order_filled(&mut self, id: ClientOrderId, price: Price, volume: Volume) {
        let (side, completion) = match self.reconciler.on_fill(id, volume) {
            FillOutcome::Tracked {
                side,
                time_in_force,
                progress,
            } => (side, Some((time_in_force, progress))),
            FillOutcome::Late { side } => {
                self.counters.late_fills += 1;
                (side, None)
            }
            FillOutcome::Unknown => return,
        };

        self.position.apply_primary_fill(side, price, volume);
        debug!(%id, %side, price, volume, position = self.position.primary(), "Primary fill");
        if self.position.primary().unsigned_abs() > self.config.position_limit {
            warn!(position = self.position.primary(), limit = self.config.position_limit,
                  "Position limit breached");
        }

        let Self {
            config,
            gateway,
            reconciler,
            hedging,
            ..
        } = self;
        hedging.on_primary_fill(config, gateway, side, volume, || reconciler.allocate_id());

        if let Some((time_in_force, progress)) = completion {
            self.after_completion(Completion {
                side,
                time_in_force,
                progress,
            });
        }
    }

    fn on_order_status(
        &mut self,
        id: ClientOrderId,
        filled_volume: Volume,
        remaining_volume: Volume,
        fees: i64,
    ) {
        let Some(order) = self.reconciler.get(id) else {
            if self.reconciler.is_retired(id) {
                // Final status after the last fill: book fees only
                self.position.record_fees(id, fees, true);
            } else {
                debug!(%id, remaining_volume, "Status for inactive order ignored");
            }
            return;
        };
        if order.filled_volume != filled_volume {
            debug!(%id, reported = filled_volume, seen = order.filled_volume,
                   "Filled volume differs from fills seen so far");
        }

        self.position.record_fees(id, fees, remaining_volume == 0);
        if let Some(completion) = self.reconciler.on_status(id, remaining_volume) {
            self.after_completion(completion);
        }
    }

    /// Place the replacement queued behind a finished resting order
    fn after_completion(&mut self, completion: Completion) {
        let Completion {
            side,
            time_in_force,
            progress,
        } = completion;
        let Progress::Completed(Some(replacement)) = progress else {
            return;
        };
        if time_in_force != TimeInForce::GoodForDay {
            return;
        }
        self.quotes.on_replaced(
            &self.config,
            &mut self.reconciler,
            &mut self.gateway,
            side,
            replacement,
            self.position.primary(),
        );
    }

    fn on_hedge_filled(&mut self, id: ClientOrderId, price: Price, volume: Volume) {
        if let Some(side) = self.hedging.on_hedge_fill(id, price, volume) {
            self.position.apply_hedge_fill(side, price, volume);
            debug!(%id, %side, price, volume, hedge = self.position.hedge(), "Hedge position updated");
        }
    }

    fn on_error(&mut self, id: ClientOrderId, message: &str) {
        self.counters.venue_errors += 1;

        if id.is_none() {
            warn!(error = message, "Venue error");
            return;
        }
        if self.hedging.on_error(id) {
            return;
        }
        match self.reconciler.on_reject(id) {
            Some(side) => {
                self.counters.rejects += 1;
                warn!(%id, %side, error = message, "Order rejected");
            }
            None => debug!(%id, error = message, "Error for inactive order ignored"),
        }
    }
}

/// Engine statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineStats {
    pub events_processed: u64,
    pub primary_updates: u64,
    pub reference_updates: u64,
    pub trade_ticks: u64,
    /// Market data events whose sequence number went backwards
    pub sequence_regressions: u64,
    pub venue_errors: u64,
    pub rejects: u64,
    /// Fills for orders that had already left the active index
    pub late_fills: u64,
    /// Traded volume per instrument, from trade ticks
    pub traded_volume: [Volume; 2],
    pub last_trade_price: [Option<Price>; 2],
    pub active_orders: usize,
    pub quotes: QuoteStats,
    pub hedges: HedgeStats,
    pub arbitrage: ArbitrageStats,
    pub primary_position: i64,
    pub hedge_position: i64,
    pub primary_fills: u64,
    pub hedge_fills: u64,
    /// Cash flow in cents
    pub primary_cash: i64,
    pub hedge_cash: i64,
    pub fees: i64,
    /// Cash plus inventory at the last mids, `None` until both books are seen
    pub mark_to_market: Option<i64>,
}
