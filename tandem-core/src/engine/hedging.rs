//! Position & hedge controller
//!
//! Tracks inventory in both instruments and sends aggressive hedge orders on
//! the reference instrument:
//!
//! - `HedgeMode::Timer`: once `|primary + hedge|` has stayed above the
//!   tolerance for more than `max_unhedged_ticks` primary updates, one hedge
//!   brings `hedge` to exactly `-primary`.
//! - `HedgeMode::EveryFill`: every primary fill is mirrored immediately.
//!
//! Hedges are priced to cross any book: buys at the highest representable ask
//! tick, sells at the lowest representable bid tick.

use super::reconciler::RETIRED_CAPACITY;
use crate::config::{EngineConfig, HedgeMode};
use crate::core::{ClientOrderId, Price, Side, Volume};
use crate::execution::OrderGateway;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, info, warn};

/// Finished hedge ids remembered for late fills
const FINISHED_HEDGE_CAPACITY: usize = 256;

/// Signed inventory and cash in both instruments
///
/// Cash is in cents: selling adds `price * volume`, buying subtracts it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Position {
    primary: i64,
    hedge: i64,
    primary_cash: i64,
    hedge_cash: i64,
    fees: i64,
    primary_fills: u64,
    hedge_fills: u64,
    /// Cumulative fees last reported per order
    order_fees: HashMap<ClientOrderId, i64>,
    /// Finished orders still in `order_fees`, oldest first
    settled: VecDeque<ClientOrderId>,
    settled_ids: HashSet<ClientOrderId>,
}

impl Position {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn primary(&self) -> i64 {
        self.primary
    }

    #[inline]
    pub fn hedge(&self) -> i64 {
        self.hedge
    }

    /// `primary + hedge`; zero when fully hedged
    #[inline]
    pub fn net(&self) -> i64 {
        self.primary + self.hedge
    }

    pub fn primary_cash(&self) -> i64 {
        self.primary_cash
    }

    pub fn hedge_cash(&self) -> i64 {
        self.hedge_cash
    }

    /// Total fees paid (negative for net rebates)
    pub fn fees(&self) -> i64 {
        self.fees
    }

    pub fn primary_fills(&self) -> u64 {
        self.primary_fills
    }

    pub fn hedge_fills(&self) -> u64 {
        self.hedge_fills
    }

    /// Ask fills subtract, bid fills add
    pub fn apply_primary_fill(&mut self, side: Side, price: Price, volume: Volume) {
        let volume = volume as i64;
        self.primary += side.sign() * volume;
        self.primary_cash -= side.sign() * volume * price as i64;
        self.primary_fills += 1;
    }

    pub fn apply_hedge_fill(&mut self, side: Side, price: Price, volume: Volume) {
        let volume = volume as i64;
        self.hedge += side.sign() * volume;
        self.hedge_cash -= side.sign() * volume * price as i64;
        self.hedge_fills += 1;
    }

    /// Record an order's cumulative fees; only the change is booked
    ///
    /// Finished orders are remembered for a while so a repeated final status
    /// books nothing.
    pub fn record_fees(&mut self, id: ClientOrderId, cumulative: i64, finished: bool) {
        let previous = self.order_fees.insert(id, cumulative).unwrap_or(0);
        self.fees += cumulative - previous;

        if finished {
            self.settle_fees(id);
        }
    }

    /// Mark `id` as finished however it ended
    ///
    /// Its fee figure is kept until [`RETIRED_CAPACITY`] later orders have
    /// settled, so a final status arriving after retirement still books only
    /// the change.
    pub fn settle_fees(&mut self, id: ClientOrderId) {
        if !self.order_fees.contains_key(&id) || !self.settled_ids.insert(id) {
            return;
        }
        if self.settled.len() == RETIRED_CAPACITY {
            if let Some(oldest) = self.settled.pop_front() {
                self.settled_ids.remove(&oldest);
                self.order_fees.remove(&oldest);
            }
        }
        self.settled.push_back(id);
    }

    /// Mark-to-market value in cents at the given prices
    pub fn mark_to_market(&self, primary_price: Price, hedge_price: Price) -> i64 {
        self.primary_cash
            + self.hedge_cash
            + self.primary * primary_price as i64
            + self.hedge * hedge_price as i64
            - self.fees
    }
}

/// Consecutive primary ticks spent outside the hedge tolerance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnhedgedTimer {
    ticks: u64,
}

impl UnhedgedTimer {
    #[inline]
    pub fn tick(&mut self) -> u64 {
        self.ticks += 1;
        self.ticks
    }

    #[inline]
    pub fn reset(&mut self) {
        self.ticks = 0;
    }

    #[inline]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

/// A hedge order sent and not yet filled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingHedge {
    pub id: ClientOrderId,
    pub side: Side,
    pub price: Price,
    pub volume: Volume,
    /// Primary ticks since the hedge was sent
    pub age: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HedgeStats {
    pub hedges_sent: u64,
    pub hedges_failed: u64,
    pub hedges_expired: u64,
    pub hedged_volume: Volume,
}

#[derive(Debug)]
pub struct HedgeController {
    timer: UnhedgedTimer,
    pending: HashMap<ClientOrderId, PendingHedge>,
    finished: VecDeque<(ClientOrderId, Side)>,
    stats: HedgeStats,
}

impl Default for HedgeController {
    fn default() -> Self {
        Self::new()
    }
}

impl HedgeController {
    pub fn new() -> Self {
        Self {
            timer: UnhedgedTimer::default(),
            pending: HashMap::new(),
            finished: VecDeque::with_capacity(FINISHED_HEDGE_CAPACITY),
            stats: HedgeStats::default(),
        }
    }

    pub fn timer(&self) -> UnhedgedTimer {
        self.timer
    }

    pub fn stats(&self) -> HedgeStats {
        self.stats
    }

    /// True while any hedge awaits its fill
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Run the unhedged timer after a primary book update
    ///
    /// `allocate` hands out a fresh order id.
    pub fn on_primary_tick<G, F>(
        &mut self,
        config: &EngineConfig,
        gateway: &mut G,
        position: &Position,
        allocate: F,
    ) where
        G: OrderGateway,
        F: FnOnce() -> ClientOrderId,
    {
        self.expire_stale(config);

        if config.hedge.mode != HedgeMode::Timer {
            return;
        }

        if position.net().unsigned_abs() <= config.hedge.tolerance {
            self.timer.reset();
            return;
        }

        let ticks = self.timer.tick();
        if ticks <= config.hedge.max_unhedged_ticks || self.has_pending() {
            return;
        }

        let delta = -position.primary() - position.hedge();
        let side = if delta > 0 { Side::Buy } else { Side::Sell };
        let volume = delta.unsigned_abs();
        info!(
            primary = position.primary(),
            hedge = position.hedge(),
            unhedged_ticks = ticks,
            "Unhedged for too long, hedging"
        );
        self.send(config, gateway, allocate(), side, volume);
        self.timer.reset();
    }

    /// Mirror a primary fill immediately (`HedgeMode::EveryFill` only)
    pub fn on_primary_fill<G, F>(
        &mut self,
        config: &EngineConfig,
        gateway: &mut G,
        side: Side,
        volume: Volume,
        allocate: F,
    ) where
        G: OrderGateway,
        F: FnOnce() -> ClientOrderId,
    {
        if config.hedge.mode != HedgeMode::EveryFill || volume == 0 {
            return;
        }
        self.send(config, gateway, allocate(), side.opposite(), volume);
    }

    /// Side of the hedge a fill belongs to; clears its pending marker
    ///
    /// Returns `None` for ids that are not ours.
    pub fn on_hedge_fill(&mut self, id: ClientOrderId, price: Price, volume: Volume) -> Option<Side> {
        if let Some(hedge) = self.pending.remove(&id) {
            debug!(%id, side = %hedge.side, price, volume, "Hedge filled");
            self.stats.hedged_volume += volume;
            self.remember(id, hedge.side);
            return Some(hedge.side);
        }
        let side = self
            .finished
            .iter()
            .rev()
            .find(|(f, _)| *f == id)
            .map(|(_, side)| *side);
        match side {
            Some(side) => {
                self.stats.hedged_volume += volume;
                debug!(%id, %side, price, volume, "Additional hedge fill");
            }
            None => warn!(%id, volume, "Hedge fill for unknown order ignored"),
        }
        side
    }

    /// Clear the pending marker of a hedge the venue refused
    pub fn on_error(&mut self, id: ClientOrderId) -> bool {
        match self.pending.remove(&id) {
            Some(hedge) => {
                warn!(%id, side = %hedge.side, volume = hedge.volume, "Hedge rejected");
                self.stats.hedges_failed += 1;
                self.remember(id, hedge.side);
                true
            }
            None => false,
        }
    }

    fn send<G: OrderGateway>(
        &mut self,
        config: &EngineConfig,
        gateway: &mut G,
        id: ClientOrderId,
        side: Side,
        volume: Volume,
    ) {
        if volume == 0 {
            return;
        }
        let price = match side {
            Side::Buy => config.max_ask_tick,
            Side::Sell => config.min_bid_tick,
        };
        match gateway.submit_hedge_order(id, side, price, volume) {
            Ok(()) => {
                info!(%id, %side, price, volume, "Hedge sent");
                self.stats.hedges_sent += 1;
                self.pending.insert(
                    id,
                    PendingHedge {
                        id,
                        side,
                        price,
                        volume,
                        age: 0,
                    },
                );
            }
            Err(e) => {
                warn!(%id, %side, volume, error = %e, "Hedge submit failed");
                self.stats.hedges_failed += 1;
            }
        }
    }

    /// Drop pending markers whose fill never arrived
    fn expire_stale(&mut self, config: &EngineConfig) {
        let max_age = config.hedge.max_unhedged_ticks;
        let mut expired = Vec::new();
        for hedge in self.pending.values_mut() {
            hedge.age += 1;
            if hedge.age > max_age {
                expired.push((hedge.id, hedge.side));
            }
        }
        for (id, side) in expired {
            warn!(%id, %side, "Hedge fill not seen, pending marker expired");
            self.pending.remove(&id);
            self.stats.hedges_expired += 1;
            self.remember(id, side);
        }
    }

    fn remember(&mut self, id: ClientOrderId, side: Side) {
        if self.finished.len() == FINISHED_HEDGE_CAPACITY {
            self.finished.pop_front();
        }
        self.finished.push_back((id, side));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::{Command, RecordingGateway};

    fn timer_config() -> EngineConfig {
        let mut config = EngineConfig::default();
        config.hedge.mode = HedgeMode::Timer;
        config
    }

    fn ids() -> impl FnMut() -> ClientOrderId {
        let mut next = 100;
        move || {
            next += 1;
            ClientOrderId::new(next)
        }
    }

    #[test]
    fn test_position_fills_and_cash() {
        let mut pos = Position::new();
        pos.apply_primary_fill(Side::Sell, 10_100, 50);
        assert_eq!(pos.primary(), -50);
        assert_eq!(pos.primary_cash(), 505_000);

        pos.apply_hedge_fill(Side::Buy, 10_000, 50);
        assert_eq!(pos.hedge(), 50);
        assert_eq!(pos.net(), 0);
        assert_eq!(pos.hedge_cash(), -500_000);

        // Flat in both: value is the captured spread
        assert_eq!(pos.mark_to_market(10_000, 10_000), 5_000);
    }

    #[test]
    fn test_fees_are_booked_incrementally() {
        let mut pos = Position::new();
        let id = ClientOrderId::new(1);
        pos.record_fees(id, 3, false);
        pos.record_fees(id, 5, false);
        pos.record_fees(id, 5, true);
        assert_eq!(pos.fees(), 5);

        // Repeated final status
        pos.record_fees(id, 5, true);
        assert_eq!(pos.fees(), 5);

        pos.record_fees(ClientOrderId::new(2), -2, true);
        assert_eq!(pos.fees(), 3);
    }

    #[test]
    fn test_fee_entries_pruned_after_any_retirement() {
        let mut pos = Position::new();
        let rejected = ClientOrderId::new(1);
        pos.record_fees(rejected, 4, false);
        pos.settle_fees(rejected);
        // Settling again, or settling an order without fees, keeps nothing extra
        pos.settle_fees(rejected);
        pos.settle_fees(ClientOrderId::new(2));
        assert_eq!(pos.settled.len(), 1);

        // A late final status books only the change
        pos.record_fees(rejected, 4, true);
        assert_eq!(pos.fees(), 4);

        for n in 0..RETIRED_CAPACITY as u64 {
            let id = ClientOrderId::new(10 + n);
            pos.record_fees(id, 1, false);
            pos.settle_fees(id);
        }
        assert!(!pos.order_fees.contains_key(&rejected));
        assert_eq!(pos.order_fees.len(), RETIRED_CAPACITY);
        assert_eq!(pos.settled_ids.len(), RETIRED_CAPACITY);
    }

    #[test]
    fn test_timer_hedges_after_threshold() {
        let config = timer_config();
        let mut gw = RecordingGateway::new();
        let mut hedging = HedgeController::new();
        let mut next_id = ids();

        let mut pos = Position::new();
        pos.apply_primary_fill(Side::Sell, 10_100, 50);

        for _ in 0..config.hedge.max_unhedged_ticks {
            hedging.on_primary_tick(&config, &mut gw, &pos, &mut next_id);
        }
        assert!(gw.commands().is_empty());

        hedging.on_primary_tick(&config, &mut gw, &pos, &mut next_id);
        assert_eq!(
            gw.commands(),
            &[Command::Hedge {
                id: ClientOrderId::new(101),
                side: Side::Buy,
                price: config.max_ask_tick,
                volume: 50,
            }]
        );
        assert_eq!(hedging.timer().ticks(), 0);
        assert!(hedging.has_pending());
    }

    #[test]
    fn test_within_tolerance_resets_timer() {
        let config = timer_config();
        let mut gw = RecordingGateway::new();
        let mut hedging = HedgeController::new();
        let mut next_id = ids();

        let mut pos = Position::new();
        pos.apply_primary_fill(Side::Buy, 9_900, 30);
        for _ in 0..5 {
            hedging.on_primary_tick(&config, &mut gw, &pos, &mut next_id);
        }
        assert_eq!(hedging.timer().ticks(), 5);

        pos.apply_hedge_fill(Side::Sell, 9_900, 25);
        hedging.on_primary_tick(&config, &mut gw, &pos, &mut next_id);
        assert_eq!(hedging.timer().ticks(), 0);
    }

    #[test]
    fn test_one_pending_hedge_at_a_time() {
        let mut config = timer_config();
        config.hedge.max_unhedged_ticks = 2;
        let mut gw = RecordingGateway::new();
        let mut hedging = HedgeController::new();
        let mut next_id = ids();

        let mut pos = Position::new();
        pos.apply_primary_fill(Side::Buy, 9_900, 40);

        for _ in 0..3 {
            hedging.on_primary_tick(&config, &mut gw, &pos, &mut next_id);
        }
        assert_eq!(gw.commands().len(), 1);

        // Still unhedged, but the hedge is in flight
        for _ in 0..2 {
            hedging.on_primary_tick(&config, &mut gw, &pos, &mut next_id);
        }
        assert_eq!(gw.commands().len(), 1);

        // Fill arrives: marker cleared, position hedged
        let side = hedging.on_hedge_fill(ClientOrderId::new(101), 9_800, 40).unwrap();
        assert_eq!(side, Side::Sell);
        pos.apply_hedge_fill(side, 9_800, 40);
        assert!(!hedging.has_pending());
        assert_eq!(pos.net(), 0);
    }

    #[test]
    fn test_stale_pending_expires() {
        let mut config = timer_config();
        config.hedge.max_unhedged_ticks = 2;
        let mut gw = RecordingGateway::new();
        let mut hedging = HedgeController::new();
        let mut next_id = ids();

        let mut pos = Position::new();
        pos.apply_primary_fill(Side::Sell, 10_100, 40);

        for _ in 0..3 {
            hedging.on_primary_tick(&config, &mut gw, &pos, &mut next_id);
        }
        assert!(hedging.has_pending());

        for _ in 0..3 {
            hedging.on_primary_tick(&config, &mut gw, &pos, &mut next_id);
        }
        assert_eq!(hedging.stats().hedges_expired, 1);
        // Timer kept counting, so a second hedge goes out
        assert_eq!(gw.commands().len(), 2);

        // A fill for the expired hedge still resolves its side
        assert_eq!(
            hedging.on_hedge_fill(ClientOrderId::new(101), 10_000, 40),
            Some(Side::Buy)
        );
    }

    #[test]
    fn test_error_clears_pending() {
        let mut config = timer_config();
        config.hedge.max_unhedged_ticks = 1;
        let mut gw = RecordingGateway::new();
        let mut hedging = HedgeController::new();
        let mut next_id = ids();

        let mut pos = Position::new();
        pos.apply_primary_fill(Side::Sell, 10_100, 40);
        hedging.on_primary_tick(&config, &mut gw, &pos, &mut next_id);
        hedging.on_primary_tick(&config, &mut gw, &pos, &mut next_id);
        assert!(hedging.has_pending());

        assert!(hedging.on_error(ClientOrderId::new(101)));
        assert!(!hedging.has_pending());
        assert!(!hedging.on_error(ClientOrderId::new(101)));
        // Still ours: a late fill resolves its side
        assert_eq!(hedging.on_hedge_fill(ClientOrderId::new(101), 10_000, 40), Some(Side::Buy));
    }

    #[test]
    fn test_every_fill_mode() {
        let mut config = EngineConfig::default();
        config.hedge.mode = HedgeMode::EveryFill;
        let mut gw = RecordingGateway::new();
        let mut hedging = HedgeController::new();
        let mut next_id = ids();

        hedging.on_primary_fill(&config, &mut gw, Side::Buy, 7, &mut next_id);
        assert_eq!(
            gw.last(),
            Some(&Command::Hedge {
                id: ClientOrderId::new(101),
                side: Side::Sell,
                price: config.min_bid_tick,
                volume: 7,
            })
        );

        // The timer does nothing in this mode
        let mut pos = Position::new();
        pos.apply_primary_fill(Side::Buy, 9_900, 90);
        for _ in 0..50 {
            hedging.on_primary_tick(&config, &mut gw, &pos, &mut next_id);
        }
        assert_eq!(gw.commands().len(), 1);
    }

    #[test]
    fn test_timer_mode_ignores_fills() {
        let config = timer_config();
        let mut gw = RecordingGateway::new();
        let mut hedging = HedgeController::new();
        hedging.on_primary_fill(&config, &mut gw, Side::Buy, 7, ids());
        assert!(gw.commands().is_empty());
    }
}
