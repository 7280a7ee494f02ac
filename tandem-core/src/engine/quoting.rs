//! Quote manager
//!
//! Keeps one good-for-day order per side on the primary instrument, priced off
//! the reference book:
//!
//! ```text
//!   ask boundary = reference ask + clearance      (never quote below)
//!   bid boundary = reference bid - clearance      (never quote above)
//!
//!   ask = max(boundary, competitor ask - tick)    rounded up to a tick
//!   bid = min(boundary, competitor bid + tick)    rounded down to a tick
//! ```
//!
//! Volumes are sized from the position limit so that a full fill on one side
//! never breaches it:
//!
//! ```text
//!   ask capacity = min((L + p) / 2, L + p - other sells outstanding)
//!   bid capacity = min((L - p) / 2, L - p - other buys outstanding)
//! ```

use super::reconciler::OrderReconciler;
use crate::config::EngineConfig;
use crate::core::{ticks, OrderState, Price, Replacement, Side, TimeInForce, Volume};
use crate::execution::OrderGateway;
use crate::orderbook::{competing_price, BookSnapshot};
use crate::reference::ReferenceQuote;
use tracing::{debug, info};

/// Counters for reporting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuoteStats {
    pub quotes_submitted: u64,
    pub reprices: u64,
    pub amends: u64,
    pub cancels: u64,
    pub replacements_submitted: u64,
    pub replacements_skipped: u64,
}

#[derive(Debug, Default)]
pub struct QuoteManager {
    stats: QuoteStats,
}

impl QuoteManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> QuoteStats {
        self.stats
    }

    /// Re-evaluate both sides after a primary book update
    pub fn on_primary_book<G: OrderGateway>(
        &mut self,
        config: &EngineConfig,
        reconciler: &mut OrderReconciler,
        gateway: &mut G,
        book: &BookSnapshot,
        reference: ReferenceQuote,
        position: i64,
    ) {
        for side in Side::BOTH {
            self.update_side(config, reconciler, gateway, book, reference, position, side);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn update_side<G: OrderGateway>(
        &mut self,
        config: &EngineConfig,
        reconciler: &mut OrderReconciler,
        gateway: &mut G,
        book: &BookSnapshot,
        reference: ReferenceQuote,
        position: i64,
        side: Side,
    ) {
        let own = reconciler
            .resting(side)
            .map(|order| (order.price, order.remaining_volume));
        let competitor = competing_price(book, side, own);
        let Some(ideal) = ideal_price(config, side, reference, competitor) else {
            // No reference price on this side, or its boundary is off the price grid
            return;
        };
        let other = reconciler.outstanding_excluding_resting(side);
        let capacity = capacity(config, side, position, other);

        match reconciler.slot_state(side) {
            OrderState::None => {
                if capacity == 0 {
                    return;
                }
                if let Some(id) =
                    reconciler.submit(gateway, side, ideal, capacity, TimeInForce::GoodForDay)
                {
                    self.stats.quotes_submitted += 1;
                    debug!(%id, %side, price = ideal, volume = capacity, "Quote submitted");
                }
            }
            OrderState::Live => {
                let Some(order) = reconciler.resting(side) else {
                    return;
                };
                let (price, remaining, filled, amending) = (
                    order.price,
                    order.remaining_volume,
                    order.filled_volume,
                    order.amend_target.is_some(),
                );

                if capacity == 0 {
                    if reconciler.cancel(gateway, side) {
                        self.stats.cancels += 1;
                        debug!(%side, "Quote cancelled, no capacity");
                    }
                } else if price.abs_diff(ideal) > config.reprice_tolerance() {
                    if reconciler.cancel_replace(gateway, side, ideal, capacity) {
                        self.stats.reprices += 1;
                        debug!(%side, from = price, to = ideal, volume = capacity, "Quote repriced");
                    }
                } else if remaining > capacity
                    && !amending
                    && reconciler.amend(gateway, side, filled + capacity)
                {
                    self.stats.amends += 1;
                    debug!(%side, from = remaining, to = capacity, "Quote amended down");
                }
            }
            OrderState::PendingCancelReplace(queued) => {
                if queued.price != ideal || queued.volume != capacity {
                    reconciler.cancel_replace(gateway, side, ideal, capacity);
                }
            }
            // Waiting on the venue
            OrderState::PendingNew | OrderState::PendingCancel | OrderState::Done => {}
        }
    }

    /// Submit the replacement queued behind a cancel once the old order is gone
    ///
    /// Whatever the old order filled while the cancel was in flight is taken
    /// off the fresh capacity.
    pub fn on_replaced<G: OrderGateway>(
        &mut self,
        config: &EngineConfig,
        reconciler: &mut OrderReconciler,
        gateway: &mut G,
        side: Side,
        replacement: Replacement,
        position: i64,
    ) {
        if reconciler.resting(side).is_some() {
            return;
        }
        let capacity = capacity(config, side, position, reconciler.outstanding(side));
        let volume = capacity.saturating_sub(replacement.filled_while_pending);
        if volume == 0 {
            self.stats.replacements_skipped += 1;
            info!(%side, capacity, filled_while_pending = replacement.filled_while_pending,
                  "Replacement skipped");
            return;
        }

        if let Some(id) = reconciler.submit(
            gateway,
            side,
            replacement.price,
            volume,
            TimeInForce::GoodForDay,
        ) {
            self.stats.replacements_submitted += 1;
            debug!(%id, %side, price = replacement.price, volume, "Replacement submitted");
        }
    }
}

/// Price we want to rest at on `side`
///
/// `None` when the reference side is empty or when the boundary (reference
/// price plus clearance) falls outside `[min_bid_tick, max_ask_tick]`.
pub fn ideal_price(
    config: &EngineConfig,
    side: Side,
    reference: ReferenceQuote,
    competitor: Option<Price>,
) -> Option<Price> {
    let tick = config.tick_size;
    let improve = config.quote.improve_competitors;

    match side {
        Side::Sell => {
            if !reference.has_ask() {
                return None;
            }
            let boundary = ticks::ceil(reference.best_ask_price + config.clearance(), tick);
            if boundary > config.max_ask_tick {
                return None;
            }
            let price = match competitor {
                Some(c) if improve => boundary.max(ticks::ceil(c.saturating_sub(tick), tick)),
                _ => boundary,
            };
            Some(price.min(config.max_ask_tick))
        }
        Side::Buy => {
            if !reference.has_bid() {
                return None;
            }
            let boundary = ticks::floor(
                reference.best_bid_price.checked_sub(config.clearance())?,
                tick,
            );
            if boundary < config.min_bid_tick {
                return None;
            }
            let price = match competitor {
                Some(c) if improve => boundary.min(ticks::floor(c + tick, tick)),
                _ => boundary,
            };
            Some(price.max(config.min_bid_tick))
        }
    }
}

/// Largest order we may rest on `side`
///
/// `other` is the volume already outstanding on that side outside the
/// resting slot.
pub fn capacity(config: &EngineConfig, side: Side, position: i64, other: Volume) -> Volume {
    let limit = config.limit();
    let headroom = match side {
        Side::Sell => limit + position,
        Side::Buy => limit - position,
    };
    if headroom <= 0 {
        return 0;
    }
    let headroom = headroom as Volume;
    (headroom / 2).min(headroom.saturating_sub(other))
}
