//! Arbitrage detector
//!
//! When the primary book crosses the reference book, trade the primary side
//! with an immediate-or-cancel order. Only the primary leg is traded; the
//! resulting imbalance is picked up by the hedge controller.

use super::reconciler::OrderReconciler;
use crate::config::EngineConfig;
use crate::core::{Price, Side, TimeInForce, Volume};
use crate::execution::OrderGateway;
use crate::orderbook::{BookSnapshot, Levels, TOP_LEVEL_COUNT};
use tracing::info;

/// A crossing worth trading, computed per tick and never stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArbitrageOpportunity {
    /// Side of the IOC order on the primary instrument
    pub side: Side,
    /// Deepest primary price consumed
    pub price: Price,
    pub volume: Volume,
}

/// Find a crossing between the primary and reference books
///
/// `position` is the primary position, `outstanding` the volume already
/// working on the primary instrument per side (indexed by `Side::index`).
pub fn detect(
    config: &EngineConfig,
    primary: &BookSnapshot,
    reference: &BookSnapshot,
    position: i64,
    outstanding: [Volume; 2],
) -> Option<ArbitrageOpportunity> {
    let limit = config.limit();

    // Primary bid above reference ask: sell the primary
    if primary.best_bid_price() != 0
        && reference.best_ask_price() != 0
        && primary.best_bid_price() > reference.best_ask_price()
    {
        let headroom = headroom(limit + position, outstanding[Side::Sell.index()]);
        return walk(
            Side::Sell,
            (&primary.bid_prices, &primary.bid_volumes),
            (&reference.ask_prices, &reference.ask_volumes),
            headroom,
        );
    }

    // Primary ask below reference bid: buy the primary
    if primary.best_ask_price() != 0
        && reference.best_bid_price() != 0
        && primary.best_ask_price() < reference.best_bid_price()
    {
        let headroom = headroom(limit - position, outstanding[Side::Buy.index()]);
        return walk(
            Side::Buy,
            (&primary.ask_prices, &primary.ask_volumes),
            (&reference.bid_prices, &reference.bid_volumes),
            headroom,
        );
    }

    None
}

#[inline]
fn headroom(room: i64, outstanding: Volume) -> Volume {
    if room <= 0 {
        0
    } else {
        (room as Volume).saturating_sub(outstanding)
    }
}

/// Walk the primary levels we would trade against the reference levels on the
/// other side, advancing whichever level runs out first (both on a tie)
fn walk(
    side: Side,
    primary: (&Levels, &Levels),
    reference: (&Levels, &Levels),
    mut headroom: Volume,
) -> Option<ArbitrageOpportunity> {
    let crosses = |primary_price: Price, reference_price: Price| match side {
        Side::Sell => primary_price > reference_price,
        Side::Buy => primary_price < reference_price,
    };

    let (p_prices, p_volumes) = primary;
    let (r_prices, r_volumes) = reference;
    let (mut i, mut j) = (0, 0);
    let (mut p_left, mut r_left) = (p_volumes[0], r_volumes[0]);
    let mut volume = 0;
    let mut deepest = 0;

    while i < TOP_LEVEL_COUNT && j < TOP_LEVEL_COUNT && headroom > 0 {
        let (p_price, r_price) = (p_prices[i], r_prices[j]);
        if p_price == 0 || r_price == 0 || !crosses(p_price, r_price) {
            break;
        }

        let take = p_left.min(r_left).min(headroom);
        if take > 0 {
            volume += take;
            headroom -= take;
            p_left -= take;
            r_left -= take;
            deepest = p_price;
        }

        if p_left == 0 {
            i += 1;
            p_left = p_volumes.get(i).copied().unwrap_or(0);
        }
        if r_left == 0 {
            j += 1;
            r_left = r_volumes.get(j).copied().unwrap_or(0);
        }
    }

    (volume > 0).then_some(ArbitrageOpportunity {
        side,
        price: deepest,
        volume,
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArbitrageStats {
    pub opportunities: u64,
    pub orders_sent: u64,
    pub volume_sent: Volume,
}

#[derive(Debug, Default)]
pub struct ArbitrageDetector {
    stats: ArbitrageStats,
}

impl ArbitrageDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> ArbitrageStats {
        self.stats
    }

    /// Check for a crossing after a primary book update and trade it
    pub fn on_primary_book<G: OrderGateway>(
        &mut self,
        config: &EngineConfig,
        reconciler: &mut OrderReconciler,
        gateway: &mut G,
        primary: &BookSnapshot,
        reference: Option<&BookSnapshot>,
        position: i64,
    ) {
        if !config.arbitrage.enabled {
            return;
        }
        let Some(reference) = reference else {
            return;
        };

        let outstanding = [
            reconciler.outstanding(Side::Buy),
            reconciler.outstanding(Side::Sell),
        ];
        let Some(opportunity) = detect(config, primary, reference, position, outstanding) else {
            return;
        };

        self.stats.opportunities += 1;
        let ArbitrageOpportunity {
            side,
            price,
            volume,
        } = opportunity;
        if let Some(id) =
            reconciler.submit(gateway, side, price, volume, TimeInForce::ImmediateOrCancel)
        {
            self.stats.orders_sent += 1;
            self.stats.volume_sent += volume;
            info!(%id, %side, price, volume, "Arbitrage order sent");
        }
    }
}
