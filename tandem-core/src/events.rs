//! Inbound events consumed by [`Engine::handle`](crate::engine::Engine::handle)

use crate::core::{ClientOrderId, Price, Volume};
use crate::orderbook::{BookSnapshot, TradeTicks};
use serde::{Deserialize, Serialize};

/// Everything the venue can tell the engine
///
/// Serialized as one JSON object per event with a `type` tag, which is the
/// format of replay files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Full top-of-book for one instrument
    BookUpdate(BookSnapshot),
    /// Trades printed on one instrument
    TradeTicks(TradeTicks),
    /// One of our primary orders traded
    OrderFilled {
        id: ClientOrderId,
        price: Price,
        volume: Volume,
    },
    /// Authoritative volumes of one of our orders; `remaining_volume == 0`
    /// means the order is gone
    OrderStatus {
        id: ClientOrderId,
        filled_volume: Volume,
        remaining_volume: Volume,
        /// Cumulative fees in cents (negative for rebates)
        fees: i64,
    },
    /// One of our hedge orders traded
    HedgeFilled {
        id: ClientOrderId,
        price: Price,
        volume: Volume,
    },
    /// The venue refused or dropped something; `id` is 0 when not order-scoped
    Error { id: ClientOrderId, message: String },
}
