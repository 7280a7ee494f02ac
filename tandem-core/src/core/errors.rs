//! Domain-specific error types for the decision engine
//!
//! None of these are fatal: the engine logs them and degrades to "no resting
//! order on this side", which the next book update repairs.

use super::order_fsm::OrderState;
use super::types::{ClientOrderId, Volume};
use thiserror::Error;

/// Errors raised when a lifecycle event does not fit the order's state
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The requested transition is not allowed from the current state
    #[error("order {id}: cannot {action} while {from:?}")]
    InvalidTransition {
        id: ClientOrderId,
        from: OrderState,
        action: &'static str,
    },

    /// The order already reached its terminal state
    #[error("order {0} is already done")]
    AlreadyDone(ClientOrderId),
}

/// Errors that can occur when applying a fill
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FillError {
    /// Fill volume is zero
    #[error("fill volume cannot be zero")]
    ZeroVolume,

    /// The order already reached its terminal state
    #[error("order {0} is already done")]
    Terminal(ClientOrderId),

    /// Fill volume exceeds what is left on the order
    #[error("fill volume {fill} exceeds remaining {remaining} (requested {requested})")]
    ExceedsRemaining {
        fill: Volume,
        remaining: Volume,
        requested: Volume,
    },
}

/// Errors a gateway may report synchronously
///
/// Asynchronous failures arrive later as `Event::Error`; both are handled the
/// same way.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The connection to the venue is gone
    #[error("gateway disconnected")]
    Disconnected,

    /// The gateway refused the command before sending it
    #[error("command for order {id} rejected: {reason}")]
    Rejected { id: ClientOrderId, reason: String },
}

/// Configuration validation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("position_limit must be positive")]
    ZeroPositionLimit,

    #[error("tick_size must be positive")]
    ZeroTickSize,

    #[error("hedge tolerance {tolerance} must be below position_limit {limit}")]
    ToleranceAboveLimit { tolerance: u64, limit: u64 },

    #[error("max_unhedged_ticks must be positive")]
    ZeroUnhedgedTicks,

    #[error("price bounds are inverted: min_bid {min_bid} >= max_ask {max_ask}")]
    InvertedPriceBounds { min_bid: u64, max_ask: u64 },
}
