//! Core value types for the decision engine
//!
//! This module provides the building blocks every component shares:
//! - `ClientOrderId`, `Side`, `TimeInForce`, `Instrument`: small `Copy` values
//! - `RestingOrder` / `OrderState`: the order lifecycle state machine
//! - Domain error types
//!
//! Prices are integer cents and volumes whole lots; nothing here allocates.

pub mod errors;
pub mod order_fsm;
pub mod types;

// Re-export commonly used types
pub use errors::{ConfigError, FillError, GatewayError, TransitionError};
pub use order_fsm::{OrderState, Progress, Replacement, RestingOrder};
pub use types::{ticks, ClientOrderId, Instrument, Price, Side, TimeInForce, Volume};
