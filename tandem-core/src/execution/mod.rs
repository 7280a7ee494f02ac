//! Order gateway - the engine's only way to act on the venue
//!
//! Commands are fire-and-forget: `Ok(())` means the command was handed to the
//! transport, not that the venue accepted it. The outcome arrives later as an
//! [`Event`](crate::events::Event).

pub mod recording;
pub mod types;

pub use recording::RecordingGateway;
pub use types::Command;

use crate::core::{ClientOrderId, GatewayError, Price, Side, TimeInForce, Volume};

/// Gateway trait - abstraction over the venue's order entry
///
/// Implementations: [`RecordingGateway`] (tests, replay, loopback), or a real
/// exchange connection living outside this crate.
pub trait OrderGateway {
    /// Submit a new limit order on the primary instrument
    fn submit_order(
        &mut self,
        id: ClientOrderId,
        side: Side,
        price: Price,
        volume: Volume,
        time_in_force: TimeInForce,
    ) -> Result<(), GatewayError>;

    /// Request cancellation of a resting order
    fn cancel_order(&mut self, id: ClientOrderId) -> Result<(), GatewayError>;

    /// Reduce a resting order to `new_volume` total lots
    fn amend_order(&mut self, id: ClientOrderId, new_volume: Volume) -> Result<(), GatewayError>;

    /// Submit an order on the reference instrument
    fn submit_hedge_order(
        &mut self,
        id: ClientOrderId,
        side: Side,
        price: Price,
        volume: Volume,
    ) -> Result<(), GatewayError>;

    /// Gateway name for logging
    fn name(&self) -> &'static str;
}

impl<G: OrderGateway + ?Sized> OrderGateway for Box<G> {
    fn submit_order(
        &mut self,
        id: ClientOrderId,
        side: Side,
        price: Price,
        volume: Volume,
        time_in_force: TimeInForce,
    ) -> Result<(), GatewayError> {
        (**self).submit_order(id, side, price, volume, time_in_force)
    }

    fn cancel_order(&mut self, id: ClientOrderId) -> Result<(), GatewayError> {
        (**self).cancel_order(id)
    }

    fn amend_order(&mut self, id: ClientOrderId, new_volume: Volume) -> Result<(), GatewayError> {
        (**self).amend_order(id, new_volume)
    }

    fn submit_hedge_order(
        &mut self,
        id: ClientOrderId,
        side: Side,
        price: Price,
        volume: Volume,
    ) -> Result<(), GatewayError> {
        (**self).submit_hedge_order(id, side, price, volume)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
