//! Recording gateway
//!
//! Captures every command instead of sending it. Used by tests, by the replay
//! runner, and as the outbound half of the loopback venue.

use super::types::Command;
use super::OrderGateway;
use crate::core::{ClientOrderId, GatewayError, Price, Side, TimeInForce, Volume};
use std::collections::VecDeque;

/// Gateway that stores commands in arrival order
#[derive(Debug, Default)]
pub struct RecordingGateway {
    commands: Vec<Command>,
    /// Errors returned by the next calls, oldest first
    scripted_errors: VecDeque<GatewayError>,
    disconnected: bool,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every command recorded so far
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Take the recorded commands, leaving the log empty
    pub fn drain(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    /// Last recorded command
    pub fn last(&self) -> Option<&Command> {
        self.commands.last()
    }

    /// Make the next call fail with `error` (the command is not recorded)
    pub fn fail_next(&mut self, error: GatewayError) {
        self.scripted_errors.push_back(error);
    }

    /// While disconnected every call fails with [`GatewayError::Disconnected`]
    pub fn set_disconnected(&mut self, disconnected: bool) {
        self.disconnected = disconnected;
    }

    fn record(&mut self, command: Command) -> Result<(), GatewayError> {
        if self.disconnected {
            return Err(GatewayError::Disconnected);
        }
        if let Some(error) = self.scripted_errors.pop_front() {
            return Err(error);
        }
        self.commands.push(command);
        Ok(())
    }
}

impl OrderGateway for RecordingGateway {
    fn submit_order(
        &mut self,
        id: ClientOrderId,
        side: Side,
        price: Price,
        volume: Volume,
        time_in_force: TimeInForce,
    ) -> Result<(), GatewayError> {
        self.record(Command::Submit {
            id,
            side,
            price,
            volume,
            time_in_force,
        })
    }

    fn cancel_order(&mut self, id: ClientOrderId) -> Result<(), GatewayError> {
        self.record(Command::Cancel { id })
    }

    fn amend_order(&mut self, id: ClientOrderId, new_volume: Volume) -> Result<(), GatewayError> {
        self.record(Command::Amend {
            id,
            volume: new_volume,
        })
    }

    fn submit_hedge_order(
        &mut self,
        id: ClientOrderId,
        side: Side,
        price: Price,
        volume: Volume,
    ) -> Result<(), GatewayError> {
        self.record(Command::Hedge {
            id,
            side,
            price,
            volume,
        })
    }

    fn name(&self) -> &'static str {
        "RecordingGateway"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_in_order() {
        let mut gw = RecordingGateway::new();
        gw.submit_order(
            ClientOrderId::new(1),
            Side::Buy,
            9_900,
            10,
            TimeInForce::GoodForDay,
        )
        .unwrap();
        gw.cancel_order(ClientOrderId::new(1)).unwrap();

        assert_eq!(gw.commands().len(), 2);
        assert_eq!(gw.last(), Some(&Command::Cancel { id: ClientOrderId::new(1) }));

        let drained = gw.drain();
        assert_eq!(drained.len(), 2);
        assert!(gw.commands().is_empty());
    }

    #[test]
    fn test_scripted_failure_is_not_recorded() {
        let mut gw = RecordingGateway::new();
        gw.fail_next(GatewayError::Rejected {
            id: ClientOrderId::new(1),
            reason: "price band".to_string(),
        });

        assert!(gw.cancel_order(ClientOrderId::new(1)).is_err());
        assert!(gw.commands().is_empty());

        // Only the next call fails
        assert!(gw.cancel_order(ClientOrderId::new(1)).is_ok());
    }

    #[test]
    fn test_disconnected() {
        let mut gw = RecordingGateway::new();
        gw.set_disconnected(true);
        assert_eq!(
            gw.amend_order(ClientOrderId::new(2), 5),
            Err(GatewayError::Disconnected)
        );
        gw.set_disconnected(false);
        assert!(gw.amend_order(ClientOrderId::new(2), 5).is_ok());
    }
}
