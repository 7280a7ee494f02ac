use crate::core::{ClientOrderId, Price, Side, TimeInForce, Volume};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One gateway call, as data
///
/// Recorded by [`RecordingGateway`](super::RecordingGateway) and written to
/// JSON lines by the runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    Submit {
        id: ClientOrderId,
        side: Side,
        price: Price,
        volume: Volume,
        time_in_force: TimeInForce,
    },
    Cancel {
        id: ClientOrderId,
    },
    Amend {
        id: ClientOrderId,
        volume: Volume,
    },
    Hedge {
        id: ClientOrderId,
        side: Side,
        price: Price,
        volume: Volume,
    },
}

impl Command {
    /// Order the command refers to
    pub fn id(&self) -> ClientOrderId {
        match self {
            Command::Submit { id, .. }
            | Command::Cancel { id }
            | Command::Amend { id, .. }
            | Command::Hedge { id, .. } => *id,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Submit {
                id,
                side,
                price,
                volume,
                time_in_force,
            } => write!(f, "SUBMIT {} {} {}@{} {}", id, side, volume, price, time_in_force),
            Command::Cancel { id } => write!(f, "CANCEL {}", id),
            Command::Amend { id, volume } => write!(f, "AMEND {} -> {}", id, volume),
            Command::Hedge {
                id,
                side,
                price,
                volume,
            } => write!(f, "HEDGE {} {} {}@{}", id, side, volume, price),
        }
    }
}
