//! Order State Machine
//!
//! Every order the engine submits is tracked as a [`RestingOrder`] whose
//! [`OrderState`] only moves along the edges below. The gateway is
//! fire-and-forget, so a cancel request is just a state: the order keeps
//! accepting fills until the venue reports zero remaining volume.
//!
//! # State Diagram
//!
//! ```text
//!                 ┌─────────────┐
//!   submit ──────▶│ PendingNew  │
//!                 └──────┬──────┘
//!                        │ ack / first fill
//!                        ▼
//!                 ┌─────────────┐  amend (volume only)
//!                 │    Live     │◀──────────┐
//!                 └──┬───────┬──┘───────────┘
//!        cancel      │       │  cancel + queue replacement
//!                    ▼       ▼
//!       ┌───────────────┐ ┌──────────────────────┐
//!       │ PendingCancel │ │ PendingCancelReplace │ (price, volume,
//!       └───────┬───────┘ └──────────┬───────────┘  filled while pending)
//!               │                    │
//!               └─────────┬──────────┘
//!                         ▼   remaining == 0
//!                 ┌─────────────┐  (fill, cancel confirmed, reject)
//!                 │    Done     │
//!                 └─────────────┘
//! ```
//!
//! Any non-terminal state goes to `Done` once remaining volume hits zero.
//! `None` is never stored on an order; it describes an empty side slot.

use super::errors::{FillError, TransitionError};
use super::types::{ClientOrderId, Price, Side, TimeInForce, Volume};

/// Replacement queued behind an in-flight cancel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Replacement {
    /// Price the replacement will be submitted at
    pub price: Price,
    /// Volume computed when the cancel was requested
    pub volume: Volume,
    /// Volume the old order filled while the cancel was in flight
    pub filled_while_pending: Volume,
}

/// Lifecycle state of an order (or of an empty side slot)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderState {
    /// No order in this slot
    None,
    /// Submitted, not yet acknowledged
    PendingNew,
    /// Acknowledged and resting
    Live,
    /// Cancel in flight, nothing queued behind it
    PendingCancel,
    /// Cancel in flight with a replacement queued behind it
    PendingCancelReplace(Replacement),
    /// Terminal
    Done,
}

impl OrderState {
    /// True once the order can no longer change
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderState::Done)
    }

    /// True for every state that occupies a slot
    #[inline]
    pub fn is_active(&self) -> bool {
        !matches!(self, OrderState::None | OrderState::Done)
    }

    /// True while a cancel request is outstanding
    #[inline]
    pub fn is_cancel_pending(&self) -> bool {
        matches!(
            self,
            OrderState::PendingCancel | OrderState::PendingCancelReplace(_)
        )
    }

    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            OrderState::None => "NONE",
            OrderState::PendingNew => "PENDING_NEW",
            OrderState::Live => "LIVE",
            OrderState::PendingCancel => "PENDING_CANCEL",
            OrderState::PendingCancelReplace(_) => "PENDING_CANCEL_REPLACE",
            OrderState::Done => "DONE",
        }
    }
}

/// What a lifecycle event did to an order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// State unchanged (volumes may have moved)
    Unchanged,
    /// PendingNew → Live
    Acknowledged,
    /// Reached `Done`; carries the replacement queued behind a cancel, if any
    Completed(Option<Replacement>),
}

/// An order submitted by the engine
#[derive(Debug, Clone)]
pub struct RestingOrder {
    pub id: ClientOrderId,
    pub side: Side,
    pub price: Price,
    pub time_in_force: TimeInForce,
    /// Total volume currently requested (reduced by amends)
    pub requested_volume: Volume,
    /// Volume still working on the venue
    pub remaining_volume: Volume,
    /// Volume filled so far, from fill events
    pub filled_volume: Volume,
    /// New total volume of an amend that is not yet confirmed
    pub amend_target: Option<Volume>,
    state: OrderState,
}

impl RestingOrder {
    /// Create a freshly submitted order
    pub fn new(
        id: ClientOrderId,
        side: Side,
        price: Price,
        volume: Volume,
        time_in_force: TimeInForce,
    ) -> Self {
        Self {
            id,
            side,
            price,
            time_in_force,
            requested_volume: volume,
            remaining_volume: volume,
            filled_volume: 0,
            amend_target: None,
            state: OrderState::PendingNew,
        }
    }

    #[inline]
    pub fn state(&self) -> OrderState {
        self.state
    }

    /// Volume that could still fill
    #[inline]
    pub fn outstanding(&self) -> Volume {
        if self.state.is_active() {
            self.remaining_volume
        } else {
            0
        }
    }

    /// Replacement queued behind the cancel, if any
    pub fn replacement(&self) -> Option<Replacement> {
        match self.state {
            OrderState::PendingCancelReplace(r) => Some(r),
            _ => None,
        }
    }

    /// Transition: PendingNew → Live
    ///
    /// Later acknowledgments are no-ops.
    pub fn acknowledge(&mut self) -> Result<Progress, TransitionError> {
        match self.state {
            OrderState::PendingNew => {
                self.state = OrderState::Live;
                Ok(Progress::Acknowledged)
            }
            OrderState::Done => Err(TransitionError::AlreadyDone(self.id)),
            _ => Ok(Progress::Unchanged),
        }
    }

    /// Transition: Live | PendingNew | PendingCancelReplace → PendingCancel
    ///
    /// Cancelling an order with a queued replacement drops the replacement.
    pub fn request_cancel(&mut self) -> Result<(), TransitionError> {
        match self.state {
            OrderState::PendingNew | OrderState::Live | OrderState::PendingCancelReplace(_) => {
                self.state = OrderState::PendingCancel;
                Ok(())
            }
            OrderState::Done => Err(TransitionError::AlreadyDone(self.id)),
            from => Err(TransitionError::InvalidTransition {
                id: self.id,
                from,
                action: "cancel",
            }),
        }
    }

    /// Transition: Live → PendingCancelReplace
    ///
    /// If a replacement is already queued its price and volume are updated in
    /// place; the volume filled while pending is kept.
    pub fn request_cancel_replace(
        &mut self,
        price: Price,
        volume: Volume,
    ) -> Result<(), TransitionError> {
        match self.state {
            OrderState::Live => {
                self.state = OrderState::PendingCancelReplace(Replacement {
                    price,
                    volume,
                    filled_while_pending: 0,
                });
                Ok(())
            }
            OrderState::PendingCancelReplace(r) => {
                self.state = OrderState::PendingCancelReplace(Replacement {
                    price,
                    volume,
                    ..r
                });
                Ok(())
            }
            OrderState::Done => Err(TransitionError::AlreadyDone(self.id)),
            from => Err(TransitionError::InvalidTransition {
                id: self.id,
                from,
                action: "cancel-replace",
            }),
        }
    }

    /// Reduce the order's total volume; only allowed while Live
    pub fn request_amend(&mut self, new_total: Volume) -> Result<(), TransitionError> {
        if self.state != OrderState::Live
            || new_total >= self.requested_volume
            || new_total <= self.filled_volume
        {
            return Err(TransitionError::InvalidTransition {
                id: self.id,
                from: self.state,
                action: "amend",
            });
        }
        self.amend_target = Some(new_total);
        Ok(())
    }

    /// Apply a fill reported by the venue
    ///
    /// # Validation
    ///
    /// - Fill volume must be > 0
    /// - Fill volume must not exceed remaining volume
    ///
    /// The order is not modified on validation failure.
    pub fn apply_fill(&mut self, volume: Volume) -> Result<Progress, FillError> {
        if self.state.is_terminal() {
            return Err(FillError::Terminal(self.id));
        }
        if volume == 0 {
            return Err(FillError::ZeroVolume);
        }
        if volume > self.remaining_volume {
            return Err(FillError::ExceedsRemaining {
                fill: volume,
                remaining: self.remaining_volume,
                requested: self.requested_volume,
            });
        }

        self.filled_volume += volume;
        self.remaining_volume -= volume;

        let mut progress = Progress::Unchanged;
        if let OrderState::PendingCancelReplace(r) = &mut self.state {
            r.filled_while_pending += volume;
        }
        if self.state == OrderState::PendingNew {
            // A fill implies the venue accepted the order
            self.state = OrderState::Live;
            progress = Progress::Acknowledged;
        }

        if self.remaining_volume == 0 {
            return Ok(Progress::Completed(self.finish()));
        }
        Ok(progress)
    }

    /// Apply an authoritative status report
    ///
    /// `remaining == 0` is terminal whatever the current state. Otherwise the
    /// report acknowledges a pending order and confirms any amend.
    pub fn apply_status(&mut self, remaining: Volume) -> Result<Progress, TransitionError> {
        if self.state.is_terminal() {
            return Err(TransitionError::AlreadyDone(self.id));
        }
        if remaining == 0 {
            self.remaining_volume = 0;
            return Ok(Progress::Completed(self.finish()));
        }

        self.remaining_volume = remaining;
        if let Some(target) = self.amend_target.take() {
            self.requested_volume = target;
        }
        self.acknowledge()
    }

    /// Force the order to `Done` (reject or error)
    ///
    /// Any queued replacement is discarded.
    pub fn reject(&mut self) -> Result<(), TransitionError> {
        if self.state.is_terminal() {
            return Err(TransitionError::AlreadyDone(self.id));
        }
        self.remaining_volume = 0;
        self.state = OrderState::Done;
        Ok(())
    }

    fn finish(&mut self) -> Option<Replacement> {
        let replacement = self.replacement();
        self.state = OrderState::Done;
        self.amend_target = None;
        replacement
    }
}
