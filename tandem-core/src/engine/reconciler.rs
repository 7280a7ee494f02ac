//! Order lifecycle reconciler
//!
//! Owns every order the engine has sent to the primary instrument. Lifecycle
//! events are applied through [`RestingOrder`]'s state machine; once an order
//! reaches `Done` it leaves the active index and frees its side slot.
//!
//! Ids come from a single monotonic counter shared with hedge orders, so an id
//! never refers to two things.

use crate::core::{
    ClientOrderId, FillError, OrderState, Price, Progress, RestingOrder, Side, TimeInForce,
    Volume,
};
use crate::execution::OrderGateway;
use std::collections::{HashMap, VecDeque};
use tracing::{debug, warn};

/// Retired ids remembered for late fills
pub const RETIRED_CAPACITY: usize = 1024;

/// Result of routing a fill to the reconciler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillOutcome {
    /// Fill applied to an active order
    Tracked {
        side: Side,
        time_in_force: TimeInForce,
        progress: Progress,
    },
    /// Fill for an order that already left the active index; inventory still
    /// moves but no order state does
    Late { side: Side },
    /// Not one of our primary orders
    Unknown,
}

/// A finished order handed back to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub side: Side,
    pub time_in_force: TimeInForce,
    pub progress: Progress,
}

#[derive(Debug)]
pub struct OrderReconciler {
    next_id: u64,
    active: HashMap<ClientOrderId, RestingOrder>,
    /// Current good-for-day order per side, indexed by `Side::index`
    resting: [Option<ClientOrderId>; 2],
    retired: VecDeque<(ClientOrderId, Side)>,
    /// Retired since the last `drain_retired`
    newly_retired: Vec<ClientOrderId>,
}

impl Default for OrderReconciler {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderReconciler {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            active: HashMap::new(),
            resting: [None, None],
            retired: VecDeque::with_capacity(RETIRED_CAPACITY),
            newly_retired: Vec::new(),
        }
    }

    /// Hand out the next client order id
    #[inline]
    pub fn allocate_id(&mut self) -> ClientOrderId {
        let id = ClientOrderId::new(self.next_id);
        self.next_id += 1;
        id
    }

    /// Start tracking a freshly submitted order
    ///
    /// Good-for-day orders take the side's resting slot, which must be free.
    pub fn track(&mut self, order: RestingOrder) {
        if order.time_in_force == TimeInForce::GoodForDay {
            debug_assert!(
                self.resting[order.side.index()].is_none(),
                "resting slot for {} already taken",
                order.side
            );
            self.resting[order.side.index()] = Some(order.id);
        }
        debug!(id = %order.id, side = %order.side, price = order.price,
               volume = order.requested_volume, tif = %order.time_in_force, "Order tracked");
        self.active.insert(order.id, order);
    }

    /// The side's current resting order, if any
    #[inline]
    pub fn resting(&self, side: Side) -> Option<&RestingOrder> {
        self.resting[side.index()].and_then(|id| self.active.get(&id))
    }

    #[inline]
    pub fn resting_mut(&mut self, side: Side) -> Option<&mut RestingOrder> {
        match self.resting[side.index()] {
            Some(id) => self.active.get_mut(&id),
            None => None,
        }
    }

    /// Lifecycle state of the side's slot
    pub fn slot_state(&self, side: Side) -> OrderState {
        self.resting(side)
            .map(|order| order.state())
            .unwrap_or(OrderState::None)
    }

    pub fn get(&self, id: ClientOrderId) -> Option<&RestingOrder> {
        self.active.get(&id)
    }

    /// True if `id` is an active primary order
    pub fn is_active(&self, id: ClientOrderId) -> bool {
        self.active.contains_key(&id)
    }

    /// Number of active orders (resting and IOC)
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Every active order, in no particular order
    pub fn active(&self) -> impl Iterator<Item = &RestingOrder> {
        self.active.values()
    }

    /// Ids of every active order, ascending
    pub fn active_ids(&self) -> Vec<ClientOrderId> {
        let mut ids: Vec<_> = self.active().map(|order| order.id).collect();
        ids.sort_unstable();
        ids
    }

    /// Volume that could still fill on `side`, across all active orders
    pub fn outstanding(&self, side: Side) -> Volume {
        self.active()
            .filter(|order| order.side == side)
            .map(RestingOrder::outstanding)
            .sum()
    }

    /// Outstanding volume on `side` excluding the resting slot
    pub fn outstanding_excluding_resting(&self, side: Side) -> Volume {
        let resting = self.resting[side.index()];
        self.active()
            .filter(|order| order.side == side && Some(order.id) != resting)
            .map(RestingOrder::outstanding)
            .sum()
    }

    // ===== COMMANDS =====
    //
    // Each command updates the order's state first and then talks to the
    // gateway. A synchronous gateway error is handled exactly like a reject
    // reported later by the venue.

    /// Submit and track a new order
    pub fn submit<G: OrderGateway>(
        &mut self,
        gateway: &mut G,
        side: Side,
        price: Price,
        volume: Volume,
        time_in_force: TimeInForce,
    ) -> Option<ClientOrderId> {
        let id = self.allocate_id();
        self.track(RestingOrder::new(id, side, price, volume, time_in_force));
        match gateway.submit_order(id, side, price, volume, time_in_force) {
            Ok(()) => Some(id),
            Err(e) => {
                warn!(%id, error = %e, "Submit failed");
                self.on_reject(id);
                None
            }
        }
    }

    /// Cancel the side's resting order, dropping any queued replacement
    pub fn cancel<G: OrderGateway>(&mut self, gateway: &mut G, side: Side) -> bool {
        let Some(order) = self.resting_mut(side) else {
            return false;
        };
        let id = order.id;
        let was_pending = order.state().is_cancel_pending();
        if let Err(e) = order.request_cancel() {
            debug!(%id, error = %e, "Cancel skipped");
            return false;
        }
        // A cancel is already on the wire for PendingCancelReplace
        if was_pending {
            return true;
        }
        self.send_cancel(gateway, id)
    }

    /// Cancel the side's live order and queue a replacement behind it
    ///
    /// If a replacement is already queued it is updated in place and no
    /// further cancel is sent.
    pub fn cancel_replace<G: OrderGateway>(
        &mut self,
        gateway: &mut G,
        side: Side,
        price: Price,
        volume: Volume,
    ) -> bool {
        let Some(order) = self.resting_mut(side) else {
            return false;
        };
        let id = order.id;
        let already_queued = order.replacement().is_some();
        if let Err(e) = order.request_cancel_replace(price, volume) {
            debug!(%id, error = %e, "Cancel-replace skipped");
            return false;
        }
        if already_queued {
            debug!(%id, price, volume, "Queued replacement updated");
            return true;
        }
        self.send_cancel(gateway, id)
    }

    /// Reduce the side's live order to `new_total` lots
    pub fn amend<G: OrderGateway>(&mut self, gateway: &mut G, side: Side, new_total: Volume) -> bool {
        let Some(order) = self.resting_mut(side) else {
            return false;
        };
        let id = order.id;
        if let Err(e) = order.request_amend(new_total) {
            debug!(%id, error = %e, "Amend skipped");
            return false;
        }
        match gateway.amend_order(id, new_total) {
            Ok(()) => true,
            Err(e) => {
                warn!(%id, error = %e, "Amend failed");
                self.on_reject(id);
                false
            }
        }
    }

    /// Cancel every active order (resting and IOC)
    pub fn cancel_all<G: OrderGateway>(&mut self, gateway: &mut G) -> usize {
        let mut sent = 0;
        for id in self.active_ids() {
            let Some(order) = self.active.get_mut(&id) else {
                continue;
            };
            let was_pending = order.state().is_cancel_pending();
            if order.request_cancel().is_err() || was_pending {
                continue;
            }
            if self.send_cancel(gateway, id) {
                sent += 1;
            }
        }
        sent
    }

    fn send_cancel<G: OrderGateway>(&mut self, gateway: &mut G, id: ClientOrderId) -> bool {
        match gateway.cancel_order(id) {
            Ok(()) => true,
            Err(e) => {
                warn!(%id, error = %e, "Cancel failed");
                self.on_reject(id);
                false
            }
        }
    }

    /// Apply a fill reported for one of our primary orders
    pub fn on_fill(&mut self, id: ClientOrderId, volume: Volume) -> FillOutcome {
        let Some(order) = self.active.get_mut(&id) else {
            return match self.retired_side(id) {
                Some(side) => {
                    warn!(%id, volume, "Late fill for retired order");
                    FillOutcome::Late { side }
                }
                None => {
                    debug!(%id, volume, "Fill for unknown order ignored");
                    FillOutcome::Unknown
                }
            };
        };

        let side = order.side;
        let time_in_force = order.time_in_force;
        match order.apply_fill(volume) {
            Ok(progress) => {
                debug!(%id, volume, remaining = order.remaining_volume,
                       state = order.state().name(), "Fill applied");
                if let Progress::Completed(_) = progress {
                    self.retire(id);
                }
                FillOutcome::Tracked {
                    side,
                    time_in_force,
                    progress,
                }
            }
            Err(FillError::ZeroVolume) => {
                debug!(%id, "Zero-volume fill ignored");
                FillOutcome::Unknown
            }
            Err(e) => {
                // The trade happened; our volume bookkeeping is what's off
                warn!(%id, volume, error = %e, "Inconsistent fill, inventory updated only");
                FillOutcome::Late { side }
            }
        }
    }

    /// Apply an authoritative status report
    ///
    /// Returns `None` for ids that are not active (duplicates, hedges, stale).
    pub fn on_status(&mut self, id: ClientOrderId, remaining: Volume) -> Option<Completion> {
        let Some(order) = self.active.get_mut(&id) else {
            debug!(%id, remaining, "Status for inactive order ignored");
            return None;
        };

        let side = order.side;
        let time_in_force = order.time_in_force;
        match order.apply_status(remaining) {
            Ok(progress) => {
                debug!(%id, remaining, state = order.state().name(), "Status applied");
                if let Progress::Completed(_) = progress {
                    self.retire(id);
                }
                Some(Completion {
                    side,
                    time_in_force,
                    progress,
                })
            }
            Err(e) => {
                debug!(%id, error = %e, "Status ignored");
                None
            }
        }
    }

    /// Finalize an order the venue refused; any queued replacement is dropped
    pub fn on_reject(&mut self, id: ClientOrderId) -> Option<Side> {
        let order = self.active.get_mut(&id)?;
        let side = order.side;
        if let Err(e) = order.reject() {
            debug!(%id, error = %e, "Reject ignored");
            return None;
        }
        self.retire(id);
        Some(side)
    }

    /// Remove a `Done` order from the active index
    fn retire(&mut self, id: ClientOrderId) {
        if let Some(order) = self.active.remove(&id) {
            let slot = &mut self.resting[order.side.index()];
            if *slot == Some(id) {
                *slot = None;
            }
            if self.retired.len() == RETIRED_CAPACITY {
                self.retired.pop_front();
            }
            self.retired.push_back((id, order.side));
            self.newly_retired.push(id);
            debug!(%id, side = %order.side, "Order retired");
        }
    }

    /// Ids retired since the previous call, oldest first
    pub fn drain_retired(&mut self) -> impl Iterator<Item = ClientOrderId> + '_ {
        self.newly_retired.drain(..)
    }

    /// True if `id` finished recently enough to still be remembered
    pub fn is_retired(&self, id: ClientOrderId) -> bool {
        self.retired_side(id).is_some()
    }

    fn retired_side(&self, id: ClientOrderId) -> Option<Side> {
        self.retired
            .iter()
            .rev()
            .find(|(retired, _)| *retired == id)
            .map(|(_, side)| *side)
    }
}
