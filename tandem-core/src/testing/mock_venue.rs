//! Mock venue for testing
//!
//! Answers the commands an engine records with the lifecycle events a venue
//! would send back. Resting orders fill only when the test says so. Hedges
//! fill in full right away; immediate-or-cancel orders trade up to the
//! scripted IOC liquidity and the rest is cancelled.

use crate::core::{ClientOrderId, Price, Side, TimeInForce, Volume};
use crate::engine::Engine;
use crate::events::Event;
use crate::execution::{Command, RecordingGateway};
use std::collections::{BTreeMap, VecDeque};

/// An order as the venue sees it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VenueOrder {
    pub side: Side,
    pub price: Price,
    pub time_in_force: TimeInForce,
    pub filled: Volume,
    pub remaining: Volume,
}

/// Programmable venue
#[derive(Debug, Default)]
pub struct MockVenue {
    orders: BTreeMap<ClientOrderId, VenueOrder>,
    outbox: VecDeque<Event>,
    /// Price reported on hedge fills
    hedge_fill_price: Price,
    /// Volume each immediate-or-cancel order can trade on arrival
    ioc_liquidity: Volume,
    /// While set, cancels and amends are held instead of answered
    silent: bool,
    held: Vec<Command>,
}

impl MockVenue {
    pub fn new() -> Self {
        Self {
            hedge_fill_price: 10_000,
            ..Self::default()
        }
    }

    /// Hold cancels and amends instead of answering them
    pub fn set_silent(&mut self, silent: bool) {
        self.silent = silent;
    }

    /// Leave silent mode and answer everything that was held
    pub fn release(&mut self) {
        self.silent = false;
        let held = std::mem::take(&mut self.held);
        self.process(held);
    }

    pub fn set_hedge_fill_price(&mut self, price: Price) {
        self.hedge_fill_price = price;
    }

    /// Let every later IOC trade up to `volume` lots at its limit price
    pub fn set_ioc_liquidity(&mut self, volume: Volume) {
        self.ioc_liquidity = volume;
    }

    /// Orders still open on the venue
    pub fn open_orders(&self) -> impl Iterator<Item = (ClientOrderId, &VenueOrder)> {
        self.orders.iter().map(|(id, order)| (*id, order))
    }

    pub fn order(&self, id: ClientOrderId) -> Option<&VenueOrder> {
        self.orders.get(&id)
    }

    /// Turn recorded commands into queued responses
    pub fn process(&mut self, commands: Vec<Command>) {
        for command in commands {
            match command {
                Command::Submit {
                    id,
                    side,
                    price,
                    volume,
                    time_in_force,
                } => {
                    let mut order = VenueOrder {
                        side,
                        price,
                        time_in_force,
                        filled: 0,
                        remaining: volume,
                    };
                    if time_in_force == TimeInForce::ImmediateOrCancel {
                        order.filled = volume.min(self.ioc_liquidity);
                        order.remaining = 0;
                        if order.filled > 0 {
                            self.outbox.push_back(Event::OrderFilled {
                                id,
                                price,
                                volume: order.filled,
                            });
                        }
                        self.outbox.push_back(status(id, &order));
                        continue;
                    }
                    self.orders.insert(id, order);
                    self.outbox.push_back(status(id, &order));
                }
                Command::Cancel { id } => {
                    if self.silent {
                        self.held.push(command);
                        continue;
                    }
                    if let Some(mut order) = self.orders.remove(&id) {
                        order.remaining = 0;
                        self.outbox.push_back(status(id, &order));
                    }
                }
                Command::Amend { id, volume } => {
                    if self.silent {
                        self.held.push(command);
                        continue;
                    }
                    if let Some(order) = self.orders.get_mut(&id) {
                        order.remaining = volume.saturating_sub(order.filled).min(order.remaining);
                        let order = *order;
                        if order.remaining == 0 {
                            self.orders.remove(&id);
                        }
                        self.outbox.push_back(status(id, &order));
                    }
                }
                Command::Hedge { id, volume, .. } => {
                    self.outbox.push_back(Event::HedgeFilled {
                        id,
                        price: self.hedge_fill_price,
                        volume,
                    });
                }
            }
        }
    }

    /// Trade up to `volume` lots of an open order
    ///
    /// Queues the fill and the status update that follows it. Returns the
    /// volume actually traded.
    pub fn fill(&mut self, id: ClientOrderId, volume: Volume) -> Volume {
        let Some(order) = self.orders.get_mut(&id) else {
            return 0;
        };
        let traded = volume.min(order.remaining);
        if traded == 0 {
            return 0;
        }
        order.filled += traded;
        order.remaining -= traded;
        let order = *order;
        if order.remaining == 0 {
            self.orders.remove(&id);
        }

        self.outbox.push_back(Event::OrderFilled {
            id,
            price: order.price,
            volume: traded,
        });
        self.outbox.push_back(status(id, &order));
        traded
    }

    pub fn next_event(&mut self) -> Option<Event> {
        self.outbox.pop_front()
    }

    pub fn pending_events(&self) -> usize {
        self.outbox.len()
    }

    /// Exchange commands and events with `engine` until both sides go quiet
    pub fn settle(&mut self, engine: &mut Engine<RecordingGateway>) {
        loop {
            let commands = engine.gateway_mut().drain();
            self.process(commands);
            match self.next_event() {
                Some(event) => engine.handle(&event),
                None => break,
            }
        }
    }
}

fn status(id: ClientOrderId, order: &VenueOrder) -> Event {
    Event::OrderStatus {
        id,
        filled_volume: order.filled,
        remaining_volume: order.remaining,
        fees: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_then_fill() {
        let mut venue = MockVenue::new();
        let id = ClientOrderId::new(1);
        venue.process(vec![Command::Submit {
            id,
            side: Side::Sell,
            price: 10_100,
            volume: 50,
            time_in_force: TimeInForce::GoodForDay,
        }]);
        assert_eq!(venue.pending_events(), 1);
        venue.next_event();

        assert_eq!(venue.fill(id, 80), 50);
        assert_eq!(
            venue.next_event(),
            Some(Event::OrderFilled {
                id,
                price: 10_100,
                volume: 50
            })
        );
        assert!(venue.order(id).is_none());
    }

    #[test]
    fn test_ioc_trades_scripted_liquidity() {
        let mut venue = MockVenue::new();
        let ioc = |id| Command::Submit {
            id: ClientOrderId::new(id),
            side: Side::Sell,
            price: 10_050,
            volume: 20,
            time_in_force: TimeInForce::ImmediateOrCancel,
        };

        // No liquidity: cancelled on arrival
        venue.process(vec![ioc(1)]);
        assert!(matches!(
            venue.next_event(),
            Some(Event::OrderStatus { filled_volume: 0, remaining_volume: 0, .. })
        ));

        venue.set_ioc_liquidity(15);
        venue.process(vec![ioc(2)]);
        assert_eq!(
            venue.next_event(),
            Some(Event::OrderFilled {
                id: ClientOrderId::new(2),
                price: 10_050,
                volume: 15,
            })
        );
        assert!(matches!(
            venue.next_event(),
            Some(Event::OrderStatus { filled_volume: 15, remaining_volume: 0, .. })
        ));
        assert_eq!(venue.open_orders().count(), 0);
    }

    #[test]
    fn test_silent_venue_holds_cancels() {
        let mut venue = MockVenue::new();
        let id = ClientOrderId::new(1);
        venue.process(vec![Command::Submit {
            id,
            side: Side::Buy,
            price: 9_900,
            volume: 10,
            time_in_force: TimeInForce::GoodForDay,
        }]);
        venue.set_silent(true);
        venue.process(vec![Command::Cancel { id }]);
        assert!(venue.order(id).is_some());

        venue.release();
        assert!(venue.order(id).is_none());
    }
}
