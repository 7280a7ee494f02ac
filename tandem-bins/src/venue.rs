//! Loopback venue
//!
//! Stands in for an exchange when the runners have no real connection. It
//! answers the commands the engine records with the events a venue would
//! send back:
//!
//! - good-for-day orders are acknowledged and rest until a trade reaches them
//! - immediate-or-cancel orders trade against the last primary book
//! - hedges fill in full at the reference touch, or fail when that side is empty
//! - cancels and amends are confirmed straight away
//!
//! There is no queue position: a trade at our price fills us first.

use std::collections::{BTreeMap, VecDeque};
use tandem_core::core::{ClientOrderId, Price, Side, TimeInForce, Volume};
use tandem_core::engine::Engine;
use tandem_core::events::Event;
use tandem_core::execution::{Command, RecordingGateway};
use tandem_core::orderbook::{volume_through, BookSnapshot, TradeTicks};
use tandem_core::Instrument;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
struct OpenOrder {
    side: Side,
    price: Price,
    filled: Volume,
    remaining: Volume,
    fees: i64,
}

/// Exchange simulator driven by recorded commands and market data
#[derive(Debug, Default)]
pub struct LoopbackVenue {
    orders: BTreeMap<ClientOrderId, OpenOrder>,
    outbox: VecDeque<Event>,
    primary: Option<BookSnapshot>,
    reference: Option<BookSnapshot>,
    /// Fee per traded lot in cents, negative for a rebate
    maker_fee: i64,
    taker_fee: i64,
}

impl LoopbackVenue {
    pub fn new(maker_fee: i64, taker_fee: i64) -> Self {
        Self {
            maker_fee,
            taker_fee,
            ..Self::default()
        }
    }

    pub fn open_orders(&self) -> usize {
        self.orders.len()
    }

    pub fn next_event(&mut self) -> Option<Event> {
        self.outbox.pop_front()
    }

    /// Take in a market data event before the engine sees it
    ///
    /// Trade ticks on the primary instrument fill resting orders they reach;
    /// the fills are queued behind the ticks themselves.
    pub fn observe(&mut self, event: &Event) {
        match event {
            Event::BookUpdate(book) => match book.instrument {
                Instrument::Primary => self.primary = Some(book.clone()),
                Instrument::Reference => self.reference = Some(book.clone()),
            },
            Event::TradeTicks(ticks) if ticks.instrument == Instrument::Primary => {
                self.match_trades(ticks);
            }
            _ => {}
        }
    }

    /// Answer the commands the engine sent since the last call
    pub fn process(&mut self, commands: Vec<Command>) {
        for command in commands {
            debug!(%command, "Loopback venue received");
            match command {
                Command::Submit {
                    id,
                    side,
                    price,
                    volume,
                    time_in_force: TimeInForce::GoodForDay,
                } => {
                    let order = OpenOrder {
                        side,
                        price,
                        filled: 0,
                        remaining: volume,
                        fees: 0,
                    };
                    self.orders.insert(id, order);
                    self.outbox.push_back(status(id, &order));
                }
                Command::Submit {
                    id,
                    side,
                    price,
                    volume,
                    time_in_force: TimeInForce::ImmediateOrCancel,
                } => self.trade_immediately(id, side, price, volume),
                Command::Cancel { id } => {
                    if let Some(mut order) = self.orders.remove(&id) {
                        order.remaining = 0;
                        self.outbox.push_back(status(id, &order));
                    }
                }
                Command::Amend { id, volume } => {
                    if let Some(order) = self.orders.get_mut(&id) {
                        order.remaining = volume.saturating_sub(order.filled).min(order.remaining);
                        let order = *order;
                        if order.remaining == 0 {
                            self.orders.remove(&id);
                        }
                        self.outbox.push_back(status(id, &order));
                    }
                }
                Command::Hedge { id, side, volume, .. } => self.hedge(id, side, volume),
            }
        }
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

    fn trade_immediately(&mut self, id: ClientOrderId, side: Side, price: Price, volume: Volume) {
        // A sell takes bids at or above its limit, a buy takes asks at or below
        let available = self
            .primary
            .as_ref()
            .map(|book| volume_through(book, side.opposite(), price))
            .unwrap_or(0);
        let traded = volume.min(available);

        let mut order = OpenOrder {
            side,
            price,
            filled: 0,
            remaining: volume,
            fees: 0,
        };
        if traded > 0 {
            order.filled = traded;
            order.fees = self.taker_fee * traded as i64;
            self.outbox.push_back(Event::OrderFilled {
                id,
                price,
                volume: traded,
            });
        }
        order.remaining = 0;
        self.outbox.push_back(status(id, &order));
    }

    fn hedge(&mut self, id: ClientOrderId, side: Side, volume: Volume) {
        let touch = self.reference.as_ref().map(|book| match side {
            Side::Buy => book.best_ask_price(),
            Side::Sell => book.best_bid_price(),
        });
        match touch {
            Some(price) if price > 0 => self.outbox.push_back(Event::HedgeFilled { id, price, volume }),
            _ => self.outbox.push_back(Event::Error {
                id,
                message: "no reference liquidity for hedge".to_string(),
            }),
        }
    }

    fn match_trades(&mut self, ticks: &TradeTicks) {
        // Aggressive buys trade on the ask side, aggressive sells on the bid side
        let highest_buy = ticks
            .ask_prices
            .iter()
            .zip(&ticks.ask_volumes)
            .filter(|(_, volume)| **volume > 0)
            .map(|(price, _)| *price)
            .max();
        let lowest_sell = ticks
            .bid_prices
            .iter()
            .zip(&ticks.bid_volumes)
            .filter(|(price, volume)| **price > 0 && **volume > 0)
            .map(|(price, _)| *price)
            .min();
        let mut buy_volume: Volume = ticks.ask_volumes.iter().sum();
        let mut sell_volume: Volume = ticks.bid_volumes.iter().sum();

        let ids: Vec<ClientOrderId> = self.orders.keys().copied().collect();
        for id in ids {
            let Some(order) = self.orders.get_mut(&id) else {
                continue;
            };
            let (reached, pool) = match order.side {
                Side::Sell => (highest_buy.is_some_and(|p| p >= order.price), &mut buy_volume),
                Side::Buy => (lowest_sell.is_some_and(|p| p <= order.price), &mut sell_volume),
            };
            if !reached || *pool == 0 {
                continue;
            }

            let traded = order.remaining.min(*pool);
            *pool -= traded;
            order.filled += traded;
            order.remaining -= traded;
            order.fees += self.maker_fee * traded as i64;
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
        }
    }
}

fn status(id: ClientOrderId, order: &OpenOrder) -> Event {
    Event::OrderStatus {
        id,
        filled_volume: order.filled,
        remaining_volume: order.remaining,
        fees: order.fees,
    }
}
