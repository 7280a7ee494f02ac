//! Property-based tests for the engine's safety invariants
//!
//! Random market data, partial fills, delayed cancels and arbitrage trades
//! are pushed through an engine wired to the mock venue. After every step:
//! - the primary position stays within the limit
//! - each side has at most one active good-for-day order

#[cfg(test)]
mod tests {
    use crate::config::EngineConfig;
    use crate::core::{Instrument, Side, TimeInForce};
    use crate::engine::quoting::{capacity, ideal_price};
    use crate::events::Event;
    use crate::reference::ReferenceQuote;
    use crate::testing::{create_test_engine, BookBuilder, MockVenue};
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Step {
        Reference { bid: u64, spread: u64, volume: u64 },
        Primary { bid: u64, spread: u64, volume: u64 },
        Fill { side: Side, volume: u64 },
        HoldCancels(bool),
        IocLiquidity(u64),
    }

    fn book(instrument: Instrument, seq: u64, bid: u64, spread: u64, volume: u64) -> Event {
        // Two levels per side so crossings can be walked
        BookBuilder::new(instrument, seq)
            .bid(bid, volume)
            .bid(bid - 100, volume)
            .ask(bid + spread, volume)
            .ask(bid + spread + 100, volume)
            .event()
    }

    fn step() -> impl Strategy<Value = Step> {
        prop_oneof![
            2 => (95u64..106, 1u64..4, 1u64..120).prop_map(|(bid, spread, volume)| {
                Step::Reference { bid: bid * 100, spread: spread * 100, volume }
            }),
            2 => (95u64..106, 1u64..4, 1u64..120).prop_map(|(bid, spread, volume)| {
                Step::Primary { bid: bid * 100, spread: spread * 100, volume }
            }),
            3 => (any::<bool>(), 1u64..80).prop_map(|(buy, volume)| Step::Fill {
                side: if buy { Side::Buy } else { Side::Sell },
                volume,
            }),
            1 => any::<bool>().prop_map(Step::HoldCancels),
            1 => (0u64..150).prop_map(Step::IocLiquidity),
        ]
    }

    /// Property: no sequence of events pushes the position past the limit,
    /// including arbitrage trades on top of resting quotes
    #[test]
    fn prop_position_and_order_invariants() {
        proptest!(|(steps in prop::collection::vec(step(), 1..120))| {
            let mut engine = create_test_engine();
            let mut venue = MockVenue::new();
            let limit = engine.config().limit();

            for (seq, step) in steps.iter().enumerate() {
                let seq = seq as u64 + 1;
                match *step {
                    Step::Reference { bid, spread, volume } => {
                        engine.handle(&book(Instrument::Reference, seq, bid, spread, volume));
                    }
                    Step::Primary { bid, spread, volume } => {
                        engine.handle(&book(Instrument::Primary, seq, bid, spread, volume));
                    }
                    Step::Fill { side, volume } => {
                        let id = venue
                            .open_orders()
                            .find(|(_, order)| order.side == side)
                            .map(|(id, _)| id);
                        if let Some(id) = id {
                            venue.fill(id, volume);
                        }
                    }
                    Step::HoldCancels(true) => venue.set_silent(true),
                    Step::HoldCancels(false) => venue.release(),
                    Step::IocLiquidity(volume) => venue.set_ioc_liquidity(volume),
                }
                venue.settle(&mut engine);

                let position = engine.position().primary();
                prop_assert!(position.abs() <= limit,
                    "position {} outside limit {} after {:?}", position, limit, step);

                for side in Side::BOTH {
                    let resting = engine
                        .reconciler()
                        .active()
                        .filter(|o| o.side == side && o.time_in_force == TimeInForce::GoodForDay)
                        .count();
                    prop_assert!(resting <= 1, "{} active GFD orders on {}", resting, side);
                }
            }
        });
    }

    /// Property: quotes never cross the reference boundary and sit on a tick
    #[test]
    fn prop_ideal_price_respects_boundary() {
        proptest!(|(
            bid in 1u64..20_000,
            spread in 0u64..500,
            competitor in prop::option::of(1u64..30_000),
        )| {
            let config = EngineConfig::default();
            let ask = bid + spread;
            let reference = ReferenceQuote {
                best_bid_price: bid,
                best_bid_volume: 1,
                best_ask_price: ask,
                best_ask_volume: 1,
            };

            match ideal_price(&config, Side::Sell, reference, competitor) {
                Some(sell) => {
                    prop_assert!(sell >= ask + config.clearance());
                    prop_assert!(sell <= config.max_ask_tick);
                    prop_assert_eq!(sell % config.tick_size, 0);
                }
                None => prop_assert!(ask + config.clearance() > config.max_ask_tick),
            }

            match ideal_price(&config, Side::Buy, reference, competitor) {
                Some(buy) => {
                    prop_assert!(buy + config.clearance() <= bid);
                    prop_assert!(buy >= config.min_bid_tick);
                    prop_assert_eq!(buy % config.tick_size, 0);
                }
                None => prop_assert!(bid < config.clearance() + config.min_bid_tick),
            }
        });
    }

    /// Property: a full fill of the quoted capacity plus everything else
    /// outstanding keeps the position within the limit
    #[test]
    fn prop_capacity_never_breaches_limit() {
        proptest!(|(position in -100i64..=100, other in 0u64..250)| {
            let config = EngineConfig::default();
            let limit = config.limit();

            let sell = capacity(&config, Side::Sell, position, other) as i64;
            if other as i64 <= limit + position {
                prop_assert!(position - sell - other as i64 >= -limit);
            } else {
                prop_assert_eq!(sell, 0);
            }

            let buy = capacity(&config, Side::Buy, position, other) as i64;
            if other as i64 <= limit - position {
                prop_assert!(position + buy + other as i64 <= limit);
            } else {
                prop_assert_eq!(buy, 0);
            }
        });
    }
}
