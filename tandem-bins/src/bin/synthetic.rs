//! Run the engine against a synthetic random-walk market
//!
//! The reference mid takes a random step of at most one tick per round; the
//! primary mid follows it with some noise and is occasionally dislocated far
//! enough to cross the reference book. Random trades on the primary reach
//! the engine's quotes through the loopback venue.

use anyhow::Result;
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::sync::atomic::Ordering;
use tandem_bins::common::{init_logging, load_config, print_stats, CommonArgs};
use tandem_bins::venue::LoopbackVenue;
use tandem_core::core::{Instrument, Price};
use tandem_core::engine::Engine;
use tandem_core::events::Event;
use tandem_core::execution::RecordingGateway;
use tandem_core::orderbook::{BookSnapshot, TradeTicks, TOP_LEVEL_COUNT};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about = "Run the engine against a random-walk market")]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    /// Number of market data rounds to generate
    #[arg(short, long, default_value_t = 10_000)]
    rounds: u64,

    /// RNG seed; random when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Starting reference mid in cents
    #[arg(long, default_value_t = 10_000)]
    start_price: Price,

    /// Chance of a primary trade per round
    #[arg(long, default_value_t = 0.3)]
    trade_probability: f64,

    /// Chance the primary is dislocated across the reference book
    #[arg(long, default_value_t = 0.02)]
    dislocation_probability: f64,

    /// Loopback maker fee per lot in cents (negative for a rebate)
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    maker_fee: i64,

    /// Loopback taker fee per lot in cents
    #[arg(long, default_value_t = 0)]
    taker_fee: i64,
}

/// Random-walk market data for both instruments
struct SyntheticFeed {
    rng: StdRng,
    tick: Price,
    /// Reference mid, on a tick
    mid: Price,
    sequence: u64,
    rounds_left: u64,
    trade_probability: f64,
    dislocation_probability: f64,
    pending: VecDeque<Event>,
}

impl SyntheticFeed {
    fn new(args: &Args, tick: Price, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            tick,
            mid: (args.start_price / tick).max(20) * tick,
            sequence: 0,
            rounds_left: args.rounds,
            trade_probability: args.trade_probability.clamp(0.0, 1.0),
            dislocation_probability: args.dislocation_probability.clamp(0.0, 1.0),
            pending: VecDeque::new(),
        }
    }

    fn round(&mut self) {
        self.sequence += 1;
        let tick = self.tick;

        let step = self.rng.gen_range(-1i64..=1);
        self.mid = self.mid.saturating_add_signed(step * tick as i64).max(20 * tick);

        // Reference: one tick either side of the mid
        let reference = self.book(Instrument::Reference, self.mid - tick, self.mid + tick, tick);

        // Primary: noisy copy of the reference, two ticks either side
        let offset = if self.rng.gen_bool(self.dislocation_probability) {
            if self.rng.gen_bool(0.5) {
                4
            } else {
                -4
            }
        } else {
            self.rng.gen_range(-1i64..=1)
        };
        let primary_mid = self.mid.saturating_add_signed(offset * tick as i64);
        let primary = self.book(
            Instrument::Primary,
            primary_mid - 2 * tick,
            primary_mid + 2 * tick,
            tick,
        );

        self.pending.push_back(Event::BookUpdate(reference));
        self.pending.push_back(Event::BookUpdate(primary));

        if self.rng.gen_bool(self.trade_probability) {
            let mut ticks = TradeTicks {
                instrument: Instrument::Primary,
                sequence: self.sequence,
                ask_prices: [0; TOP_LEVEL_COUNT],
                ask_volumes: [0; TOP_LEVEL_COUNT],
                bid_prices: [0; TOP_LEVEL_COUNT],
                bid_volumes: [0; TOP_LEVEL_COUNT],
            };
            let reach = self.rng.gen_range(1..=4) * tick;
            let volume = self.rng.gen_range(1..=40);
            if self.rng.gen_bool(0.5) {
                ticks.ask_prices[0] = primary_mid + reach;
                ticks.ask_volumes[0] = volume;
            } else {
                ticks.bid_prices[0] = primary_mid.saturating_sub(reach);
                ticks.bid_volumes[0] = volume;
            }
            self.pending.push_back(Event::TradeTicks(ticks));
        }
    }

    fn book(&mut self, instrument: Instrument, bid: Price, ask: Price, tick: Price) -> BookSnapshot {
        let mut book = BookSnapshot::empty(instrument, self.sequence);
        for level in 0..TOP_LEVEL_COUNT {
            let depth = level as Price * tick;
            if bid > depth {
                book.bid_prices[level] = bid - depth;
                book.bid_volumes[level] = self.rng.gen_range(5..=100);
            }
            book.ask_prices[level] = ask + depth;
            book.ask_volumes[level] = self.rng.gen_range(5..=100);
        }
        book
    }
}

impl Iterator for SyntheticFeed {
    type Item = Event;

    fn next(&mut self) -> Option<Event> {
        if self.pending.is_empty() && self.rounds_left > 0 {
            self.rounds_left -= 1;
            self.round();
        }
        self.pending.pop_front()
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.common.log_level, args.common.json_logs)?;

    info!("=== Tandem: Synthetic Market + Loopback Venue ===");

    let config = load_config(args.common.config.as_ref())?;
    let seed = args.seed.unwrap_or_else(rand::random);
    info!(seed, rounds = args.rounds, start_price = args.start_price, "Generating market");

    let mut feed = SyntheticFeed::new(&args, config.tick_size, seed);
    let mut venue = LoopbackVenue::new(args.maker_fee, args.taker_fee);
    let mut engine = Engine::new(config, RecordingGateway::new());

    let shutdown = engine.shutdown_signal();
    ctrlc::set_handler(move || {
        warn!("Received Ctrl+C, initiating graceful shutdown...");
        shutdown.store(true, Ordering::Release);
    })?;

    engine.run(|gateway| {
        venue.process(gateway.drain());
        if let Some(event) = venue.next_event() {
            return Ok(Some(event));
        }
        let Some(event) = feed.next() else {
            return Ok(None);
        };
        venue.observe(&event);
        Ok(Some(event))
    })?;

    engine.shutdown();
    venue.settle(&mut engine);
    if venue.open_orders() > 0 {
        warn!(open = venue.open_orders(), "Orders left open at the venue");
    }
    print_stats(&engine.stats());

    Ok(())
}
