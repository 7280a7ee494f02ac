//! Common utilities for all binaries
//!
//! Shared initialization, CLI parsing, and setup code.

use anyhow::Result;
use clap::Args;
use rust_decimal::Decimal;
use std::path::PathBuf;
use tandem_core::config::EngineConfig;
use tandem_core::engine::EngineStats;
use tandem_core::Instrument;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Common CLI arguments for all binaries
#[derive(Args, Debug)]
pub struct CommonArgs {
    /// Engine configuration (TOML); built-in defaults when omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,
}

/// Initialize tracing/logging
///
/// `RUST_LOG` takes precedence over `level`.
pub fn init_logging(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json().with_target(false)).init();
    } else {
        registry.with(fmt::layer().with_target(false)).init();
    }

    Ok(())
}

/// Load the engine configuration named on the command line
pub fn load_config(path: Option<&PathBuf>) -> Result<EngineConfig> {
    let config = match path {
        Some(path) => {
            let config = EngineConfig::load(path)?;
            info!(path = %path.display(), "Loaded configuration");
            config
        }
        None => {
            info!("Using built-in configuration");
            EngineConfig::default()
        }
    };
    Ok(config)
}

/// Integer cents as dollars
pub fn dollars(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Print final statistics
pub fn print_stats(stats: &EngineStats) {
    let primary = Instrument::Primary.index();
    let reference = Instrument::Reference.index();

    info!("=== Final Statistics ===");
    info!("Events processed: {}", stats.events_processed);
    info!(
        "Book updates: {} primary, {} reference",
        stats.primary_updates, stats.reference_updates
    );
    info!(
        "Market volume: {} primary, {} reference",
        stats.traded_volume[primary], stats.traded_volume[reference]
    );
    if stats.sequence_regressions > 0 {
        info!("Sequence regressions: {}", stats.sequence_regressions);
    }
    info!(
        "Quotes: {} submitted, {} repriced, {} amended, {} cancelled",
        stats.quotes.quotes_submitted, stats.quotes.reprices, stats.quotes.amends, stats.quotes.cancels
    );
    info!(
        "Replacements: {} submitted, {} skipped",
        stats.quotes.replacements_submitted, stats.quotes.replacements_skipped
    );
    info!(
        "Arbitrage: {} orders, {} lots",
        stats.arbitrage.orders_sent, stats.arbitrage.volume_sent
    );
    info!(
        "Hedges: {} sent, {} failed, {} expired, {} lots",
        stats.hedges.hedges_sent,
        stats.hedges.hedges_failed,
        stats.hedges.hedges_expired,
        stats.hedges.hedged_volume
    );
    info!(
        "Venue errors: {} ({} rejects, {} late fills)",
        stats.venue_errors, stats.rejects, stats.late_fills
    );
    info!(
        "Final position: {} primary ({} fills), {} hedge ({} fills)",
        stats.primary_position, stats.primary_fills, stats.hedge_position, stats.hedge_fills
    );
    info!(
        "Cash: ${} primary, ${} hedge, fees ${}",
        dollars(stats.primary_cash),
        dollars(stats.hedge_cash),
        dollars(stats.fees)
    );
    match stats.mark_to_market {
        Some(value) => info!("Mark-to-market PnL: ${}", dollars(value)),
        None => info!("Mark-to-market PnL: n/a (no mid price for both books)"),
    }
}
