//! Replay a recorded event stream through the engine
//!
//! Reads one JSON event per line and feeds it to an
//! `Engine<RecordingGateway>`. Recordings that carry the venue's answers
//! (fills, statuses) are replayed as they are; for market-data-only
//! recordings, `--loopback` answers the engine's commands instead.
//!
//! Ctrl+C stops the replay; open orders are cancelled before the report.

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use tandem_bins::common::{init_logging, load_config, print_stats, CommonArgs};
use tandem_bins::venue::LoopbackVenue;
use tandem_core::engine::Engine;
use tandem_core::events::Event;
use tandem_core::execution::{Command, RecordingGateway};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about = "Replay a JSON-lines event file through the engine")]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    /// JSON-lines event file
    input: PathBuf,

    /// Answer the engine's commands with the loopback venue
    #[arg(long)]
    loopback: bool,

    /// Write every command the engine sends to this JSON-lines file
    #[arg(long)]
    commands_out: Option<PathBuf>,

    /// Loopback maker fee per lot in cents (negative for a rebate)
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    maker_fee: i64,

    /// Loopback taker fee per lot in cents
    #[arg(long, default_value_t = 0)]
    taker_fee: i64,
}

/// Optional JSON-lines sink for outbound commands
struct CommandLog {
    writer: Option<BufWriter<File>>,
    written: u64,
}

impl CommandLog {
    fn open(path: Option<&PathBuf>) -> Result<Self> {
        let writer = match path {
            Some(path) => Some(BufWriter::new(File::create(path).with_context(|| {
                format!("Failed to create command log {}", path.display())
            })?)),
            None => None,
        };
        Ok(Self { writer, written: 0 })
    }

    fn write(&mut self, commands: &[Command]) -> Result<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };
        for command in commands {
            serde_json::to_writer(&mut *writer, command)?;
            writer.write_all(b"\n")?;
            self.written += 1;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush().context("Failed to flush command log")?;
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.common.log_level, args.common.json_logs)?;

    info!("=== Tandem: Replay ===");
    info!("Input: {}", args.input.display());

    let config = load_config(args.common.config.as_ref())?;
    let mut engine = Engine::new(config, RecordingGateway::new());

    let shutdown = engine.shutdown_signal();
    ctrlc::set_handler(move || {
        warn!("Received Ctrl+C, initiating graceful shutdown...");
        shutdown.store(true, Ordering::Release);
    })?;

    let file = File::open(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;
    let mut lines = BufReader::new(file).lines();
    let mut line_no = 0usize;

    let mut venue = args
        .loopback
        .then(|| LoopbackVenue::new(args.maker_fee, args.taker_fee));
    let mut log = CommandLog::open(args.commands_out.as_ref())?;

    let feed = |gateway: &mut RecordingGateway| -> Result<Option<Event>> {
        let commands = gateway.drain();
        log.write(&commands)?;
        if let Some(venue) = venue.as_mut() {
            venue.process(commands);
            if let Some(event) = venue.next_event() {
                return Ok(Some(event));
            }
        }

        for line in lines.by_ref() {
            line_no += 1;
            let line = line.with_context(|| format!("Failed to read line {line_no}"))?;
            if line.trim().is_empty() {
                continue;
            }
            let event: Event = serde_json::from_str(&line)
                .with_context(|| format!("Invalid event on line {line_no}"))?;
            if let Some(venue) = venue.as_mut() {
                venue.observe(&event);
            }
            return Ok(Some(event));
        }
        Ok(None)
    };

    engine.run(feed)?;

    engine.shutdown();
    log.write(engine.gateway().commands())?;
    match venue.as_mut() {
        Some(venue) => venue.settle(&mut engine),
        None => {
            engine.gateway_mut().drain();
        }
    }
    log.finish()?;

    if args.commands_out.is_some() {
        info!("Commands written: {}", log.written);
    }
    print_stats(&engine.stats());

    Ok(())
}
