//! User Input Tracker CLI
//!
//! Replays raw input events from a JSON-lines stream and prints one aggregate
//! per window.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};
use user_input_tracker::{
    logging::init_tracing, ChannelSource, Config, RawEvent, SourceFeed, Tracker,
    UserInputAggregate, UserInputTracker, VERSION,
};

#[derive(Parser)]
#[command(name = "user-input-tracker")]
#[command(version = VERSION)]
#[command(about = "Windowed aggregation of keyboard and pointer activity", long_about = None)]
struct Cli {
    /// Include log targets in output
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate raw events read as JSON lines
    Run {
        /// Window length in milliseconds (overrides config)
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Tally keystrokes per category
        #[arg(long)]
        key_details: bool,

        /// Read events from this file instead of stdin
        #[arg(long, short)]
        input: Option<PathBuf>,
    },

    /// Show configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load().context("loading configuration")?;
    init_tracing(&config.log_filter, cli.verbose);

    match cli.command {
        Commands::Run {
            interval_ms,
            key_details,
            input,
        } => cmd_run(config, interval_ms, key_details, input),
        Commands::Config => cmd_config(&config),
    }
}

fn cmd_run(
    mut config: Config,
    interval_ms: Option<u64>,
    key_details: bool,
    input: Option<PathBuf>,
) -> Result<()> {
    if let Some(ms) = interval_ms {
        config.aggregating_interval = Duration::from_millis(ms);
    }
    if key_details {
        config.collect_key_details = true;
    }

    let reader: Box<dyn BufRead + Send> = match input {
        Some(ref path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("opening {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let source = ChannelSource::new();
    spawn_reader(reader, source.feed());

    let mut tracker = UserInputTracker::new(
        source,
        print_aggregate,
        config.aggregating_interval,
        config.tracker_options(),
    )?;

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || r.store(false, Ordering::SeqCst))
        .context("setting Ctrl+C handler")?;

    tracker.start()?;
    info!(
        interval_ms = config.aggregating_interval.as_millis() as u64,
        key_details = config.collect_key_details,
        "press Ctrl+C to stop"
    );

    while running.load(Ordering::SeqCst) {
        thread::sleep(Duration::from_millis(100));
    }

    tracker.terminate();
    eprintln!();
    eprintln!("{}", tracker.stats().summary());
    Ok(())
}

/// Print an aggregate as one JSON line on stdout.
fn print_aggregate(aggregate: &UserInputAggregate) {
    match serde_json::to_string(aggregate) {
        Ok(line) => {
            let mut out = io::stdout().lock();
            let _ = writeln!(out, "{line}");
            let _ = out.flush();
        }
        Err(e) => warn!(error = %e, "could not serialize aggregate"),
    }
}

/// Parse raw events off `reader` on a background thread.
fn spawn_reader(reader: Box<dyn BufRead + Send>, feed: SourceFeed) {
    thread::spawn(move || {
        for (index, line) in reader.lines().enumerate() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!(error = %e, "input read failed");
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<RawEvent>(&line) {
                Ok(event) => {
                    feed.send(event);
                }
                Err(e) => warn!(line = index + 1, error = %e, "skipping malformed event"),
            }
        }
        info!("input stream ended");
    });
}

fn cmd_config(config: &Config) -> Result<()> {
    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}
