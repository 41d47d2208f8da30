//! `slots` CLI — compute bookable slots and materialize recurring series from
//! JSON requests.
//!
//! ## Usage
//!
//! ```sh
//! # Free slots for a request (stdin → stdout)
//! slots free < request.json
//!
//! # Free slots from file to file
//! slots free -i request.json -o slots.json
//!
//! # Book a recurring series against the snapshot in the request
//! slots materialize -i series.json
//!
//! # Preview the next occurrences of a cadence
//! slots next --cadence monthly-day --start 2026-03-12T10:00 --count 4 --tz Europe/Berlin
//!
//! # Show what the engine is doing
//! RUST_LOG=slot_engine=debug slots free -i request.json
//! ```

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use slot_engine::cadence::occurrences_from_local;
use slot_engine::dst;
use slot_engine::{Cadence, FreeSlotsRequest, MaterializeRequest};
use std::io::{self, Read};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "slots",
    version,
    about = "Bookable slot and recurring series CLI"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log engine decisions to stderr (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute free slots for a JSON request
    Free {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Materialize a recurring series for a JSON request
    Materialize {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Print the next occurrences of a cadence
    Next {
        /// Cadence name: none, weekly, monthly-date, monthly-day, yearly
        #[arg(long)]
        cadence: String,
        /// Local start, e.g. 2026-03-12T10:00
        #[arg(long)]
        start: String,
        /// Duration of each occurrence in minutes
        #[arg(long, default_value_t = 60)]
        duration: u32,
        /// Number of occurrences to print
        #[arg(long, default_value_t = 5)]
        count: usize,
        /// IANA timezone of the start time
        #[arg(long, default_value = "UTC")]
        tz: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Free { input, output } => {
            let json = read_input(input.as_deref())?;
            let request =
                FreeSlotsRequest::from_json(&json).context("Failed to parse free-slots request")?;
            let result = request
                .evaluate(Utc::now())
                .context("Failed to compute free slots")?;
            let pretty = serde_json::to_string_pretty(&result)?;
            write_output(output.as_deref(), &pretty)?;
        }
        Commands::Materialize { input, output } => {
            let json = read_input(input.as_deref())?;
            let request = MaterializeRequest::from_json(&json)
                .context("Failed to parse materialize request")?;
            let series = request
                .evaluate()
                .context("Failed to materialize series")?;
            if series.is_truncated() {
                tracing::info!(
                    created = series.created.len(),
                    requested = series.requested,
                    "series truncated at first conflict"
                );
            }
            let pretty = serde_json::to_string_pretty(&series)?;
            write_output(output.as_deref(), &pretty)?;
        }
        Commands::Next {
            cadence,
            start,
            duration,
            count,
            tz,
        } => {
            let cadence: Cadence = cadence.parse()?;
            let local = dst::parse_local(&start)
                .with_context(|| format!("Invalid local datetime: '{}'", start))?;
            let tz = dst::timezone_or_utc(&tz);

            let lines: Vec<String> = occurrences_from_local(local, duration, cadence, tz)?
                .take(count)
                .map(|o| {
                    format!(
                        "{} {}",
                        o.start.with_timezone(&tz).to_rfc3339(),
                        o.end.with_timezone(&tz).to_rfc3339()
                    )
                })
                .collect();
            println!("{}", lines.join("\n"));
        }
    }

    Ok(())
}

/// Send engine events to stderr. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
