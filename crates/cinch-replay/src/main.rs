//! Replay a JSON-lines session transcript and print what a subscriber sees.
//!
//! # Examples
//!
//! ```sh
//! # Replay a recorded transcript with tool summaries
//! cinch-replay --events session.jsonl --verbose on
//!
//! # Pipe events from another process, replies only
//! tail -n +1 session.jsonl | cinch-replay --events - --verbose off
//!
//! # Give retries longer to settle, with debug logging on stderr
//! RUST_LOG=cinch_bridge=debug cinch-replay --events session.jsonl --wait-timeout-ms 30000
//! ```
//!
//! Exit status is 0 when the session settled, 2 when compaction retries were
//! still outstanding at the timeout, and 1 on any other error.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use cinch_bridge::bridge::VerboseLevel;
use cinch_replay::{ReplayConfig, ReplayReport, replay};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Replay a JSON-lines session transcript through the session bridge.
#[derive(Parser)]
#[command(name = "cinch-replay")]
struct Cli {
    /// Transcript file, or `-` for stdin
    #[arg(long)]
    events: PathBuf,

    /// Correlation token recorded on every log line and summary
    #[arg(long, default_value = "replay")]
    run_id: String,

    /// Tool summary verbosity: off or on
    #[arg(long, default_value = "on")]
    verbose: VerboseLevel,

    /// How long to wait for outstanding compaction retries
    #[arg(long, default_value_t = 5000)]
    wait_timeout_ms: u64,

    /// Per-argument truncation width for summaries
    #[arg(long)]
    max_arg_chars: Option<usize>,

    /// Print the report as JSON instead of plain lines
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    match run(&cli).await {
        Ok(report) => {
            print_report(&report, cli.json);
            if !report.settled {
                process::exit(2);
            }
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

async fn run(cli: &Cli) -> Result<ReplayReport, String> {
    let mut config = ReplayConfig::new(cli.run_id.clone())
        .with_verbose_level(cli.verbose)
        .with_wait_timeout(Duration::from_millis(cli.wait_timeout_ms));
    if let Some(max) = cli.max_arg_chars {
        config = config.with_max_arg_chars(max);
    }

    if cli.events.as_os_str() == "-" {
        replay(BufReader::new(io::stdin()), &config).await
    } else {
        let file = File::open(&cli.events)
            .map_err(|e| format!("cannot open {}: {e}", cli.events.display()))?;
        replay(BufReader::new(file), &config).await
    }
}

fn print_report(report: &ReplayReport, json: bool) {
    if json {
        let value = serde_json::json!({
            "events": report.events,
            "skippedLines": report.skipped_lines,
            "summaries": report.summaries,
            "replies": report.replies,
            "settled": report.settled,
            "pendingCompactionRetries": report.pending_compaction_retries,
        });
        println!("{value:#}");
        return;
    }

    for summary in &report.summaries {
        println!("{}", summary.text);
    }
    for reply in &report.replies {
        println!("> {}", reply.text);
    }
    eprintln!(
        "{} events, {} skipped, settled: {}",
        report.events,
        report.skipped_lines.len(),
        if report.settled { "yes" } else { "no" }
    );
}
