//! Replay a recorded session transcript through [`cinch_bridge::subscribe`].
//!
//! A transcript is JSON lines, one session event per line, exactly as a live
//! session would emit them. Each line is pushed through a
//! [`ManualSession`], so the replay exercises the same routing, summary
//! formatting and retry accounting a live subscription would.
//!
//! ```ignore
//! let config = ReplayConfig::new("run-7").with_verbose_level(VerboseLevel::On);
//! let report = replay(BufReader::new(std::io::stdin()), &config).await?;
//! for summary in &report.summaries {
//!     println!("{}", summary.text);
//! }
//! ```

use std::io::{self, BufRead};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cinch_bridge::prelude::*;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Lines read ahead of the session before the reader thread blocks.
const READ_AHEAD_LINES: usize = 64;

/// Settings for one replay.
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// Correlation token for the subscription.
    pub run_id: String,
    pub verbose_level: VerboseLevel,
    /// How long to wait for outstanding compaction retries once the
    /// transcript is exhausted.
    pub wait_timeout: Duration,
    /// Per-argument truncation width for summaries. `None` keeps the
    /// formatter default.
    pub max_arg_chars: Option<usize>,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            run_id: "replay".into(),
            verbose_level: VerboseLevel::On,
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
            max_arg_chars: None,
        }
    }
}

impl ReplayConfig {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            ..Default::default()
        }
    }

    pub fn with_verbose_level(mut self, level: VerboseLevel) -> Self {
        self.verbose_level = level;
        self
    }

    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    pub fn with_max_arg_chars(mut self, max_arg_chars: usize) -> Self {
        self.max_arg_chars = Some(max_arg_chars);
        self
    }
}

/// What a replay observed.
#[derive(Debug, Default)]
pub struct ReplayReport {
    /// Lines pushed into the session.
    pub events: usize,
    /// Lines that were not valid JSON, by 1-based line number.
    pub skipped_lines: Vec<usize>,
    pub summaries: Vec<ToolSummary>,
    pub replies: Vec<AssistantReply>,
    /// Whether every compaction retry finished before the wait timed out.
    pub settled: bool,
    pub pending_compaction_retries: usize,
}

/// Feed every line of `reader` through a fresh subscription and collect what
/// the sinks received.
///
/// Blank lines are ignored and lines that are not JSON are skipped with a
/// warning; event-level problems (unknown types, missing fields) are left to
/// the bridge, which ignores them.
///
/// Reading happens on a blocking thread, so `reader` may be a slow pipe.
///
/// # Errors
///
/// Fails on a read error or when called outside a Tokio runtime.
pub async fn replay<R>(reader: R, config: &ReplayConfig) -> Result<ReplayReport, String>
where
    R: BufRead + Send + 'static,
{
    let summaries: Arc<Mutex<Vec<ToolSummary>>> = Arc::new(Mutex::new(Vec::new()));
    let replies: Arc<Mutex<Vec<AssistantReply>>> = Arc::new(Mutex::new(Vec::new()));

    let mut options = SubscribeOptions::default()
        .with_verbose_level(config.verbose_level)
        .with_tool_sink_fn({
            let summaries = summaries.clone();
            move |summary: ToolSummary| {
                summaries
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .push(summary)
            }
        })
        .with_reply_sink_fn({
            let replies = replies.clone();
            move |reply: AssistantReply| {
                replies
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .push(reply)
            }
        });
    if let Some(max) = config.max_arg_chars {
        options = options.with_max_arg_chars(max);
    }

    let session = ManualSession::new();
    let handle = subscribe(&session, config.run_id.as_str(), options)
        .map_err(|e| format!("cannot subscribe: {e}"))?;

    let (lines_tx, mut lines_rx) = mpsc::channel::<io::Result<String>>(READ_AHEAD_LINES);
    let reading = tokio::task::spawn_blocking(move || {
        for line in reader.lines() {
            let failed = line.is_err();
            if lines_tx.blocking_send(line).is_err() || failed {
                break;
            }
        }
    });

    let mut report = ReplayReport::default();
    let mut line_no = 0;
    while let Some(line) = lines_rx.recv().await {
        line_no += 1;
        let line = line.map_err(|e| format!("failed to read line {line_no}: {e}"))?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(&line) {
            Ok(raw) => {
                session.emit_raw(&raw);
                report.events += 1;
            }
            Err(e) => {
                warn!(line = line_no, "skipping line that is not JSON: {e}");
                report.skipped_lines.push(line_no);
            }
        }
    }
    reading
        .await
        .map_err(|e| format!("transcript reader failed: {e}"))?;
    debug!(events = report.events, "transcript exhausted");

    handle.flush_deliveries().await;
    report.settled = tokio::time::timeout(config.wait_timeout, handle.wait_for_compaction_retry())
        .await
        .is_ok();
    report.pending_compaction_retries = handle.pending_compaction_retries();
    if report.settled {
        info!("session settled");
    } else {
        warn!(
            pending = report.pending_compaction_retries,
            timeout_ms = config.wait_timeout.as_millis() as u64,
            "compaction retries still outstanding"
        );
    }

    handle.unsubscribe();
    handle.flush_deliveries().await;

    report.summaries = std::mem::take(&mut *summaries.lock().unwrap_or_else(|e| e.into_inner()));
    report.replies = std::mem::take(&mut *replies.lock().unwrap_or_else(|e| e.into_inner()));
    Ok(report)
}
