//! Turns tool-execution events into display summaries.
//!
//! A summary is produced once per `toolCallId`, when the call starts, so the
//! caller sees immediately that a tool is running. The matching end event
//! only closes bookkeeping; it never produces a second summary, and neither
//! does a repeated start for the same id.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use serde_json::Value;
use tracing::{debug, trace};

use crate::format::SummaryFormatter;

use super::sink::ToolSummary;

#[derive(Default)]
struct SummarizerState {
    /// Every call id a summary was produced for, kept for the life of the
    /// subscription so late duplicates stay suppressed.
    summarized: HashSet<String>,
    /// Start time of calls that have not ended yet.
    in_flight: HashMap<String, Instant>,
}

/// Per-subscription tool summary state.
pub struct ToolActivitySummarizer {
    enabled: bool,
    formatter: SummaryFormatter,
    run_id: String,
    state: Mutex<SummarizerState>,
}

impl ToolActivitySummarizer {
    /// `enabled` should already account for both verbosity and the presence
    /// of a sink; when it is false no summary is ever produced.
    pub fn new(enabled: bool, formatter: SummaryFormatter, run_id: impl Into<String>) -> Self {
        Self {
            enabled,
            formatter,
            run_id: run_id.into(),
            state: Mutex::new(SummarizerState::default()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Handle a tool start. Returns the summary to deliver, if this is the
    /// first start seen for `tool_call_id` and summaries are enabled.
    pub fn on_tool_start(
        &self,
        tool_name: &str,
        tool_call_id: &str,
        args: &Value,
    ) -> Option<ToolSummary> {
        {
            let mut state = self.lock();
            state
                .in_flight
                .entry(tool_call_id.to_string())
                .or_insert_with(Instant::now);
            if !self.enabled {
                trace!(tool_name, tool_call_id, "tool summaries disabled");
                return None;
            }
            if !state.summarized.insert(tool_call_id.to_string()) {
                debug!(tool_name, tool_call_id, "duplicate tool start; summary already produced");
                return None;
            }
        }

        Some(ToolSummary {
            text: self.formatter.summarize(tool_name, args),
            tool_name: tool_name.to_string(),
            tool_call_id: tool_call_id.to_string(),
            run_id: self.run_id.clone(),
            args: args.clone(),
        })
    }

    /// Handle a tool end. Releases in-flight bookkeeping; never produces a
    /// summary.
    pub fn on_tool_end(&self, tool_name: &str, tool_call_id: &str, is_error: bool) {
        let started = self.lock().in_flight.remove(tool_call_id);
        match started {
            Some(at) => debug!(
                tool_name,
                tool_call_id,
                is_error,
                elapsed_ms = at.elapsed().as_millis() as u64,
                "tool call finished"
            ),
            None => trace!(tool_name, tool_call_id, "tool end without a matching start"),
        }
    }

    /// Calls started but not yet ended.
    pub fn in_flight(&self) -> usize {
        self.lock().in_flight.len()
    }

    fn lock(&self) -> MutexGuard<'_, SummarizerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn enabled() -> ToolActivitySummarizer {
        ToolActivitySummarizer::new(true, SummaryFormatter::default(), "run-tool")
    }

    #[test]
    fn start_produces_summary_with_payload_fields() {
        let summarizer = enabled();
        let summary = summarizer
            .on_tool_start("read", "tool-1", &json!({"path": "/tmp/a.txt"}))
            .unwrap();
        assert!(summary.text.contains("/tmp/a.txt"));
        assert_eq!(summary.tool_name, "read");
        assert_eq!(summary.tool_call_id, "tool-1");
        assert_eq!(summary.run_id, "run-tool");
        assert_eq!(summary.args["path"], "/tmp/a.txt");
    }

    #[test]
    fn one_summary_per_call_id() {
        let summarizer = enabled();
        let args = json!({"path": "a"});
        assert!(summarizer.on_tool_start("read", "tool-1", &args).is_some());
        assert!(summarizer.on_tool_start("read", "tool-1", &args).is_none());

        summarizer.on_tool_end("read", "tool-1", false);
        summarizer.on_tool_end("read", "tool-1", false);
        // A start replayed after the end is still a duplicate.
        assert!(summarizer.on_tool_start("read", "tool-1", &args).is_none());

        assert!(summarizer.on_tool_start("read", "tool-2", &args).is_some());
    }

    #[test]
    fn disabled_never_summarizes() {
        let summarizer = ToolActivitySummarizer::new(false, SummaryFormatter::default(), "r");
        assert!(!summarizer.is_enabled());
        assert!(
            summarizer
                .on_tool_start("read", "tool-1", &json!({"path": "a"}))
                .is_none()
        );
    }

    #[test]
    fn in_flight_tracks_start_and_end() {
        let summarizer = ToolActivitySummarizer::new(false, SummaryFormatter::default(), "r");
        summarizer.on_tool_start("read", "a", &Value::Null);
        summarizer.on_tool_start("exec", "b", &Value::Null);
        assert_eq!(summarizer.in_flight(), 2);

        summarizer.on_tool_end("read", "a", false);
        summarizer.on_tool_end("read", "unknown", true);
        assert_eq!(summarizer.in_flight(), 1);
    }
}
