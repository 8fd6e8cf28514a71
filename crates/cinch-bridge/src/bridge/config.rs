//! Options for [`subscribe`](super::subscribe).
//!
//! Everything defaults to quiet: verbosity off, no sinks, the default
//! reasoning tags, and the default formatter set.
//!
//! ```ignore
//! let options = SubscribeOptions::default()
//!     .with_verbose_level(VerboseLevel::On)
//!     .with_tool_sink_fn(|summary| println!("{}", summary.text))
//!     .with_max_arg_chars(80);
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::format::SummaryFormatter;
use crate::reasoning::ThinkingTags;

use super::sink::{
    AssistantReply, FnReplySink, FnToolSummarySink, ReplySink, ToolSummary, ToolSummarySink,
};

/// Whether tool-call summaries are produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerboseLevel {
    #[default]
    Off,
    On,
}

impl VerboseLevel {
    pub fn is_on(self) -> bool {
        self == VerboseLevel::On
    }
}

impl FromStr for VerboseLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "false" | "0" => Ok(VerboseLevel::Off),
            "on" | "true" | "1" => Ok(VerboseLevel::On),
            _ => Err(ConfigError::InvalidVerboseLevel(s.to_string())),
        }
    }
}

impl fmt::Display for VerboseLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VerboseLevel::Off => "off",
            VerboseLevel::On => "on",
        })
    }
}

/// Configuration for one subscription.
#[derive(Clone, Default)]
pub struct SubscribeOptions {
    /// Default: [`VerboseLevel::Off`].
    pub verbose_level: VerboseLevel,
    /// Receives tool summaries when `verbose_level` is on.
    pub tool_sink: Option<Arc<dyn ToolSummarySink>>,
    /// Receives visible assistant text from `message_end` events.
    pub reply_sink: Option<Arc<dyn ReplySink>>,
    /// Reasoning tags stripped from assistant text.
    pub thinking_tags: ThinkingTags,
    /// Tool summary rendering.
    pub formatter: SummaryFormatter,
}

impl SubscribeOptions {
    pub fn with_verbose_level(mut self, level: VerboseLevel) -> Self {
        self.verbose_level = level;
        self
    }

    pub fn with_tool_sink(mut self, sink: impl ToolSummarySink + 'static) -> Self {
        self.tool_sink = Some(Arc::new(sink));
        self
    }

    /// Shorthand for [`with_tool_sink`](Self::with_tool_sink) with a
    /// [`FnToolSummarySink`].
    pub fn with_tool_sink_fn(self, f: impl Fn(ToolSummary) + Send + Sync + 'static) -> Self {
        self.with_tool_sink(FnToolSummarySink::new(f))
    }

    pub fn with_reply_sink(mut self, sink: impl ReplySink + 'static) -> Self {
        self.reply_sink = Some(Arc::new(sink));
        self
    }

    pub fn with_reply_sink_fn(self, f: impl Fn(AssistantReply) + Send + Sync + 'static) -> Self {
        self.with_reply_sink(FnReplySink::new(f))
    }

    pub fn with_thinking_tags(mut self, tags: ThinkingTags) -> Self {
        self.thinking_tags = tags;
        self
    }

    pub fn with_formatter(mut self, formatter: SummaryFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    /// Per-argument truncation width for tool summaries.
    pub fn with_max_arg_chars(mut self, max_arg_chars: usize) -> Self {
        self.formatter = self.formatter.with_max_arg_chars(max_arg_chars);
        self
    }

    /// Whether tool summaries will actually reach a sink.
    pub fn summaries_enabled(&self) -> bool {
        self.verbose_level.is_on() && self.tool_sink.is_some()
    }
}

impl fmt::Debug for SubscribeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscribeOptions")
            .field("verbose_level", &self.verbose_level)
            .field("tool_sink", &self.tool_sink.is_some())
            .field("reply_sink", &self.reply_sink.is_some())
            .field("thinking_tags", &self.thinking_tags)
            .field("formatter", &self.formatter)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::DEFAULT_MAX_ARG_CHARS;

    #[test]
    fn defaults_are_quiet() {
        let options = SubscribeOptions::default();
        assert_eq!(options.verbose_level, VerboseLevel::Off);
        assert!(options.tool_sink.is_none());
        assert!(options.reply_sink.is_none());
        assert!(!options.summaries_enabled());
        assert_eq!(options.formatter.max_arg_chars(), DEFAULT_MAX_ARG_CHARS);
        assert_eq!(options.thinking_tags, ThinkingTags::default());
    }

    #[test]
    fn summaries_need_both_verbosity_and_sink() {
        let sink_only = SubscribeOptions::default().with_tool_sink_fn(|_| {});
        assert!(!sink_only.summaries_enabled());

        let verbose_only = SubscribeOptions::default().with_verbose_level(VerboseLevel::On);
        assert!(!verbose_only.summaries_enabled());

        let both = sink_only.with_verbose_level(VerboseLevel::On);
        assert!(both.summaries_enabled());
    }

    #[test]
    fn verbose_level_parses_case_insensitively() {
        assert_eq!("on".parse::<VerboseLevel>().unwrap(), VerboseLevel::On);
        assert_eq!(" OFF ".parse::<VerboseLevel>().unwrap(), VerboseLevel::Off);
        assert_eq!("true".parse::<VerboseLevel>().unwrap(), VerboseLevel::On);
        assert_eq!("0".parse::<VerboseLevel>().unwrap(), VerboseLevel::Off);
        assert_eq!(
            "loud".parse::<VerboseLevel>(),
            Err(ConfigError::InvalidVerboseLevel("loud".into()))
        );
    }

    #[test]
    fn verbose_level_round_trips_through_serde_and_display() {
        assert_eq!(serde_json::to_string(&VerboseLevel::On).unwrap(), "\"on\"");
        assert_eq!(
            serde_json::from_str::<VerboseLevel>("\"off\"").unwrap(),
            VerboseLevel::Off
        );
        assert_eq!(VerboseLevel::On.to_string(), "on");
    }

    #[test]
    fn thinking_tags_can_be_replaced() {
        let options = SubscribeOptions::default().with_thinking_tags(ThinkingTags::new(["scratch"]));
        assert_eq!(options.thinking_tags.names().collect::<Vec<_>>(), vec!["scratch"]);
        assert_eq!(
            options.thinking_tags.strip("<scratch>x</scratch>kept <think>y</think>"),
            "kept <think>y</think>"
        );
    }

    #[test]
    fn max_arg_chars_reaches_formatter() {
        let options = SubscribeOptions::default().with_max_arg_chars(12);
        assert_eq!(options.formatter.max_arg_chars(), 12);
        // Specializations survive the width change.
        assert!(options.formatter.is_specialized("browser"));
    }
}
