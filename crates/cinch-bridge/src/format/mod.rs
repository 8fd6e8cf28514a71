//! Human-readable one-line summaries of tool calls.
//!
//! [`SummaryFormatter`] picks a [`ToolFormatter`] by exact tool name and
//! falls back to [`GenericFormatter`] for everything else. Adding a
//! specialization never touches the generic path:
//!
//! ```ignore
//! struct SqlFormatter;
//! impl ToolFormatter for SqlFormatter {
//!     fn format(&self, tool_name: &str, args: &Value, max_arg_chars: usize) -> String {
//!         headline("\u{1f5c4}", tool_name, args["query"].as_str().unwrap_or(""))
//!     }
//! }
//!
//! let formatter = SummaryFormatter::default().with_formatter("sql", SqlFormatter);
//! ```
//!
//! | Tool | Formatter | Example |
//! |------|-----------|---------|
//! | `browser` | [`BrowserFormatter`] | `🌐 browser: snapshot https://example.com` |
//! | `exec`, `bash` | [`ExecFormatter`] | `🛠️ exec: cargo test (in /repo)` |
//! | anything else | [`GenericFormatter`] | `📖 read: path=/tmp/a.txt` |

pub mod browser;
pub mod exec;
pub mod names;

pub use browser::BrowserFormatter;
pub use exec::ExecFormatter;

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

/// Default per-argument width before truncation.
pub const DEFAULT_MAX_ARG_CHARS: usize = 120;

/// Argument keys that name what a tool call targets. They are rendered first
/// and never truncated, so a reader always sees the full target.
pub const PRIMARY_ARG_KEYS: &[&str] = &[
    "path",
    "file_path",
    "filePath",
    "targetUrl",
    "url",
    "command",
    "query",
    "pattern",
];

/// Renders the summary text for one tool call.
pub trait ToolFormatter: Send + Sync {
    fn format(&self, tool_name: &str, args: &Value, max_arg_chars: usize) -> String;
}

/// Tool name plus `key=value` pairs.
pub struct GenericFormatter;

impl ToolFormatter for GenericFormatter {
    fn format(&self, tool_name: &str, args: &Value, max_arg_chars: usize) -> String {
        headline(
            names::marker_for(tool_name),
            tool_name,
            &render_args(args, &[], max_arg_chars),
        )
    }
}

/// `"{marker} {tool_name}: {detail}"`, or without the colon when `detail`
/// is empty.
pub fn headline(marker: &str, tool_name: &str, detail: &str) -> String {
    if detail.is_empty() {
        format!("{marker} {tool_name}")
    } else {
        format!("{marker} {tool_name}: {detail}")
    }
}

/// Compact rendering of tool arguments.
///
/// Objects become space-separated `key=value` pairs: keys from
/// [`PRIMARY_ARG_KEYS`] first and verbatim, the rest in map order and
/// truncated to `max_arg_chars`. Keys in `skip` and null values are left
/// out. Non-object arguments render as compact JSON.
pub fn render_args(args: &Value, skip: &[&str], max_arg_chars: usize) -> String {
    let map = match args {
        Value::Null => return String::new(),
        Value::Object(map) => map,
        other => return truncate_chars(&other.to_string(), max_arg_chars),
    };

    let mut pairs = Vec::with_capacity(map.len());
    for key in PRIMARY_ARG_KEYS {
        if skip.contains(key) {
            continue;
        }
        if let Some(value) = map.get(*key).filter(|v| !v.is_null()) {
            pairs.push(format!("{key}={}", render_value(value, usize::MAX)));
        }
    }
    for (key, value) in map {
        if value.is_null() || skip.contains(&key.as_str()) || PRIMARY_ARG_KEYS.contains(&key.as_str())
        {
            continue;
        }
        pairs.push(format!("{key}={}", render_value(value, max_arg_chars)));
    }
    pairs.join(" ")
}

/// Strings render raw, everything else as compact JSON.
pub fn render_value(value: &Value, max_chars: usize) -> String {
    match value {
        Value::String(s) => truncate_chars(s, max_chars),
        other => truncate_chars(&other.to_string(), max_chars),
    }
}

/// Truncate to at most `max` characters, marking the cut with an ellipsis.
pub fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max).collect();
    format!("{kept}\u{2026}")
}

/// A string argument, if present and non-empty.
pub(crate) fn str_arg<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Dispatches tool calls to the matching [`ToolFormatter`].
#[derive(Clone)]
pub struct SummaryFormatter {
    generic: Arc<dyn ToolFormatter>,
    specialized: HashMap<String, Arc<dyn ToolFormatter>>,
    max_arg_chars: usize,
}

impl Default for SummaryFormatter {
    fn default() -> Self {
        Self::bare(DEFAULT_MAX_ARG_CHARS)
            .with_formatter(names::BROWSER, BrowserFormatter)
            .with_formatter(names::EXEC, ExecFormatter)
            .with_formatter(names::BASH, ExecFormatter)
    }
}

impl SummaryFormatter {
    /// A formatter with only the generic path.
    pub fn bare(max_arg_chars: usize) -> Self {
        Self {
            generic: Arc::new(GenericFormatter),
            specialized: HashMap::new(),
            max_arg_chars,
        }
    }

    /// Register (or replace) the formatter for `tool_name`.
    pub fn with_formatter(
        mut self,
        tool_name: impl Into<String>,
        formatter: impl ToolFormatter + 'static,
    ) -> Self {
        self.specialized
            .insert(tool_name.into(), Arc::new(formatter));
        self
    }

    /// Replace the fallback used for tools without a specialization.
    pub fn with_generic(mut self, formatter: impl ToolFormatter + 'static) -> Self {
        self.generic = Arc::new(formatter);
        self
    }

    pub fn with_max_arg_chars(mut self, max_arg_chars: usize) -> Self {
        self.max_arg_chars = max_arg_chars;
        self
    }

    pub fn max_arg_chars(&self) -> usize {
        self.max_arg_chars
    }

    pub fn is_specialized(&self, tool_name: &str) -> bool {
        self.specialized.contains_key(tool_name)
    }

    /// Summary text for one tool call.
    pub fn summarize(&self, tool_name: &str, args: &Value) -> String {
        let formatter = self
            .specialized
            .get(tool_name)
            .unwrap_or(&self.generic);
        formatter.format(tool_name, args, self.max_arg_chars)
    }
}

impl std::fmt::Debug for SummaryFormatter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.specialized.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("SummaryFormatter")
            .field("specialized", &names)
            .field("max_arg_chars", &self.max_arg_chars)
            .finish()
    }
}
