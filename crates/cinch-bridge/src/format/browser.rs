//! Summaries for the `browser` tool.

use serde_json::Value;

use super::names::{self, BROWSER};
use super::{ToolFormatter, headline, render_args, render_value};

/// Renders `🌐 browser: {action} {url} {other args}`.
///
/// The target URL is read from `targetUrl`, falling back to `url`. Both the
/// action and the URL appear verbatim.
pub struct BrowserFormatter;

impl ToolFormatter for BrowserFormatter {
    fn format(&self, tool_name: &str, args: &Value, max_arg_chars: usize) -> String {
        let mut parts = Vec::new();
        if let Some(action) = verbatim_arg(args, "action") {
            parts.push(action);
        }
        if let Some(url) = verbatim_arg(args, "targetUrl").or_else(|| verbatim_arg(args, "url")) {
            parts.push(url);
        }
        let rest = render_args(args, &["action", "targetUrl", "url"], max_arg_chars);
        if !rest.is_empty() {
            parts.push(rest);
        }
        headline(names::marker_for(BROWSER), tool_name, &parts.join(" "))
    }
}

/// An argument shown in full: strings untouched, other values as compact
/// JSON. Null and blank strings count as absent.
fn verbatim_arg(args: &Value, key: &str) -> Option<String> {
    match args.get(key)? {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        value => Some(render_value(value, usize::MAX)),
    }
}
