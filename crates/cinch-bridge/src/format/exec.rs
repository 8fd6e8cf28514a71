//! Summaries for shell execution tools (`exec`, `bash`).

use serde_json::Value;

use super::names::{self, EXEC};
use super::{ToolFormatter, headline, render_args, str_arg};

/// Renders `🛠️ exec: {command} (in {workdir})`.
pub struct ExecFormatter;

impl ToolFormatter for ExecFormatter {
    fn format(&self, tool_name: &str, args: &Value, max_arg_chars: usize) -> String {
        let mut detail = str_arg(args, "command").unwrap_or_default().to_string();
        if let Some(dir) = str_arg(args, "workdir").or_else(|| str_arg(args, "cwd")) {
            if detail.is_empty() {
                detail = format!("(in {dir})");
            } else {
                detail.push_str(&format!(" (in {dir})"));
            }
        }
        let rest = render_args(args, &["command", "workdir", "cwd"], max_arg_chars);
        if !rest.is_empty() {
            if !detail.is_empty() {
                detail.push(' ');
            }
            detail.push_str(&rest);
        }
        headline(names::marker_for(EXEC), tool_name, &detail)
    }
}

#[cfg(test)]
mod tests {
    use crate::format::SummaryFormatter;
    use crate::format::names::{EXEC, marker_for};
    use serde_json::json;

    #[test]
    fn command_and_workdir() {
        let text = SummaryFormatter::default()
            .summarize("exec", &json!({"command": "cargo test", "workdir": "/repo"}));
        assert_eq!(text, format!("{} exec: cargo test (in /repo)", marker_for(EXEC)));
    }

    #[test]
    fn bash_shares_the_exec_rendering() {
        let text = SummaryFormatter::default()
            .summarize("bash", &json!({"command": "ls -la", "timeout": 30}));
        assert_eq!(text, format!("{} bash: ls -la timeout=30", marker_for(EXEC)));
    }
}
