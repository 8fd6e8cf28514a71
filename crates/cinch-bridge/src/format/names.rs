//! Canonical tool name constants and their display markers.
//!
//! All tool-name string literals should reference these constants to avoid
//! scattered magic strings.

pub const READ: &str = "read";
pub const WRITE: &str = "write";
pub const EDIT: &str = "edit";
pub const EXEC: &str = "exec";
pub const BASH: &str = "bash";
pub const BROWSER: &str = "browser";
pub const WEB_SEARCH: &str = "web_search";
pub const WEB_FETCH: &str = "web_fetch";
pub const MEMORY: &str = "memory";

/// Marker for tools without a dedicated one.
pub const DEFAULT_MARKER: &str = "\u{1f527}"; // 🔧

/// Leading glyph shown before a tool summary.
pub fn marker_for(tool_name: &str) -> &'static str {
    match tool_name {
        READ => "\u{1f4d6}",             // 📖
        WRITE => "\u{270d}\u{fe0f}",      // ✍️
        EDIT => "\u{1f4dd}",             // 📝
        EXEC | BASH => "\u{1f6e0}\u{fe0f}", // 🛠️
        BROWSER => "\u{1f310}",          // 🌐
        WEB_SEARCH => "\u{1f50e}",       // 🔎
        WEB_FETCH => "\u{1f4c4}",        // 📄
        MEMORY => "\u{1f9e0}",           // 🧠
        _ => DEFAULT_MARKER,
    }
}
