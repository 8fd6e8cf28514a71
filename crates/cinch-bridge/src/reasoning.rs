//! Removal of inline model reasoning from assistant text.
//!
//! Some models emit their chain of thought inline, wrapped in XML-ish tags
//! such as `<think>...</think>`. [`ThinkingTags`] holds the set of tag names
//! to recognize and separates those spans from the visible reply.
//!
//! Matching is ASCII case-insensitive on the markers. An open marker with no
//! matching close swallows the rest of the text (the model is still
//! "thinking"), and a close marker with no open is dropped.

/// Tag names recognized by default.
pub const DEFAULT_THINKING_TAGS: &[&str] = &["think", "thinking", "thought", "antthinking"];

/// A set of reasoning tag names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThinkingTags {
    names: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
enum Marker {
    Open(usize),
    Close,
}

impl Default for ThinkingTags {
    fn default() -> Self {
        Self::new(DEFAULT_THINKING_TAGS.iter().copied())
    }
}

impl ThinkingTags {
    /// Build from bare tag names (`"think"`, not `"<think>"`).
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: names
                .into_iter()
                .map(|n| n.as_ref().trim().to_ascii_lowercase())
                .filter(|n| !n.is_empty())
                .collect(),
        }
    }

    /// A set that recognizes nothing; [`strip`](Self::strip) only trims.
    pub fn none() -> Self {
        Self { names: Vec::new() }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Remove every reasoning span (markers included) and trim the result.
    pub fn strip(&self, text: &str) -> String {
        self.split(text).0
    }

    /// Separate `text` into its visible part and the reasoning spans it
    /// contained, in order. Empty spans are omitted.
    pub fn split(&self, text: &str) -> (String, Vec<String>) {
        if self.names.is_empty() {
            return (text.trim().to_string(), Vec::new());
        }

        // ASCII lowercasing keeps byte offsets identical to `text`.
        let lower = text.to_ascii_lowercase();
        let mut visible = String::with_capacity(text.len());
        let mut reasoning = Vec::new();
        let mut pos = 0;

        while let Some((at, len, marker)) = self.next_marker(&lower, pos) {
            visible.push_str(text.get(pos..at).unwrap_or(""));
            let body_start = at + len;
            match marker {
                Marker::Close => pos = body_start,
                Marker::Open(i) => {
                    let close = format!("</{}>", self.names[i]);
                    let body_end = lower
                        .get(body_start..)
                        .and_then(|rest| rest.find(&close))
                        .map(|off| body_start + off);
                    let end = body_end.unwrap_or(text.len());
                    let body = text.get(body_start..end).unwrap_or("").trim();
                    if !body.is_empty() {
                        reasoning.push(body.to_string());
                    }
                    pos = body_end.map_or(text.len(), |e| e + close.len());
                }
            }
        }
        visible.push_str(text.get(pos..).unwrap_or(""));

        (visible.trim().to_string(), reasoning)
    }

    /// Earliest open or close marker at or after `from`.
    fn next_marker(&self, lower: &str, from: usize) -> Option<(usize, usize, Marker)> {
        let rest = lower.get(from..)?;
        let mut best: Option<(usize, usize, Marker)> = None;
        for (i, name) in self.names.iter().enumerate() {
            for (marker, kind) in [
                (format!("<{name}>"), Marker::Open(i)),
                (format!("</{name}>"), Marker::Close),
            ] {
                if let Some(off) = rest.find(&marker) {
                    let at = from + off;
                    if best.is_none_or(|(b, _, _)| at < b) {
                        best = Some((at, marker.len(), kind));
                    }
                }
            }
        }
        best
    }
}
