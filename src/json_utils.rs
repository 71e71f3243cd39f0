//! Locating JSON inside free-form model output.
//!
//! Models wrap JSON in code fences, prose, or both. The scanner below finds
//! every balanced object/array span (ignoring brackets inside strings) so the
//! caller can try to deserialize each one.

use serde::de::DeserializeOwned;
use tracing::{debug, instrument, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    Object,
    Array,
}

/// Byte range of a JSON structure within a larger text, with nested spans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonSpan {
    pub start: usize,
    /// Inclusive index of the closing bracket/brace
    pub end: usize,
    pub kind: SpanKind,
    pub children: Vec<JsonSpan>,
}

impl JsonSpan {
    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..=self.end]
    }
}

struct Open {
    start: usize,
    kind: SpanKind,
    children: Vec<JsonSpan>,
}

/// Find all top-level balanced JSON spans in `text`. Unbalanced closers are ignored.
#[instrument(target = "command_quiz::json_scan", skip(text), fields(text_len = text.len()))]
pub fn find_json_spans(text: &str) -> Vec<JsonSpan> {
    let mut roots = Vec::new();
    let mut stack: Vec<Open> = Vec::new();
    let mut in_string = false;
    let mut escape = false;

    for (i, b) in text.bytes().enumerate() {
        if in_string {
            match b {
                _ if escape => escape = false,
                b'\\' => escape = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }

        let closing = match b {
            b'"' => {
                in_string = true;
                continue;
            }
            b'{' | b'[' => {
                let kind = if b == b'{' { SpanKind::Object } else { SpanKind::Array };
                stack.push(Open { start: i, kind, children: Vec::new() });
                continue;
            }
            b'}' => SpanKind::Object,
            b']' => SpanKind::Array,
            _ => continue,
        };

        match stack.pop() {
            Some(open) if open.kind == closing => {
                let span = JsonSpan { start: open.start, end: i, kind: closing, children: open.children };
                match stack.last_mut() {
                    Some(parent) => parent.children.push(span),
                    None => roots.push(span),
                }
            }
            // mismatched closer: drop the frame and keep scanning
            Some(_) => trace!(target: "command_quiz::json_scan", at = i, "mismatched bracket"),
            None => {}
        }
    }

    debug!(target: "command_quiz::json_scan", count = roots.len(), "found root spans");
    roots
}

/// Extract every `T` found in `text`, in the order they appear.
///
/// The whole text is tried as `Vec<T>` first. Otherwise each span is tried as
/// `Vec<T>`, then as `T`; a span that matches neither is searched recursively,
/// which also finds arrays nested under a wrapper object like `{"questions": [...]}`.
pub fn extract_all<T: DeserializeOwned>(text: &str) -> Vec<T> {
    if let Ok(all) = serde_json::from_str::<Vec<T>>(text) {
        return all;
    }

    fn collect<T: DeserializeOwned>(text: &str, span: &JsonSpan, out: &mut Vec<T>) {
        let s = span.slice(text);
        if let Ok(items) = serde_json::from_str::<Vec<T>>(s) {
            out.extend(items);
            return;
        }
        if let Ok(item) = serde_json::from_str::<T>(s) {
            out.push(item);
            return;
        }
        for child in &span.children {
            collect(text, child, out);
        }
    }

    let mut out = Vec::new();
    for span in find_json_spans(text) {
        collect(text, &span, &mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brackets_inside_strings_are_ignored() {
        let spans = find_json_spans(r#"say {"a": "}{]["} done"#);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].kind, SpanKind::Object);
    }

    #[test]
    fn nested_spans_are_children() {
        let text = r#"{"xs": [1, 2], "y": {"z": 3}}"#;
        let spans = find_json_spans(text);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].children.len(), 2);
        assert_eq!(spans[0].children[0].slice(text), "[1, 2]");
    }

    #[test]
    fn escaped_quote_does_not_end_string() {
        let spans = find_json_spans(r#"{"a": "x\"}"} tail"#);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].end, 12);
    }
}
