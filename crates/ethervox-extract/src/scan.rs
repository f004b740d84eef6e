//! Locate `<tool_call ... />` occurrences in a generated-token buffer.
//!
//! The design is deliberately permissive: no full XML parser, just a search
//! for the literal `<tool_call` followed by the next `/>` terminator. The
//! model is prompted with a specific micro-format, not general XML — a
//! strict parser would make the loop brittle to model variation (spec.md's
//! Design Notes, "String parsing").

/// One raw occurrence found by [`scan_tool_calls`]: the `name` attribute (if
/// present) and every `key="value"` attribute pair found inside the span,
/// including `name` itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawToolCall {
    pub attrs: Vec<(String, String)>,
}

impl RawToolCall {
    pub fn name(&self) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == "name")
            .map(|(_, v)| v.as_str())
    }
}

const TAG_OPEN: &str = "<tool_call";
const TAG_CLOSE: &str = "/>";

/// Scan `text` for successive `<tool_call ... />` occurrences. Non-terminated
/// (no `/>` anywhere after the opening literal) occurrences are skipped and
/// scanning continues past them, per spec.md §4.4 and testable property 7.
pub fn scan_tool_calls(text: &str) -> Vec<RawToolCall> {
    let mut out = Vec::new();
    let mut search_from = 0usize;

    while let Some(rel_start) = text[search_from..].find(TAG_OPEN) {
        let start = search_from + rel_start;
        let attrs_start = start + TAG_OPEN.len();

        match text[attrs_start..].find(TAG_CLOSE) {
            Some(rel_close) => {
                let close_at = attrs_start + rel_close;
                let body = &text[attrs_start..close_at];
                out.push(RawToolCall {
                    attrs: parse_attrs(body),
                });
                search_from = close_at + TAG_CLOSE.len();
            }
            None => {
                // No terminator anywhere in the remaining text — this
                // occurrence (and anything after it) cannot be well-formed.
                break;
            }
        }
    }

    out
}

/// Parse `key="value"` pairs out of the text between `<tool_call` and `/>`.
/// Tolerates arbitrary whitespace between attributes (spec.md §6).
pub fn parse_attrs(text: &str) -> Vec<(String, String)> {
    let bytes = text.as_bytes();
    let n = bytes.len();
    let mut out = Vec::new();
    let mut i = 0usize;

    while i < n {
        if !(bytes[i].is_ascii_alphabetic() || bytes[i] == b'_') {
            i += 1;
            continue;
        }

        let name_start = i;
        while i < n && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_' || bytes[i] == b'-') {
            i += 1;
        }
        let name_end = i;

        let mut j = i;
        while j < n && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        if j < n && bytes[j] == b'=' {
            j += 1;
            while j < n && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            if j < n && bytes[j] == b'"' {
                j += 1;
                let val_start = j;
                while j < n && bytes[j] != b'"' {
                    j += 1;
                }
                if j < n {
                    let val_end = j;
                    out.push((
                        text[name_start..name_end].to_string(),
                        text[val_start..val_end].to_string(),
                    ));
                    i = j + 1;
                    continue;
                }
            }
        }
        i = name_end;
    }

    out
}
