/// Serialization helpers for splicing values back into project text

use std::ops::Range;

/// A pending text replacement against the original source
#[derive(Debug, Clone, PartialEq)]
pub struct Edit {
    pub range: Range<usize>,
    pub text: String,
}

/// Render a string the way Xcode writes it: bare when it only contains
/// safe characters, otherwise quoted and escaped
pub fn quote_string(value: &str) -> String {
    if needs_quotes(value) {
        let mut out = String::with_capacity(value.len() + 2);
        out.push('"');
        for ch in value.chars() {
            match ch {
                '"' => out.push_str("\\\""),
                '\\' => out.push_str("\\\\"),
                '\n' => out.push_str("\\n"),
                '\t' => out.push_str("\\t"),
                '\r' => out.push_str("\\r"),
                other => out.push(other),
            }
        }
        out.push('"');
        out
    } else {
        value.to_string()
    }
}

fn needs_quotes(value: &str) -> bool {
    value.is_empty()
        || value.contains("//")
        || value.contains("/*")
        || !value
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '$' | '/' | '.'))
}

/// Apply non-overlapping edits to `source`, back to front so earlier
/// offsets stay valid
pub fn apply_edits(source: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by(|a, b| b.range.start.cmp(&a.range.start));

    let mut out = source.to_string();
    for edit in edits {
        out.replace_range(edit.range, &edit.text);
    }
    out
}
