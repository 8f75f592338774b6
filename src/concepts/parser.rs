//! Tolerant parsing of LLM concept responses
//!
//! Models get told to return a bare JSON array and routinely don't: they
//! wrap it in prose, code fences, or both. The parser digs the array out
//! anyway. It is a best-effort extractor, not a schema validator; a response
//! it cannot salvage becomes a `ParseFailure` for the caller to absorb.

use crate::concepts::ConceptRecord;

/// Why one response couldn't be parsed; recovered per batch, never fatal
#[derive(Debug, thiserror::Error)]
pub enum ParseFailure {
    #[error("no JSON array in response")]
    NoArray,
    #[error("bracketed content is not a concept array: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Extract concept records from raw LLM output.
///
/// Strips surrounding code fences, then parses the widest bracketed span
/// (first `[` to last `]`). When trailing prose contains a stray `]` the
/// widest span is garbage, so a string-aware balanced scan from the first
/// `[` is tried before giving up.
pub fn parse_concepts(raw: &str) -> Result<Vec<ConceptRecord>, ParseFailure> {
    let cleaned = strip_code_fences(raw);

    let start = cleaned.find('[').ok_or(ParseFailure::NoArray)?;
    let end = cleaned
        .rfind(']')
        .filter(|&end| end > start)
        .ok_or(ParseFailure::NoArray)?;

    let widest = &cleaned[start..=end];
    match serde_json::from_str(widest) {
        Ok(records) => Ok(records),
        Err(widest_err) => match balanced_array(&cleaned[start..]) {
            Some(span) if span != widest => {
                serde_json::from_str(span).map_err(ParseFailure::InvalidJson)
            }
            _ => Err(ParseFailure::InvalidJson(widest_err)),
        },
    }
}

/// Drop a surrounding markdown code fence if present
fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

/// Return the prefix of `s` spanning one balanced `[...]` array, tracking
/// string literals and escapes. `s` must start at a `[`.
fn balanced_array(s: &str) -> Option<&str> {
    let bytes = s.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}
