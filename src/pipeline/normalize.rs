//! Text normalization for physician notes.
//!
//! Dictated and pasted notes arrive with arbitrary line wrapping. Every
//! downstream regex assumes a single-line corpus, so this runs once at the
//! front of the pipeline. Case is preserved here; the matcher lowercases on
//! its own because some consumers want the original casing.

use std::sync::LazyLock;

use regex::Regex;

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex"));

/// Collapse a raw note into a single searchable line.
///
/// CR/LF become spaces, runs of whitespace collapse to one space, and the
/// result is trimmed. Empty input yields an empty string.
pub fn normalize_note(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let unwrapped = raw.replace("\r\n", " ").replace('\n', " ");
    WHITESPACE_RUN.replace_all(&unwrapped, " ").trim().to_string()
}
