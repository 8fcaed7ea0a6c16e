//! Post-processing: deterministic cleanup of engine-extracted text.
//!
//! Engines hand back whatever the document contained: Windows line endings
//! from HTML exports, byte-order marks from spreadsheets, zero-width joiners
//! from slide decks, and long runs of empty paragraphs from Word. These rules
//! normalise that noise without touching the words themselves, so the preview
//! and both downloads show the same clean text.
//!
//! ## Rule Order
//!
//! Invisible characters go first so that a line holding only a zero-width
//! space counts as blank; line endings are normalised before per-line
//! trimming; blank-line collapsing runs last.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleanup rules to raw engine output.
///
/// Rules (applied in order):
/// 1. Strip invisible Unicode (BOM, zero-width spaces/joiners, NUL)
/// 2. Normalise line endings (CRLF / CR → LF)
/// 3. Trim trailing whitespace per line
/// 4. Collapse 3+ consecutive blank lines down to 2
/// 5. Drop leading and trailing blank lines
///
/// Empty (or whitespace-only) input yields an empty string.
pub fn clean_text(input: &str) -> String {
    let s = remove_invisible_chars(input);
    let s = normalise_line_endings(&s);
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    trim_blank_edges(&s)
}

// ── Rule 1: Strip invisible characters ───────────────────────────────────────

const INVISIBLE: [char; 6] = [
    '\u{FEFF}', '\u{200B}', '\u{200C}', '\u{200D}', '\u{2060}', '\u{0000}',
];

fn remove_invisible_chars(input: &str) -> String {
    input.chars().filter(|c| !INVISIBLE.contains(c)).collect()
}

// ── Rule 2: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Trim trailing whitespace per line ────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 4: Collapse excessive blank lines ───────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{4,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n\n").to_string()
}

// ── Rule 5: Drop blank edges ─────────────────────────────────────────────────

fn trim_blank_edges(input: &str) -> String {
    input.trim_start_matches('\n').trim_end().to_string()
}
