//! Normalisation: remove transport artefacts from service Markdown.
//!
//! Vision models behind the extraction service sometimes wrap their whole
//! answer in a ```` ```markdown ```` fence, emit CRLF line endings, or sprinkle
//! zero-width characters into table cells. None of that is content, and the
//! fence in particular would otherwise become a stray row on the last page.
//!
//! Only these three rules run. Line content is otherwise left alone: the
//! rows converter treats non-table lines verbatim, so nothing here trims or
//! reflows text.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply the normalisation rules in order:
///
/// 1. Normalise line endings (CRLF/CR → LF)
/// 2. Strip an outer markdown fence wrapping the entire body
/// 3. Remove invisible Unicode (zero-width spaces, BOM, soft hyphens)
pub fn clean_markdown(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = strip_markdown_fences(&s);
    remove_invisible_chars(&s)
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Strip outer markdown fences ──────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:markdown|md)?[ \t]*\n(.*)\n```\s*$").unwrap());

fn strip_markdown_fences(input: &str) -> String {
    if let Some(caps) = RE_OUTER_FENCES.captures(input.trim()) {
        caps[1].to_string()
    } else {
        input.to_string()
    }
}

// ── Rule 3: Remove invisible characters ──────────────────────────────────────

const INVISIBLE: [char; 6] = [
    '\u{200B}', // zero-width space
    '\u{200C}', // zero-width non-joiner
    '\u{200D}', // zero-width joiner
    '\u{2060}', // word joiner
    '\u{FEFF}', // BOM
    '\u{00AD}', // soft hyphen
];

fn remove_invisible_chars(input: &str) -> String {
    input.chars().filter(|c| !INVISIBLE.contains(c)).collect()
}
