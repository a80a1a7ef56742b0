//! Page segmentation: split a Markdown document on page markers.
//!
//! The extraction service labels each page with a marker line in one of two
//! forms, recognised interchangeably after trimming the line:
//!
//! ```text
//! ## Page 7
//! --- Page 7 ---
//! ```
//!
//! The number is ASCII decimal digits only. A marker for page 0, or one whose
//! number does not fit a `u32`, is skipped together with the content after it.
//!
//! The document is first tokenised line by line into [`Token::Marker`] and
//! [`Token::Content`] runs, then folded into [`PageBlock`]s. Text before the
//! first marker belongs to no page and is dropped. A marker followed by only
//! whitespace yields no block, but its page number is still reported in
//! [`ParsedPages::markers`] so cleanup can decide what that means.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// One page's worth of Markdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageBlock {
    /// Page number as declared by the marker (not the batch-relative index).
    pub page_number: u32,
    /// Text between this marker and the next, trimmed. Never empty.
    pub content: String,
}

/// Result of parsing one Markdown document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPages {
    /// Blocks with non-empty content, in marker order. A page number may
    /// appear more than once.
    pub blocks: Vec<PageBlock>,
    /// Every page number whose marker was seen, including those with empty
    /// content.
    pub markers: BTreeSet<u32>,
}

/// A lexical unit of the page grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A marker line. `None` when the digits are not a usable page number
    /// (zero, or too large).
    Marker(Option<u32>),
    /// A maximal run of non-marker lines, newline-joined.
    Content(String),
}

static RE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:## Page ([0-9]+)|--- Page ([0-9]+) ---)$").unwrap());

/// If `line` (after trimming) is a page marker, return its parsed number.
///
/// `Some(None)` means the line is a marker whose number is zero or overflows.
fn marker_number(line: &str) -> Option<Option<u32>> {
    let caps = RE_MARKER.captures(line.trim())?;
    let digits = caps.get(1).or_else(|| caps.get(2))?.as_str();
    Some(digits.parse::<u32>().ok().filter(|&n| n > 0))
}

/// Tokenise `markdown` into marker and content runs.
pub fn tokenize(markdown: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut run: Vec<&str> = Vec::new();

    for line in markdown.lines() {
        match marker_number(line) {
            Some(number) => {
                if !run.is_empty() {
                    tokens.push(Token::Content(run.join("\n")));
                    run.clear();
                }
                tokens.push(Token::Marker(number));
            }
            None => run.push(line),
        }
    }
    if !run.is_empty() {
        tokens.push(Token::Content(run.join("\n")));
    }
    tokens
}

/// Split `markdown` into page blocks.
pub fn parse_pages(markdown: &str) -> ParsedPages {
    let mut parsed = ParsedPages::default();
    // Page the next content run belongs to; `None` before the first marker
    // and after an unparseable one.
    let mut open: Option<u32> = None;

    for token in tokenize(markdown) {
        match token {
            Token::Marker(Some(n)) => {
                parsed.markers.insert(n);
                open = Some(n);
            }
            Token::Marker(None) => {
                warn!("Skipping page marker with an out-of-range page number (pages start at 1)");
                open = None;
            }
            Token::Content(text) => {
                let Some(page_number) = open.take() else {
                    debug!("Dropping {} bytes outside any page", text.len());
                    continue;
                };
                let content = text.trim();
                if content.is_empty() {
                    continue;
                }
                parsed.blocks.push(PageBlock {
                    page_number,
                    content: content.to_string(),
                });
            }
        }
    }

    parsed
}
