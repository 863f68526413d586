// src/markup.rs
//! Minimal table extraction for the scraped attendance grid.
//!
//! The grid is a single `<table>` captured from the attendance site. Only
//! `<tr>`/`<td>` structure matters here; tag matching is case-insensitive and
//! tolerant of attributes and whitespace. Nested tables are not supported.

use once_cell::sync::Lazy;
use regex::Regex;

static ROW_START_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<tr\b[^>]*>").expect("valid row start regex"));
static ROW_END_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)</(?:tr|thead|tbody|tfoot|table)\s*>").expect("valid row end regex")
});
static CELL_START_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<t[dh]\b[^>]*>").expect("valid cell start regex"));
static CELL_END_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</t[dh]\s*>").expect("valid cell end regex"));
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid tag regex"));
static ENTITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").expect("valid entity regex"));

/// Returns the inner markup of every `<tr>` block, in document order.
///
/// End tags are optional: a row also ends where the next `<tr>` starts.
pub fn table_rows(markup: &str) -> Vec<&str> {
    tag_blocks(markup, &ROW_START_RE, &ROW_END_RE)
        .into_iter()
        .map(|(_, body)| body)
        .collect()
}

/// Returns the text content of every `<td>` in a row, untrimmed.
///
/// Whitespace is preserved so callers can recognise padding sentinels.
/// `<th>` cells are not data and are skipped.
pub fn row_cells(row: &str) -> Vec<String> {
    tag_blocks(row, &CELL_START_RE, &CELL_END_RE)
        .into_iter()
        .filter(|(tag, _)| tag[..3].eq_ignore_ascii_case("<td"))
        .map(|(_, body)| cell_text(body))
        .collect()
}

// Pairs each start tag with the markup after it. The body stops at the first
// `end` match or, failing that, right before the next start tag.
fn tag_blocks<'a>(text: &'a str, start: &Regex, end: &Regex) -> Vec<(&'a str, &'a str)> {
    let starts: Vec<regex::Match<'a>> = start.find_iter(text).collect();
    starts
        .iter()
        .enumerate()
        .map(|(idx, tag)| {
            let limit = starts.get(idx + 1).map_or(text.len(), |next| next.start());
            let body = &text[tag.end()..limit];
            let body = end.find(body).map_or(body, |close| &body[..close.start()]);
            (tag.as_str(), body)
        })
        .collect()
}

/// Strips tags and decodes entities. `&nbsp;` becomes a plain space.
pub fn cell_text(inner: &str) -> String {
    let without_tags = TAG_RE.replace_all(inner, "");
    decode_entities(&without_tags)
}

fn decode_entities(text: &str) -> String {
    ENTITY_RE
        .replace_all(text, |caps: &regex::Captures| {
            let name = &caps[1];
            let decoded = match name {
                "nbsp" => Some(' '),
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => numeric_entity(name),
            };
            match decoded {
                Some(c) => c.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

fn numeric_entity(name: &str) -> Option<char> {
    let digits = name.strip_prefix('#')?;
    let code = match digits.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<u32>().ok()?,
    };
    char::from_u32(code)
}
