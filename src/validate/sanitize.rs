//! Input sanitization for admin-authored text.
//!
//! Three cleaners, picked per field type:
//! - [`clean_line`] for single-line fields: strips markup spans and all
//!   control characters, then trims.
//! - [`clean_block`] for multi-line plain text: same, but newlines survive.
//! - [`clean_markdown`] for markdown bodies: parses the event stream, drops
//!   raw HTML events, and re-serializes. Angle brackets inside code spans
//!   and code blocks are content, not markup, and are preserved.

use pulldown_cmark::{Event, Options, Parser};
use pulldown_cmark_to_cmark::cmark;

/// Sanitize a single-line text field.
pub fn clean_line(raw: &str) -> String {
    strip_tags(raw)
        .chars()
        .filter(|c| !c.is_control())
        .collect::<String>()
        .trim()
        .to_string()
}

/// Sanitize multi-line plain text, keeping line breaks.
pub fn clean_block(raw: &str) -> String {
    strip_tags(raw)
        .chars()
        .filter(|c| *c == '\n' || !c.is_control())
        .collect::<String>()
        .trim()
        .to_string()
}

/// Sanitize a markdown body by dropping raw HTML from the event stream.
///
/// Text without any `<` cannot contain HTML and is returned trimmed but
/// otherwise untouched, so already-clean content round-trips byte-identically
/// through repeated sanitization.
pub fn clean_markdown(raw: &str) -> String {
    let trimmed = raw.trim();
    if !trimmed.contains('<') {
        return trimmed.to_string();
    }

    let options = Options::all();
    let parser = Parser::new_ext(trimmed, options);
    let events: Vec<Event> = parser
        .filter(|event| !matches!(event, Event::Html(_) | Event::InlineHtml(_)))
        .collect();

    let mut output = String::new();
    // cmark returns Result, unwrap is safe for valid events
    cmark(events.iter(), &mut output).expect("cmark serialization failed");
    output.trim().to_string()
}

// Removes `<...>` spans wholesale. An unterminated `<` is kept literally.
fn strip_tags(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        match rest[open..].find('>') {
            Some(close) => rest = &rest[open + close + 1..],
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
