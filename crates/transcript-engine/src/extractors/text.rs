//! Plain-text extraction from XML/XHTML transcripts
//!
//! Markup is stripped with a lenient streaming reader: end tags are not
//! checked against their start tags, so HTML-style void elements (`<br>`)
//! do not abort the parse. Every non-blank text or CDATA node is trimmed and
//! joined with a single space.
//!
//! Both the decoded input and the final text are NFC-normalized so that
//! character offsets computed downstream are stable across inputs that spell
//! the same accented letter differently.

use crate::error::Result;
use quick_xml::escape::{resolve_html5_entity, resolve_predefined_entity};
use quick_xml::events::{BytesText, Event};
use quick_xml::Reader;
use unicode_normalization::UnicodeNormalization;

/// Decode bytes as UTF-8, replacing invalid sequences with U+FFFD
pub fn decode_lossy(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => text.into_owned(),
    }
}

/// XML's five entities plus the HTML5 named set (`&eacute;`, `&nbsp;`, ...)
pub(crate) fn resolve_entity(entity: &str) -> Option<&'static str> {
    resolve_predefined_entity(entity).or_else(|| resolve_html5_entity(entity))
}

/// Unescaped node text. A node with an entity outside both sets keeps its
/// raw text.
pub(crate) fn unescape_text(e: &BytesText<'_>) -> String {
    match e.unescape_with(resolve_entity) {
        Ok(text) => text.into_owned(),
        Err(_) => String::from_utf8_lossy(e).into_owned(),
    }
}

pub fn normalize(text: &str) -> String {
    text.nfc().collect()
}

/// Strip markup from an already decoded document
pub fn strip_markup(markup: &str) -> Result<String> {
    let mut reader = Reader::from_str(markup);
    let config = reader.config_mut();
    config.trim_text(true);
    config.check_end_names = false;

    let mut pieces: Vec<String> = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Text(e) => push_piece(&mut pieces, &unescape_text(&e)),
            Event::CData(e) => {
                push_piece(&mut pieces, &String::from_utf8_lossy(&e));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(pieces.join(" "))
}

fn push_piece(pieces: &mut Vec<String>, text: &str) {
    let text = text.trim();
    if !text.is_empty() {
        pieces.push(text.to_string());
    }
}

/// Fallible extraction: lossy decode, NFC, strip markup, NFC
pub fn try_extract_text(bytes: &[u8]) -> Result<String> {
    let decoded = normalize(&decode_lossy(bytes));
    let stripped = strip_markup(&decoded)?;
    Ok(normalize(&stripped))
}

/// Extract plain text, returning an empty string when the markup is broken
pub fn extract_text(bytes: &[u8]) -> String {
    match try_extract_text(bytes) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(error = %e, "Markup parse failed, treating document as empty");
            String::new()
        }
    }
}
