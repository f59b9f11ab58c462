//! Context snippets around matches
//!
//! Two policies are available. [`ContextPolicy::CharWindow`] works from the
//! match offsets. [`ContextPolicy::WordWindow`] re-scans the whole text for
//! every word equal to the matched text and returns one window per such word,
//! so a term that occurs three times yields three snippets for *each* of its
//! three matches, and a multi-word phrase yields none. The policy is chosen
//! per search; neither is applied implicitly.

use crate::patterns::MatchSpan;
use serde::{Deserialize, Serialize};

pub const DEFAULT_WORD_RADIUS: usize = 8;
pub const DEFAULT_CHAR_RADIUS: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum ContextPolicy {
    /// ±`radius` whitespace-separated words around every equal word
    WordWindow {
        #[serde(default = "default_word_radius")]
        radius: usize,
    },
    /// ±`radius` characters around the match itself
    CharWindow {
        #[serde(default = "default_char_radius")]
        radius: usize,
    },
}

fn default_word_radius() -> usize {
    DEFAULT_WORD_RADIUS
}

fn default_char_radius() -> usize {
    DEFAULT_CHAR_RADIUS
}

impl Default for ContextPolicy {
    fn default() -> Self {
        Self::WordWindow {
            radius: DEFAULT_WORD_RADIUS,
        }
    }
}

impl ContextPolicy {
    pub fn word_window() -> Self {
        Self::WordWindow {
            radius: DEFAULT_WORD_RADIUS,
        }
    }

    pub fn char_window() -> Self {
        Self::CharWindow {
            radius: DEFAULT_CHAR_RADIUS,
        }
    }

    pub fn with_radius(self, radius: usize) -> Self {
        match self {
            Self::WordWindow { .. } => Self::WordWindow { radius },
            Self::CharWindow { .. } => Self::CharWindow { radius },
        }
    }

    /// Snippets for one match of `text`
    pub fn extract(&self, text: &str, span: &MatchSpan<'_>) -> Vec<String> {
        match *self {
            Self::WordWindow { radius } => word_window(text, span.text, radius),
            Self::CharWindow { radius } => vec![char_window(text, span.start, span.end, radius)],
        }
    }
}

/// One window per whitespace-separated word equal (ignoring case) to `word`
pub fn word_window(text: &str, word: &str, radius: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let target = word.to_lowercase();

    words
        .iter()
        .enumerate()
        .filter(|(_, w)| w.to_lowercase() == target)
        .map(|(index, _)| {
            let start = index.saturating_sub(radius);
            let end = (index + radius + 1).min(words.len());
            words[start..end].join(" ")
        })
        .collect()
}

/// `radius` characters either side of the byte span `start..end`, trimmed.
///
/// Offsets are clamped to the text and snapped back to character boundaries,
/// so out-of-range or mid-codepoint input never panics.
pub fn char_window(text: &str, start: usize, end: usize, radius: usize) -> String {
    let start = floor_char_boundary(text, start.min(text.len()));
    let end = floor_char_boundary(text, end.clamp(start, text.len()));

    let from = text[..start]
        .char_indices()
        .rev()
        .take(radius)
        .last()
        .map_or(start, |(i, _)| i);
    let to = text[end..]
        .char_indices()
        .nth(radius)
        .map_or(text.len(), |(i, _)| end + i);

    text[from..to].trim().to_string()
}

fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}
