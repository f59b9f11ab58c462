//! Query compilation for term search
//!
//! A query is one free-text string in which `/` separates alternative terms
//! or phrases (`"loi/décret/conseil d'État"`). Every alternative is escaped
//! so that user input is always matched literally, then the alternatives are
//! joined into a single case-insensitive disjunction.

use crate::error::{EngineError, Result};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// Separator between alternatives in a query
pub const ALTERNATIVE_SEPARATOR: char = '/';

/// How alternatives are anchored in the text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// `\b(...)\b`: an alternative never matches inside a larger word
    #[default]
    WholeWord,
    /// No anchoring, for phrases that start or end with punctuation
    Substring,
}

/// One match, in byte offsets of the searched text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchSpan<'t> {
    pub start: usize,
    pub end: usize,
    pub text: &'t str,
}

/// Compiled, read-only query. Safe to share across worker threads.
#[derive(Debug, Clone)]
pub struct SearchPattern {
    regex: Regex,
    alternatives: Vec<String>,
    mode: MatchMode,
}

impl SearchPattern {
    pub fn build(query: &str, mode: MatchMode) -> Result<Self> {
        if query.trim().is_empty() {
            return Err(EngineError::InvalidQuery(
                "search query is empty".to_string(),
            ));
        }

        let alternatives = split_alternatives(query);
        if alternatives.is_empty() {
            return Err(EngineError::InvalidQuery(format!(
                "query {:?} contains no search term",
                query
            )));
        }

        let escaped: Vec<String> = alternatives.iter().map(|a| regex::escape(a)).collect();
        let disjunction = escaped.join("|");
        let source = match mode {
            MatchMode::WholeWord => format!(r"\b(?:{})\b", disjunction),
            MatchMode::Substring => format!("(?:{})", disjunction),
        };

        let regex = RegexBuilder::new(&source)
            .case_insensitive(true)
            .build()
            .map_err(|e| EngineError::InvalidQuery(e.to_string()))?;

        Ok(Self {
            regex,
            alternatives,
            mode,
        })
    }

    pub fn alternatives(&self) -> &[String] {
        &self.alternatives
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// All non-overlapping matches, left to right
    pub fn find_matches<'t>(&self, text: &'t str) -> Vec<MatchSpan<'t>> {
        self.regex
            .find_iter(text)
            .map(|m| MatchSpan {
                start: m.start(),
                end: m.end(),
                text: m.as_str(),
            })
            .collect()
    }

    pub fn count_matches(&self, text: &str) -> usize {
        self.regex.find_iter(text).count()
    }
}

/// Trimmed, non-blank alternatives in query order
pub fn split_alternatives(query: &str) -> Vec<String> {
    query
        .split(ALTERNATIVE_SEPARATOR)
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect()
}
