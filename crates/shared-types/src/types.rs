use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Label rendered in place of a date when a filename carries none
pub const UNDATED_LABEL: &str = "undated";

/// Raw transcript as handed to the engine (uploaded or read from disk)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub name: String, // Filename, possibly with directories
    pub bytes: Vec<u8>,
}

impl SourceDocument {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub identifier: String,
    pub date: Option<NaiveDate>, // None = no parseable date in the filename
}

impl DocumentMetadata {
    pub fn year(&self) -> Option<i32> {
        self.date.map(|d| d.year())
    }
}

/// One context snippet for one pattern match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub identifier: String,
    pub date: Option<NaiveDate>,
    pub context: String,
}

impl MatchRecord {
    /// `YYYY-MM-DD`, or [`UNDATED_LABEL`]
    pub fn date_label(&self) -> String {
        format_date(self.date)
    }
}

pub fn format_date(date: Option<NaiveDate>) -> String {
    match date {
        Some(d) => d.format("%Y-%m-%d").to_string(),
        None => UNDATED_LABEL.to_string(),
    }
}

/// Grouping key of a [`FrequencyTally`]: a year or a document identifier.
///
/// Keys that parse as unsigned integers sort first, numerically. All other
/// keys follow in lexical order. Numeric ties (`"07"` vs `"7"`) fall back to
/// the string so the ordering stays consistent with equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TallyKey(String);

impl TallyKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn year(year: i32) -> Self {
        Self(year.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn numeric(&self) -> Option<u64> {
        if self.0.is_empty() || !self.0.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        self.0.parse().ok()
    }
}

impl Ord for TallyKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for TallyKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for TallyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Occurrence counts per grouping key, iterated in display order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrequencyTally {
    counts: BTreeMap<TallyKey, usize>,
}

impl FrequencyTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` to `key`, creating the entry (even for 0)
    pub fn add(&mut self, key: TallyKey, count: usize) {
        *self.counts.entry(key).or_insert(0) += count;
    }

    pub fn get(&self, key: &str) -> Option<usize> {
        self.counts.get(&TallyKey::new(key)).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TallyKey, usize)> {
        self.counts.iter().map(|(k, v)| (k, *v))
    }

    pub fn keys(&self) -> Vec<&str> {
        self.counts.keys().map(TallyKey::as_str).collect()
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// "`from` spoke immediately before `to`"
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RelationTuple {
    pub from: String,
    pub to: String,
}

impl RelationTuple {
    /// Returns `None` for a self-pair, which is never a relation
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Option<Self> {
        let from = from.into();
        let to = to.into();
        if from == to {
            None
        } else {
            Some(Self { from, to })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationRow {
    pub speaker_1: String,
    pub speaker_2: String,
    pub count: usize,
}

/// Multiset of relations across a whole corpus
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationCounts {
    counts: BTreeMap<RelationTuple, usize>,
}

impl RelationCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, relation: RelationTuple) {
        *self.counts.entry(relation).or_insert(0) += 1;
    }

    pub fn extend<I: IntoIterator<Item = RelationTuple>>(&mut self, relations: I) {
        for relation in relations {
            self.add(relation);
        }
    }

    pub fn get(&self, from: &str, to: &str) -> usize {
        let key = RelationTuple {
            from: from.to_string(),
            to: to.to_string(),
        };
        self.counts.get(&key).copied().unwrap_or(0)
    }

    /// Distinct relations
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Rows ordered by count (descending), then by speaker pair
    pub fn rows(&self) -> Vec<RelationRow> {
        let mut entries: Vec<(&RelationTuple, &usize)> = self.counts.iter().collect();
        entries.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        entries
            .into_iter()
            .map(|(relation, count)| RelationRow {
                speaker_1: relation.from.clone(),
                speaker_2: relation.to.clone(),
                count: *count,
            })
            .collect()
    }
}

impl Serialize for RelationCounts {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.rows().serialize(serializer)
    }
}

/// Immutable result of one search over a document set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub records: Vec<MatchRecord>,
    pub tally: FrequencyTally,
    pub documents_scanned: usize,
    pub documents_skipped: usize, // Filtered out by date
    pub total_matches: usize,
}

impl AnalysisReport {
    /// False means "no occurrences found"
    pub fn has_occurrences(&self) -> bool {
        self.total_matches > 0
    }
}
