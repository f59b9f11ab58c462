//! Search over a document set: per-document analysis and the merge step
//!
//! [`analyze_document`] is a pure function of one document, the compiled
//! pattern and the options. [`analyze`] maps it over the set, sequentially
//! or on the rayon pool, and merges the outcomes in input order, so the
//! report never depends on which worker finished first.

use crate::context::ContextPolicy;
use crate::dates::{DateRange, UndatedPolicy};
use crate::extractors::{parse_metadata, try_extract_text};
use crate::patterns::SearchPattern;
use serde::{Deserialize, Serialize};
use shared_types::{
    AnalysisReport, DocumentMetadata, FrequencyTally, MatchRecord, SourceDocument, TallyKey,
};
use tracing::{debug, info, instrument, warn};

/// Dimension the match counts are grouped by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TallyGrouping {
    /// `Year` when a date range is set, `Document` otherwise
    #[default]
    Auto,
    /// One entry per document identifier, including documents with no match
    Document,
    /// Session year; undated documents fall back to their identifier
    Year,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisOptions {
    pub context: ContextPolicy,
    pub grouping: TallyGrouping,
    pub date_range: Option<DateRange>,
    pub undated: UndatedPolicy,
    pub parallel: bool,
}

impl AnalysisOptions {
    /// Whether a document with this metadata takes part in the search
    pub fn accepts(&self, metadata: &DocumentMetadata) -> bool {
        let Some(range) = &self.date_range else {
            return true;
        };
        match metadata.date {
            Some(date) => range.contains(date),
            None => self.undated == UndatedPolicy::Include,
        }
    }

    pub fn tally_key(&self, metadata: &DocumentMetadata) -> TallyKey {
        let by_year = match self.grouping {
            TallyGrouping::Auto => self.date_range.is_some(),
            TallyGrouping::Document => false,
            TallyGrouping::Year => true,
        };
        match metadata.year() {
            Some(year) if by_year => TallyKey::year(year),
            _ => TallyKey::new(metadata.identifier.clone()),
        }
    }
}

/// Outcome for one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentAnalysis {
    /// Filtered out by the date range; contributes nothing
    Skipped { identifier: String },
    Analyzed {
        key: TallyKey,
        match_count: usize,
        records: Vec<MatchRecord>,
    },
}

pub fn analyze_document(
    document: &SourceDocument,
    pattern: &SearchPattern,
    options: &AnalysisOptions,
) -> DocumentAnalysis {
    let metadata = parse_metadata(&document.name);
    if !options.accepts(&metadata) {
        debug!(document = %document.name, "Outside date range, skipping");
        return DocumentAnalysis::Skipped {
            identifier: metadata.identifier,
        };
    }

    let text = match try_extract_text(&document.bytes) {
        Ok(text) => text,
        Err(e) => {
            warn!(
                document = %document.name,
                error = %e,
                "Could not parse document, counting no matches"
            );
            String::new()
        }
    };

    let matches = pattern.find_matches(&text);
    let records: Vec<MatchRecord> = matches
        .iter()
        .flat_map(|m| options.context.extract(&text, m))
        .map(|context| MatchRecord {
            identifier: metadata.identifier.clone(),
            date: metadata.date,
            context,
        })
        .collect();

    debug!(
        document = %document.name,
        matches = matches.len(),
        records = records.len(),
        "Document analyzed"
    );

    DocumentAnalysis::Analyzed {
        key: options.tally_key(&metadata),
        match_count: matches.len(),
        records,
    }
}

/// Run the compiled pattern over every document and merge the results
#[instrument(skip_all, fields(documents = documents.len(), pattern = pattern.as_str()))]
pub fn analyze(
    documents: &[SourceDocument],
    pattern: &SearchPattern,
    options: &AnalysisOptions,
) -> AnalysisReport {
    let outcomes = analyze_all(documents, pattern, options);

    let mut report = AnalysisReport::default();
    let mut tally = FrequencyTally::new();
    for outcome in outcomes {
        match outcome {
            DocumentAnalysis::Skipped { .. } => report.documents_skipped += 1,
            DocumentAnalysis::Analyzed {
                key,
                match_count,
                records,
            } => {
                report.documents_scanned += 1;
                report.total_matches += match_count;
                tally.add(key, match_count);
                report.records.extend(records);
            }
        }
    }
    report.tally = tally;

    info!(
        scanned = report.documents_scanned,
        skipped = report.documents_skipped,
        matches = report.total_matches,
        "Search complete"
    );
    report
}

fn analyze_all(
    documents: &[SourceDocument],
    pattern: &SearchPattern,
    options: &AnalysisOptions,
) -> Vec<DocumentAnalysis> {
    if options.parallel {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            return documents
                .par_iter()
                .map(|document| analyze_document(document, pattern, options))
                .collect();
        }
        #[cfg(not(feature = "parallel"))]
        debug!("Parallel analysis requested without the `parallel` feature, running sequentially");
    }

    documents
        .iter()
        .map(|document| analyze_document(document, pattern, options))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::MatchMode;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn doc(name: &str, body: &str) -> SourceDocument {
        SourceDocument::new(name, format!("<pv><p>{}</p></pv>", body))
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn corpus() -> Vec<SourceDocument> {
        vec![
            doc("PV2019-06-01.xml", "La loi est conforme. Une autre loi."),
            doc("PV2020-03-10_v1.1.xml", "Le décret et la LOI organique."),
            doc("PV2020-11-05-06.xml", "Aucune occurrence ici."),
            doc("seance.xhtml", "La loi du pays."),
        ]
    }

    #[test]
    fn test_document_grouping_counts_every_document() {
        let pattern = SearchPattern::build("loi", MatchMode::WholeWord).unwrap();
        let report = analyze(&corpus(), &pattern, &AnalysisOptions::default());

        assert_eq!(report.documents_scanned, 4);
        assert_eq!(report.total_matches, 4);
        assert_eq!(report.tally.get("2019-06-01"), Some(2));
        assert_eq!(report.tally.get("2020-03-10"), Some(1));
        assert_eq!(report.tally.get("2020-11-05-06"), Some(0));
        assert_eq!(report.tally.get("seance"), Some(1));
        assert!(report.has_occurrences());
    }

    #[test]
    fn test_year_grouping() {
        let pattern = SearchPattern::build("loi", MatchMode::WholeWord).unwrap();
        let options = AnalysisOptions {
            grouping: TallyGrouping::Year,
            ..Default::default()
        };
        let report = analyze(&corpus(), &pattern, &options);

        assert_eq!(report.tally.keys(), vec!["2019", "2020", "seance"]);
        assert_eq!(report.tally.get("2019"), Some(2));
        assert_eq!(report.tally.get("2020"), Some(1));
        assert_eq!(report.tally.get("seance"), Some(1));
    }

    #[test]
    fn test_records_follow_input_then_match_order() {
        let pattern = SearchPattern::build("loi", MatchMode::WholeWord).unwrap();
        let options = AnalysisOptions {
            context: ContextPolicy::CharWindow { radius: 4 },
            ..Default::default()
        };
        let report = analyze(&corpus(), &pattern, &options);

        let contexts: Vec<(&str, &str)> = report
            .records
            .iter()
            .map(|r| (r.identifier.as_str(), r.context.as_str()))
            .collect();
        assert_eq!(
            contexts,
            vec![
                ("2019-06-01", "La loi est"),
                ("2019-06-01", "tre loi."),
                ("2020-03-10", "la LOI org"),
                ("seance", "La loi du"),
            ]
        );
        assert_eq!(report.records[0].date, Some(ymd(2019, 6, 1)));
        assert_eq!(report.records[3].date, None);
    }

    #[test]
    fn test_date_range_skips_out_of_range_documents() {
        let pattern = SearchPattern::build("loi", MatchMode::WholeWord).unwrap();
        let options = AnalysisOptions {
            date_range: Some(DateRange::new(ymd(2020, 1, 1), ymd(2020, 12, 31)).unwrap()),
            undated: UndatedPolicy::Exclude,
            ..Default::default()
        };
        let report = analyze(&corpus(), &pattern, &options);

        assert_eq!(report.documents_scanned, 2);
        assert_eq!(report.documents_skipped, 2);
        assert_eq!(report.tally.keys(), vec!["2020"]);
        assert_eq!(report.tally.get("2020"), Some(1));
        assert!(report.records.iter().all(|r| r.identifier.starts_with("2020")));
    }

    #[test]
    fn test_explicit_document_grouping_with_range() {
        let pattern = SearchPattern::build("loi", MatchMode::WholeWord).unwrap();
        let options = AnalysisOptions {
            date_range: Some(DateRange::new(ymd(2020, 1, 1), ymd(2020, 12, 31)).unwrap()),
            undated: UndatedPolicy::Exclude,
            grouping: TallyGrouping::Document,
            ..Default::default()
        };
        let report = analyze(&corpus(), &pattern, &options);
        assert_eq!(report.tally.keys(), vec!["2020-03-10", "2020-11-05-06"]);
    }

    #[test]
    fn test_date_range_can_keep_undated_documents() {
        let pattern = SearchPattern::build("loi", MatchMode::WholeWord).unwrap();
        let options = AnalysisOptions {
            date_range: Some(DateRange::new(ymd(2019, 1, 1), ymd(2019, 12, 31)).unwrap()),
            undated: UndatedPolicy::Include,
            grouping: TallyGrouping::Year,
            ..Default::default()
        };
        let report = analyze(&corpus(), &pattern, &options);

        assert_eq!(report.tally.keys(), vec!["2019", "seance"]);
        assert_eq!(report.documents_skipped, 2);
        assert_eq!(report.records.last().unwrap().date_label(), "undated");
    }

    #[test]
    fn test_broken_document_does_not_abort_batch() {
        let documents = vec![
            SourceDocument::new("PV2020-01-01.xml", "<p>loi <!-- jamais ferme"),
            doc("PV2020-01-02.xml", "une loi"),
        ];
        let pattern = SearchPattern::build("loi", MatchMode::WholeWord).unwrap();
        let report = analyze(&documents, &pattern, &AnalysisOptions::default());

        assert_eq!(report.tally.get("2020-01-01"), Some(0));
        assert_eq!(report.tally.get("2020-01-02"), Some(1));
        assert_eq!(report.documents_scanned, 2);
    }

    #[test]
    fn test_no_occurrences_signal() {
        let pattern = SearchPattern::build("ordonnance", MatchMode::WholeWord).unwrap();
        let report = analyze(&corpus(), &pattern, &AnalysisOptions::default());
        assert!(!report.has_occurrences());
        assert!(report.records.is_empty());
        assert_eq!(report.tally.len(), 4);
    }

    #[test]
    fn test_tally_counts_matches_not_snippets() {
        // Word window re-scans: two matches produce four snippets
        let documents = vec![doc("PV2021-01-01.xml", "loi et loi")];
        let pattern = SearchPattern::build("loi", MatchMode::WholeWord).unwrap();
        let report = analyze(&documents, &pattern, &AnalysisOptions::default());

        assert_eq!(report.tally.get("2021-01-01"), Some(2));
        assert_eq!(report.records.len(), 4);
    }

    #[test]
    fn test_analysis_is_idempotent() {
        let pattern = SearchPattern::build("loi/décret", MatchMode::WholeWord).unwrap();
        let options = AnalysisOptions::default();
        let first = analyze(&corpus(), &pattern, &options);
        let second = analyze(&corpus(), &pattern, &options);
        assert_eq!(first, second);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_sequential() {
        let documents: Vec<SourceDocument> = (1..=28)
            .map(|day| doc(&format!("PV2018-02-{:02}.xml", day), &"loi ".repeat(day)))
            .collect();
        let pattern = SearchPattern::build("loi", MatchMode::WholeWord).unwrap();
        let sequential = AnalysisOptions {
            context: ContextPolicy::char_window(),
            ..Default::default()
        };
        let parallel = AnalysisOptions {
            parallel: true,
            ..sequential.clone()
        };

        assert_eq!(
            analyze(&documents, &pattern, &sequential),
            analyze(&documents, &pattern, &parallel)
        );
    }
}
