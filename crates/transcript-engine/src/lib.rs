//! Term search and speaker-relation counts over council meeting transcripts
//!
//! This crate provides:
//! - Plain-text extraction from XML/XHTML and filename metadata (`extractors`)
//! - Query compilation (`patterns`) and context snippets (`context`)
//! - The per-document search and merge step (`aggregate`)
//! - Consecutive-speaker relation counts (`relations`)
//! - Corpus loading, CSV/JSON export and TOML configuration

pub mod aggregate;
pub mod config;
pub mod context;
pub mod corpus;
pub mod dates;
pub mod error;
pub mod export;
pub mod extractors;
pub mod patterns;
pub mod relations;

pub use aggregate::{analyze, analyze_document, AnalysisOptions, DocumentAnalysis, TallyGrouping};
pub use config::EngineConfig;
pub use context::ContextPolicy;
pub use dates::{DateRange, UndatedPolicy};
pub use error::EngineError;
pub use export::ExportFormat;
pub use patterns::{MatchMode, SearchPattern};
pub use relations::{count_relations, RelationOptions, SpeakerSource};

use shared_types::{AnalysisReport, RelationCounts, SourceDocument};

/// Compile `query` and run it over `documents`.
///
/// The query is validated before any document is read, so an empty query
/// fails fast with [`EngineError::InvalidQuery`].
pub fn search(
    documents: &[SourceDocument],
    query: &str,
    mode: MatchMode,
    options: &AnalysisOptions,
) -> error::Result<AnalysisReport> {
    let pattern = SearchPattern::build(query, mode)?;
    Ok(analyze(documents, &pattern, options))
}

/// TranscriptEngine entry point, bound to one configuration
pub struct TranscriptEngine {
    config: EngineConfig,
}

impl TranscriptEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Documents from the configured corpus directory
    pub fn load_corpus(&self) -> error::Result<Vec<SourceDocument>> {
        corpus::load_directory(&self.config.corpus.directory, &self.config.corpus.extensions)
    }

    /// Search with the configured options. Query and date range are both
    /// checked before the documents are touched.
    pub fn search(
        &self,
        documents: &[SourceDocument],
        query: &str,
    ) -> error::Result<AnalysisReport> {
        let pattern = SearchPattern::build(query, self.config.search.mode)?;
        let options = self.config.search.analysis_options()?;
        Ok(analyze(documents, &pattern, &options))
    }

    pub fn count_relations(&self, documents: &[SourceDocument]) -> RelationCounts {
        relations::count_relations(documents, &self.config.relations)
    }
}

impl Default for TranscriptEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
