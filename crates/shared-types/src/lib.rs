pub mod types;

pub use types::{
    format_date, AnalysisReport, DocumentMetadata, FrequencyTally, MatchRecord, RelationCounts,
    RelationRow, RelationTuple, SourceDocument, TallyKey, UNDATED_LABEL,
};
