use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("Failed to parse markup: {0}")]
    Parse(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Export failed: {0}")]
    Export(String),
}

impl EngineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<quick_xml::Error> for EngineError {
    fn from(e: quick_xml::Error) -> Self {
        Self::Parse(e.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for EngineError {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        Self::Parse(e.to_string())
    }
}

impl From<csv::Error> for EngineError {
    fn from(e: csv::Error) -> Self {
        Self::Export(e.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        Self::Export(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
