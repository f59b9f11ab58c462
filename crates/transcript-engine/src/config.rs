//! TOML configuration: corpus source, output destination and search options
//!
//! Every section and field is optional. A minimal file only names the
//! corpus directory:
//!
//! ```toml
//! [corpus]
//! directory = "./transcripts"
//! ```

use crate::aggregate::{AnalysisOptions, TallyGrouping};
use crate::context::ContextPolicy;
use crate::corpus::default_extensions;
use crate::dates::{DateRange, UndatedPolicy};
use crate::error::{EngineError, Result};
use crate::export::ExportFormat;
use crate::patterns::MatchMode;
use crate::relations::RelationOptions;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub corpus: CorpusConfig,
    pub output: OutputConfig,
    pub search: SearchConfig,
    pub relations: RelationOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    pub directory: PathBuf,
    pub extensions: Vec<String>,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            extensions: default_extensions(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Where exports are written; `None` keeps results on stdout
    pub directory: Option<PathBuf>,
    pub format: ExportFormat,
}

impl OutputConfig {
    /// `<directory>/<stem>.<ext>` when an output directory is configured
    pub fn path_for(&self, stem: &str) -> Option<PathBuf> {
        self.directory
            .as_ref()
            .map(|dir| dir.join(format!("{}.{}", stem, self.format.extension())))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub mode: MatchMode,
    pub context: ContextPolicy,
    pub grouping: TallyGrouping,
    pub undated: UndatedPolicy,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub parallel: bool,
}

impl SearchConfig {
    /// Validated options; a reversed date range is rejected here, before any
    /// document is read
    pub fn analysis_options(&self) -> Result<AnalysisOptions> {
        Ok(AnalysisOptions {
            context: self.context,
            grouping: self.grouping,
            date_range: DateRange::from_bounds(self.date_from, self.date_to)?,
            undated: self.undated,
            parallel: self.parallel,
        })
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the TOML is malformed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| EngineError::io(path, e))?;
        content.parse()
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| EngineError::Config(e.to_string()))
    }
}

impl FromStr for EngineConfig {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| EngineError::Config(e.to_string()))
    }
}
