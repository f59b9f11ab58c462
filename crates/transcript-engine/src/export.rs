//! Tabular and JSON export of search reports and relation counts

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use shared_types::{AnalysisReport, FrequencyTally, MatchRecord, RelationCounts};
use std::io::Write;

pub const RECORD_COLUMNS: [&str; 3] = ["identifier", "date", "context"];
pub const TALLY_COLUMNS: [&str; 2] = ["key", "count"];
pub const RELATION_COLUMNS: [&str; 3] = ["speaker_1", "speaker_2", "count"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

/// One row per record; undated records carry the `undated` label
pub fn write_records_csv<W: Write>(records: &[MatchRecord], writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(RECORD_COLUMNS)?;
    for record in records {
        csv.write_record([
            record.identifier.as_str(),
            record.date_label().as_str(),
            record.context.as_str(),
        ])?;
    }
    csv.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Tally rows in display order
pub fn write_tally_csv<W: Write>(tally: &FrequencyTally, writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(TALLY_COLUMNS)?;
    for (key, count) in tally.iter() {
        csv.write_record([key.as_str(), count.to_string().as_str()])?;
    }
    csv.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Relation rows, most frequent first
pub fn write_relations_csv<W: Write>(counts: &RelationCounts, writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(RELATION_COLUMNS)?;
    for row in counts.rows() {
        csv.write_record([
            row.speaker_1.as_str(),
            row.speaker_2.as_str(),
            row.count.to_string().as_str(),
        ])?;
    }
    csv.flush().map_err(csv::Error::from)?;
    Ok(())
}

pub fn to_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<String> {
    let output = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(output)
}

/// Records as CSV, or the whole report as JSON
pub fn write_report<W: Write>(
    report: &AnalysisReport,
    format: ExportFormat,
    mut writer: W,
) -> Result<()> {
    match format {
        ExportFormat::Csv => write_records_csv(&report.records, writer),
        ExportFormat::Json => {
            let json = to_json(report, true)?;
            writer
                .write_all(json.as_bytes())
                .map_err(|e| EngineError::Export(e.to_string()))
        }
    }
}

pub fn write_relations<W: Write>(
    counts: &RelationCounts,
    format: ExportFormat,
    mut writer: W,
) -> Result<()> {
    match format {
        ExportFormat::Csv => write_relations_csv(counts, writer),
        ExportFormat::Json => {
            let json = to_json(counts, true)?;
            writer
                .write_all(json.as_bytes())
                .map_err(|e| EngineError::Export(e.to_string()))
        }
    }
}
