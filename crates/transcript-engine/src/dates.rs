use crate::error::{EngineError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inclusive `[start, end]` filter on session dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DateBounds")]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

/// Unchecked wire form of [`DateRange`]
#[derive(Deserialize)]
struct DateBounds {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<DateBounds> for DateRange {
    type Error = EngineError;

    fn try_from(bounds: DateBounds) -> Result<Self> {
        Self::new(bounds.start, bounds.end)
    }
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(EngineError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Range from optional bounds. A missing bound is open; no bounds at all
    /// means no filtering.
    pub fn from_bounds(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Option<Self>> {
        match (start, end) {
            (None, None) => Ok(None),
            (start, end) => Self::new(
                start.unwrap_or(NaiveDate::MIN),
                end.unwrap_or(NaiveDate::MAX),
            )
            .map(Some),
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// What the date filter does with documents whose filename has no date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UndatedPolicy {
    /// Keep them; records carry the `undated` label
    #[default]
    Include,
    Exclude,
}

/// Parse a `YYYY-MM-DD` bound
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|e| EngineError::Config(format!("invalid date {:?}: {}", value, e)))
}
