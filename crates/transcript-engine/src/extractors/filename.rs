//! Document identifier and session date derived from a transcript filename
//!
//! Filenames follow loose conventions such as `PV2020-01-15_v1.2.xml` or
//! `PV2019-03-12-13.xhtml` (a two-day session). The identifier drops the
//! version suffix and the `PV` marker; the date is the earliest valid day
//! found in any `YYYY-MM-DD[-DD...]` run.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use shared_types::DocumentMetadata;

lazy_static! {
    static ref VERSION_SUFFIX: Regex = Regex::new(r"_v\d+\.\d+").unwrap();
    static ref DATE_RUN: Regex = Regex::new(r"(\d{4})-(\d{2})-(\d{1,2}(?:-\d{1,2})*)").unwrap();
}

const PV_MARKER: &str = "PV";

/// Last path component, accepting both `/` and `\` separators
fn base_name(filename: &str) -> &str {
    filename.rsplit(['/', '\\']).next().unwrap_or(filename)
}

/// Base name without its extension. A purely numeric "extension" is kept,
/// since `_v1.2` without a file extension would otherwise lose its minor
/// version.
fn stem(base: &str) -> &str {
    match base.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty() && !ext.is_empty() && !ext.bytes().all(|b| b.is_ascii_digit()) =>
        {
            stem
        }
        _ => base,
    }
}

fn clean_stem(filename: &str) -> String {
    let stem = stem(base_name(filename));
    let without_version = VERSION_SUFFIX.replace_all(stem, "");
    without_version.replace(PV_MARKER, "").trim().to_string()
}

/// Identifier shown for a document. Never empty for a non-empty filename.
pub fn extract_identifier(filename: &str) -> String {
    let cleaned = clean_stem(filename);
    if !cleaned.is_empty() {
        return cleaned;
    }

    let base = base_name(filename);
    let fallback = stem(base);
    if fallback.is_empty() {
        base.to_string()
    } else {
        fallback.to_string()
    }
}

/// Earliest valid date embedded in the filename, if any
pub fn extract_date(filename: &str) -> Option<NaiveDate> {
    let cleaned = clean_stem(filename);

    DATE_RUN
        .captures_iter(&cleaned)
        .flat_map(|cap| {
            let year = cap[1].to_string();
            let month = cap[2].to_string();
            cap[3]
                .split('-')
                .map(|day| format!("{}-{}-{:0>2}", year, month, day))
                .collect::<Vec<_>>()
        })
        .filter_map(|candidate| NaiveDate::parse_from_str(&candidate, "%Y-%m-%d").ok())
        .min()
}

pub fn parse_metadata(filename: &str) -> DocumentMetadata {
    DocumentMetadata {
        identifier: extract_identifier(filename),
        date: extract_date(filename),
    }
}
