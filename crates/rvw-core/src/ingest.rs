//! Parsing review dumps.
//!
//! Accepts either a JSON array of review objects or NDJSON (one object per
//! line). Records that fail to parse or validate are skipped and counted
//! rather than failing the whole dump. Everything here is a plain function
//! over its input; no parser state is shared between calls.

use std::fs;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{CoreError, CoreResult};
use crate::model::{Review, DATE_FORMAT};

/// Outcome of an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub imported: usize,
    pub skipped: usize,
}

/// Reviews parsed from one dump.
#[derive(Debug, Clone, Default)]
pub struct ParsedDump {
    pub reviews: Vec<Review>,
    pub skipped: usize,
}

/// One review object as it appears in a dump.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReview {
    id: i64,
    #[serde(default, alias = "text")]
    review: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default, alias = "source", alias = "store")]
    review_source: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default, alias = "product")]
    product_name: Option<String>,
    reviewed_date: String,
    rating: Value,
}

/// Read and parse a dump file.
pub fn read_dump(path: &Path) -> CoreResult<ParsedDump> {
    let input = fs::read_to_string(path)?;
    parse_dump(&input, &path.display().to_string())
}

/// Parse a dump, detecting JSON array vs NDJSON from the first
/// non-whitespace character.
///
/// # Errors
///
/// Returns [`CoreError::Ingest`] when a JSON array dump is not valid JSON.
/// Malformed NDJSON lines are skipped instead.
pub fn parse_dump(input: &str, source_name: &str) -> CoreResult<ParsedDump> {
    let trimmed = input.trim_start();
    let values: Vec<Result<Value, String>> = if trimmed.starts_with('[') {
        let items: Vec<Value> =
            serde_json::from_str(trimmed).map_err(|e| CoreError::Ingest {
                source_name: source_name.to_string(),
                message: e.to_string(),
            })?;
        items.into_iter().map(Ok).collect()
    } else {
        trimmed
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(n, line)| {
                serde_json::from_str(line).map_err(|e| format!("line {}: {e}", n + 1))
            })
            .collect()
    };

    let mut dump = ParsedDump::default();
    for value in values {
        match value.and_then(review_from_value) {
            Ok(review) => dump.reviews.push(review),
            Err(reason) => {
                tracing::warn!(source = source_name, %reason, "skipping review record");
                dump.skipped += 1;
            }
        }
    }
    tracing::debug!(
        source = source_name,
        parsed = dump.reviews.len(),
        skipped = dump.skipped,
        "parsed review dump"
    );
    Ok(dump)
}

fn review_from_value(value: Value) -> Result<Review, String> {
    let raw: RawReview = serde_json::from_value(value).map_err(|e| e.to_string())?;
    let (date, time) = parse_review_date(&raw.reviewed_date)
        .ok_or_else(|| format!("review {}: bad reviewedDate {:?}", raw.id, raw.reviewed_date))?;
    let rating = rating_from_value(&raw.rating)
        .ok_or_else(|| format!("review {}: bad rating {}", raw.id, raw.rating))?;

    Review::builder(raw.id, date, rating)
        .text(raw.review)
        .author(raw.author)
        .source(raw.review_source)
        .title(raw.title)
        .product_name(raw.product_name)
        .reviewed_time(time)
        .build()
        .map_err(|e| format!("review {}: {e}", raw.id))
}

/// Ratings show up as integers, whole floats, or numeric strings.
#[allow(clippy::cast_possible_truncation)]
fn rating_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < 1e6)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Parse a review date, keeping the time of day when one is present.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM[:SS[.fff]]`, the same with a space
/// separator, and RFC 3339 (the local date and time of the offset are kept).
#[must_use]
pub fn parse_review_date(value: &str) -> Option<(NaiveDate, Option<NaiveTime>)> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, DATE_FORMAT) {
        return Some((date, None));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        let local = dt.naive_local();
        return Some((local.date(), Some(local.time())));
    }
    [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ]
    .iter()
    .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
    .map(|dt| (dt.date(), Some(dt.time())))
}
