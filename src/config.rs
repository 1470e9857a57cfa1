use crate::error::{Result, ScanError};
use crate::recency::RecencyFilter;
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, TimeZone, Utc};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_NON_CODE: [&str; 2] = ["Markdown", "CSV"];

/// Validated settings for one scan run.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub org_url: String,
    pub pat: String,
    pub out_dir: PathBuf,
    pub recency: Option<RecencyFilter>,
    pub exclude_non_code: bool,
    pub non_code: Vec<String>,
    pub rate_delay: Duration,
    pub timeout: Duration,
    pub api_version: String,
}

impl ScanConfig {
    /// Languages left out of the code-only tally; empty unless exclusion is on.
    pub fn excluded_languages(&self) -> &[String] {
        if self.exclude_non_code {
            &self.non_code
        } else {
            &[]
        }
    }
}

pub fn require(value: Option<String>, what: &str) -> Result<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ScanError::MissingConfig(what.to_string()))
}

/// Threshold from an explicit date or a day count before `now`.
/// A day count of zero means no threshold.
pub fn resolve_since(
    since_iso: Option<&str>,
    since_days: Option<u32>,
    now: DateTime<Utc>,
) -> Result<Option<DateTime<Utc>>> {
    if let Some(input) = since_iso.map(str::trim).filter(|s| !s.is_empty()) {
        return parse_date(input).map(Some);
    }
    match since_days {
        Some(days) if days > 0 => {
            let date = (now - ChronoDuration::days(i64::from(days))).date_naive();
            Ok(date.and_hms_opt(0, 0, 0).map(|dt| Utc.from_utc_datetime(&dt)))
        }
        _ => Ok(None),
    }
}

fn parse_date(input: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        if let Some(datetime) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&datetime));
        }
    }
    Err(ScanError::InvalidDate(format!(
        "'{input}' is neither YYYY-MM-DD nor RFC3339"
    )))
}

/// Plain seconds (`0.05`) or a humantime duration (`50ms`).
pub fn parse_delay(input: &str) -> Result<Duration> {
    let input = input.trim();
    if let Ok(secs) = input.parse::<f64>() {
        return Duration::try_from_secs_f64(secs)
            .map_err(|_| ScanError::InvalidDuration(input.to_string()));
    }
    humantime::parse_duration(input).map_err(|e| ScanError::InvalidDuration(format!("'{input}': {e}")))
}
