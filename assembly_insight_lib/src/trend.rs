//! Trailing-window activity counts.

use chrono::{DateTime, Duration, NaiveDate};
use serde::Serialize;

/// Number of daily buckets in a trend series.
pub const TREND_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendSeries {
    pub labels: Vec<String>,
    pub data: Vec<u32>,
}

/// `MM-DD` label for a bucket date.
pub fn bucket_label(date: NaiveDate) -> String {
    date.format("%m-%d").to_string()
}

/// Calendar date a stored timestamp falls on, in the offset it was recorded
/// with. Accepts RFC 3339, a leading `YYYY-MM-DD`, compact `YYYYMMDD` and
/// RFC 2822.
pub fn calendar_date(timestamp: &str) -> Option<NaiveDate> {
    let timestamp = timestamp.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(timestamp) {
        return Some(dt.date_naive());
    }
    if let Some(prefix) = timestamp.get(..10) {
        if let Ok(date) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d") {
            return Some(date);
        }
    }
    if timestamp.len() == 8 && timestamp.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(date) = NaiveDate::parse_from_str(timestamp, "%Y%m%d") {
            return Some(date);
        }
    }
    DateTime::parse_from_rfc2822(timestamp)
        .ok()
        .map(|dt| dt.date_naive())
}

/// Count timestamps per day over the [`TREND_DAYS`] days ending on `today`,
/// oldest first. Unparseable timestamps are ignored.
pub fn trend<'a>(timestamps: impl IntoIterator<Item = &'a str>, today: NaiveDate) -> TrendSeries {
    let start = today - Duration::days(TREND_DAYS - 1);
    let mut data = vec![0u32; TREND_DAYS as usize];

    for date in timestamps.into_iter().filter_map(calendar_date) {
        let offset = (date - start).num_days();
        if (0..TREND_DAYS).contains(&offset) {
            data[offset as usize] += 1;
        }
    }

    let labels = (0..TREND_DAYS)
        .map(|i| bucket_label(start + Duration::days(i)))
        .collect();

    TrendSeries { labels, data }
}
