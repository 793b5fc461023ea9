//! Dashboard window and bucket derivation.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use desk_common::bucket::{day_buckets, month_buckets, week_buckets, DateBucket};
use serde::{Deserialize, Serialize};

/// Reporting period shortcuts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Day,
    Week,
    #[default]
    Month,
    Quarter,
    Year,
}

impl Period {
    /// Unknown values degrade to the default month view.
    pub fn parse(input: Option<&str>) -> Self {
        match input.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("day") => Self::Day,
            Some("week") => Self::Week,
            Some("month") => Self::Month,
            Some("quarter") => Self::Quarter,
            Some("year") => Self::Year,
            _ => Self::default(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Quarter => "quarter",
            Self::Year => "year",
        }
    }

    /// Period-derived window ending at `now`.
    pub fn window(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let days = match self {
            Self::Day => 1,
            Self::Week => 7,
            Self::Month => 30,
            Self::Quarter => 90,
            Self::Year => 365,
        };
        (now - Duration::days(days), now)
    }
}

/// Bucket granularity scaled to the window span: days for a month or
/// less, weeks up to half a year, months beyond.
pub fn buckets_for(start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<DateBucket> {
    let span_days = (end - start).num_days();
    if span_days <= 31 {
        day_buckets(start, end)
    } else if span_days <= 182 {
        week_buckets(start, end)
    } else {
        month_buckets(start, end)
    }
}

/// Parse an ISO `YYYY-MM-DD` override; invalid input degrades to `None`.
pub fn parse_date_param(input: Option<&str>, end_of_day: bool) -> Option<DateTime<Utc>> {
    let raw = input?.trim();
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    let time = if end_of_day {
        date.and_hms_opt(23, 59, 59)?
    } else {
        date.and_hms_opt(0, 0, 0)?
    };
    Some(Utc.from_utc_datetime(&time))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_period_degrades_to_month() {
        assert_eq!(Period::parse(Some("fortnight")), Period::Month);
        assert_eq!(Period::parse(None), Period::Month);
        assert_eq!(Period::parse(Some("WEEK")), Period::Week);
    }

    #[test]
    fn granularity_scales_with_span() {
        let end: DateTime<Utc> = "2026-06-30T00:00:00Z".parse().unwrap();

        let buckets = buckets_for(end - Duration::days(7), end);
        assert_eq!(buckets.len(), 8); // one per day, inclusive bounds

        let buckets = buckets_for(end - Duration::days(90), end);
        assert!(buckets.len() <= 14); // weekly

        let buckets = buckets_for(end - Duration::days(365), end);
        assert_eq!(buckets.len(), 13); // monthly, spanning a year boundary
    }

    #[test]
    fn date_param_parses_and_degrades() {
        let start = parse_date_param(Some("2026-03-05"), false).unwrap();
        assert_eq!(start.to_rfc3339(), "2026-03-05T00:00:00+00:00");

        let end = parse_date_param(Some("2026-03-05"), true).unwrap();
        assert_eq!(end.to_rfc3339(), "2026-03-05T23:59:59+00:00");

        assert_eq!(parse_date_param(Some("05/03/2026"), false), None);
        assert_eq!(parse_date_param(None, false), None);
    }
}
