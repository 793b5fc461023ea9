//! Date-bucket partitioning for dashboard aggregation.
//!
//! The aggregation services fetch all rows for one global range, then
//! split them across buckets in memory instead of issuing one query per
//! bucket. Buckets must be supplied non-overlapping and in chronological
//! order: a row is credited to the FIRST bucket containing its timestamp
//! and the scan stops there.

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};

/// A contiguous sub-range of a larger date range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateBucket {
    /// Display label, e.g. "2026-03-14" or "2026-03"
    pub label: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateBucket {
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts <= self.end
    }
}

/// One bucket per calendar day covering `[start, end]`.
pub fn day_buckets(start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<DateBucket> {
    let mut buckets = Vec::new();
    let mut cursor = start.date_naive();
    let last = end.date_naive();

    while cursor <= last {
        let day_start = Utc.from_utc_datetime(&cursor.and_hms_opt(0, 0, 0).unwrap());
        let day_end = Utc.from_utc_datetime(&cursor.and_hms_opt(23, 59, 59).unwrap());
        buckets.push(DateBucket {
            label: cursor.format("%Y-%m-%d").to_string(),
            start: day_start.max(start),
            end: day_end.min(end),
        });
        cursor += Duration::days(1);
    }
    buckets
}

/// One bucket per ISO week covering `[start, end]`.
pub fn week_buckets(start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<DateBucket> {
    let mut buckets = Vec::new();
    // Align the cursor to the Monday of the starting week
    let mut cursor = start.date_naive()
        - Duration::days(i64::from(start.date_naive().weekday().num_days_from_monday()));
    let last = end.date_naive();

    while cursor <= last {
        let week_start = Utc.from_utc_datetime(&cursor.and_hms_opt(0, 0, 0).unwrap());
        let week_end = Utc.from_utc_datetime(
            &(cursor + Duration::days(6)).and_hms_opt(23, 59, 59).unwrap(),
        );
        let iso = cursor.iso_week();
        buckets.push(DateBucket {
            label: format!("{}-W{:02}", iso.year(), iso.week()),
            start: week_start.max(start),
            end: week_end.min(end),
        });
        cursor += Duration::days(7);
    }
    buckets
}

/// One bucket per calendar month covering `[start, end]`.
pub fn month_buckets(start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<DateBucket> {
    let mut buckets = Vec::new();
    let mut year = start.year();
    let mut month = start.month();

    loop {
        let month_start = Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0).unwrap();
        if month_start > end {
            break;
        }
        let (next_year, next_month) = if month == 12 {
            (year + 1, 1)
        } else {
            (year, month + 1)
        };
        let month_end =
            Utc.with_ymd_and_hms(next_year, next_month, 1, 0, 0, 0).unwrap() - Duration::seconds(1);
        buckets.push(DateBucket {
            label: format!("{year}-{month:02}"),
            start: month_start.max(start),
            end: month_end.min(end),
        });
        year = next_year;
        month = next_month;
    }
    buckets
}

/// The minimal `[start, end]` covering every bucket.
pub fn global_range(buckets: &[DateBucket]) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = buckets.iter().map(|b| b.start).min()?;
    let end = buckets.iter().map(|b| b.end).max()?;
    Some((start, end))
}

/// Assign each row to the first bucket containing its timestamp.
///
/// Rows whose `timestamp_of` returns `None` are excluded from every
/// bucket; rows outside all buckets are dropped. Returns one `Vec` of
/// row references per bucket, in bucket order.
pub fn partition<'a, T, F>(rows: &'a [T], buckets: &[DateBucket], timestamp_of: F) -> Vec<Vec<&'a T>>
where
    F: Fn(&T) -> Option<DateTime<Utc>>,
{
    let mut out: Vec<Vec<&T>> = buckets.iter().map(|_| Vec::new()).collect();

    for row in rows {
        let Some(ts) = timestamp_of(row) else {
            continue;
        };
        for (idx, bucket) in buckets.iter().enumerate() {
            if bucket.contains(ts) {
                out[idx].push(row);
                break;
            }
        }
    }
    out
}
