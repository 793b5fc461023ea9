//! Dashboard aggregation services.
//!
//! Each service issues exactly one store query covering the global
//! range of the requested buckets, then partitions rows in memory.
//! Errors are returned tagged (`Err`, not an empty result) so callers
//! can tell "no data" from "query failed"; the dashboard route is the
//! one place that deliberately degrades an `Err` to an empty block.

use crate::store::Store;
use chrono::{DateTime, Utc};
use desk_common::bucket::{global_range, partition, DateBucket};
use desk_common::{DeskError, Ticket, TicketKind};
use serde::{Deserialize, Serialize};

/// Ticket volume for one bucket, split by kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct VolumeCounts {
    pub bugs: u64,
    pub reqs: u64,
    pub assistances: u64,
}

impl VolumeCounts {
    pub fn total(&self) -> u64 {
        self.bugs + self.reqs + self.assistances
    }
}

/// One chart point of the volume series
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketVolume {
    pub date: String,
    pub counts: VolumeCounts,
}

/// One chart point of the time-spent series
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketMinutes {
    pub date: String,
    pub total_minutes: i64,
}

/// Strategic block for director/admin dashboards
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Strategic {
    pub open_backlog: u64,
    pub created_total: u64,
    pub resolved_total: u64,
    pub avg_resolution_minutes: i64,
}

/// Per-bucket ticket volume by creation date: one query, in-memory split.
pub async fn volume_by_bucket(
    store: &Store,
    buckets: &[DateBucket],
) -> Result<Vec<BucketVolume>, DeskError> {
    let Some((start, end)) = global_range(buckets) else {
        return Ok(Vec::new());
    };

    let rows = store.tickets_created_between(start, end).await?;
    let parts = partition(&rows, buckets, |t: &Ticket| Some(t.created_at));

    Ok(buckets
        .iter()
        .zip(parts)
        .map(|(bucket, rows)| BucketVolume {
            date: bucket.label.clone(),
            counts: count_kinds(&rows),
        })
        .collect())
}

/// Per-bucket logged minutes by resolution date. Unresolved tickets are
/// excluded before bucketing, not defaulted into any bucket.
pub async fn resolution_minutes_by_bucket(
    store: &Store,
    buckets: &[DateBucket],
) -> Result<Vec<BucketMinutes>, DeskError> {
    let Some((start, end)) = global_range(buckets) else {
        return Ok(Vec::new());
    };

    let rows = store.tickets_resolved_between(start, end).await?;
    let parts = partition(&rows, buckets, |t: &Ticket| t.resolved_at);

    Ok(buckets
        .iter()
        .zip(parts)
        .map(|(bucket, rows)| BucketMinutes {
            date: bucket.label.clone(),
            total_minutes: rows.iter().map(|t| t.time_spent_minutes).sum(),
        })
        .collect())
}

/// Strategic roll-up over the dashboard window.
pub async fn strategic_summary(
    store: &Store,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    include_old: bool,
) -> Result<Strategic, DeskError> {
    let backlog_floor = if include_old { None } else { Some(start) };
    let open_backlog = store.count_open_tickets(backlog_floor).await?;

    let created = store.tickets_created_between(start, end).await?;
    let resolved = store.tickets_resolved_between(start, end).await?;

    let avg_resolution_minutes = if resolved.is_empty() {
        0
    } else {
        let total: i64 = resolved
            .iter()
            .filter_map(|t| t.resolved_at.map(|r| (r - t.created_at).num_minutes()))
            .sum();
        total / resolved.len() as i64
    };

    Ok(Strategic {
        open_backlog,
        created_total: created.len() as u64,
        resolved_total: resolved.len() as u64,
        avg_resolution_minutes,
    })
}

fn count_kinds(rows: &[&Ticket]) -> VolumeCounts {
    let mut counts = VolumeCounts::default();
    for ticket in rows {
        match ticket.kind {
            TicketKind::Bug => counts.bugs += 1,
            TicketKind::Request => counts.reqs += 1,
            TicketKind::Assistance => counts.assistances += 1,
        }
    }
    counts
}
