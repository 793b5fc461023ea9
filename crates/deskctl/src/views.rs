//! Deserialized shapes of the daemon's non-list responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeCountsView {
    pub bugs: u64,
    pub reqs: u64,
    pub assistances: u64,
}

impl VolumeCountsView {
    pub fn total(&self) -> u64 {
        self.bugs + self.reqs + self.assistances
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumePoint {
    pub date: String,
    pub counts: VolumeCountsView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinutesPoint {
    pub date: String,
    pub total_minutes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategicView {
    pub open_backlog: u64,
    pub created_total: u64,
    pub resolved_total: u64,
    pub avg_resolution_minutes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardView {
    pub period: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Only present for director/admin sessions
    #[serde(default)]
    pub strategic: Option<StrategicView>,
    pub volume: Vec<VolumePoint>,
    pub time_spent: Vec<MinutesPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthView {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}
