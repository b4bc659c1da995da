// src/models/streak.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of recording an activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreakUpdate {
    pub updated: bool,
    pub streak: i32,
    pub message: String,
}

/// Read-only projection returned by `GET /api/streak`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakStatus {
    pub streak: i32,
    pub last_active_date: Option<DateTime<Utc>>,
}
