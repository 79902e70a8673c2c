//! Hosted backend: REST session store and the aggregated stats endpoint.

mod client;

use serde::{Deserialize, Serialize};

pub use client::RestClient;

/// Per-user totals served by `GET /api/stats/{userId}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_tasks: u64,
    pub completed_tasks: u64,
    pub total_focus_mins: u64,
    pub pomodoros_completed: u64,
}
