//! In-process counter for queried time-series data points.
//!
//! Exposition is somebody else's job; the engine only keeps the monotonic
//! per-`(user, report)` totals and logs each increment.

use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct DatapointCounter {
    counts: Mutex<HashMap<(String, String), u64>>,
}

impl DatapointCounter {
    /// Record `rows` raw data points returned for one query, observed before
    /// null filtering.
    pub fn add(&self, user_id: &str, report_id: &str, rows: u64) {
        let mut counts = self
            .counts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *counts
            .entry((user_id.to_string(), report_id.to_string()))
            .or_insert(0) += rows;
        tracing::debug!(user_id, report_id, rows, "Queried time-series data points");
    }

    pub fn get(&self, user_id: &str, report_id: &str) -> u64 {
        let counts = self
            .counts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        counts
            .get(&(user_id.to_string(), report_id.to_string()))
            .copied()
            .unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        let counts = self
            .counts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        counts.values().sum()
    }
}
