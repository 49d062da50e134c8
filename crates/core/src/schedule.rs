//! Cron schedule computation.
//!
//! Reports carry a five-field cron expression (minute, hour, day-of-month,
//! month, day-of-week). `scheduledFor` is recomputed on every write as the
//! next fire strictly after the write instant.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use cron::Schedule;

use crate::error::CoreError;

/// Compute the next fire of a five-field cron expression strictly after
/// `after`. An empty expression means the report is unscheduled (`None`).
///
/// `cron::Schedule` expects a leading seconds field; schedules fire at
/// second zero.
pub fn next_fire(cron_expr: &str, after: DateTime<Utc>) -> Result<Option<DateTime<Utc>>, CoreError> {
    if cron_expr.is_empty() {
        return Ok(None);
    }
    let schedule = Schedule::from_str(&format!("0 {cron_expr}"))
        .map_err(|e| CoreError::Validation(format!("invalid cron expression '{cron_expr}': {e}")))?;
    Ok(schedule.after(&after).next())
}
