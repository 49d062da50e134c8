//! Rolling time-window rewriting.
//!
//! A rolling window keeps the day (and for `"year"` mode the month) of a
//! stored query window while advancing its year/month to "now", so a report
//! scheduled monthly always covers the current period. The rewrite happens
//! on the materialization pass's working copy; the stored report is never
//! touched.

use chrono::{DateTime, Datelike, Duration, NaiveTime, SecondsFormat, TimeZone, Utc};

use crate::error::CoreError;
use crate::report::ReportObject;

pub const ROLLING_MONTH: &str = "month";
pub const ROLLING_YEAR: &str = "year";

/// Rewrite the query window of `object` in place according to its
/// `queryOptions`, using `now` as the reference instant.
///
/// For each of start/end with a rolling mode set and the corresponding
/// timestamp present: subtract the offset minutes, reassemble day/month onto
/// `now`'s year (and month, for `"month"` mode) at midnight UTC, then re-add
/// the offset. Offsets default to zero. The result is always emitted as UTC
/// RFC3339, regardless of the input's zone offset.
pub fn rewrite_rolling_window(object: &mut ReportObject, now: DateTime<Utc>) -> Result<(), CoreError> {
    let Some(options) = object.query_options.clone() else {
        return Ok(());
    };
    let Some(query) = object.query.as_mut() else {
        return Ok(());
    };
    let Some(time) = query.time.as_mut() else {
        return Ok(());
    };

    if let (Some(mode), Some(start)) = (options.rolling_start_date.as_deref(), time.start.as_mut()) {
        *start = reassemble(start, mode, options.start_offset.unwrap_or(0), now)?;
    }
    if let (Some(mode), Some(end)) = (options.rolling_end_date.as_deref(), time.end.as_mut()) {
        *end = reassemble(end, mode, options.end_offset.unwrap_or(0), now)?;
    }
    Ok(())
}

fn reassemble(
    timestamp: &str,
    mode: &str,
    offset_minutes: i64,
    now: DateTime<Utc>,
) -> Result<String, CoreError> {
    let parsed = DateTime::parse_from_rfc3339(timestamp)
        .map_err(|e| CoreError::Validation(format!("invalid RFC3339 timestamp '{timestamp}': {e}")))?;
    let base = parsed.with_timezone(&Utc) - Duration::minutes(offset_minutes);

    let rebuilt = match mode {
        ROLLING_MONTH => date_at_midnight(now.year(), now.month(), base.day())?,
        ROLLING_YEAR => date_at_midnight(now.year(), base.month(), base.day())?,
        _ => base,
    };

    let shifted = rebuilt + Duration::minutes(offset_minutes);
    Ok(shifted.to_rfc3339_opts(SecondsFormat::Secs, true))
}

/// Midnight UTC of the given calendar day. A day beyond the month's end
/// overflows into the following month, matching calendar addition.
fn date_at_midnight(year: i32, month: u32, day: u32) -> Result<DateTime<Utc>, CoreError> {
    let first = chrono::NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| CoreError::Validation(format!("invalid rolling date {year}-{month:02}")))?;
    let date = first + Duration::days(i64::from(day) - 1);
    Ok(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{QueryOptions, QueryTime, TimeseriesQuery};

    fn node(start: &str, options: QueryOptions) -> ReportObject {
        ReportObject {
            value_type: "float64".into(),
            query: Some(TimeseriesQuery {
                device_id: Some("d1".into()),
                service_id: Some("s1".into()),
                time: Some(QueryTime {
                    start: Some(start.into()),
                    end: None,
                    last: None,
                }),
                ..TimeseriesQuery::default()
            }),
            query_options: Some(options),
            ..ReportObject::default()
        }
    }

    fn start_of(object: &ReportObject) -> String {
        object
            .query
            .as_ref()
            .and_then(|q| q.time.as_ref())
            .and_then(|t| t.start.clone())
            .expect("start present")
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 15, 0, 0, 0).single().expect("valid")
    }

    #[test]
    fn month_mode_with_zero_offset_keeps_the_day() {
        let mut object = node(
            "2024-01-10T13:45:00Z",
            QueryOptions {
                rolling_start_date: Some(ROLLING_MONTH.into()),
                ..QueryOptions::default()
            },
        );
        rewrite_rolling_window(&mut object, fixed_now()).expect("rewrite");
        assert_eq!(start_of(&object), "2024-07-10T00:00:00Z");
    }

    #[test]
    fn offset_is_subtracted_before_and_added_after_reassembly() {
        let mut object = node(
            "2024-01-10T12:00:00Z",
            QueryOptions {
                rolling_start_date: Some(ROLLING_MONTH.into()),
                start_offset: Some(60),
                ..QueryOptions::default()
            },
        );
        rewrite_rolling_window(&mut object, fixed_now()).expect("rewrite");
        assert_eq!(start_of(&object), "2024-07-10T01:00:00Z");
    }

    #[test]
    fn offset_crossing_midnight_shifts_the_preserved_day() {
        // Subtracting the offset moves the base instant to the previous day,
        // and that day is what the reassembly preserves.
        let mut object = node(
            "2024-01-10T00:00:00Z",
            QueryOptions {
                rolling_start_date: Some(ROLLING_MONTH.into()),
                start_offset: Some(60),
                ..QueryOptions::default()
            },
        );
        rewrite_rolling_window(&mut object, fixed_now()).expect("rewrite");
        assert_eq!(start_of(&object), "2024-07-09T01:00:00Z");
    }

    #[test]
    fn year_mode_keeps_month_and_day() {
        let mut object = node(
            "2021-03-05T08:00:00Z",
            QueryOptions {
                rolling_start_date: Some(ROLLING_YEAR.into()),
                ..QueryOptions::default()
            },
        );
        rewrite_rolling_window(&mut object, fixed_now()).expect("rewrite");
        assert_eq!(start_of(&object), "2024-03-05T00:00:00Z");
    }

    #[test]
    fn zoned_input_is_emitted_as_utc() {
        // 2024-01-10T01:30+02:00 is 2024-01-09T23:30Z; the preserved day is 9.
        let mut object = node(
            "2024-01-10T01:30:00+02:00",
            QueryOptions {
                rolling_start_date: Some(ROLLING_MONTH.into()),
                ..QueryOptions::default()
            },
        );
        rewrite_rolling_window(&mut object, fixed_now()).expect("rewrite");
        assert_eq!(start_of(&object), "2024-07-09T00:00:00Z");
    }

    #[test]
    fn day_overflow_rolls_into_the_next_month() {
        // Day 31 reassembled onto June lands on July 1.
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).single().expect("valid");
        let mut object = node(
            "2024-01-31T00:00:00Z",
            QueryOptions {
                rolling_start_date: Some(ROLLING_MONTH.into()),
                ..QueryOptions::default()
            },
        );
        rewrite_rolling_window(&mut object, now).expect("rewrite");
        assert_eq!(start_of(&object), "2024-07-01T00:00:00Z");
    }

    #[test]
    fn end_date_is_rewritten_symmetrically() {
        let mut object = ReportObject {
            value_type: "array".into(),
            query: Some(TimeseriesQuery {
                device_id: Some("d1".into()),
                service_id: Some("s1".into()),
                time: Some(QueryTime {
                    start: Some("2024-01-01T00:00:00Z".into()),
                    end: Some("2024-01-31T12:00:00Z".into()),
                    last: None,
                }),
                ..TimeseriesQuery::default()
            }),
            query_options: Some(QueryOptions {
                rolling_end_date: Some(ROLLING_MONTH.into()),
                ..QueryOptions::default()
            }),
            ..ReportObject::default()
        };
        rewrite_rolling_window(&mut object, fixed_now()).expect("rewrite");
        let time = object.query.as_ref().and_then(|q| q.time.clone()).expect("time");
        // Start has no rolling mode configured and stays untouched.
        assert_eq!(time.start.as_deref(), Some("2024-01-01T00:00:00Z"));
        assert_eq!(time.end.as_deref(), Some("2024-07-31T00:00:00Z"));
    }

    #[test]
    fn missing_options_or_query_is_a_no_op() {
        let mut object = ReportObject {
            value_type: "string".into(),
            value: Some(serde_json::json!("literal")),
            ..ReportObject::default()
        };
        rewrite_rolling_window(&mut object, fixed_now()).expect("rewrite");
        assert_eq!(object.value, Some(serde_json::json!("literal")));
    }

    #[test]
    fn malformed_timestamp_is_an_error() {
        let mut object = node(
            "not-a-date",
            QueryOptions {
                rolling_start_date: Some(ROLLING_MONTH.into()),
                ..QueryOptions::default()
            },
        );
        assert!(rewrite_rolling_window(&mut object, fixed_now()).is_err());
    }
}
