//! Duration strings for the scheduler tick, e.g. `"1m"`, `"90s"`, `"1h30m"`.
//!
//! Supports the units `s`, `m`, `h`, `d`, `w`. Multiple number/unit pairs
//! accumulate, so `"1h30m"` is ninety minutes.

use std::time::Duration;

use crate::error::CoreError;

pub fn parse_duration(input: &str) -> Result<Duration, CoreError> {
    if input.is_empty() {
        return Err(CoreError::Validation("empty duration string".into()));
    }

    let bytes = input.as_bytes();
    let mut total_secs: i64 = 0;
    let mut i = 0;

    while i < bytes.len() {
        let start = i;
        while i < bytes.len() && (bytes[i] == b'-' || bytes[i] == b'+' || bytes[i].is_ascii_digit())
        {
            i += 1;
        }
        if i == start {
            return Err(CoreError::Validation(format!("invalid duration: {input}")));
        }
        let number: i64 = input[start..i]
            .parse()
            .map_err(|_| CoreError::Validation(format!("invalid duration: {input}")))?;

        let Some(&unit) = bytes.get(i) else {
            return Err(CoreError::Validation(format!(
                "missing unit in duration: {input}"
            )));
        };
        i += 1;

        let unit_secs = match unit {
            b's' => 1,
            b'm' => 60,
            b'h' => 3600,
            b'd' => 24 * 3600,
            b'w' => 7 * 24 * 3600,
            other => {
                return Err(CoreError::Validation(format!(
                    "unknown unit {} in duration {input}",
                    other as char
                )))
            }
        };
        total_secs += number * unit_secs;
    }

    u64::try_from(total_secs)
        .map(Duration::from_secs)
        .map_err(|_| CoreError::Validation(format!("negative duration: {input}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_units() {
        assert_eq!(parse_duration("90s").expect("ok"), Duration::from_secs(90));
        assert_eq!(parse_duration("1m").expect("ok"), Duration::from_secs(60));
        assert_eq!(parse_duration("2h").expect("ok"), Duration::from_secs(7200));
        assert_eq!(parse_duration("1d").expect("ok"), Duration::from_secs(86_400));
        assert_eq!(parse_duration("1w").expect("ok"), Duration::from_secs(604_800));
    }

    #[test]
    fn compound_durations_accumulate() {
        assert_eq!(parse_duration("1h30m").expect("ok"), Duration::from_secs(5400));
        assert_eq!(parse_duration("1d-1h").expect("ok"), Duration::from_secs(23 * 3600));
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("5").is_err());
        assert!(parse_duration("x5m").is_err());
        assert!(parse_duration("5y").is_err());
        assert!(parse_duration("-2m").is_err());
    }
}
