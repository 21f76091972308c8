use anyhow::{Context, Result};
use chrono::NaiveDateTime;

/// Format used for every timestamp persisted in the store. ISO-8601 without
/// an offset, so SQLite's date() function works directly on the raw text.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub fn format_timestamp(value: NaiveDateTime) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .with_context(|| format!("Invalid stored timestamp {value:?}"))
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};

    use super::{format_timestamp, parse_timestamp};

    #[test]
    fn timestamp_round_trip_drops_subsecond_precision() {
        let moment = NaiveDateTime::new(
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            NaiveTime::from_hms_milli_opt(9, 30, 12, 457).unwrap(),
        );
        let text = format_timestamp(moment);
        assert_eq!(text, "2024-03-15T09:30:12");
        assert_eq!(
            parse_timestamp(&text).unwrap(),
            moment.with_nanosecond(0).unwrap()
        );
    }

    #[test]
    fn rejects_malformed_timestamps() {
        assert!(parse_timestamp("2024-03-15").is_err());
        assert!(parse_timestamp("not a time").is_err());
    }
}
