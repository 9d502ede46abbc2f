//! FILENAME: core/engine/src/dates.rs
//! PURPOSE: Calendar bucketing of timestamp values.
//! CONTEXT: Bucket units use the single-letter date format codes the host's
//! widgets already speak (`Y`, `M`, `d`, ...). Quarter is an extra unit.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Label of values that are present but do not parse as dates.
pub const INVALID_DATE_LABEL: &str = "--";

/// Calendar unit a date dimension groups by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DateBucket {
    /// `d`: day of month, two digits.
    Day,
    /// `j`: day of month without leading zero.
    DayNoPad,
    /// `W`: ISO week number, two digits.
    IsoWeek,
    /// `m`: month number, two digits.
    Month,
    /// `n`: month number without leading zero.
    MonthNoPad,
    /// `Y`: four digit year.
    Year,
    /// `M`: short month name.
    MonthShort,
    /// `F`: full month name.
    MonthLong,
    /// `D`: short weekday name.
    WeekdayShort,
    /// `l`: full weekday name.
    WeekdayLong,
    /// `Q`: quarter of the year.
    Quarter,
    /// Any other code: the full `YYYY-MM-DD` date.
    FullDate(String),
}

impl Default for DateBucket {
    fn default() -> Self {
        DateBucket::FullDate(String::new())
    }
}

impl From<String> for DateBucket {
    fn from(code: String) -> Self {
        match code.as_str() {
            "d" => DateBucket::Day,
            "j" => DateBucket::DayNoPad,
            "W" => DateBucket::IsoWeek,
            "m" => DateBucket::Month,
            "n" => DateBucket::MonthNoPad,
            "Y" => DateBucket::Year,
            "M" => DateBucket::MonthShort,
            "F" => DateBucket::MonthLong,
            "D" => DateBucket::WeekdayShort,
            "l" => DateBucket::WeekdayLong,
            "Q" => DateBucket::Quarter,
            _ => DateBucket::FullDate(code),
        }
    }
}

impl From<DateBucket> for String {
    fn from(bucket: DateBucket) -> String {
        match bucket {
            DateBucket::Day => "d".to_string(),
            DateBucket::DayNoPad => "j".to_string(),
            DateBucket::IsoWeek => "W".to_string(),
            DateBucket::Month => "m".to_string(),
            DateBucket::MonthNoPad => "n".to_string(),
            DateBucket::Year => "Y".to_string(),
            DateBucket::MonthShort => "M".to_string(),
            DateBucket::MonthLong => "F".to_string(),
            DateBucket::WeekdayShort => "D".to_string(),
            DateBucket::WeekdayLong => "l".to_string(),
            DateBucket::Quarter => "Q".to_string(),
            DateBucket::FullDate(code) => code,
        }
    }
}

/// A bucketed date: display label plus a chronological ordinal for sorting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketedDate {
    pub label: String,
    pub ordinal: Option<i64>,
}

impl DateBucket {
    /// Buckets a raw value. Unparseable values land in the `--` bucket.
    pub fn bucket(&self, value: &Value) -> BucketedDate {
        match parse_date(value) {
            Some(date) => self.bucket_date(date),
            None => BucketedDate {
                label: INVALID_DATE_LABEL.to_string(),
                ordinal: None,
            },
        }
    }

    pub fn bucket_date(&self, date: NaiveDate) -> BucketedDate {
        let (label, ordinal) = match self {
            DateBucket::Day => (date.format("%d").to_string(), date.day() as i64),
            DateBucket::DayNoPad => (date.day().to_string(), date.day() as i64),
            DateBucket::IsoWeek => {
                let week = date.iso_week().week();
                (format!("{:02}", week), week as i64)
            }
            DateBucket::Month => (date.format("%m").to_string(), date.month() as i64),
            DateBucket::MonthNoPad => (date.month().to_string(), date.month() as i64),
            DateBucket::Year => (date.year().to_string(), date.year() as i64),
            DateBucket::MonthShort => (date.format("%b").to_string(), date.month() as i64),
            DateBucket::MonthLong => (date.format("%B").to_string(), date.month() as i64),
            DateBucket::WeekdayShort => (
                date.format("%a").to_string(),
                date.weekday().number_from_monday() as i64,
            ),
            DateBucket::WeekdayLong => (
                date.format("%A").to_string(),
                date.weekday().number_from_monday() as i64,
            ),
            DateBucket::Quarter => {
                let quarter = (date.month() - 1) / 3 + 1;
                (format!("Q{}", quarter), quarter as i64)
            }
            DateBucket::FullDate(_) => (
                date.format("%Y-%m-%d").to_string(),
                date.year() as i64 * 10_000 + date.month() as i64 * 100 + date.day() as i64,
            ),
        };
        BucketedDate {
            label,
            ordinal: Some(ordinal),
        }
    }
}

/// Parses a string timestamp into its wall-clock calendar date.
/// Accepts RFC 3339, ISO 8601 offsets without a colon (`+0300`), naive
/// date-times with `T` or space, and plain dates.
pub fn parse_date(value: &Value) -> Option<NaiveDate> {
    let text = value.as_str()?.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local().date());
    }
    const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(text, format) {
            return Some(dt.naive_local().date());
        }
    }
    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bucket(code: &str, raw: &str) -> String {
        DateBucket::from(code.to_string()).bucket(&json!(raw)).label
    }

    #[test]
    fn test_year_and_month_buckets() {
        assert_eq!(bucket("Y", "2024-03-15T10:00:00Z"), "2024");
        assert_eq!(bucket("M", "2024-03-15T10:00:00Z"), "Mar");
        assert_eq!(bucket("F", "2024-03-15T10:00:00Z"), "March");
        assert_eq!(bucket("m", "2024-03-15"), "03");
        assert_eq!(bucket("n", "2024-03-15"), "3");
    }

    #[test]
    fn test_day_week_and_quarter_buckets() {
        assert_eq!(bucket("d", "2024-03-05 08:30:00"), "05");
        assert_eq!(bucket("j", "2024-03-05 08:30:00"), "5");
        assert_eq!(bucket("W", "2024-03-15"), "11");
        assert_eq!(bucket("D", "2024-03-15"), "Fri");
        assert_eq!(bucket("l", "2024-03-15"), "Friday");
        assert_eq!(bucket("Q", "2024-11-02"), "Q4");
    }

    #[test]
    fn test_unknown_code_uses_full_date() {
        assert_eq!(bucket("x", "2024-03-15T23:59:59.123+02:00"), "2024-03-15");
    }

    #[test]
    fn test_basic_offset_keeps_wall_clock_date() {
        assert_eq!(bucket("Y", "2024-03-15T10:00:00+0300"), "2024");
        assert_eq!(bucket("x", "2024-12-31T23:30:00-0500"), "2024-12-31");
        assert_eq!(bucket("x", "2024-12-31T23:30:00.250-05:00"), "2024-12-31");
        assert_eq!(bucket("d", "2024-03-05 01:00:00+0300"), "05");
    }

    #[test]
    fn test_unparseable_is_sentinel() {
        assert_eq!(bucket("Y", "not a date"), INVALID_DATE_LABEL);
        let numeric = DateBucket::Year.bucket(&json!(20240315));
        assert_eq!(numeric.label, INVALID_DATE_LABEL);
        assert_eq!(numeric.ordinal, None);
    }

    #[test]
    fn test_month_ordinal_is_chronological() {
        let jan = DateBucket::MonthShort.bucket(&json!("2024-01-10"));
        let feb = DateBucket::MonthShort.bucket(&json!("2024-02-10"));
        assert!(jan.ordinal < feb.ordinal);
        assert_eq!(jan.label, "Jan");
    }

    #[test]
    fn test_serde_uses_format_codes() {
        let parsed: DateBucket = serde_json::from_value(json!("Y")).unwrap();
        assert_eq!(parsed, DateBucket::Year);
        assert_eq!(serde_json::to_value(DateBucket::Quarter).unwrap(), json!("Q"));
    }
}
