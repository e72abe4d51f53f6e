use {
    crate::config::constants::display::{DATE_FORMAT, LONG_DATE_FORMAT},
    chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc},
};

pub struct TimeUtils;

impl TimeUtils {
    pub const MS_IN_S: i64 = 1000;
    pub const MS_IN_MIN: i64 = Self::MS_IN_S * 60;
    pub const MS_IN_H: i64 = Self::MS_IN_MIN * 60;
    pub const MS_IN_D: i64 = Self::MS_IN_H * 24;

    /// Layouts accepted for naive (zone-less) timestamps, read as UTC.
    const NAIVE_LAYOUTS: &'static [&'static str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
}

// Time Helper functions

/// RFC 3339, a naive `YYYY-MM-DD[ T]HH:MM[:SS[.f]]`, or a bare date at midnight UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for layout in TimeUtils::NAIVE_LAYOUTS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, layout) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// A bare date, or the date part of anything `parse_timestamp` accepts.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .ok()
        .or_else(|| parse_timestamp(raw).map(|dt| dt.date_naive()))
}

pub fn parse_time_of_day(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

/// Whole days from `from` to `to`, floored, never negative.
pub fn whole_days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    let elapsed_ms = (to - from).num_milliseconds();
    if elapsed_ms <= 0 {
        0
    } else {
        elapsed_ms / TimeUtils::MS_IN_D
    }
}

pub fn format_long_date(date: NaiveDate) -> String {
    // Used for display purposes
    date.format(LONG_DATE_FORMAT).to_string()
}

pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}
