use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Utc};

use crate::types::dto::common::to_datetime;

pub const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Midnight UTC of the day containing `now`
pub fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.from_utc_datetime(&now.date_naive().and_time(NaiveTime::MIN))
}

/// Midnight UTC on the first day of the month containing `now`
pub fn start_of_month(now: DateTime<Utc>) -> DateTime<Utc> {
    let day = start_of_day(now);
    day - Duration::days(i64::from(day.day0()))
}

/// First and last second of the UTC day containing `now`
pub fn today_bounds(now: DateTime<Utc>) -> (i64, i64) {
    let start = start_of_day(now).timestamp();
    (start, start + SECONDS_PER_DAY - 1)
}

pub fn day_key(timestamp: i64) -> String {
    to_datetime(timestamp).format("%Y-%m-%d").to_string()
}

/// "YYYY-MM-DD to YYYY-MM-DD"
pub fn range_label(from: DateTime<Utc>, to: DateTime<Utc>) -> String {
    format!("{} to {}", from.format("%Y-%m-%d"), to.format("%Y-%m-%d"))
}

/// Defaults to the current month so far
pub fn month_to_date(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    (from.unwrap_or_else(|| start_of_month(now)), to.unwrap_or(now))
}
