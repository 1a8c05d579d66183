use chrono::{Local, NaiveDate, NaiveTime};

/// Epoch seconds of today's local date at 23:59:59, read as UTC.
pub fn end_of_today_epoch() -> i64 {
    today_epoch(23, 59, 59)
}

/// Epoch seconds of today's local date at the given time, read as UTC.
///
/// Out-of-range times fall back to midnight.
pub fn today_epoch(hour: u32, min: u32, sec: u32) -> i64 {
    let time = NaiveTime::from_hms_opt(hour, min, sec).unwrap_or(NaiveTime::MIN);
    Local::now().date_naive().and_time(time).and_utc().timestamp()
}

pub fn start_of_day_epoch(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

pub fn end_of_day_epoch(date: NaiveDate) -> i64 {
    let end = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
    date.and_time(end).and_utc().timestamp()
}
