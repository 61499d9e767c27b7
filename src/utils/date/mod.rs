// Date utility functions
// Week anchoring and time-of-day arithmetic shared by the grid and the models

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveTime, TimeZone, Timelike};

pub const MINUTES_PER_DAY: u32 = 24 * 60;
/// Latest representable end of day on the grid (23:59).
pub const LAST_MINUTE: u32 = MINUTES_PER_DAY - 1;
const MS_PER_DAY: f64 = 86_400_000.0;

/// Anchors `date` at local noon. Noon never falls inside a DST gap, so the
/// resulting instant always maps back to the same calendar date.
pub fn local_noon(date: NaiveDate) -> DateTime<Local> {
    local_instant(date, time_from_minutes(12 * 60))
}

/// Local instant for a wall-clock date and time. Ambiguous times resolve to
/// the earlier instant; times inside a DST gap are read as UTC.
pub fn local_instant(date: NaiveDate, time: NaiveTime) -> DateTime<Local> {
    let naive = date.and_time(time);
    match Local.from_local_datetime(&naive) {
        chrono::LocalResult::Single(dt) => dt,
        chrono::LocalResult::Ambiguous(earliest, _) => earliest,
        chrono::LocalResult::None => Local.from_utc_datetime(&naive),
    }
}

/// Sunday at local noon of the week containing `date`.
pub fn week_start(date: DateTime<Local>) -> DateTime<Local> {
    local_noon(week_start_date(date.date_naive()))
}

/// Calendar date of the Sunday starting the week that contains `date`.
pub fn week_start_date(date: NaiveDate) -> NaiveDate {
    let offset = date.weekday().num_days_from_sunday() as i64;
    date - Duration::days(offset)
}

/// Whole-day offset of `date` from `week_start`, computed from the millisecond
/// distance between the two noon anchors so a DST transition inside the week
/// cannot shift the result.
pub fn day_offset(date: NaiveDate, week_start: DateTime<Local>) -> i64 {
    let millis = (local_noon(date) - week_start).num_milliseconds() as f64;
    (millis / MS_PER_DAY).round() as i64
}

/// Calendar date of column `day` for a week anchored at `week_start`.
pub fn date_for_day(week_start: DateTime<Local>, day: u8) -> NaiveDate {
    week_start.date_naive() + Duration::days(day as i64)
}

pub fn minutes_of(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

/// Builds a time of day from minutes past midnight, clamped to 23:59.
pub fn time_from_minutes(minutes: u32) -> NaiveTime {
    let minutes = minutes.min(LAST_MINUTE);
    NaiveTime::from_num_seconds_from_midnight_opt(minutes * 60, 0).unwrap_or_default()
}

pub fn hm(hour: u32, minute: u32) -> NaiveTime {
    time_from_minutes(hour * 60 + minute)
}

pub fn format_hhmm(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// Accepts `HH:MM` and `HH:MM:SS`.
pub fn parse_hhmm(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;
    use test_case::test_case;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test_case(date(2025, 3, 9), date(2025, 3, 9) ; "sunday maps to itself")]
    #[test_case(date(2025, 3, 12), date(2025, 3, 9) ; "midweek")]
    #[test_case(date(2025, 3, 15), date(2025, 3, 9) ; "saturday")]
    #[test_case(date(2025, 1, 1), date(2024, 12, 29) ; "crosses year boundary")]
    fn test_week_start_date(input: NaiveDate, expected: NaiveDate) {
        assert_eq!(week_start_date(input), expected);
    }

    #[test]
    fn test_week_start_is_sunday_noon() {
        let start = week_start(local_noon(date(2025, 6, 18)));
        assert_eq!(start.weekday(), Weekday::Sun);
        assert_eq!(start.hour(), 12);
        assert_eq!(start.minute(), 0);
    }

    #[test]
    fn test_day_offset_across_dst_week() {
        // Week containing the US spring-forward transition.
        let start = week_start(local_noon(date(2025, 3, 10)));
        for day in 0..7u8 {
            let d = date_for_day(start, day);
            assert_eq!(day_offset(d, start), day as i64);
        }
    }

    #[test]
    fn test_day_offset_out_of_range() {
        let start = week_start(local_noon(date(2025, 6, 18)));
        assert_eq!(day_offset(date(2025, 6, 14), start), -1);
        assert_eq!(day_offset(date(2025, 6, 22), start), 7);
    }

    #[test]
    fn test_time_from_minutes_clamps() {
        assert_eq!(time_from_minutes(9 * 60 + 30), hm(9, 30));
        assert_eq!(time_from_minutes(MINUTES_PER_DAY), hm(23, 59));
    }

    #[test]
    fn test_parse_hhmm_variants() {
        assert_eq!(parse_hhmm("09:15"), Some(hm(9, 15)));
        assert_eq!(parse_hhmm("17:00:00"), Some(hm(17, 0)));
        assert_eq!(parse_hhmm("9am"), None);
        assert_eq!(format_hhmm(hm(7, 5)), "07:05");
    }
}
