use chrono::{DateTime, Datelike, Duration, FixedOffset, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use anyhow::{anyhow, Result};

// REMAINDER[w][k]: weekdays among k consecutive days starting on weekday w (Mon = 0).
const REMAINDER: [[i64; 7]; 7] = [
    [0, 1, 2, 3, 4, 5, 5],
    [0, 1, 2, 3, 4, 4, 4],
    [0, 1, 2, 3, 3, 3, 4],
    [0, 1, 2, 2, 2, 3, 4],
    [0, 1, 1, 1, 2, 3, 4],
    [0, 0, 0, 1, 2, 3, 4],
    [0, 0, 1, 2, 3, 4, 5],
];

/// Number of Monday..Friday dates in `[start, end)`. Zero when `end <= start`.
pub fn weekdays_between(start: NaiveDate, end: NaiveDate) -> i64 {
    let days = (end - start).num_days();
    if days <= 0 {
        return 0;
    }
    let full_weeks = days / 7;
    let rem = (days % 7) as usize;
    let w = start.weekday().num_days_from_monday() as usize;
    full_weeks * 5 + REMAINDER[w][rem]
}

/// Weekdays in `[start, end]`, both dates counted.
pub fn working_days_inclusive(start: NaiveDate, end: NaiveDate) -> i64 {
    if end < start {
        return 0;
    }
    match end.succ_opt() {
        Some(next) => weekdays_between(start, next),
        None => weekdays_between(start, end),
    }
}

/// Calendar date of `ts` as seen from `offset`.
pub fn local_date(ts: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    ts.with_timezone(&offset).date_naive()
}

fn local_to_utc(local: NaiveDateTime, offset: FixedOffset) -> Option<DateTime<Utc>> {
    let shift = Duration::seconds(offset.local_minus_utc() as i64);
    Some(Utc.from_utc_datetime(&local.checked_sub_signed(shift)?))
}

/// First day of `now`'s month at 00:00 and last day at 23:59, in `offset`'s calendar.
pub fn month_bounds(now: DateTime<Utc>, offset: FixedOffset) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let today = local_date(now, offset);
    let first = today.with_day(1)?;
    let last = first.checked_add_months(Months::new(1))?.pred_opt()?;

    let start = first.and_hms_opt(0, 0, 0)?;
    let end = last.and_hms_opt(23, 59, 0)?;
    Some((local_to_utc(start, offset)?, local_to_utc(end, offset)?))
}

pub fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|_| anyhow!("Could not parse date: {} (expected YYYY-MM-DD)", input))
}

/// Parses a point in time relative to `now`:
/// `now`, `today` (00:00), `+Nd`/`-Nd`/`-Nw`, `YYYY-MM-DD`, `YYYY-MM-DD HH:MM[:SS]`, `YYYY-MM-DDTHH:MM`.
pub fn parse_timestamp(input: &str, now: DateTime<Utc>, offset: FixedOffset) -> Result<DateTime<Utc>> {
    let input = input.trim();
    if input.is_empty() {
        return Err(anyhow!("Empty date string"));
    }

    match input.to_lowercase().as_str() {
        "now" => return Ok(now),
        "today" | "tod" => {
            let midnight = local_date(now, offset).and_time(NaiveTime::MIN);
            return local_to_utc(midnight, offset).ok_or_else(|| out_of_range(input));
        }
        _ => {}
    }

    if input.starts_with('+') || input.starts_with('-') {
        if let Some(delta) = parse_relative(input) {
            return now.checked_add_signed(delta).ok_or_else(|| out_of_range(input));
        }
    }

    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, fmt) {
            return local_to_utc(dt, offset).ok_or_else(|| out_of_range(input));
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return local_to_utc(d.and_time(NaiveTime::MIN), offset).ok_or_else(|| out_of_range(input));
    }

    Err(anyhow!("Could not parse date: {}", input))
}

fn out_of_range(input: &str) -> anyhow::Error {
    anyhow!("Date out of range: {}", input)
}

fn parse_relative(input: &str) -> Option<Duration> {
    let (sign, rest) = input.split_at(1);
    if rest.len() < 2 || !rest.is_ascii() {
        return None;
    }
    let (num_str, unit) = rest.split_at(rest.len() - 1);
    let count: i64 = num_str.parse().ok()?;
    let count = if sign == "-" { count.checked_neg()? } else { count };
    match unit {
        "h" => Duration::try_hours(count),
        "d" => Duration::try_days(count),
        "w" => Duration::try_weeks(count),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn walk(start: NaiveDate, end: NaiveDate) -> i64 {
        start
            .iter_days()
            .take_while(|d| *d < end)
            .filter(|d| d.weekday().num_days_from_monday() < 5)
            .count() as i64
    }

    #[test]
    fn test_seven_days_hold_five_weekdays() {
        // 2024-01-01 is a Monday; cover every starting weekday.
        for offset in 0..7 {
            let start = date(2024, 1, 1) + Duration::days(offset);
            let end = start + Duration::days(6);
            assert_eq!(working_days_inclusive(start, end), 5, "start {}", start);
        }
    }

    #[test]
    fn test_closed_form_matches_walk() {
        let base = date(2023, 12, 20);
        for s in 0..14 {
            for len in 0..40 {
                let start = base + Duration::days(s);
                let end = start + Duration::days(len);
                assert_eq!(weekdays_between(start, end), walk(start, end), "{} .. {}", start, end);
            }
        }
    }

    #[test]
    fn test_working_days_inclusive_edges() {
        // Mon..Fri
        assert_eq!(working_days_inclusive(date(2024, 1, 1), date(2024, 1, 5)), 5);
        // single Saturday
        assert_eq!(working_days_inclusive(date(2024, 1, 6), date(2024, 1, 6)), 0);
        // single Wednesday
        assert_eq!(working_days_inclusive(date(2024, 1, 3), date(2024, 1, 3)), 1);
        // reversed
        assert_eq!(working_days_inclusive(date(2024, 1, 5), date(2024, 1, 1)), 0);
    }

    #[test]
    fn test_month_bounds() {
        let now = Utc.with_ymd_and_hms(2024, 2, 14, 12, 0, 0).unwrap();
        let utc = FixedOffset::east_opt(0).unwrap();
        let (start, end) = month_bounds(now, utc).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 0).unwrap());

        let december = Utc.with_ymd_and_hms(2023, 12, 31, 10, 0, 0).unwrap();
        let (_, end) = month_bounds(december, utc).unwrap();
        assert_eq!(end, Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 0).unwrap());
    }

    #[test]
    fn test_month_bounds_follow_offset() {
        // 23:30 UTC on Jan 31 is already February in UTC+3.
        let now = Utc.with_ymd_and_hms(2024, 1, 31, 23, 30, 0).unwrap();
        let msk = FixedOffset::east_opt(3 * 3600).unwrap();
        let (start, _) = month_bounds(now, msk).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 1, 31, 21, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_timestamp() {
        let now = Utc.with_ymd_and_hms(2024, 1, 10, 15, 0, 0).unwrap();
        let utc = FixedOffset::east_opt(0).unwrap();

        assert_eq!(parse_timestamp("now", now, utc).unwrap(), now);
        assert_eq!(
            parse_timestamp("today", now, utc).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap()
        );
        assert_eq!(parse_timestamp("-2d", now, utc).unwrap(), now - Duration::days(2));
        assert_eq!(
            parse_timestamp("2024-01-01 09:00", now, utc).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
        );
        assert_eq!(
            parse_timestamp("2024-01-05", now, utc).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap()
        );
        assert!(parse_timestamp("yesterday-ish", now, utc).is_err());
        assert!(parse_timestamp("-xd", now, utc).is_err());
    }

    #[test]
    fn test_parse_timestamp_out_of_range() {
        let now = Utc.with_ymd_and_hms(2024, 1, 10, 15, 0, 0).unwrap();
        let utc = FixedOffset::east_opt(0).unwrap();

        // too large for a Duration
        assert!(parse_timestamp("+99999999999999d", now, utc).is_err());
        assert!(parse_timestamp("-99999999999999w", now, utc).is_err());
        // fits a Duration, overflows the calendar
        assert!(parse_timestamp("+999999999d", now, utc).is_err());
        assert!(parse_timestamp("--9223372036854775808h", now, utc).is_err());
        assert_eq!(parse_timestamp("+3h", now, utc).unwrap(), now + Duration::hours(3));
    }
}
