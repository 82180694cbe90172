//! Timestamp normalization for listing subtexts.
//!
//! Listings show either a relative age ("3시간 전", "2 days ago") or an
//! absolute date ("2024.03.02."). [`normalize`] turns both into an instant,
//! given the caller's notion of "now". Sub-day ages collapse to `now`.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone};
use once_cell::sync::Lazy;
use regex::Regex;

static SUB_DAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\d+\s*(초|분|시간)\s*전|방금|just now|\d+\s*(sec|second|min|minute|hr|hour)s?\s+ago",
    )
    .unwrap()
});

static DAYS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+)\s*(?:일\s*전|days?\s+ago)").unwrap());

static WEEKS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+)\s*(?:주\s*전|weeks?\s+ago)").unwrap());

static ABSOLUTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4})[./-]\s*(\d{1,2})[./-]\s*(\d{1,2})\.?").unwrap());

/// True when `text` carries a relative-age unit word.
pub fn looks_relative(text: &str) -> bool {
    SUB_DAY.is_match(text) || DAYS.is_match(text) || WEEKS.is_match(text)
}

/// Convert listing time text into an instant, or `None` if it is not a time.
pub fn normalize(text: &str, now: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
    if SUB_DAY.is_match(text) {
        return Some(now);
    }
    if let Some(days) = leading_count(&DAYS, text) {
        return now.checked_sub_signed(Duration::try_days(days)?);
    }
    if let Some(weeks) = leading_count(&WEEKS, text) {
        return now.checked_sub_signed(Duration::try_days(weeks.checked_mul(7)?)?);
    }
    absolute(text, now.offset())
}

fn leading_count(pattern: &Regex, text: &str) -> Option<i64> {
    pattern.captures(text)?.get(1)?.as_str().parse().ok()
}

fn absolute(text: &str, offset: &FixedOffset) -> Option<DateTime<FixedOffset>> {
    let caps = ABSOLUTE.captures(text)?;
    let year: i32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let day: u32 = caps[3].parse().ok()?;
    let midnight = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(0, 0, 0)?;
    offset.from_local_datetime(&midnight).single()
}
