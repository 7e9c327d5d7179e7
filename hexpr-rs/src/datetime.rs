//! OLE automation dates.
//!
//! A date is a day count from 1899-12-30 with the time of day in the
//! fraction.  Before the epoch the integer part counts backwards while the
//! fraction still counts forwards from midnight, so `-1.25` is
//! 1899-12-29 06:00.

use std::sync::OnceLock;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;

/// Sentinel for a failed conversion.
pub const INVALID_DATE: f64 = -1e30;

/// Rendered in place of an invalid date.
pub const INVALID_DATE_TEXT: &str = "##Invalid date##";

const SECONDS_PER_DAY: f64 = 86_400.0;

// Range accepted by the OLE date type.
const MIN_OLE: f64 = -657_434.0;
const MAX_OLE: f64 = 2_958_466.0;

fn epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .unwrap_or_default()
        .and_time(NaiveTime::MIN)
}

/// Convert a calendar date-time to an OLE day count.
pub fn naive_to_ole(dt: NaiveDateTime) -> f64 {
    let since = dt - epoch();
    let days = since.num_days();
    let secs = (since - Duration::days(days)).num_milliseconds() as f64 / 1000.0;
    // `num_days` truncates toward zero, so before the epoch the remainder is
    // negative; fold it into the previous day.
    let (days, secs) = if secs < 0.0 {
        (days - 1, secs + SECONDS_PER_DAY)
    } else {
        (days, secs)
    };
    let frac = secs / SECONDS_PER_DAY;
    if days >= 0 {
        days as f64 + frac
    } else {
        days as f64 - frac
    }
}

/// Convert an OLE day count back to a calendar date-time (to the nearest
/// second).  `None` for the invalid sentinel and anything out of range.
pub fn ole_to_naive(ole: f64) -> Option<NaiveDateTime> {
    if !ole.is_finite() || !(MIN_OLE..MAX_OLE).contains(&ole) {
        return None;
    }
    let days = ole.trunc();
    let frac = (ole - days).abs();
    let secs = (frac * SECONDS_PER_DAY).round() as i64;
    epoch()
        .checked_add_signed(Duration::days(days as i64))?
        .checked_add_signed(Duration::seconds(secs))
}

pub fn is_valid(ole: f64) -> bool {
    ole_to_naive(ole).is_some()
}

/// The current local time as an OLE date.
pub fn now() -> f64 {
    naive_to_ole(chrono::Local::now().naive_local())
}

// ── Parsing ───────────────────────────────────────────────────────────────────

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(\d{1,2})/(\d{1,2})/(\d{1,4})(?:(?:\s+|\s*,\s*)(\d{1,2}):(\d{1,2}):(\d{1,2}))?$",
        )
        .unwrap()
    })
}

fn time_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{1,2}):(\d{1,2}):(\d{1,2})$").unwrap()
    })
}

fn field(caps: &regex::Captures<'_>, i: usize) -> Option<u32> {
    caps.get(i)?.as_str().parse().ok()
}

fn hms(caps: &regex::Captures<'_>, first: usize) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(
        field(caps, first)?,
        field(caps, first + 1)?,
        field(caps, first + 2)?,
    )
}

/// Parse `MM/DD/YYYY` with an optional `HH:MM:SS` separated by blanks or a
/// comma.  Surrounding blanks are ignored.
pub fn parse_date(s: &str) -> Option<f64> {
    let caps = date_re().captures(s.trim())?;
    let date = NaiveDate::from_ymd_opt(field(&caps, 3)? as i32, field(&caps, 1)?, field(&caps, 2)?)?;
    let time = if caps.get(4).is_some() {
        hms(&caps, 4)?
    } else {
        NaiveTime::MIN
    };
    Some(naive_to_ole(date.and_time(time)))
}

/// Parse `HH:MM:SS` as a time on the epoch day.
pub fn parse_time(s: &str) -> Option<f64> {
    let caps = time_re().captures(s.trim())?;
    Some(naive_to_ole(epoch().date().and_time(hms(&caps, 1)?)))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
