//! Date parsing for profile timelines and relative "time ago" labels.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use regex::Regex;

use crate::models::PRESENT;

/// A whole duration token: `"3 yrs"`, `"1 yr 2 mos"`, `"11 mos"`.
static DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:(\d+)\s*yrs?)?\s*(?:(\d+)\s*mos?)?$").expect("valid duration regex")
});

/// First `<amount><unit>` pair of a relative label, e.g. `"3d"` or `"5 hours"`.
static TIME_AGO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*([a-z]+)").expect("valid time-ago regex"));

/// Start and end of a position as displayed on the profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateSpan {
    pub start: Option<String>,
    /// Always set; `"Present"` when no explicit end boundary was found.
    pub end: String,
}

impl DateSpan {
    fn open(start: Option<String>) -> Self {
        Self {
            start,
            end: PRESENT.to_string(),
        }
    }
}

/// Parse a timeline line such as `"Jan 2020 - Mar 2022 · 2 yrs 3 mos"`,
/// `"Jan 2020 · 1 mo"` or a bare duration like `"3 yrs 2 mos"`.
///
/// A bare duration is back-computed from `today` as `years * 365 + months * 30`
/// days and formatted `"%b %Y"`. A duration too large to subtract leaves the
/// start absent.
pub fn parse_date_range(line: &str, today: NaiveDate) -> DateSpan {
    let segments: Vec<&str> = line
        .split(" · ")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    if let Some((start, end)) = segments.iter().find_map(|s| s.split_once(" -")) {
        let start = Some(start.trim()).filter(|s| !s.is_empty()).map(str::to_string);
        let end = Some(end.trim()).filter(|s| !s.is_empty()).unwrap_or(PRESENT);
        return DateSpan {
            start,
            end: end.to_string(),
        };
    }

    if segments.len() > 1
        && let Some(start) = segments
            .iter()
            .find(|s| s.chars().any(|c| c.is_ascii_digit()) && !is_duration_token(s))
    {
        return DateSpan::open(Some(start.to_string()));
    }

    let start = segments
        .iter()
        .rev()
        .find(|s| is_duration_token(s))
        .and_then(|s| duration_days(s))
        .and_then(|days| days_before(days, today));
    DateSpan::open(start)
}

/// True when `text`, or its last `" · "` segment, is a whole duration token
/// such as `"3 yrs"`, `"1 yr 2 mos"` or `"5 mos"`.
pub fn is_duration(text: &str) -> bool {
    text.rsplit(" · ").next().is_some_and(is_duration_token)
}

fn is_duration_token(text: &str) -> bool {
    DURATION
        .captures(text.trim())
        .is_some_and(|caps| caps.get(1).is_some() || caps.get(2).is_some())
}

/// Length of a duration token in days. `None` when it does not fit an `i64`.
fn duration_days(text: &str) -> Option<i64> {
    let caps = DURATION.captures(text.trim())?;
    let amount = |group: usize| -> Option<i64> {
        caps.get(group).map_or(Some(0), |m| m.as_str().parse().ok())
    };
    amount(1)?
        .checked_mul(365)?
        .checked_add(amount(2)?.checked_mul(30)?)
}

fn days_before(days: i64, today: NaiveDate) -> Option<String> {
    let start = today.checked_sub_signed(TimeDelta::try_days(days)?)?;
    Some(start.format("%b %Y").to_string())
}

/// Resolve a relative label such as `"3d"`, `"2w •"`, `"1mo • Edited"` or
/// `"5 days ago"` against `now`.
///
/// Returns `None` when no recognizable amount and unit are present, or when
/// the amount reaches past the representable calendar.
pub fn parse_time_ago(label: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let lower = label.to_lowercase();
    let cleaned = lower.split('•').next().unwrap_or_default().trim();

    if cleaned.starts_with("now") || cleaned.starts_with("just now") {
        return Some(now);
    }

    let caps = TIME_AGO.captures(cleaned)?;
    let amount: i64 = caps[1].parse().ok()?;

    let delta = match &caps[2] {
        "s" | "sec" | "secs" | "second" | "seconds" => TimeDelta::try_seconds(amount),
        "m" | "min" | "mins" | "minute" | "minutes" => TimeDelta::try_minutes(amount),
        "h" | "hr" | "hrs" | "hour" | "hours" => TimeDelta::try_hours(amount),
        "d" | "day" | "days" => TimeDelta::try_days(amount),
        "w" | "wk" | "wks" | "week" | "weeks" => TimeDelta::try_weeks(amount),
        "mo" | "mos" | "month" | "months" => amount.checked_mul(30).and_then(TimeDelta::try_days),
        "y" | "yr" | "yrs" | "year" | "years" => amount.checked_mul(365).and_then(TimeDelta::try_days),
        _ => None,
    }?;
    now.checked_sub_signed(delta)
}

/// Midnight UTC of the day containing `at`.
pub fn start_of_day(at: DateTime<Utc>) -> DateTime<Utc> {
    at.date_naive().and_time(NaiveTime::MIN).and_utc()
}
