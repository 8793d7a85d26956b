//! Freshness parsing: how many hours ago was a posting published.

use chrono::{DateTime, NaiveDate, Utc};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref MINUTES: Regex = Regex::new(r"(\d+)\s*(minutos|minuto|minutes|minute|min)").unwrap();
    static ref HOURS: Regex = Regex::new(r"(\d+)\s*(horas|hora|hours|hour)").unwrap();
    static ref DAYS: Regex = Regex::new(r"(\d+)\s*(días|día|dias|dia|days|day)").unwrap();
}

const JUST_NOW: &[&str] = &[
    "just now", "ahora", "recién", "recien", "nuevo", "new", "hoy", "today",
];

const YESTERDAY: &[&str] = &["ayer", "yesterday"];

type Rule = fn(&str) -> Option<u32>;

/// Evaluated in order; the first rule that matches decides.
const RULES: &[Rule] = &[just_now, yesterday, minutes, hours, days];

/// Parse relative freshness text ("hace 2 días", "ayer", "3 hours ago").
///
/// Returns hours since posting, or `None` when nothing recognizable is found.
pub fn parse_relative_age(text: &str) -> Option<u32> {
    if text.trim().is_empty() {
        return None;
    }
    let lowered = text.to_lowercase();
    RULES.iter().find_map(|rule| rule(&lowered))
}

/// Hours between an absolute posting date (`2024-05-01` or RFC 3339) and `now`.
pub fn hours_since_date(text: &str, now: DateTime<Utc>) -> Option<u32> {
    let text = text.trim();
    let posted = DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        })?;

    let hours = (now - posted).num_hours();
    u32::try_from(hours.max(0)).ok()
}

/// Relative phrasing first, then absolute dates as structured data carries them.
pub fn parse_posted(text: &str, now: DateTime<Utc>) -> Option<u32> {
    parse_relative_age(text).or_else(|| hours_since_date(text, now))
}

fn just_now(text: &str) -> Option<u32> {
    JUST_NOW.iter().any(|token| text.contains(token)).then_some(0)
}

fn yesterday(text: &str) -> Option<u32> {
    YESTERDAY.iter().any(|token| text.contains(token)).then_some(24)
}

fn minutes(text: &str) -> Option<u32> {
    MINUTES.is_match(text).then_some(0)
}

fn hours(text: &str) -> Option<u32> {
    leading_number(&HOURS, text)
}

fn days(text: &str) -> Option<u32> {
    leading_number(&DAYS, text).and_then(|days| days.checked_mul(24))
}

fn leading_number(pattern: &Regex, text: &str) -> Option<u32> {
    pattern
        .captures(text)
        .and_then(|cap| cap.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
