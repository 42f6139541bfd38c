use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// What to do with a date string we cannot read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnparseableDatePolicy {
    Reject,
    Accept,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecencyWindow {
    pub max_age_days: u32,
    pub on_unparseable_date: UnparseableDatePolicy,
}

impl RecencyWindow {
    pub fn new(max_age_days: u32, on_unparseable_date: UnparseableDatePolicy) -> Self {
        Self {
            max_age_days,
            on_unparseable_date,
        }
    }

    fn accepts_unparseable(&self) -> bool {
        self.on_unparseable_date == UnparseableDatePolicy::Accept
    }
}

impl Default for RecencyWindow {
    fn default() -> Self {
        Self::new(14, UnparseableDatePolicy::Reject)
    }
}

fn relative_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(\d+)\s+(minute|hour|day|week)s?\s+ago\b")
            .expect("relative date regex must compile")
    })
}

fn absolute_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b([a-z]{3,9})\.?\s+(\d{1,2}),\s*(\d{4})\b")
            .expect("absolute date regex must compile")
    })
}

/// Decides whether free-text timestamps fall inside a recency window,
/// relative to the "now" captured at construction.
#[derive(Debug, Clone, Copy)]
pub struct RecencyEvaluator {
    now: NaiveDateTime,
}

impl Default for RecencyEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl RecencyEvaluator {
    pub fn new() -> Self {
        Self::at(Local::now().naive_local())
    }

    pub fn at(now: NaiveDateTime) -> Self {
        Self { now }
    }

    pub fn now(&self) -> NaiveDateTime {
        self.now
    }

    pub fn is_recent(&self, date_text: Option<&str>, window: &RecencyWindow) -> bool {
        let text = match date_text.map(str::trim) {
            Some(text) if !text.is_empty() => text.to_lowercase(),
            _ => return window.accepts_unparseable(),
        };

        if let Some(recent) = Self::check_relative(&text, window) {
            return recent;
        }

        if let Some(date) = Self::parse_absolute(&text) {
            let published = date.and_time(NaiveTime::MIN);
            if published > self.now {
                tracing::debug!(date_text = %text, "rejecting future date");
                return false;
            }
            return self.now - published <= Duration::days(i64::from(window.max_age_days));
        }

        tracing::trace!(date_text = %text, "unrecognised date text");
        window.accepts_unparseable()
    }

    /// "5 hours ago", "2 weeks ago"
    fn check_relative(text: &str, window: &RecencyWindow) -> Option<bool> {
        let caps = relative_re().captures(text)?;
        // Too many digits for a u64 is still a very old date
        let quantity: u64 = caps[1].parse().unwrap_or(u64::MAX);
        let max_days = u64::from(window.max_age_days);

        let recent = match &caps[2] {
            "minute" | "hour" => true,
            "day" => quantity <= max_days,
            "week" => quantity.saturating_mul(7) <= max_days,
            _ => return None,
        };
        Some(recent)
    }

    /// "Jan 5, 2026" or "January 5, 2026", anywhere in the text
    fn parse_absolute(text: &str) -> Option<NaiveDate> {
        absolute_re().captures_iter(text).find_map(|caps| {
            let normalized = format!("{} {}, {}", &caps[1], &caps[2], &caps[3]);
            ["%b %d, %Y", "%B %d, %Y"]
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(&normalized, fmt).ok())
        })
    }
}
