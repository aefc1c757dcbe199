//! Calendar events as read from the provider, and the policy that decides
//! which of them count as busy time.
//!
//! Events use Google-style `start`/`end` objects: all-day events carry a
//! `date`, timed events a `dateTime`.
//!
//! Filtering rules, first match wins:
//!
//! 1. Title mentions "out of office" (or another OOO keyword) → busy.
//! 2. Title is a working-location declaration ("Home", "Office") → ignored.
//! 3. All-day event → busy only if the title names a holiday or leave.
//! 4. Timed event → busy only if accepted, or if the recruiter organizes it.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use slot_engine::schedule::day_start;
use slot_engine::BusyInterval;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResponseStatus {
    Accepted,
    Tentative,
    Declined,
    NeedsAction,
}

/// Either an all-day `date` or a timed `dateTime`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<DateTime<Utc>>,
}

impl EventTime {
    pub fn all_day(date: NaiveDate) -> Self {
        Self {
            date: Some(date),
            date_time: None,
        }
    }

    pub fn timed(date_time: DateTime<Utc>) -> Self {
        Self {
            date: None,
            date_time: Some(date_time),
        }
    }

    /// The instant this boundary denotes. All-day dates resolve to the start of the local day.
    pub fn resolve(&self, tz: Tz) -> Option<DateTime<Utc>> {
        match (self.date_time, self.date) {
            (Some(instant), _) => Some(instant),
            (None, Some(date)) => day_start(date, tz),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub start: EventTime,
    pub end: EventTime,
    /// The calendar owner organizes this event.
    #[serde(default)]
    pub organizer_self: bool,
    /// The calendar owner's own attendance response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_status: Option<ResponseStatus>,
}

impl CalendarEvent {
    pub fn is_all_day(&self) -> bool {
        self.start.date_time.is_none() && self.start.date.is_some()
    }

    /// Convert to a busy interval, or `None` if the times are missing,
    /// unresolvable, or inverted.
    pub fn to_busy_interval(&self, tz: Tz) -> Option<BusyInterval> {
        let start = self.start.resolve(tz)?;
        let end = match self.end.resolve(tz) {
            Some(end) => end,
            // An all-day event without an end covers its start date only.
            None if self.is_all_day() => {
                let next = self.start.date?.succ_opt()?;
                day_start(next, tz)?
            }
            None => return None,
        };
        if end <= start {
            return None;
        }
        Some(BusyInterval {
            id: self.id.clone(),
            title: self.title.clone(),
            start,
            end,
        })
    }
}

/// Keyword sets for the busy-time policy. Matching is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CalendarFilter {
    /// Keywords marking an out-of-office event.
    pub out_of_office_keywords: Vec<String>,
    /// Exact titles of working-location declarations.
    pub working_location_titles: Vec<String>,
    /// Keywords that make an all-day event count as time off.
    pub holiday_keywords: Vec<String>,
}

impl Default for CalendarFilter {
    fn default() -> Self {
        let owned = |words: &[&str]| -> Vec<String> { words.iter().map(|w| w.to_string()).collect() };
        Self {
            out_of_office_keywords: owned(&["out of office", "ooo"]),
            working_location_titles: owned(&["home", "office", "working location"]),
            holiday_keywords: owned(&[
                "holiday",
                "vacation",
                "leave",
                "pto",
                "day off",
                "sick",
                "out of office",
            ]),
        }
    }
}

/// Lowercased alphanumeric words of `text`.
fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Whether any keyword appears in `title` as a run of whole words, so "ooo"
/// does not match "Zoo tour" and "day off" does not match "Friday offsite".
fn mentions(title: &[String], keywords: &[String]) -> bool {
    keywords.iter().any(|keyword| {
        let keyword = words(keyword);
        !keyword.is_empty() && title.windows(keyword.len()).any(|run| run == keyword.as_slice())
    })
}

impl CalendarFilter {
    /// Whether this event makes the calendar owner unavailable.
    pub fn is_busy(&self, event: &CalendarEvent) -> bool {
        let title = event.title.trim().to_lowercase();
        let title_words = words(&title);

        if mentions(&title_words, &self.out_of_office_keywords) {
            return true;
        }
        if self
            .working_location_titles
            .iter()
            .any(|t| t.trim().eq_ignore_ascii_case(&title))
        {
            return false;
        }
        if event.is_all_day() {
            return mentions(&title_words, &self.holiday_keywords);
        }
        event.organizer_self || event.response_status == Some(ResponseStatus::Accepted)
    }

    /// Apply the policy and convert survivors to busy intervals.
    pub fn busy_intervals<'a>(
        &self,
        events: impl IntoIterator<Item = &'a CalendarEvent>,
        tz: Tz,
    ) -> Vec<BusyInterval> {
        events
            .into_iter()
            .filter(|event| self.is_busy(event))
            .filter_map(|event| event.to_busy_interval(tz))
            .collect()
    }
}
