use crate::date::{self, format_duration};
use crate::store::CalendarEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A contest listing as a source reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContestRecord {
    pub name: String,
    pub url: String,
    pub start_time: String,
    pub end_time: String,
    /// Seconds, possibly fractional. Empty when the source does not report it.
    #[serde(default)]
    pub duration: String,
    pub site: String,
    #[serde(default)]
    pub in_24_hours: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContestStatus {
    Upcoming,
    Ongoing,
    Ended,
}

/// The calendar event a contest was found in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarLink {
    pub event_date: DateTime<Utc>,
    pub calendar_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contest {
    pub id: String,
    pub name: String,
    pub site: String,
    pub url: String,
    pub start_time: String,
    pub end_time: String,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub duration_seconds: Option<i64>,
    /// Human readable duration; `None` when the listing runs unreasonably long.
    pub duration: Option<String>,
    pub status: ContestStatus,
    pub reminder_set: bool,
    pub calendar_link: Option<CalendarLink>,
}

impl Contest {
    /// Build a contest from a listing record.
    ///
    /// Reminder and calendar flags start cleared; they are joined in from the stores afterwards.
    pub fn from_record(record: ContestRecord, now: DateTime<Utc>) -> Self {
        let start = date::parse_date(&record.start_time);
        let end = date::parse_date(&record.end_time);

        let duration_seconds = match record.duration.parse::<f64>() {
            Ok(seconds) if seconds.is_finite() => Some(seconds as i64),
            _ => match (start, end) {
                (Some(start), Some(end)) if record.duration.is_empty() => {
                    Some((end - start).num_seconds())
                }
                _ => None,
            },
        };
        let duration = if record.duration.is_empty() {
            format_duration(&duration_seconds.map(|s| s.to_string()).unwrap_or_default())
        } else {
            format_duration(&record.duration)
        };

        let mut contest = Contest {
            id: Self::id_for(&record),
            name: record.name,
            site: record.site,
            url: record.url,
            start_time: record.start_time,
            end_time: record.end_time,
            start,
            end,
            duration_seconds,
            duration,
            status: ContestStatus::Ended,
            reminder_set: false,
            calendar_link: None,
        };
        contest.status = contest.status_at(now);
        contest
    }

    /// Identity of a listing, stable across fetches as long as the source keeps reporting it
    /// the same way.
    pub fn id_for(record: &ContestRecord) -> String {
        format!(
            "{}|{}|{}|{}",
            record.site, record.name, record.start_time, record.end_time
        )
    }

    /// Unparsable dates count as ended.
    pub fn status_at(&self, now: DateTime<Utc>) -> ContestStatus {
        match (self.start, self.end) {
            (Some(_), Some(end)) if date::is_past(end, now) => ContestStatus::Ended,
            (Some(start), Some(end)) if date::is_running(start, end, now) => ContestStatus::Ongoing,
            (Some(_), Some(_)) => ContestStatus::Upcoming,
            _ => ContestStatus::Ended,
        }
    }

    pub fn is_ended(&self, now: DateTime<Utc>) -> bool {
        self.status_at(now) == ContestStatus::Ended
    }

    pub fn is_running(&self, now: DateTime<Utc>) -> bool {
        self.status_at(now) == ContestStatus::Ongoing
    }

    pub fn is_calendar_linked(&self) -> bool {
        self.calendar_link.is_some()
    }

    /// Exact match on title and both instants.
    pub fn matches(&self, title: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.name == title && self.start == Some(start) && self.end == Some(end)
    }

    /// Whether `event` is the calendar entry made for this contest.
    pub fn matches_event(&self, event: &CalendarEvent) -> bool {
        let site = self.site.to_lowercase();
        let mentions_site = event
            .notes
            .as_deref()
            .map_or(false, |notes| notes.to_lowercase().contains(&site));

        mentions_site && self.matches(&event.title, event.start, event.end)
    }

    /// Populate the calendar link from the first matching event, clearing it when none match.
    pub fn link_calendar(&mut self, events: &[CalendarEvent]) {
        self.calendar_link = events
            .iter()
            .find(|event| self.matches_event(event))
            .map(|event| CalendarLink {
                event_date: event.alarm.unwrap_or(event.start),
                calendar_name: event.calendar.clone(),
            });
    }
}
