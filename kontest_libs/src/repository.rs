use crate::aggregator::{Aggregator, SourceFailure};
use crate::model::Contest;
use crate::store::{CalendarAuthorization, CalendarEvent, CalendarStore, ReminderStore};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// The outcome of one fetch cycle, ready to be published to a feed.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Contests that have not ended, sorted by start.
    pub contests: Vec<Contest>,
    pub failures: Vec<SourceFailure>,
    pub fetched_at: Option<DateTime<Utc>>,
}

/// Turns raw listings into contests with their reminder and calendar state joined in.
pub struct ContestRepository {
    aggregator: Aggregator,
    calendar: Arc<dyn CalendarStore>,
    reminders: Arc<dyn ReminderStore>,
}

impl ContestRepository {
    pub fn new(
        aggregator: Aggregator,
        calendar: Arc<dyn CalendarStore>,
        reminders: Arc<dyn ReminderStore>,
    ) -> Self {
        Self {
            aggregator,
            calendar,
            reminders,
        }
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    async fn calendar_events(&self, fetch_calendar_events: bool) -> Vec<CalendarEvent> {
        if !fetch_calendar_events {
            return Vec::new();
        }
        if self.calendar.authorization_status().await != CalendarAuthorization::FullAccess {
            tracing::warn!("calendar access is not granted; contests are not linked to events.");
            return Vec::new();
        }

        match self.calendar.all_events().await {
            Ok(events) => events,
            Err(e) => {
                tracing::error!("failed to read calendar events: {:?}", e);
                Vec::new()
            }
        }
    }

    async fn reminder_set(&self, id: &str) -> bool {
        match self.reminders.is_reminder_set(id).await {
            Ok(set) => set,
            Err(e) => {
                tracing::warn!("failed to read reminder status of {}: {:?}", id, e);
                false
            }
        }
    }

    /// Fetch all sources and build the working set of contests.
    ///
    /// Contests whose duration could not be formatted or whose end is not in the future are
    /// dropped.
    pub async fn fetch(&self, fetch_calendar_events: bool, now: DateTime<Utc>) -> Snapshot {
        let aggregate = self.aggregator.fetch_all().await;
        let events = self.calendar_events(fetch_calendar_events).await;

        let mut contests = Vec::with_capacity(aggregate.records.len());
        for record in aggregate.records {
            let mut contest = Contest::from_record(record, now);
            if contest.duration.is_none() || contest.is_ended(now) {
                tracing::debug!("drop contest {}", contest.id);
                continue;
            }

            contest.reminder_set = self.reminder_set(&contest.id).await;
            contest.link_calendar(&events);
            contests.push(contest);
        }
        contests.sort_by_key(|contest| contest.start);

        tracing::info!("{} contests in the working set.", contests.len());
        Snapshot {
            contests,
            failures: aggregate.failures,
            fetched_at: Some(now),
        }
    }
}
