pub mod list;
pub mod prefs;
pub mod reconcile;
pub mod remind;
pub mod watch;

use crate::modules::{
    config::Config,
    stores::{JsonCalendarStore, JsonNotificationStore, JsonPreferencesStore, JsonReminderStore},
};
use anyhow::Result;
use chrono::Local;
use itertools::Itertools;
use kontest_libs::{
    Aggregator, Categories, ContestRepository, Feed, FeedDependencies, FeedWarning, SystemClock,
};
use std::sync::Arc;

/// Wire the file stores and HTTP sources of `config` into a feed.
pub fn build_feed(config: &Config) -> Result<Feed> {
    let sources = config.build_sources()?;
    let calendar = Arc::new(JsonCalendarStore::new(&config.data_dir));
    let notifications = Arc::new(JsonNotificationStore::new(&config.data_dir));
    let reminders = Arc::new(JsonReminderStore::new(&config.data_dir));
    let preferences = Arc::new(JsonPreferencesStore::new(&config.data_dir));

    let repository = Arc::new(ContestRepository::new(
        Aggregator::new(sources),
        calendar.clone(),
        reminders.clone(),
    ));
    tracing::info!(
        "contests will be fetched from {}",
        repository.aggregator().source_names().join(", ")
    );

    Ok(Feed::new(FeedDependencies {
        repository,
        calendar,
        notifications,
        reminders,
        preferences,
        clock: Arc::new(SystemClock),
    }))
}

pub fn render_categories(categories: &Categories) -> String {
    let mut lines = Vec::new();
    for (label, contests) in categories.iter().filter(|(_, c)| !c.is_empty()) {
        lines.push(format!("{} ({})", label, contests.len()));
        for contest in contests {
            let when = match (contest.start, contest.end) {
                (Some(start), Some(end)) => format!(
                    "{} - {}",
                    start.with_timezone(&Local).format("%m/%d %H:%M"),
                    end.with_timezone(&Local).format("%m/%d %H:%M")
                ),
                _ => String::from("unknown"),
            };
            let flags = [
                (contest.reminder_set, "reminder"),
                (contest.is_calendar_linked(), "calendar"),
            ]
            .iter()
            .filter(|(set, _)| *set)
            .map(|(_, flag)| *flag)
            .join(",");

            lines.push(format!(
                "  [{}] {}  {}  {}{}",
                contest.site,
                contest.name,
                when,
                contest.duration.as_deref().unwrap_or_default(),
                if flags.is_empty() {
                    String::new()
                } else {
                    format!("  ({})", flags)
                }
            ));
        }
    }

    if lines.is_empty() {
        lines.push(String::from("No contests."));
    }
    lines.join("\n")
}

pub fn report_feed_problems(feed: &Feed) {
    for failure in feed.failures() {
        eprintln!("source {} failed: {}", failure.source, failure.reason);
    }
    for warning in feed.warnings() {
        match warning {
            FeedWarning::NotificationPermissionDenied { pending } => eprintln!(
                "{} notifications are pending but notification permission is denied.",
                pending
            ),
        }
    }
}
