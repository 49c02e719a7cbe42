use crate::date;
use crate::model::Contest;
use crate::store::{
    CalendarAuthorization, CalendarEvent, CalendarStore, NotificationStore, PendingNotification,
};
use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub cancelled_events: usize,
    pub duplicate_events: usize,
    pub cancelled_notifications: usize,
    pub duplicate_notifications: usize,
    pub failed_removals: usize,
    pub calendar_skipped: bool,
    pub notifications_skipped: bool,
}

impl ReconcileReport {
    pub fn removed(&self) -> usize {
        self.cancelled_events
            + self.duplicate_events
            + self.cancelled_notifications
            + self.duplicate_notifications
    }
}

fn is_listed(contests: &[Contest], title: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    contests
        .iter()
        .any(|contest| contest.matches(title, start, end))
}

/// Future events that no longer correspond to any fetched contest.
pub fn cancelled_events<'a>(
    events: &'a [CalendarEvent],
    contests: &[Contest],
    now: DateTime<Utc>,
) -> Vec<&'a CalendarEvent> {
    events
        .iter()
        .filter(|event| date::is_future(event.start, now))
        .filter(|event| !is_listed(contests, &event.title, event.start, event.end))
        .collect()
}

/// Future notifications scheduled for a contest that is no longer fetched.
///
/// Notifications that carry no contest were not scheduled by us and are left alone.
pub fn cancelled_notifications<'a>(
    notifications: &'a [PendingNotification],
    contests: &[Contest],
    now: DateTime<Utc>,
) -> Vec<&'a PendingNotification> {
    notifications
        .iter()
        .filter(|notification| date::is_future(notification.trigger_at, now))
        .filter(|notification| match &notification.contest {
            Some(contest) => !is_listed(contests, &contest.name, contest.start, contest.end),
            None => false,
        })
        .collect()
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

pub fn event_key(event: &CalendarEvent) -> (String, DateTime<Utc>, DateTime<Utc>) {
    (normalize(&event.title), event.start, event.end)
}

pub fn notification_key(notification: &PendingNotification) -> (String, String, DateTime<Utc>) {
    (
        normalize(&notification.title),
        normalize(&notification.body),
        notification.trigger_at,
    )
}

/// Every entry after the first one sharing its key, in source order.
pub fn duplicates<T, K, F>(items: &[T], key: F) -> Vec<&T>
where
    K: Eq + std::hash::Hash,
    F: Fn(&T) -> K,
{
    let mut seen = HashSet::new();
    items.iter().filter(|item| !seen.insert(key(*item))).collect()
}

/// Removes stale and duplicated entries from the calendar and notification stores.
///
/// Cleanup is best effort: a failed removal is logged and counted, and the loop goes on.
#[derive(Clone)]
pub struct Reconciler {
    calendar: Arc<dyn CalendarStore>,
    notifications: Arc<dyn NotificationStore>,
}

impl Reconciler {
    pub fn new(
        calendar: Arc<dyn CalendarStore>,
        notifications: Arc<dyn NotificationStore>,
    ) -> Self {
        Self {
            calendar,
            notifications,
        }
    }

    pub async fn reconcile(&self, contests: &[Contest], now: DateTime<Utc>) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        if self.calendar.authorization_status().await == CalendarAuthorization::FullAccess {
            self.remove_cancelled_events(contests, now, &mut report).await;
            self.remove_duplicate_events(&mut report).await;
        } else {
            tracing::warn!("calendar access is not granted; skip calendar cleanup.");
            report.calendar_skipped = true;
        }

        if self.notifications.authorization_status().await.is_granted() {
            self.remove_cancelled_notifications(contests, now, &mut report)
                .await;
            self.remove_duplicate_notifications(&mut report).await;
        } else {
            tracing::warn!("notification permission is not granted; skip notification cleanup.");
            report.notifications_skipped = true;
        }

        tracing::info!(
            "reconciliation finished: {} entries removed, {} removals failed.",
            report.removed(),
            report.failed_removals
        );
        report
    }

    async fn kontest_events(&self) -> Option<Vec<CalendarEvent>> {
        match self.calendar.kontest_events().await {
            Ok(events) => Some(events),
            Err(e) => {
                tracing::error!("failed to read calendar events: {:?}", e);
                None
            }
        }
    }

    async fn pending_notifications(&self) -> Option<Vec<PendingNotification>> {
        match self.notifications.pending_notifications().await {
            Ok(pending) => Some(pending),
            Err(e) => {
                tracing::error!("failed to read pending notifications: {:?}", e);
                None
            }
        }
    }

    async fn remove_events(
        &self,
        events: Vec<&CalendarEvent>,
        report: &mut ReconcileReport,
    ) -> usize {
        let mut removed = 0;
        for event in events {
            match self.calendar.remove_event(event).await {
                Ok(()) => {
                    tracing::info!("calendar event {} ({}) removed.", event.id, event.title);
                    removed += 1;
                }
                Err(e) => {
                    tracing::error!("failed to remove calendar event {}: {:?}", event.id, e);
                    report.failed_removals += 1;
                }
            }
        }
        removed
    }

    async fn remove_notifications(
        &self,
        notifications: Vec<&PendingNotification>,
        report: &mut ReconcileReport,
    ) -> usize {
        let mut removed = 0;
        for notification in notifications {
            match self.notifications.remove_notification(&notification.id).await {
                Ok(()) => {
                    tracing::info!("notification {} removed.", notification.id);
                    removed += 1;
                }
                Err(e) => {
                    tracing::error!("failed to remove notification {}: {:?}", notification.id, e);
                    report.failed_removals += 1;
                }
            }
        }
        removed
    }

    pub async fn remove_cancelled_events(
        &self,
        contests: &[Contest],
        now: DateTime<Utc>,
        report: &mut ReconcileReport,
    ) {
        if let Some(events) = self.kontest_events().await {
            let targets = cancelled_events(&events, contests, now);
            let removed = self.remove_events(targets, report).await;
            report.cancelled_events += removed;
        }
    }

    pub async fn remove_duplicate_events(&self, report: &mut ReconcileReport) {
        if let Some(events) = self.kontest_events().await {
            let targets = duplicates(&events, event_key);
            let removed = self.remove_events(targets, report).await;
            report.duplicate_events += removed;
        }
    }

    pub async fn remove_cancelled_notifications(
        &self,
        contests: &[Contest],
        now: DateTime<Utc>,
        report: &mut ReconcileReport,
    ) {
        if let Some(pending) = self.pending_notifications().await {
            let targets = cancelled_notifications(&pending, contests, now);
            let removed = self.remove_notifications(targets, report).await;
            report.cancelled_notifications += removed;
        }
    }

    /// Notifications are removed by id, which takes every entry sharing it. Entries kept for
    /// their key that lose a shared id are scheduled again, so exactly one per key remains.
    pub async fn remove_duplicate_notifications(&self, report: &mut ReconcileReport) {
        let pending = match self.pending_notifications().await {
            Some(pending) => pending,
            None => return,
        };
        let targets = duplicates(&pending, notification_key);

        let ids: Vec<&str> = targets.iter().map(|n| n.id.as_str()).unique().collect();
        for id in ids {
            let extra = targets.iter().filter(|n| n.id == id).count();
            match self.notifications.remove_notification(id).await {
                Ok(()) => {
                    tracing::info!("{} duplicates of notification {} removed.", extra, id);
                    report.duplicate_notifications += extra;
                }
                Err(e) => {
                    tracing::error!("failed to remove notification {}: {:?}", id, e);
                    report.failed_removals += 1;
                    continue;
                }
            }

            let kept = pending
                .iter()
                .filter(|n| n.id == id && !targets.iter().any(|t| std::ptr::eq(*t, *n)));
            for kept in kept {
                if let Err(e) = self.notifications.schedule_notification(kept.clone()).await {
                    tracing::error!("failed to restore notification {}: {:?}", id, e);
                    report.failed_removals += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::test::contest;
    use crate::store::memory::{MemoryCalendarStore, MemoryNotificationStore};
    use crate::store::{NotificationAuthorization, NotificationContest, KONTEST_CALENDAR};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 30, 12, 0, 0).unwrap()
    }

    fn event(id: &str, title: &str, start: DateTime<Utc>, hours: i64) -> CalendarEvent {
        CalendarEvent {
            id: id.to_string(),
            title: title.to_string(),
            notes: Some(String::from("AtCoder")),
            url: None,
            start,
            end: start + Duration::hours(hours),
            alarm: None,
            calendar: KONTEST_CALENDAR.to_string(),
        }
    }

    fn notification(
        id: &str,
        title: &str,
        start: DateTime<Utc>,
        hours: i64,
    ) -> PendingNotification {
        PendingNotification {
            id: id.to_string(),
            title: title.to_string(),
            body: String::from("AtCoder"),
            trigger_at: start - Duration::minutes(10),
            contest: Some(NotificationContest {
                name: title.to_string(),
                site: String::from("AtCoder"),
                start,
                end: start + Duration::hours(hours),
            }),
        }
    }

    fn ids<T, F: Fn(&T) -> &str>(items: &[T], id: F) -> Vec<&str> {
        items.iter().map(id).collect()
    }

    #[test]
    fn test_cancelled_events_keep_listed_and_past() {
        let start = now() + Duration::days(1);
        let contests = vec![contest("ABC 365", "AtCoder", start, 2)];
        let events = vec![
            event("listed", "ABC 365", start, 2),
            event("moved", "ABC 365", start + Duration::hours(1), 2),
            event("renamed", "ABC 365 (rated)", start, 2),
            event("past", "ABC 300", now() - Duration::days(1), 2),
            // Listed under another site note, still the same contest.
            CalendarEvent {
                notes: None,
                ..event("no-notes", "ABC 365", start, 2)
            },
        ];

        let targets: Vec<&str> = cancelled_events(&events, &contests, now())
            .into_iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(targets, vec!["moved", "renamed"]);
    }

    #[test]
    fn test_duplicates_keep_first_occurrence() {
        let start = now() + Duration::days(1);
        let events = vec![
            event("first", "Foo", start, 2),
            event("second", "  foo ", start, 2),
            event("different", "Foo", start, 3),
            event("third", "FOO", start, 2),
        ];

        let targets: Vec<&str> = duplicates(&events, event_key)
            .into_iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(targets, vec!["second", "third"]);
    }

    #[tokio::test]
    async fn test_identical_events_leave_exactly_one() {
        let start = now() + Duration::days(1);
        let contests = vec![contest("Foo", "AtCoder", start, 2)];
        let calendar = Arc::new(MemoryCalendarStore::new(vec![
            event("a", "Foo", start, 2),
            event("b", "Foo", start, 2),
        ]));
        let notifications = Arc::new(MemoryNotificationStore::new(vec![]));
        let reconciler = Reconciler::new(calendar.clone(), notifications);

        let report = reconciler.reconcile(&contests, now()).await;
        assert_eq!(report.duplicate_events, 1);
        assert_eq!(report.cancelled_events, 0);
        assert_eq!(ids(&calendar.events(), |e| e.id.as_str()), vec!["a"]);

        // A second run finds nothing more to do.
        let report = reconciler.reconcile(&contests, now()).await;
        assert_eq!(report.removed(), 0);
        assert_eq!(ids(&calendar.events(), |e| e.id.as_str()), vec!["a"]);
    }

    #[tokio::test]
    async fn test_reconcile_notifications() {
        let start = now() + Duration::days(1);
        let contests = vec![contest("Foo", "AtCoder", start, 2)];
        let foreign = PendingNotification {
            contest: None,
            ..notification("foreign", "Dentist", start, 1)
        };
        let notifications = Arc::new(MemoryNotificationStore::new(vec![
            notification("foo-10", "Foo", start, 2),
            notification("foo-10-copy", "Foo", start, 2),
            notification("bar-10", "Bar", start, 2),
            foreign,
        ]));
        let calendar = Arc::new(MemoryCalendarStore::new(vec![]));
        let reconciler = Reconciler::new(calendar, notifications.clone());

        let report = reconciler.reconcile(&contests, now()).await;
        assert_eq!(report.cancelled_notifications, 1);
        assert_eq!(report.duplicate_notifications, 1);
        assert_eq!(
            ids(&notifications.pending(), |n| n.id.as_str()),
            vec!["foo-10", "foreign"]
        );
    }

    #[tokio::test]
    async fn test_notifications_sharing_an_id_leave_exactly_one() {
        let start = now() + Duration::days(1);
        let unlisted = PendingNotification {
            contest: None,
            ..notification("abc#10", "Foo", start, 2)
        };
        let notifications = Arc::new(MemoryNotificationStore::new(vec![
            unlisted.clone(),
            unlisted.clone(),
            unlisted.clone(),
            notification("other#10", "Bar", start, 2),
        ]));
        let calendar = Arc::new(MemoryCalendarStore::new(vec![]));
        let contests = vec![contest("Bar", "AtCoder", start, 2)];
        let reconciler = Reconciler::new(calendar, notifications.clone());

        let report = reconciler.reconcile(&contests, now()).await;
        assert_eq!(report.duplicate_notifications, 2);
        assert_eq!(report.failed_removals, 0);
        let mut remaining = ids(&notifications.pending(), |n| n.id.as_str())
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>();
        remaining.sort();
        assert_eq!(remaining, vec!["abc#10", "other#10"]);

        // A second run finds nothing more to do.
        let report = reconciler.reconcile(&contests, now()).await;
        assert_eq!(report.removed(), 0);
        assert_eq!(notifications.pending().len(), 2);
    }

    #[tokio::test]
    async fn test_events_sharing_an_id_leave_exactly_one() {
        let start = now() + Duration::days(1);
        let contests = vec![contest("Foo", "AtCoder", start, 2)];
        let calendar = Arc::new(MemoryCalendarStore::new(vec![
            event("a", "Foo", start, 2),
            event("a", "Foo", start, 2),
        ]));
        let notifications = Arc::new(MemoryNotificationStore::new(vec![]));
        let reconciler = Reconciler::new(calendar.clone(), notifications);

        let report = reconciler.reconcile(&contests, now()).await;
        assert_eq!(report.duplicate_events, 1);
        assert_eq!(ids(&calendar.events(), |e| e.id.as_str()), vec!["a"]);

        let report = reconciler.reconcile(&contests, now()).await;
        assert_eq!(report.removed(), 0);
        assert_eq!(calendar.events().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_removal_does_not_stop_cleanup() {
        let start = now() + Duration::days(1);
        let calendar = Arc::new(MemoryCalendarStore::new(vec![
            event("stuck", "Gone 1", start, 2),
            event("gone", "Gone 2", start, 2),
        ]));
        calendar.fail_removal_of("stuck");
        let notifications = Arc::new(MemoryNotificationStore::new(vec![]));
        let reconciler = Reconciler::new(calendar.clone(), notifications);

        let report = reconciler.reconcile(&[], now()).await;
        assert_eq!(report.cancelled_events, 1);
        assert_eq!(report.failed_removals, 1);
        assert_eq!(ids(&calendar.events(), |e| e.id.as_str()), vec!["stuck"]);
    }

    #[tokio::test]
    async fn test_cleanup_skipped_without_permission() {
        let start = now() + Duration::days(1);
        let calendar = Arc::new(MemoryCalendarStore::with_authorization(
            vec![event("gone", "Gone", start, 2)],
            CalendarAuthorization::Denied,
        ));
        let notifications = Arc::new(MemoryNotificationStore::with_authorization(
            vec![notification("gone", "Gone", start, 2)],
            NotificationAuthorization::Denied,
        ));
        let reconciler = Reconciler::new(calendar.clone(), notifications.clone());

        let report = reconciler.reconcile(&[], now()).await;
        assert!(report.calendar_skipped);
        assert!(report.notifications_skipped);
        assert_eq!(report.removed(), 0);
        assert_eq!(calendar.events().len(), 1);
        assert_eq!(notifications.pending().len(), 1);
    }
}
