use crate::model::Contest;
use crate::store::{
    NotificationContest, NotificationStore, PendingNotification, ReminderStore, StoreError,
};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use std::sync::Arc;

pub fn notification_id(contest: &Contest, minutes_before: u32) -> String {
    format!("{}#{}", contest.id, minutes_before)
}

/// Automatic "contest starts soon" notifications.
pub struct Scheduler {
    notifications: Arc<dyn NotificationStore>,
    reminders: Arc<dyn ReminderStore>,
}

impl Scheduler {
    pub fn new(
        notifications: Arc<dyn NotificationStore>,
        reminders: Arc<dyn ReminderStore>,
    ) -> Self {
        Self {
            notifications,
            reminders,
        }
    }

    /// The notifications `schedule_automatic` would add, given what is already pending.
    pub fn plan(
        contests: &[Contest],
        lead_times: &[u32],
        pending_ids: &HashSet<String>,
        now: DateTime<Utc>,
    ) -> Vec<PendingNotification> {
        let mut planned = Vec::new();
        for contest in contests {
            let (start, end) = match (contest.start, contest.end) {
                (Some(start), Some(end)) if now < start => (start, end),
                _ => continue,
            };

            for minutes in lead_times {
                let id = notification_id(contest, *minutes);
                let trigger_at = start - Duration::minutes(i64::from(*minutes));
                if trigger_at <= now || pending_ids.contains(&id) {
                    continue;
                }

                planned.push(PendingNotification {
                    id,
                    title: contest.name.clone(),
                    body: format!(
                        "{} starts in {} minutes ({})",
                        contest.site,
                        minutes,
                        start.format("%Y-%m-%d %H:%M UTC")
                    ),
                    trigger_at,
                    contest: Some(NotificationContest {
                        name: contest.name.clone(),
                        site: contest.site.clone(),
                        start,
                        end,
                    }),
                });
            }
        }
        planned
    }

    /// Schedule a notification `lead_times` minutes before every upcoming contest.
    ///
    /// Does nothing without notification permission. Returns how many were scheduled.
    pub async fn schedule_automatic(
        &self,
        contests: &[Contest],
        lead_times: &[u32],
        now: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        if !self.notifications.authorization_status().await.is_granted() {
            tracing::warn!("notification permission is not granted; skip automatic notifications.");
            return Ok(0);
        }

        let pending_ids: HashSet<String> = self
            .notifications
            .pending_notifications()
            .await?
            .into_iter()
            .map(|notification| notification.id)
            .collect();

        let mut scheduled = 0;
        for notification in Self::plan(contests, lead_times, &pending_ids, now) {
            let id = notification.id.clone();
            let contest_id = id.rsplit_once('#').map(|(contest_id, _)| contest_id.to_string());
            match self.notifications.schedule_notification(notification).await {
                Ok(()) => {
                    tracing::info!("notification {} scheduled.", id);
                    scheduled += 1;
                    if let Some(contest_id) = contest_id {
                        if let Err(e) = self.reminders.set_reminder(&contest_id).await {
                            tracing::warn!("failed to mark reminder of {}: {:?}", contest_id, e);
                        }
                    }
                }
                Err(e) => tracing::error!("failed to schedule notification {}: {:?}", id, e),
            }
        }

        Ok(scheduled)
    }
}
