//! In-process stores, handy for tests and dry runs.
use super::*;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

fn locked<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

#[derive(Debug)]
pub struct MemoryCalendarStore {
    authorization: CalendarAuthorization,
    events: Mutex<Vec<CalendarEvent>>,
    failing: Mutex<HashSet<String>>,
}

impl MemoryCalendarStore {
    pub fn new(events: Vec<CalendarEvent>) -> Self {
        Self::with_authorization(events, CalendarAuthorization::FullAccess)
    }

    pub fn with_authorization(
        events: Vec<CalendarEvent>,
        authorization: CalendarAuthorization,
    ) -> Self {
        Self {
            authorization,
            events: Mutex::new(events),
            failing: Mutex::new(HashSet::new()),
        }
    }

    /// Make every removal of the event with this id fail.
    pub fn fail_removal_of(&self, id: &str) {
        locked(&self.failing).insert(id.to_string());
    }

    pub fn events(&self) -> Vec<CalendarEvent> {
        locked(&self.events).clone()
    }
}

#[async_trait]
impl CalendarStore for MemoryCalendarStore {
    async fn authorization_status(&self) -> CalendarAuthorization {
        self.authorization
    }

    async fn all_events(&self) -> Result<Vec<CalendarEvent>> {
        if self.authorization != CalendarAuthorization::FullAccess {
            return Err(StoreError::PermissionDeniedError(String::from("calendar")));
        }
        Ok(self.events())
    }

    async fn kontest_events(&self) -> Result<Vec<CalendarEvent>> {
        Ok(self
            .all_events()
            .await?
            .into_iter()
            .filter(|event| event.calendar == KONTEST_CALENDAR)
            .collect())
    }

    async fn remove_event(&self, event: &CalendarEvent) -> Result<()> {
        if locked(&self.failing).contains(&event.id) {
            return Err(StoreError::UnexpectedError(format!(
                "refusing to remove {}",
                event.id
            )));
        }

        let mut events = locked(&self.events);
        match position_of(&events, event) {
            Some(index) => {
                events.remove(index);
                Ok(())
            }
            None => Err(StoreError::NotFoundError(event.id.clone())),
        }
    }
}

#[derive(Debug)]
pub struct MemoryNotificationStore {
    authorization: NotificationAuthorization,
    pending: Mutex<Vec<PendingNotification>>,
}

impl MemoryNotificationStore {
    pub fn new(pending: Vec<PendingNotification>) -> Self {
        Self::with_authorization(pending, NotificationAuthorization::Authorized)
    }

    pub fn with_authorization(
        pending: Vec<PendingNotification>,
        authorization: NotificationAuthorization,
    ) -> Self {
        Self {
            authorization,
            pending: Mutex::new(pending),
        }
    }

    pub fn pending(&self) -> Vec<PendingNotification> {
        locked(&self.pending).clone()
    }
}

#[async_trait]
impl NotificationStore for MemoryNotificationStore {
    async fn authorization_status(&self) -> NotificationAuthorization {
        self.authorization
    }

    async fn pending_notifications(&self) -> Result<Vec<PendingNotification>> {
        Ok(self.pending())
    }

    /// Removes every pending notification with this id.
    async fn remove_notification(&self, id: &str) -> Result<()> {
        locked(&self.pending).retain(|notification| notification.id != id);
        Ok(())
    }

    async fn schedule_notification(&self, notification: PendingNotification) -> Result<()> {
        if !self.authorization.is_granted() {
            return Err(StoreError::PermissionDeniedError(String::from(
                "notifications",
            )));
        }
        locked(&self.pending).push(notification);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryReminderStore {
    reminders: Mutex<HashMap<String, bool>>,
}

impl MemoryReminderStore {
    pub fn new<I: IntoIterator<Item = String>>(ids: I) -> Self {
        Self {
            reminders: Mutex::new(ids.into_iter().map(|id| (id, true)).collect()),
        }
    }
}

#[async_trait]
impl ReminderStore for MemoryReminderStore {
    async fn is_reminder_set(&self, id: &str) -> Result<bool> {
        Ok(locked(&self.reminders).get(id).copied().unwrap_or(false))
    }

    async fn set_reminder(&self, id: &str) -> Result<()> {
        locked(&self.reminders).insert(id.to_string(), true);
        Ok(())
    }

    async fn clear_reminder(&self, id: &str) -> Result<()> {
        locked(&self.reminders).remove(id);
        Ok(())
    }
}
