use super::{locked, read_json, write_json, Result};
use async_trait::async_trait;
use kontest_libs::store::{NotificationAuthorization, PendingNotification};
use kontest_libs::{NotificationStore, StoreError};
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct NotificationFile {
    #[serde(default = "default_authorization")]
    authorization: NotificationAuthorization,
    #[serde(default)]
    pending: Vec<PendingNotification>,
}

fn default_authorization() -> NotificationAuthorization {
    NotificationAuthorization::Authorized
}

impl Default for NotificationFile {
    fn default() -> Self {
        Self {
            authorization: default_authorization(),
            pending: Vec::new(),
        }
    }
}

/// Pending notifications kept in `notifications.json`.
pub struct JsonNotificationStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonNotificationStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join("notifications.json"),
            lock: Mutex::new(()),
        }
    }

    fn read(&self) -> Result<NotificationFile> {
        let _guard = locked(&self.lock);
        read_json(&self.path)
    }
}

#[async_trait]
impl NotificationStore for JsonNotificationStore {
    async fn authorization_status(&self) -> NotificationAuthorization {
        match self.read() {
            Ok(file) => file.authorization,
            Err(e) => {
                tracing::error!("failed to read {}: {:?}", self.path.display(), e);
                NotificationAuthorization::NotDetermined
            }
        }
    }

    async fn pending_notifications(&self) -> Result<Vec<PendingNotification>> {
        Ok(self.read()?.pending)
    }

    /// Removes every pending notification with this id.
    async fn remove_notification(&self, id: &str) -> Result<()> {
        let _guard = locked(&self.lock);
        let mut file: NotificationFile = read_json(&self.path)?;
        file.pending.retain(|notification| notification.id != id);
        write_json(&self.path, &file)
    }

    async fn schedule_notification(&self, notification: PendingNotification) -> Result<()> {
        let _guard = locked(&self.lock);
        let mut file: NotificationFile = read_json(&self.path)?;
        if !file.authorization.is_granted() {
            return Err(StoreError::PermissionDeniedError(String::from(
                "notifications",
            )));
        }

        file.pending.push(notification);
        write_json(&self.path, &file)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::modules::stores::test::temp_dir;
    use chrono::{TimeZone, Utc};

    fn notification(id: &str) -> PendingNotification {
        PendingNotification {
            id: id.to_string(),
            title: String::from("Weekly Contest 408"),
            body: String::from("LeetCode starts in 10 minutes"),
            trigger_at: Utc.with_ymd_and_hms(2024, 7, 28, 2, 20, 0).unwrap(),
            contest: None,
        }
    }

    #[tokio::test]
    async fn test_schedule_and_remove() {
        let store = JsonNotificationStore::new(&temp_dir("notification-schedule"));

        store.schedule_notification(notification("a")).await.unwrap();
        store.schedule_notification(notification("a")).await.unwrap();
        store.schedule_notification(notification("b")).await.unwrap();
        assert_eq!(store.pending_notifications().await.unwrap().len(), 3);

        store.remove_notification("a").await.unwrap();
        let pending = store.pending_notifications().await.unwrap();
        assert_eq!(pending, vec![notification("b")]);
    }

    #[tokio::test]
    async fn test_schedule_without_permission() {
        let dir = temp_dir("notification-denied");
        let file = NotificationFile {
            authorization: NotificationAuthorization::Denied,
            pending: vec![notification("a")],
        };
        write_json(&dir.join("notifications.json"), &file).unwrap();
        let store = JsonNotificationStore::new(&dir);

        assert_eq!(
            store.authorization_status().await,
            NotificationAuthorization::Denied
        );
        assert!(matches!(
            store.schedule_notification(notification("b")).await,
            Err(StoreError::PermissionDeniedError(_))
        ));
        assert_eq!(store.pending_notifications().await.unwrap().len(), 1);
    }
}
