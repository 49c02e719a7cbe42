use super::{locked, read_json, write_json, Result};
use async_trait::async_trait;
use kontest_libs::store::{position_of, CalendarAuthorization, CalendarEvent, KONTEST_CALENDAR};
use kontest_libs::{CalendarStore, StoreError};
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CalendarFile {
    #[serde(default = "default_authorization")]
    authorization: CalendarAuthorization,
    #[serde(default)]
    events: Vec<CalendarEvent>,
}

fn default_authorization() -> CalendarAuthorization {
    CalendarAuthorization::FullAccess
}

impl Default for CalendarFile {
    fn default() -> Self {
        Self {
            authorization: default_authorization(),
            events: Vec::new(),
        }
    }
}

/// Calendar events kept in `calendar.json`.
pub struct JsonCalendarStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonCalendarStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join("calendar.json"),
            lock: Mutex::new(()),
        }
    }

    fn read(&self) -> Result<CalendarFile> {
        let _guard = locked(&self.lock);
        read_json(&self.path)
    }
}

#[async_trait]
impl CalendarStore for JsonCalendarStore {
    async fn authorization_status(&self) -> CalendarAuthorization {
        match self.read() {
            Ok(file) => file.authorization,
            Err(e) => {
                tracing::error!("failed to read {}: {:?}", self.path.display(), e);
                CalendarAuthorization::NotDetermined
            }
        }
    }

    async fn all_events(&self) -> Result<Vec<CalendarEvent>> {
        let file = self.read()?;
        if file.authorization != CalendarAuthorization::FullAccess {
            return Err(StoreError::PermissionDeniedError(String::from("calendar")));
        }
        Ok(file.events)
    }

    async fn kontest_events(&self) -> Result<Vec<CalendarEvent>> {
        let events = self.all_events().await?;
        Ok(events
            .into_iter()
            .filter(|event| event.calendar == KONTEST_CALENDAR)
            .collect())
    }

    async fn remove_event(&self, event: &CalendarEvent) -> Result<()> {
        let _guard = locked(&self.lock);
        let mut file: CalendarFile = read_json(&self.path)?;

        match position_of(&file.events, event) {
            Some(index) => {
                file.events.remove(index);
                write_json(&self.path, &file)
            }
            None => Err(StoreError::NotFoundError(event.id.clone())),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::modules::stores::test::temp_dir;
    use chrono::{Duration, TimeZone, Utc};

    fn event(id: &str, calendar: &str) -> CalendarEvent {
        let start = Utc.with_ymd_and_hms(2024, 7, 30, 18, 30, 0).unwrap();
        CalendarEvent {
            id: id.to_string(),
            title: String::from("Codeforces Round 960"),
            notes: Some(String::from("CodeForces")),
            url: None,
            start,
            end: start + Duration::hours(2),
            alarm: None,
            calendar: calendar.to_string(),
        }
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_with_access() {
        let store = JsonCalendarStore::new(&temp_dir("calendar-missing"));
        assert_eq!(
            store.authorization_status().await,
            CalendarAuthorization::FullAccess
        );
        assert!(store.all_events().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_event() {
        let dir = temp_dir("calendar-remove");
        let file = CalendarFile {
            authorization: CalendarAuthorization::FullAccess,
            events: vec![event("1", KONTEST_CALENDAR), event("2", "Work")],
        };
        write_json(&dir.join("calendar.json"), &file).unwrap();
        let store = JsonCalendarStore::new(&dir);

        assert_eq!(store.kontest_events().await.unwrap().len(), 1);
        store.remove_event(&event("1", KONTEST_CALENDAR)).await.unwrap();
        assert!(store.kontest_events().await.unwrap().is_empty());
        assert_eq!(store.all_events().await.unwrap().len(), 1);

        assert!(matches!(
            store.remove_event(&event("1", KONTEST_CALENDAR)).await,
            Err(StoreError::NotFoundError(_))
        ));
    }

    #[tokio::test]
    async fn test_remove_event_takes_one_copy() {
        let dir = temp_dir("calendar-copies");
        let file = CalendarFile {
            authorization: CalendarAuthorization::FullAccess,
            events: vec![event("1", KONTEST_CALENDAR), event("1", KONTEST_CALENDAR)],
        };
        write_json(&dir.join("calendar.json"), &file).unwrap();
        let store = JsonCalendarStore::new(&dir);

        store.remove_event(&event("1", KONTEST_CALENDAR)).await.unwrap();
        assert_eq!(store.all_events().await.unwrap(), vec![event("1", KONTEST_CALENDAR)]);
    }

    #[tokio::test]
    async fn test_denied_access() {
        let dir = temp_dir("calendar-denied");
        let file = CalendarFile {
            authorization: CalendarAuthorization::Denied,
            events: vec![event("1", KONTEST_CALENDAR)],
        };
        write_json(&dir.join("calendar.json"), &file).unwrap();
        let store = JsonCalendarStore::new(&dir);

        assert_eq!(store.authorization_status().await, CalendarAuthorization::Denied);
        assert!(matches!(
            store.all_events().await,
            Err(StoreError::PermissionDeniedError(_))
        ));
    }
}
