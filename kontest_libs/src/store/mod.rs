//! Contracts of the external stores the feed reads from and cleans up.
//!
//! The stores are the source of truth for "has a reminder" and "is in my calendar"; contests
//! re-derive those flags from them on every fetch.
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access store file")]
    IoError(#[from] std::io::Error),
    #[error("failed to (de)serialize store content")]
    SerdeError(#[from] serde_json::Error),
    #[error("access to {0} is not granted")]
    PermissionDeniedError(String),
    #[error("entry {0} not found")]
    NotFoundError(String),
    #[error("{0}")]
    UnexpectedError(String),
}

/// Name of the calendar the application writes its own events into.
pub const KONTEST_CALENDAR: &str = "Kontest";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// When the user asked to be alerted; `None` means at the start.
    #[serde(default)]
    pub alarm: Option<DateTime<Utc>>,
    pub calendar: String,
}

/// Where `event` sits in `events`: its last exact copy, else the last entry with its id.
pub fn position_of(events: &[CalendarEvent], event: &CalendarEvent) -> Option<usize> {
    events
        .iter()
        .rposition(|e| e == event)
        .or_else(|| events.iter().rposition(|e| e.id == event.id))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalendarAuthorization {
    NotDetermined,
    FullAccess,
    Denied,
}

#[async_trait]
pub trait CalendarStore: Send + Sync {
    async fn authorization_status(&self) -> CalendarAuthorization;
    /// Every event in every calendar.
    async fn all_events(&self) -> Result<Vec<CalendarEvent>>;
    /// Events created by this application.
    async fn kontest_events(&self) -> Result<Vec<CalendarEvent>>;
    async fn remove_event(&self, event: &CalendarEvent) -> Result<()>;
}

/// The contest a notification was scheduled for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationContest {
    pub name: String,
    pub site: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingNotification {
    pub id: String,
    pub title: String,
    pub body: String,
    pub trigger_at: DateTime<Utc>,
    /// Absent for notifications this application did not schedule.
    #[serde(default)]
    pub contest: Option<NotificationContest>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationAuthorization {
    NotDetermined,
    Authorized,
    Provisional,
    Denied,
}

impl NotificationAuthorization {
    pub fn is_granted(&self) -> bool {
        matches!(
            self,
            NotificationAuthorization::Authorized | NotificationAuthorization::Provisional
        )
    }
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn authorization_status(&self) -> NotificationAuthorization;
    async fn pending_notifications(&self) -> Result<Vec<PendingNotification>>;
    async fn remove_notification(&self, id: &str) -> Result<()>;
    async fn schedule_notification(&self, notification: PendingNotification) -> Result<()>;
}

/// Per-contest "a reminder was set" flags, keyed by contest id.
#[async_trait]
pub trait ReminderStore: Send + Sync {
    async fn is_reminder_set(&self, id: &str) -> Result<bool>;
    async fn set_reminder(&self, id: &str) -> Result<()>;
    async fn clear_reminder(&self, id: &str) -> Result<()>;
}
