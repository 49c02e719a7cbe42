//! JSON-file backed implementations of the store contracts.
//!
//! Every store keeps one file under the data directory. A missing file reads as the default
//! content; writes go to a `.tmp` sibling first and are renamed into place.
pub mod calendar;
pub mod notification;
pub mod preferences;
pub mod reminder;

pub use calendar::JsonCalendarStore;
pub use notification::JsonNotificationStore;
pub use preferences::JsonPreferencesStore;
pub use reminder::JsonReminderStore;

use kontest_libs::StoreError;
use serde::{de::DeserializeOwned, Serialize};
use std::{
    fs,
    path::Path,
    sync::{Mutex, MutexGuard},
};

type Result<T> = std::result::Result<T, StoreError>;

pub(crate) fn read_json<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        return Ok(T::default());
    }

    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(T::default());
    }
    let value = serde_json::from_str(&content)?;
    Ok(value)
}

pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            tracing::info!("create data directory {}", dir.display());
            fs::create_dir_all(dir)?;
        }
    }

    let json = serde_json::to_string_pretty(value)?;
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, json)?;
    fs::rename(tmp_path, path)?;
    Ok(())
}

/// Serializes read-modify-write cycles on one file within this process.
pub(crate) fn locked(mutex: &Mutex<()>) -> MutexGuard<'_, ()> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
