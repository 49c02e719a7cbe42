use super::{locked, read_json, write_json, Result};
use async_trait::async_trait;
use kontest_libs::ReminderStore;
use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
    sync::Mutex,
};

/// Ids of contests with a reminder, kept in `reminders.json`.
pub struct JsonReminderStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonReminderStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join("reminders.json"),
            lock: Mutex::new(()),
        }
    }

    fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeSet<String>) -> bool,
    {
        let _guard = locked(&self.lock);
        let mut ids: BTreeSet<String> = read_json(&self.path)?;
        if f(&mut ids) {
            write_json(&self.path, &ids)?;
        }
        Ok(())
    }
}

#[async_trait]
impl ReminderStore for JsonReminderStore {
    async fn is_reminder_set(&self, id: &str) -> Result<bool> {
        let _guard = locked(&self.lock);
        let ids: BTreeSet<String> = read_json(&self.path)?;
        Ok(ids.contains(id))
    }

    async fn set_reminder(&self, id: &str) -> Result<()> {
        self.update(|ids| ids.insert(id.to_string()))
    }

    async fn clear_reminder(&self, id: &str) -> Result<()> {
        self.update(|ids| ids.remove(id))
    }
}
