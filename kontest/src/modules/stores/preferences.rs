use super::{locked, read_json, write_json, Result};
use kontest_libs::{Preferences, PreferencesStore};
use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};

/// User preferences kept in `preferences.json`. Missing keys take their defaults.
pub struct JsonPreferencesStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonPreferencesStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join("preferences.json"),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, preferences: &Preferences) -> Result<()> {
        let _guard = locked(&self.lock);
        write_json(&self.path, preferences)
    }
}

impl PreferencesStore for JsonPreferencesStore {
    fn load(&self) -> Result<Preferences> {
        let _guard = locked(&self.lock);
        read_json(&self.path)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::modules::stores::test::temp_dir;
    use std::fs;

    #[test]
    fn test_missing_file_gives_defaults() {
        let store = JsonPreferencesStore::new(&temp_dir("preferences-missing"));
        assert_eq!(store.load().unwrap(), Preferences::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = temp_dir("preferences-partial");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("preferences.json"),
            r#"{"min_duration_hours": 1, "sites": {"AtCoder": true}}"#,
        )
        .unwrap();

        let preferences = JsonPreferencesStore::new(&dir).load().unwrap();
        assert_eq!(preferences.min_duration_hours, 1);
        assert_eq!(preferences.max_duration_hours, 360);
        assert!(preferences.is_site_allowed("AtCoder"));
        assert!(!preferences.is_site_allowed("CodeForces"));
        assert_eq!(preferences.reminder_lead_times, vec![10]);
    }

    #[test]
    fn test_save_then_load() {
        let store = JsonPreferencesStore::new(&temp_dir("preferences-save"));
        let mut preferences = Preferences::default();
        preferences.set_site_allowed("leetcode", false);
        preferences.max_duration_hours = 5;

        store.save(&preferences).unwrap();
        assert_eq!(store.load().unwrap(), preferences);
    }
}
