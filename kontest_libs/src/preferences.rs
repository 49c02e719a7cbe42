use crate::model::Contest;
use crate::site::Site;
use crate::store::StoreError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

fn default_sites() -> BTreeMap<String, bool> {
    Site::ALL
        .iter()
        .map(|site| (site.name().to_string(), true))
        .collect()
}

fn default_max_duration_hours() -> u32 {
    360
}

fn default_reminder_lead_times() -> Vec<u32> {
    vec![10]
}

/// User preferences the feed consults. The feed only ever reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    /// Allow flag per site display name. Sites missing from the map are hidden.
    #[serde(default = "default_sites")]
    pub sites: BTreeMap<String, bool>,
    #[serde(default)]
    pub min_duration_hours: u32,
    #[serde(default = "default_max_duration_hours")]
    pub max_duration_hours: u32,
    #[serde(default)]
    pub fetch_all_calendar_events: bool,
    /// Minutes before the start at which automatic notifications fire.
    #[serde(default = "default_reminder_lead_times")]
    pub reminder_lead_times: Vec<u32>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            sites: default_sites(),
            min_duration_hours: 0,
            max_duration_hours: default_max_duration_hours(),
            fetch_all_calendar_events: false,
            reminder_lead_times: default_reminder_lead_times(),
        }
    }
}

impl Preferences {
    pub fn is_site_allowed(&self, site: &str) -> bool {
        self.sites.get(site).copied().unwrap_or(false)
    }

    pub fn allowed_sites(&self) -> HashSet<String> {
        self.sites
            .iter()
            .filter(|(_, allowed)| **allowed)
            .map(|(site, _)| site.clone())
            .collect()
    }

    pub fn set_site_allowed(&mut self, site: &str, allowed: bool) {
        let name = Site::from_name(site)
            .map(|known| known.name().to_string())
            .unwrap_or_else(|| site.trim().to_string());
        self.sites.insert(name, allowed);
    }

    /// Contests without a known duration are never filtered on it.
    pub fn is_duration_allowed(&self, contest: &Contest) -> bool {
        match contest.duration_seconds {
            Some(seconds) => {
                let min = i64::from(self.min_duration_hours) * 3600;
                let max = i64::from(self.max_duration_hours) * 3600;
                min <= seconds && seconds <= max
            }
            None => true,
        }
    }

    /// Contests the user wants to see, in their original order.
    pub fn apply(&self, contests: &[Contest]) -> Vec<Contest> {
        contests
            .iter()
            .filter(|contest| self.is_site_allowed(&contest.site))
            .filter(|contest| self.is_duration_allowed(contest))
            .cloned()
            .collect()
    }
}

/// Where preferences are persisted. Read once per filter pass, never cached by the feed.
pub trait PreferencesStore: Send + Sync {
    fn load(&self) -> Result<Preferences, StoreError>;
}

impl PreferencesStore for Preferences {
    fn load(&self) -> Result<Preferences, StoreError> {
        Ok(self.clone())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::test::contest;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_defaults_allow_every_known_site() {
        let preferences: Preferences = serde_json::from_str("{}").unwrap();
        assert_eq!(preferences, Preferences::default());
        for site in Site::ALL {
            assert!(preferences.is_site_allowed(site.name()));
        }
        assert!(!preferences.is_site_allowed("Yuki Coder"));
    }

    #[test]
    fn test_set_site_allowed_normalizes_known_names() {
        let mut preferences = Preferences::default();
        preferences.set_site_allowed("codeforces", false);
        preferences.set_site_allowed("Yuki Coder", true);

        assert!(!preferences.is_site_allowed("CodeForces"));
        assert!(preferences.is_site_allowed("Yuki Coder"));
        assert!(!preferences.allowed_sites().contains("CodeForces"));
    }

    #[test]
    fn test_apply_filters_site_and_duration() {
        let start = Utc.with_ymd_and_hms(2024, 7, 30, 18, 30, 0).unwrap();
        let contests = vec![
            contest("Short", "AtCoder", start, 2),
            contest("Long", "AtCoder", start, 30),
            contest("Hidden", "Toph", start, 2),
        ];
        let mut preferences = Preferences::default();
        preferences.max_duration_hours = 24;
        preferences.set_site_allowed("Toph", false);

        let names: Vec<String> = preferences
            .apply(&contests)
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Short"]);
    }
}
