use crate::modules::{config::Config, stores::JsonPreferencesStore};
use anyhow::{Context, Result};
use clap::Args;
use kontest_libs::{Preferences, PreferencesStore, Site};

#[derive(Debug, Args)]
pub struct PrefsArgs {
    /// Show contests of this site. May be repeated.
    #[arg(long)]
    allow: Vec<String>,
    /// Hide contests of this site. May be repeated.
    #[arg(long)]
    deny: Vec<String>,
    #[arg(long)]
    min_hours: Option<u32>,
    #[arg(long)]
    max_hours: Option<u32>,
    /// Link contests to calendar events on every fetch.
    #[arg(long)]
    calendar_events: Option<bool>,
    /// Minutes before the start to be notified at. Replaces the current list when given.
    #[arg(long)]
    lead_time: Vec<u32>,
}

impl PrefsArgs {
    fn is_empty(&self) -> bool {
        self.allow.is_empty()
            && self.deny.is_empty()
            && self.min_hours.is_none()
            && self.max_hours.is_none()
            && self.calendar_events.is_none()
            && self.lead_time.is_empty()
    }

    fn apply(&self, preferences: &mut Preferences) -> Result<()> {
        for site in &self.allow {
            if Site::from_name(site).is_none() {
                tracing::warn!("{} is not a known site.", site);
            }
            preferences.set_site_allowed(site, true);
        }
        for site in &self.deny {
            preferences.set_site_allowed(site, false);
        }
        if let Some(hours) = self.min_hours {
            preferences.min_duration_hours = hours;
        }
        if let Some(hours) = self.max_hours {
            preferences.max_duration_hours = hours;
        }
        if let Some(fetch) = self.calendar_events {
            preferences.fetch_all_calendar_events = fetch;
        }
        if !self.lead_time.is_empty() {
            preferences.reminder_lead_times = self.lead_time.clone();
        }

        if preferences.min_duration_hours > preferences.max_duration_hours {
            let message = format!(
                "minimum duration {}h exceeds maximum duration {}h.",
                preferences.min_duration_hours, preferences.max_duration_hours
            );
            tracing::error!(message);
            anyhow::bail!(message)
        }
        Ok(())
    }
}

pub async fn run(args: PrefsArgs) -> Result<()> {
    let config = Config::from_env()?;
    let store = JsonPreferencesStore::new(&config.data_dir);

    let mut preferences = store.load().with_context(|| {
        let message = format!("failed to load {}", store.path().display());
        tracing::error!(message);
        message
    })?;

    if !args.is_empty() {
        args.apply(&mut preferences)?;
        store.save(&preferences).with_context(|| {
            let message = format!("failed to save {}", store.path().display());
            tracing::error!(message);
            message
        })?;
        tracing::info!("preferences saved to {}", store.path().display());
    }

    println!("{}", serde_json::to_string_pretty(&preferences)?);
    Ok(())
}
