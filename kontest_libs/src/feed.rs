//! The single owner of every contest list shown to the user.
//!
//! All mutation goes through `&mut Feed`, so there is one writer by construction. Fetching is
//! split from publishing: a [`Snapshot`] can be produced from a shared [`ContestRepository`]
//! while the feed keeps serving ticks, and whichever snapshot is published last wins.
use crate::aggregator::SourceFailure;
use crate::categorizer::{
    categorize_within, next_boundary_within, BoundaryWatcher, Categories, DayBoundaries,
    TickAction,
};
use crate::clock::Clock;
use crate::model::Contest;
use crate::preferences::{Preferences, PreferencesStore};
use crate::reconciler::{ReconcileReport, Reconciler};
use crate::repository::{ContestRepository, Snapshot};
use crate::scheduler::Scheduler;
use crate::search::filter_contests;
use crate::store::{
    CalendarStore, NotificationAuthorization, NotificationStore, ReminderStore, StoreError,
};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FeedWarning {
    /// Notifications are pending but the user has revoked permission to show them.
    NotificationPermissionDenied { pending: usize },
}

/// Everything the feed talks to.
pub struct FeedDependencies {
    pub repository: Arc<ContestRepository>,
    pub calendar: Arc<dyn CalendarStore>,
    pub notifications: Arc<dyn NotificationStore>,
    pub reminders: Arc<dyn ReminderStore>,
    pub preferences: Arc<dyn PreferencesStore>,
    pub clock: Arc<dyn Clock>,
}

pub struct Feed {
    repository: Arc<ContestRepository>,
    reconciler: Reconciler,
    scheduler: Scheduler,
    notifications: Arc<dyn NotificationStore>,
    reminders: Arc<dyn ReminderStore>,
    preferences: Arc<dyn PreferencesStore>,
    clock: Arc<dyn Clock>,

    all: Vec<Contest>,
    backup: Vec<Contest>,
    shown: Vec<Contest>,
    categories: Categories,
    search: String,
    failures: Vec<SourceFailure>,
    warnings: Vec<FeedWarning>,
    watcher: BoundaryWatcher,
}

impl Feed {
    pub fn new(deps: FeedDependencies) -> Self {
        Self {
            reconciler: Reconciler::new(deps.calendar, deps.notifications.clone()),
            scheduler: Scheduler::new(deps.notifications.clone(), deps.reminders.clone()),
            repository: deps.repository,
            notifications: deps.notifications,
            reminders: deps.reminders,
            preferences: deps.preferences,
            clock: deps.clock,
            all: Vec::new(),
            backup: Vec::new(),
            shown: Vec::new(),
            categories: Categories::default(),
            search: String::new(),
            failures: Vec::new(),
            warnings: Vec::new(),
            watcher: BoundaryWatcher::default(),
        }
    }

    pub fn repository(&self) -> Arc<ContestRepository> {
        self.repository.clone()
    }

    pub fn categories(&self) -> &Categories {
        &self.categories
    }

    /// Contests after preference and search filtering.
    pub fn contests(&self) -> &[Contest] {
        &self.shown
    }

    /// Every contest of the last fetch, regardless of preferences.
    pub fn all_contests(&self) -> &[Contest] {
        &self.all
    }

    pub fn failures(&self) -> &[SourceFailure] {
        &self.failures
    }

    pub fn warnings(&self) -> &[FeedWarning] {
        &self.warnings
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn next_boundary(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.watcher.next_boundary()
    }

    fn load_preferences(&self) -> Preferences {
        match self.preferences.load() {
            Ok(preferences) => preferences,
            Err(e) => {
                tracing::warn!("failed to load preferences, defaults are used: {:?}", e);
                Preferences::default()
            }
        }
    }

    /// A detached fetch of every source. The feed is not borrowed while it runs, so ticks can
    /// continue and the result is handed back through [`Feed::complete_refresh`].
    pub fn fetch(&self) -> impl Future<Output = Snapshot> + Send + 'static {
        let repository = self.repository.clone();
        let fetch_calendar_events = self.load_preferences().fetch_all_calendar_events;
        let now = self.clock.now_utc();
        async move { repository.fetch(fetch_calendar_events, now).await }
    }

    /// Fetch every source and publish the result.
    pub async fn refresh(&mut self) {
        let snapshot = self.fetch().await;
        self.complete_refresh(snapshot).await;
    }

    /// Publish a snapshot and run the post-fetch housekeeping.
    pub async fn complete_refresh(&mut self, snapshot: Snapshot) {
        self.publish(snapshot);
        let warnings = self.housekeeping().await;
        self.set_warnings(warnings);
    }

    /// Post-fetch housekeeping detached from the feed, like [`Feed::fetch`]: clears reminder
    /// flags of ended contests and resolves to the warnings for [`Feed::set_warnings`].
    pub fn housekeeping(&self) -> impl Future<Output = Vec<FeedWarning>> + Send + 'static {
        let reminders = self.reminders.clone();
        let notifications = self.notifications.clone();
        let now = self.clock.now_utc();
        let ended: Vec<String> = self
            .all
            .iter()
            .filter(|contest| contest.is_ended(now))
            .map(|contest| contest.id.clone())
            .collect();

        async move {
            clear_reminders(reminders.as_ref(), &ended).await;
            notification_warnings(notifications.as_ref()).await
        }
    }

    pub fn set_warnings(&mut self, warnings: Vec<FeedWarning>) {
        self.warnings = warnings;
    }

    /// Replace the contest set with a freshly fetched one and recategorize.
    pub fn publish(&mut self, snapshot: Snapshot) {
        self.all = snapshot.contests;
        self.failures = snapshot.failures;
        self.apply_preferences();
    }

    /// Re-read site and duration preferences and rebuild every derived list.
    pub fn apply_preferences(&mut self) {
        let preferences = self.load_preferences();
        self.backup = preferences.apply(&self.all);
        self.shown = filter_contests(&self.backup, &self.search);
        self.recategorize_with(&preferences);
        self.rearm();
    }

    pub fn set_search(&mut self, query: &str) {
        self.search = query.to_string();
        self.shown = filter_contests(&self.backup, &self.search);
        self.recategorize();
        self.rearm();
    }

    fn recategorize(&mut self) {
        let preferences = self.load_preferences();
        self.recategorize_with(&preferences);
    }

    fn recategorize_with(&mut self, preferences: &Preferences) {
        let instant = self.clock.now_utc();
        let days = DayBoundaries::from_clock(self.clock.as_ref());

        self.shown.retain(|contest| !contest.is_ended(instant));
        self.categories =
            categorize_within(&self.shown, &preferences.allowed_sites(), instant, days);
    }

    fn rearm(&mut self) {
        let days = DayBoundaries::from_clock(self.clock.as_ref());
        let next = next_boundary_within(&self.categories, days);
        self.watcher.arm(next);
    }

    /// Called once a second. Returns whether the buckets were recomputed.
    ///
    /// Does nothing while a search is active.
    pub fn tick(&mut self) -> bool {
        if !self.search.is_empty() {
            return false;
        }

        match self.watcher.check(self.clock.now_utc()) {
            TickAction::Idle => false,
            TickAction::Refresh => {
                self.recategorize();
                true
            }
            TickAction::Rearm => {
                self.recategorize();
                self.rearm();
                true
            }
        }
    }

    /// Clean the calendar and notification stores against the last fetch.
    pub async fn reconcile(&self) -> ReconcileReport {
        self.reconcile_task().await
    }

    /// [`Feed::reconcile`] against the current contest set, without borrowing the feed.
    pub fn reconcile_task(&self) -> impl Future<Output = ReconcileReport> + Send + 'static {
        let reconciler = self.reconciler.clone();
        let contests = self.all.clone();
        let now = self.clock.now_utc();
        async move { reconciler.reconcile(&contests, now).await }
    }

    /// Schedule automatic notifications for the contests the user can see.
    pub async fn schedule_reminders(&self) -> Result<usize, StoreError> {
        let preferences = self.load_preferences();
        self.scheduler
            .schedule_automatic(
                &self.backup,
                &preferences.reminder_lead_times,
                self.clock.now_utc(),
            )
            .await
    }
}

async fn clear_reminders(reminders: &dyn ReminderStore, ended: &[String]) {
    for id in ended {
        match reminders.clear_reminder(id).await {
            Ok(()) => tracing::info!("reminder of {} cleared as the contest has ended.", id),
            Err(e) => tracing::warn!("failed to clear reminder of {}: {:?}", id, e),
        }
    }
}

async fn notification_warnings(notifications: &dyn NotificationStore) -> Vec<FeedWarning> {
    let pending = match notifications.pending_notifications().await {
        Ok(pending) => pending.len(),
        Err(e) => {
            tracing::warn!("failed to read pending notifications: {:?}", e);
            return Vec::new();
        }
    };
    if pending == 0 {
        return Vec::new();
    }

    if notifications.authorization_status().await == NotificationAuthorization::Denied {
        tracing::warn!(
            "{} notifications are pending but notification permission is denied.",
            pending
        );
        return vec![FeedWarning::NotificationPermissionDenied { pending }];
    }
    Vec::new()
}
