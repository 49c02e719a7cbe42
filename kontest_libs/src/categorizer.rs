use crate::clock::Clock;
use crate::date::{self, day_after_tomorrow, tomorrow};
use crate::model::Contest;
use chrono::{DateTime, Duration, FixedOffset, Utc};
use itertools::Itertools;
use serde::Serialize;
use std::collections::HashSet;

/// Half-width of the window around the next boundary in which ticks recategorize.
pub const BOUNDARY_WINDOW_SECS: i64 = 5;

/// The four time buckets. Every shown contest lands in exactly one of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Categories {
    /// Running now, soonest-ending first.
    pub ongoing: Vec<Contest>,
    /// Starting before local midnight.
    pub later_today: Vec<Contest>,
    /// Starting on the next local day.
    pub tomorrow: Vec<Contest>,
    pub later: Vec<Contest>,
}

impl Categories {
    pub fn len(&self) -> usize {
        self.ongoing.len() + self.later_today.len() + self.tomorrow.len() + self.later.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Vec<Contest>)> {
        [
            ("Ongoing", &self.ongoing),
            ("Later Today", &self.later_today),
            ("Tomorrow", &self.tomorrow),
            ("Later", &self.later),
        ]
        .into_iter()
    }

    pub fn summary(&self) -> String {
        self.iter()
            .map(|(label, contests)| format!("{}: {}", label, contests.len()))
            .join(", ")
    }
}

/// The next two local midnights, which split "Later Today", "Tomorrow" and "Later".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayBoundaries {
    pub tomorrow: DateTime<Utc>,
    pub day_after_tomorrow: DateTime<Utc>,
}

impl DayBoundaries {
    /// Midnights at the offset of `now`.
    pub fn at(now: &DateTime<FixedOffset>) -> Self {
        Self {
            tomorrow: tomorrow(now),
            day_after_tomorrow: day_after_tomorrow(now),
        }
    }

    pub fn from_clock(clock: &dyn Clock) -> Self {
        Self {
            tomorrow: clock.start_of_day(1),
            day_after_tomorrow: clock.start_of_day(2),
        }
    }
}

/// Split contests into time buckets as of `now`.
///
/// Contests from sites outside `allowed_sites` and contests that have ended (including those
/// with unparsable dates) are left out.
pub fn categorize(
    contests: &[Contest],
    allowed_sites: &HashSet<String>,
    now: DateTime<FixedOffset>,
) -> Categories {
    categorize_within(
        contests,
        allowed_sites,
        now.with_timezone(&Utc),
        DayBoundaries::at(&now),
    )
}

/// [`categorize`] with the day boundaries given explicitly.
pub fn categorize_within(
    contests: &[Contest],
    allowed_sites: &HashSet<String>,
    instant: DateTime<Utc>,
    days: DayBoundaries,
) -> Categories {
    let DayBoundaries {
        tomorrow,
        day_after_tomorrow,
    } = days;

    let mut categories = Categories::default();
    for contest in contests
        .iter()
        .filter(|contest| allowed_sites.contains(&contest.site))
        .filter(|contest| !contest.is_ended(instant))
    {
        let (start, end) = match (contest.start, contest.end) {
            (Some(start), Some(end)) => (start, end),
            _ => continue,
        };

        if date::is_running(start, end, instant) {
            categories.ongoing.push(contest.clone());
        } else if start < tomorrow {
            categories.later_today.push(contest.clone());
        } else if start < day_after_tomorrow {
            categories.tomorrow.push(contest.clone());
        } else {
            categories.later.push(contest.clone());
        }
    }
    categories.ongoing.sort_by_key(|contest| contest.end);

    categories
}

/// The earliest instant after which `categorize` could give a different answer: an ongoing
/// contest ending, an upcoming contest starting, or the local day rolling over.
pub fn next_boundary(categories: &Categories, now: DateTime<FixedOffset>) -> DateTime<Utc> {
    next_boundary_within(categories, DayBoundaries::at(&now))
}

pub fn next_boundary_within(categories: &Categories, days: DayBoundaries) -> DateTime<Utc> {
    let ends = categories.ongoing.iter().filter_map(|contest| contest.end);
    let starts = [&categories.later_today, &categories.tomorrow, &categories.later]
        .into_iter()
        .flatten()
        .filter_map(|contest| contest.start);

    ends.chain(starts)
        .chain(std::iter::once(days.tomorrow))
        .min()
        .unwrap_or(days.tomorrow)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickAction {
    /// Nothing can have changed yet.
    Idle,
    /// Close to a boundary; recategorize.
    Refresh,
    /// Past the window; recategorize and compute a new boundary.
    Rearm,
}

/// Decides on each clock tick whether the buckets need recomputing.
///
/// Within `BOUNDARY_WINDOW_SECS` of the armed boundary every tick refreshes; once the window is
/// left behind the watcher asks to be rearmed.
#[derive(Debug, Clone, Default)]
pub struct BoundaryWatcher {
    next: Option<DateTime<Utc>>,
}

impl BoundaryWatcher {
    pub fn arm(&mut self, next: DateTime<Utc>) {
        tracing::debug!("next category boundary at {}", next);
        self.next = Some(next);
    }

    pub fn next_boundary(&self) -> Option<DateTime<Utc>> {
        self.next
    }

    pub fn check(&self, now: DateTime<Utc>) -> TickAction {
        let window = Duration::seconds(BOUNDARY_WINDOW_SECS);
        match self.next {
            None => TickAction::Rearm,
            Some(next) if now < next - window => TickAction::Idle,
            Some(next) if now <= next + window => TickAction::Refresh,
            Some(_) => TickAction::Rearm,
        }
    }
}
