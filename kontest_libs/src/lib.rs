pub mod aggregator;
pub mod categorizer;
pub mod clock;
pub mod date;
pub mod feed;
pub mod model;
pub mod preferences;
pub mod reconciler;
pub mod repository;
pub mod scheduler;
pub mod search;
pub mod site;
pub mod source;
pub mod store;

pub use aggregator::{Aggregate, Aggregator, SourceFailure};
pub use categorizer::{categorize, BoundaryWatcher, Categories, DayBoundaries, TickAction};
pub use clock::{Clock, ManualClock, SystemClock};
pub use feed::{Feed, FeedDependencies, FeedWarning};
pub use model::{CalendarLink, Contest, ContestRecord, ContestStatus};
pub use preferences::{Preferences, PreferencesStore};
pub use reconciler::{ReconcileReport, Reconciler};
pub use repository::{ContestRepository, Snapshot};
pub use scheduler::Scheduler;
pub use site::Site;
pub use source::{SourceError, SourceFetcher};
pub use store::{CalendarStore, NotificationStore, ReminderStore, StoreError};
