pub mod competition;
pub mod edit_session;
pub mod result_entry;
pub mod result_snapshot;
pub mod shooting_class;
pub mod shot;

pub use competition::{CompetitionConfig, CompetitionScope, Registration, SeriesFormat, StartListEntry};
pub use edit_session::{EditSession, LeaseOutcome, SessionKey};
pub use result_entry::{NewSeriesResult, ResultEntry, ResultKey};
pub use result_snapshot::{FrozenResults, ResultSnapshot};
pub use shooting_class::{ClassDefinition, ClassTaxonomy, Cohort, WeaponGroup};
pub use shot::{SHOTS_PER_SERIES, Shot};
