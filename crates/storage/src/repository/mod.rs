//! Persistence seams of the results engine.
//!
//! Each store is a trait so the engine runs unchanged over PostgreSQL in
//! production and over the in-memory stores in tests. Every method is a
//! single atomic unit: implementations must never expose a half-applied
//! write to concurrent callers.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::error::Result;
use crate::models::{
    CompetitionConfig, LeaseOutcome, NewSeriesResult, Registration, ResultEntry, ResultKey,
    ResultSnapshot, SessionKey, StartListEntry,
};

pub mod directory;
pub mod memory;
pub mod results;
pub mod sessions;
pub mod snapshots;

pub use directory::DirectoryRepository;
pub use memory::{MemoryDirectory, MemoryResultStore, MemorySessionStore, MemorySnapshotStore};
pub use results::ResultRepository;
pub use sessions::SessionRepository;
pub use snapshots::SnapshotRepository;

/// Per-competitor-per-series results keyed by [`ResultKey`].
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Inserts or overwrites the row for `result.key` in one transaction.
    async fn upsert(&self, result: NewSeriesResult) -> Result<ResultEntry>;

    /// Returns whether a row existed.
    async fn delete(&self, key: ResultKey) -> Result<bool>;

    /// All rows of a competition ordered by team, position, series, member.
    async fn list(&self, competition_id: i64) -> Result<Vec<ResultEntry>>;
}

/// Leases on physical scoring slots.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Atomic check-and-set: grants or refreshes the lease when the slot is
    /// free, expired, or already held by `officer_id`.
    async fn acquire(
        &self,
        key: SessionKey,
        officer_id: i64,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<LeaseOutcome>;

    /// Clears the lease early. Only the holder may release it.
    async fn release(&self, key: SessionKey, officer_id: i64) -> Result<bool>;

    /// Marks leases last refreshed before `cutoff` inactive.
    async fn deactivate_stale(&self, cutoff: DateTime<Utc>) -> Result<u64>;
}

/// One publication record per competition.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn get(&self, competition_id: i64) -> Result<Option<ResultSnapshot>>;

    /// Stores an official snapshot unless one is already official.
    /// Returns whether the transition happened.
    async fn freeze(&self, snapshot: &ResultSnapshot) -> Result<bool>;

    /// Drops the frozen payload and returns to preliminary.
    /// Returns whether the snapshot was official.
    async fn unfreeze(&self, competition_id: i64, now: DateTime<Utc>) -> Result<bool>;
}

/// Read-only view of the registration and membership directory.
#[async_trait]
pub trait CompetitionDirectory: Send + Sync {
    async fn competition_config(&self, competition_id: i64) -> Result<Option<CompetitionConfig>>;

    async fn registrations(&self, competition_id: i64) -> Result<Vec<Registration>>;

    /// `None` when no start list has been drawn yet.
    async fn start_list(&self, competition_id: i64) -> Result<Option<Vec<StartListEntry>>>;

    async fn member_name(&self, member_id: i64) -> Result<Option<String>>;
}
