//! In-memory implementations of the store traits.
//!
//! Used by tests and local tooling. Each store keeps its state behind one
//! async mutex, so every trait method is atomic with respect to concurrent
//! callers in the same way a single-statement database write is.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{CompetitionDirectory, ResultStore, SessionStore, SnapshotStore};
use crate::error::{Result, StorageError};
use crate::models::{
    CompetitionConfig, EditSession, LeaseOutcome, NewSeriesResult, Registration, ResultEntry,
    ResultKey, ResultSnapshot, SessionKey, StartListEntry,
};

#[derive(Clone, Default)]
pub struct MemoryResultStore {
    rows: Arc<Mutex<HashMap<ResultKey, ResultEntry>>>,
}

impl MemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResultStore for MemoryResultStore {
    async fn upsert(&self, result: NewSeriesResult) -> Result<ResultEntry> {
        let now = Utc::now();
        let mut rows = self.rows.lock().await;

        let entry = match rows.get_mut(&result.key) {
            Some(existing) => {
                result.apply_to(existing, now);
                existing.clone()
            }
            None => {
                let key = result.key;
                let entry = result.into_entry(Uuid::new_v4(), now);
                rows.insert(key, entry.clone());
                entry
            }
        };

        Ok(entry)
    }

    async fn delete(&self, key: ResultKey) -> Result<bool> {
        Ok(self.rows.lock().await.remove(&key).is_some())
    }

    async fn list(&self, competition_id: i64) -> Result<Vec<ResultEntry>> {
        let rows = self.rows.lock().await;
        let mut entries: Vec<ResultEntry> = rows
            .values()
            .filter(|entry| entry.competition_id == competition_id)
            .cloned()
            .collect();

        entries.sort_by_key(|e| (e.team_number, e.position, e.series_number, e.member_id));
        Ok(entries)
    }
}

#[derive(Clone, Default)]
pub struct MemorySessionStore {
    sessions: Arc<Mutex<HashMap<SessionKey, EditSession>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: SessionKey) -> Option<EditSession> {
        self.sessions.lock().await.get(&key).cloned()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn acquire(
        &self,
        key: SessionKey,
        officer_id: i64,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<LeaseOutcome> {
        let mut sessions = self.sessions.lock().await;

        match sessions.get_mut(&key) {
            Some(session) if !session.admits(officer_id, now, ttl) => Ok(LeaseOutcome::Conflict {
                holder_id: session.holder_id,
            }),
            Some(session) => {
                session.renew(officer_id, now, ttl);
                Ok(LeaseOutcome::Granted(session.clone()))
            }
            None => {
                let session = EditSession {
                    lease_id: Uuid::new_v4(),
                    key,
                    holder_id: officer_id,
                    lease_start: now,
                    last_refresh: now,
                    active: true,
                };
                sessions.insert(key, session.clone());
                Ok(LeaseOutcome::Granted(session))
            }
        }
    }

    async fn release(&self, key: SessionKey, officer_id: i64) -> Result<bool> {
        let mut sessions = self.sessions.lock().await;

        match sessions.get_mut(&key) {
            Some(session) if session.active && session.holder_id == officer_id => {
                session.active = false;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn deactivate_stale(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut sessions = self.sessions.lock().await;
        let mut count = 0;

        for session in sessions.values_mut() {
            if session.active && session.last_refresh <= cutoff {
                session.active = false;
                count += 1;
            }
        }

        Ok(count)
    }
}

#[derive(Clone, Default)]
pub struct MemorySnapshotStore {
    snapshots: Arc<Mutex<HashMap<i64, ResultSnapshot>>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn get(&self, competition_id: i64) -> Result<Option<ResultSnapshot>> {
        Ok(self.snapshots.lock().await.get(&competition_id).cloned())
    }

    async fn freeze(&self, snapshot: &ResultSnapshot) -> Result<bool> {
        let mut snapshots = self.snapshots.lock().await;

        if snapshots
            .get(&snapshot.competition_id)
            .is_some_and(|existing| existing.is_official)
        {
            return Ok(false);
        }

        snapshots.insert(snapshot.competition_id, snapshot.clone());
        Ok(true)
    }

    async fn unfreeze(&self, competition_id: i64, now: DateTime<Utc>) -> Result<bool> {
        let mut snapshots = self.snapshots.lock().await;

        match snapshots.get_mut(&competition_id) {
            Some(snapshot) if snapshot.is_official => {
                *snapshot = ResultSnapshot::preliminary(competition_id, now);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[derive(Default)]
struct DirectoryState {
    competitions: HashMap<i64, CompetitionConfig>,
    registrations: HashMap<i64, Vec<Registration>>,
    start_lists: HashMap<i64, Vec<StartListEntry>>,
    members: HashMap<i64, String>,
}

/// Directory fixture. `set_available(false)` makes every lookup fail the
/// way an unreachable upstream would.
#[derive(Clone)]
pub struct MemoryDirectory {
    state: Arc<Mutex<DirectoryState>>,
    available: Arc<AtomicBool>,
}

impl Default for MemoryDirectory {
    fn default() -> Self {
        Self {
            state: Arc::default(),
            available: Arc::new(AtomicBool::new(true)),
        }
    }
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_competition(&self, config: CompetitionConfig) {
        let mut state = self.state.lock().await;
        state.competitions.insert(config.competition_id, config);
    }

    pub async fn add_registration(&self, competition_id: i64, registration: Registration) {
        let mut state = self.state.lock().await;
        state
            .members
            .insert(registration.member_id, registration.member_name.clone());
        state
            .registrations
            .entry(competition_id)
            .or_default()
            .push(registration);
    }

    pub async fn set_start_list(&self, competition_id: i64, entries: Vec<StartListEntry>) {
        let mut state = self.state.lock().await;
        state.start_lists.insert(competition_id, entries);
    }

    pub async fn add_member(&self, member_id: i64, name: impl Into<String>) {
        let mut state = self.state.lock().await;
        state.members.insert(member_id, name.into());
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StorageError::ExternalCollaborator(
                "directory lookup timed out".to_string(),
            ))
        }
    }
}

#[async_trait]
impl CompetitionDirectory for MemoryDirectory {
    async fn competition_config(&self, competition_id: i64) -> Result<Option<CompetitionConfig>> {
        self.check_available()?;
        Ok(self.state.lock().await.competitions.get(&competition_id).cloned())
    }

    async fn registrations(&self, competition_id: i64) -> Result<Vec<Registration>> {
        self.check_available()?;
        Ok(self
            .state
            .lock()
            .await
            .registrations
            .get(&competition_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn start_list(&self, competition_id: i64) -> Result<Option<Vec<StartListEntry>>> {
        self.check_available()?;
        Ok(self.state.lock().await.start_lists.get(&competition_id).cloned())
    }

    async fn member_name(&self, member_id: i64) -> Result<Option<String>> {
        self.check_available()?;
        Ok(self.state.lock().await.members.get(&member_id).cloned())
    }
}
