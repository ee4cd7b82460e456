use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::error::{Result, StorageError};
use crate::models::{LeaseOutcome, SessionKey};
use crate::repository::SessionStore;

/// Default lease lifetime when none is configured.
pub const DEFAULT_LEASE_TTL_SECONDS: i64 = 180;

/// Hands out exclusive, expiring leases on scoring slots.
///
/// A lease lapses `ttl` after its last refresh; conflicts are reported to
/// the caller immediately and never retried here.
#[derive(Clone)]
pub struct SessionLockManager {
    store: Arc<dyn SessionStore>,
    ttl: Duration,
}

impl SessionLockManager {
    pub fn new(store: Arc<dyn SessionStore>, ttl: Duration) -> Result<Self> {
        if ttl <= Duration::zero() {
            return Err(StorageError::Validation(
                "lease TTL must be positive".to_string(),
            ));
        }
        Ok(Self { store, ttl })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn try_acquire(&self, key: SessionKey, officer_id: i64) -> Result<LeaseOutcome> {
        self.try_acquire_at(key, officer_id, Utc::now()).await
    }

    pub async fn try_acquire_at(
        &self,
        key: SessionKey,
        officer_id: i64,
        now: DateTime<Utc>,
    ) -> Result<LeaseOutcome> {
        let outcome = self.store.acquire(key, officer_id, now, self.ttl).await?;

        match &outcome {
            LeaseOutcome::Granted(session) => tracing::debug!(
                "Lease {} on {:?} granted to officer {}",
                session.lease_id,
                key,
                officer_id
            ),
            LeaseOutcome::Conflict { holder_id } => tracing::warn!(
                "Officer {} refused lease on {:?}: held by officer {}",
                officer_id,
                key,
                holder_id
            ),
        }

        Ok(outcome)
    }

    pub async fn release(&self, key: SessionKey, officer_id: i64) -> Result<bool> {
        self.store.release(key, officer_id).await
    }

    /// Deactivates every lease that has lapsed by `now`.
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        self.store.deactivate_stale(now - self.ttl).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemorySessionStore;

    fn manager() -> SessionLockManager {
        SessionLockManager::new(Arc::new(MemorySessionStore::new()), Duration::minutes(3)).unwrap()
    }

    #[test]
    fn test_rejects_non_positive_ttl() {
        let store = Arc::new(MemorySessionStore::new());
        assert!(SessionLockManager::new(store.clone(), Duration::zero()).is_err());
        assert!(SessionLockManager::new(store, Duration::seconds(-5)).is_err());
    }

    #[tokio::test]
    async fn test_second_officer_sees_holder() {
        let locks = manager();
        let key = SessionKey::new(1, 2, 3, 1);
        let now = Utc::now();

        assert!(matches!(
            locks.try_acquire_at(key, 10, now).await.unwrap(),
            LeaseOutcome::Granted(_)
        ));
        assert_eq!(
            locks.try_acquire_at(key, 11, now + Duration::seconds(30)).await.unwrap(),
            LeaseOutcome::Conflict { holder_id: 10 }
        );
    }

    #[tokio::test]
    async fn test_lease_lapses_after_ttl() {
        let locks = manager();
        let key = SessionKey::new(1, 2, 3, 1);
        let now = Utc::now();

        locks.try_acquire_at(key, 10, now).await.unwrap();
        let outcome = locks
            .try_acquire_at(key, 11, now + Duration::minutes(3))
            .await
            .unwrap();

        match outcome {
            LeaseOutcome::Granted(session) => assert_eq!(session.holder_id, 11),
            other => panic!("expected grant, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_refresh_extends_lease() {
        let locks = manager();
        let key = SessionKey::new(1, 2, 3, 1);
        let now = Utc::now();

        locks.try_acquire_at(key, 10, now).await.unwrap();
        locks.try_acquire_at(key, 10, now + Duration::minutes(2)).await.unwrap();

        assert_eq!(
            locks.try_acquire_at(key, 11, now + Duration::minutes(4)).await.unwrap(),
            LeaseOutcome::Conflict { holder_id: 10 }
        );
    }

    #[tokio::test]
    async fn test_release_frees_slot_early() {
        let locks = manager();
        let key = SessionKey::new(1, 2, 3, 1);
        let now = Utc::now();

        locks.try_acquire_at(key, 10, now).await.unwrap();
        assert!(locks.release(key, 10).await.unwrap());
        assert!(matches!(
            locks.try_acquire_at(key, 11, now).await.unwrap(),
            LeaseOutcome::Granted(_)
        ));
    }

    #[tokio::test]
    async fn test_different_slots_do_not_contend() {
        let locks = manager();
        let now = Utc::now();

        for position in 1..=4 {
            let key = SessionKey::new(1, 1, position, 1);
            assert!(matches!(
                locks.try_acquire_at(key, i64::from(position), now).await.unwrap(),
                LeaseOutcome::Granted(_)
            ));
        }
    }
}
