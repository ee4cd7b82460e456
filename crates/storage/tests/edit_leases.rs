use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::sync::Barrier;

use storage::models::{LeaseOutcome, SessionKey};
use storage::repository::{MemorySessionStore, SessionStore};
use storage::services::session_lock::SessionLockManager;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_officers_get_exactly_one_grant() {
    let store = Arc::new(MemorySessionStore::new());
    let locks = SessionLockManager::new(store.clone(), Duration::minutes(3)).unwrap();
    let key = SessionKey::new(7, 2, 4, 1);
    let officers = 16;
    let barrier = Arc::new(Barrier::new(officers));
    let now = Utc::now();

    let handles: Vec<_> = (0..officers)
        .map(|i| {
            let locks = locks.clone();
            let barrier = barrier.clone();
            tokio::spawn(async move {
                barrier.wait().await;
                locks.try_acquire_at(key, 100 + i as i64, now).await
            })
        })
        .collect();

    let mut winners = Vec::new();
    let mut reported_holders = Vec::new();
    for handle in handles {
        match handle.await.unwrap().unwrap() {
            LeaseOutcome::Granted(session) => winners.push(session.holder_id),
            LeaseOutcome::Conflict { holder_id } => reported_holders.push(holder_id),
        }
    }

    assert_eq!(winners.len(), 1);
    assert_eq!(reported_holders.len(), officers - 1);
    assert!(reported_holders.iter().all(|h| *h == winners[0]));

    let stored = store.get(key).await.unwrap();
    assert!(stored.active);
    assert_eq!(stored.holder_id, winners[0]);
}

#[tokio::test]
async fn test_sweep_deactivates_only_lapsed_leases() {
    let store = Arc::new(MemorySessionStore::new());
    let locks = SessionLockManager::new(store.clone(), Duration::minutes(3)).unwrap();
    let start = Utc::now();
    let stale = SessionKey::new(7, 1, 1, 1);
    let fresh = SessionKey::new(7, 1, 2, 1);

    locks.try_acquire_at(stale, 100, start).await.unwrap();
    locks
        .try_acquire_at(fresh, 101, start + Duration::minutes(2))
        .await
        .unwrap();

    let swept = locks.sweep_expired(start + Duration::minutes(4)).await.unwrap();

    assert_eq!(swept, 1);
    assert!(!store.get(stale).await.unwrap().active);
    assert!(store.get(fresh).await.unwrap().active);
    assert_eq!(store.deactivate_stale(start).await.unwrap(), 0);
}

#[tokio::test]
async fn test_reacquiring_after_expiry_starts_new_lease() {
    let store = Arc::new(MemorySessionStore::new());
    let locks = SessionLockManager::new(store, Duration::minutes(3)).unwrap();
    let key = SessionKey::new(7, 1, 1, 1);
    let start = Utc::now();

    let LeaseOutcome::Granted(first) = locks.try_acquire_at(key, 100, start).await.unwrap() else {
        panic!("first acquire must succeed");
    };
    let LeaseOutcome::Granted(renewed) = locks
        .try_acquire_at(key, 100, start + Duration::minutes(1))
        .await
        .unwrap()
    else {
        panic!("holder must be able to refresh");
    };
    let LeaseOutcome::Granted(taken_over) = locks
        .try_acquire_at(key, 101, start + Duration::minutes(5))
        .await
        .unwrap()
    else {
        panic!("expired lease must be claimable");
    };

    assert_eq!(renewed.lease_id, first.lease_id);
    assert_eq!(renewed.lease_start, first.lease_start);
    assert_ne!(taken_over.lease_id, first.lease_id);
    assert_eq!(taken_over.lease_start, start + Duration::minutes(5));
}
