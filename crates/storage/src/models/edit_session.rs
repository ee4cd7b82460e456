use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A physical scoring slot for one series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct SessionKey {
    pub competition_id: i64,
    pub team_number: i32,
    pub position: i32,
    pub series_number: i32,
}

impl SessionKey {
    pub fn new(competition_id: i64, team_number: i32, position: i32, series_number: i32) -> Self {
        Self {
            competition_id,
            team_number,
            position,
            series_number,
        }
    }
}

/// Lease granting one officer authority over a scoring slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EditSession {
    pub lease_id: Uuid,
    pub key: SessionKey,
    pub holder_id: i64,
    pub lease_start: DateTime<Utc>,
    pub last_refresh: DateTime<Utc>,
    pub active: bool,
}

impl EditSession {
    pub fn expires_at(&self, ttl: Duration) -> DateTime<Utc> {
        self.last_refresh + ttl
    }

    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now >= self.expires_at(ttl)
    }

    /// Whether `officer_id` may take or refresh this lease at `now`.
    pub fn admits(&self, officer_id: i64, now: DateTime<Utc>, ttl: Duration) -> bool {
        !self.active || self.holder_id == officer_id || self.is_expired(now, ttl)
    }

    /// Grants a fresh lease, or refreshes it when the same officer still holds it.
    pub fn renew(&mut self, officer_id: i64, now: DateTime<Utc>, ttl: Duration) {
        let continuing = self.active && self.holder_id == officer_id && !self.is_expired(now, ttl);
        if !continuing {
            self.lease_id = Uuid::new_v4();
            self.lease_start = now;
        }
        self.holder_id = officer_id;
        self.last_refresh = now;
        self.active = true;
    }
}

/// Result of a lease request. A conflict is an ordinary outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaseOutcome {
    Granted(EditSession),
    Conflict { holder_id: i64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(holder_id: i64, last_refresh: DateTime<Utc>) -> EditSession {
        EditSession {
            lease_id: Uuid::new_v4(),
            key: SessionKey::new(1, 2, 3, 1),
            holder_id,
            lease_start: last_refresh,
            last_refresh,
            active: true,
        }
    }

    #[test]
    fn test_active_lease_excludes_other_officers() {
        let now = Utc::now();
        let lease = session(7, now);
        let ttl = Duration::minutes(3);

        assert!(lease.admits(7, now, ttl));
        assert!(!lease.admits(8, now + Duration::minutes(2), ttl));
        assert!(lease.admits(8, now + Duration::minutes(3), ttl));
    }

    #[test]
    fn test_released_lease_admits_anyone() {
        let now = Utc::now();
        let mut lease = session(7, now);
        lease.active = false;

        assert!(lease.admits(8, now, Duration::minutes(3)));
    }

    #[test]
    fn test_refresh_keeps_lease_identity() {
        let start = Utc::now();
        let ttl = Duration::minutes(3);
        let mut lease = session(7, start);
        let lease_id = lease.lease_id;

        lease.renew(7, start + Duration::minutes(1), ttl);
        assert_eq!(lease.lease_id, lease_id);
        assert_eq!(lease.lease_start, start);
        assert_eq!(lease.last_refresh, start + Duration::minutes(1));

        lease.renew(9, start + Duration::minutes(10), ttl);
        assert_ne!(lease.lease_id, lease_id);
        assert_eq!(lease.holder_id, 9);
        assert_eq!(lease.lease_start, start + Duration::minutes(10));
    }
}
