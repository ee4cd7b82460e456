use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{EditSession, LeaseOutcome, SessionKey};

use super::SessionStore;

#[derive(FromRow)]
struct SessionRow {
    lease_id: Uuid,
    competition_id: i64,
    team_number: i32,
    position: i32,
    series_number: i32,
    holder_id: i64,
    lease_start: DateTime<Utc>,
    last_refresh: DateTime<Utc>,
    active: bool,
}

impl From<SessionRow> for EditSession {
    fn from(row: SessionRow) -> Self {
        Self {
            lease_id: row.lease_id,
            key: SessionKey::new(
                row.competition_id,
                row.team_number,
                row.position,
                row.series_number,
            ),
            holder_id: row.holder_id,
            lease_start: row.lease_start,
            last_refresh: row.last_refresh,
            active: row.active,
        }
    }
}

/// Repository for edit leases on scoring slots
#[derive(Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for SessionRepository {
    async fn acquire(
        &self,
        key: SessionKey,
        officer_id: i64,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<LeaseOutcome> {
        let stale_before = now - ttl;

        // The conditional upsert is the whole check-and-set: the row lock taken
        // by ON CONFLICT serializes racing officers on the same slot.
        let granted: Option<SessionRow> = sqlx::query_as(
            r#"
            INSERT INTO edit_sessions (
                lease_id, competition_id, team_number, position, series_number,
                holder_id, lease_start, last_refresh, active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7, TRUE)
            ON CONFLICT (competition_id, team_number, position, series_number)
            DO UPDATE SET
                lease_id = CASE
                    WHEN edit_sessions.active
                         AND edit_sessions.holder_id = EXCLUDED.holder_id
                         AND edit_sessions.last_refresh > $8
                    THEN edit_sessions.lease_id
                    ELSE EXCLUDED.lease_id
                END,
                lease_start = CASE
                    WHEN edit_sessions.active
                         AND edit_sessions.holder_id = EXCLUDED.holder_id
                         AND edit_sessions.last_refresh > $8
                    THEN edit_sessions.lease_start
                    ELSE EXCLUDED.lease_start
                END,
                holder_id = EXCLUDED.holder_id,
                last_refresh = EXCLUDED.last_refresh,
                active = TRUE
            WHERE NOT edit_sessions.active
               OR edit_sessions.holder_id = EXCLUDED.holder_id
               OR edit_sessions.last_refresh <= $8
            RETURNING lease_id, competition_id, team_number, position, series_number,
                      holder_id, lease_start, last_refresh, active
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(key.competition_id)
        .bind(key.team_number)
        .bind(key.position)
        .bind(key.series_number)
        .bind(officer_id)
        .bind(now)
        .bind(stale_before)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = granted {
            return Ok(LeaseOutcome::Granted(row.into()));
        }

        let holder_id: i64 = sqlx::query_scalar(
            r#"
            SELECT holder_id
            FROM edit_sessions
            WHERE competition_id = $1 AND team_number = $2 AND position = $3 AND series_number = $4
            "#,
        )
        .bind(key.competition_id)
        .bind(key.team_number)
        .bind(key.position)
        .bind(key.series_number)
        .fetch_one(&self.pool)
        .await?;

        Ok(LeaseOutcome::Conflict { holder_id })
    }

    async fn release(&self, key: SessionKey, officer_id: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE edit_sessions
            SET active = FALSE
            WHERE competition_id = $1 AND team_number = $2 AND position = $3
              AND series_number = $4 AND holder_id = $5 AND active
            "#,
        )
        .bind(key.competition_id)
        .bind(key.team_number)
        .bind(key.position)
        .bind(key.series_number)
        .bind(officer_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn deactivate_stale(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE edit_sessions
            SET active = FALSE
            WHERE active AND last_refresh <= $1
            "#,
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
