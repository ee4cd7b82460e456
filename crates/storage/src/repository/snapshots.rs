use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};

use crate::error::Result;
use crate::models::{FrozenResults, ResultSnapshot};

use super::SnapshotStore;

#[derive(FromRow)]
struct SnapshotRow {
    competition_id: i64,
    is_official: bool,
    last_updated: DateTime<Utc>,
    frozen_results: Option<Json<FrozenResults>>,
}

impl From<SnapshotRow> for ResultSnapshot {
    fn from(row: SnapshotRow) -> Self {
        Self {
            competition_id: row.competition_id,
            is_official: row.is_official,
            last_updated: row.last_updated,
            frozen: row.frozen_results.map(|Json(frozen)| frozen),
        }
    }
}

/// Repository for published result snapshots
#[derive(Clone)]
pub struct SnapshotRepository {
    pool: PgPool,
}

impl SnapshotRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SnapshotStore for SnapshotRepository {
    async fn get(&self, competition_id: i64) -> Result<Option<ResultSnapshot>> {
        let row: Option<SnapshotRow> = sqlx::query_as(
            r#"
            SELECT competition_id, is_official, last_updated, frozen_results
            FROM result_snapshots
            WHERE competition_id = $1
            "#,
        )
        .bind(competition_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ResultSnapshot::from))
    }

    async fn freeze(&self, snapshot: &ResultSnapshot) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO result_snapshots (competition_id, is_official, last_updated, frozen_results)
            VALUES ($1, TRUE, $2, $3)
            ON CONFLICT (competition_id)
            DO UPDATE SET
                is_official = TRUE,
                last_updated = EXCLUDED.last_updated,
                frozen_results = EXCLUDED.frozen_results
            WHERE NOT result_snapshots.is_official
            "#,
        )
        .bind(snapshot.competition_id)
        .bind(snapshot.last_updated)
        .bind(snapshot.frozen.as_ref().map(Json))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn unfreeze(&self, competition_id: i64, now: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE result_snapshots
            SET is_official = FALSE,
                last_updated = $2,
                frozen_results = NULL
            WHERE competition_id = $1 AND is_official
            "#,
        )
        .bind(competition_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
