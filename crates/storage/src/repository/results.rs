use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::{NewSeriesResult, ResultEntry, ResultKey, Shot};

use super::ResultStore;

#[derive(FromRow)]
struct ResultRow {
    result_id: Uuid,
    competition_id: i64,
    member_id: i64,
    series_number: i32,
    shooting_class: String,
    shots: Vec<String>,
    total: i32,
    inner_tens: i32,
    team_number: i32,
    position: i32,
    entered_by: i64,
    modified_by: i64,
    entered_at: DateTime<Utc>,
    last_modified: DateTime<Utc>,
}

impl TryFrom<ResultRow> for ResultEntry {
    type Error = StorageError;

    fn try_from(row: ResultRow) -> Result<Self> {
        let shots = row
            .shots
            .iter()
            .map(|token| token.parse::<Shot>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| {
                StorageError::ConstraintViolation(format!(
                    "stored result {} has a corrupt shot: {}",
                    row.result_id, e
                ))
            })?;

        Ok(ResultEntry {
            result_id: row.result_id,
            competition_id: row.competition_id,
            member_id: row.member_id,
            series_number: row.series_number,
            shooting_class: row.shooting_class,
            shots,
            total: row.total,
            inner_tens: row.inner_tens,
            team_number: row.team_number,
            position: row.position,
            entered_by: row.entered_by,
            modified_by: row.modified_by,
            entered_at: row.entered_at,
            last_modified: row.last_modified,
        })
    }
}

const RESULT_COLUMNS: &str = "result_id, competition_id, member_id, series_number, shooting_class, \
     shots, total, inner_tens, team_number, position, entered_by, modified_by, entered_at, \
     last_modified";

/// Repository for series results
#[derive(Clone)]
pub struct ResultRepository {
    pool: PgPool,
}

impl ResultRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResultStore for ResultRepository {
    async fn upsert(&self, result: NewSeriesResult) -> Result<ResultEntry> {
        let shots: Vec<String> = result.shots.iter().map(Shot::to_string).collect();

        // Creation metadata (id, entered_by, entered_at) survives the update.
        let query = format!(
            r#"
            INSERT INTO result_entries (
                result_id, competition_id, member_id, series_number, shooting_class,
                shots, total, inner_tens, team_number, position,
                entered_by, modified_by, entered_at, last_modified
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11, NOW(), NOW())
            ON CONFLICT (competition_id, member_id, series_number)
            DO UPDATE SET
                shooting_class = EXCLUDED.shooting_class,
                shots = EXCLUDED.shots,
                total = EXCLUDED.total,
                inner_tens = EXCLUDED.inner_tens,
                team_number = EXCLUDED.team_number,
                position = EXCLUDED.position,
                modified_by = EXCLUDED.modified_by,
                last_modified = EXCLUDED.last_modified
            RETURNING {RESULT_COLUMNS}
            "#
        );

        let row: ResultRow = sqlx::query_as(&query)
            .bind(Uuid::new_v4())
            .bind(result.key.competition_id)
            .bind(result.key.member_id)
            .bind(result.key.series_number)
            .bind(&result.shooting_class)
            .bind(&shots)
            .bind(result.total)
            .bind(result.inner_tens)
            .bind(result.team_number)
            .bind(result.position)
            .bind(result.officer_id)
            .fetch_one(&self.pool)
            .await?;

        row.try_into()
    }

    async fn delete(&self, key: ResultKey) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM result_entries
            WHERE competition_id = $1 AND member_id = $2 AND series_number = $3
            "#,
        )
        .bind(key.competition_id)
        .bind(key.member_id)
        .bind(key.series_number)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, competition_id: i64) -> Result<Vec<ResultEntry>> {
        let query = format!(
            r#"
            SELECT {RESULT_COLUMNS}
            FROM result_entries
            WHERE competition_id = $1
            ORDER BY team_number, position, series_number, member_id
            "#
        );

        let rows: Vec<ResultRow> = sqlx::query_as(&query)
            .bind(competition_id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(ResultEntry::try_from).collect()
    }
}
