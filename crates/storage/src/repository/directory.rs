use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use crate::error::{Result, StorageError};
use crate::models::{
    CompetitionConfig, CompetitionScope, Registration, SeriesFormat, StartListEntry,
};

use super::CompetitionDirectory;

#[derive(FromRow)]
struct CompetitionRow {
    competition_id: i64,
    name: String,
    qualification_series: i32,
    finals_series: i32,
    award_standard_medals: bool,
    split_group_c: bool,
    scope: String,
    is_external: bool,
}

impl TryFrom<CompetitionRow> for CompetitionConfig {
    type Error = StorageError;

    fn try_from(row: CompetitionRow) -> Result<Self> {
        let qualification_series = u32::try_from(row.qualification_series).map_err(|_| {
            StorageError::ConstraintViolation("qualification_series must not be negative".into())
        })?;
        let finals_series = u32::try_from(row.finals_series).map_err(|_| {
            StorageError::ConstraintViolation("finals_series must not be negative".into())
        })?;
        let scope = row
            .scope
            .parse::<CompetitionScope>()
            .map_err(StorageError::ConstraintViolation)?;

        Ok(CompetitionConfig {
            competition_id: row.competition_id,
            name: row.name,
            format: SeriesFormat::new(qualification_series, finals_series),
            award_standard_medals: row.award_standard_medals,
            split_group_c: row.split_group_c,
            scope,
            is_external: row.is_external,
        })
    }
}

#[derive(FromRow)]
struct RegistrationRow {
    member_id: i64,
    member_name: String,
    club: Option<String>,
    shooting_class: String,
}

#[derive(FromRow)]
struct StartListRow {
    team_number: i32,
    position: i32,
    member_id: i64,
    weapon_class: String,
}

/// Reads competition settings, registrations and start lists maintained by
/// the club administration system.
#[derive(Clone)]
pub struct DirectoryRepository {
    pool: PgPool,
}

impl DirectoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CompetitionDirectory for DirectoryRepository {
    async fn competition_config(&self, competition_id: i64) -> Result<Option<CompetitionConfig>> {
        let row: Option<CompetitionRow> = sqlx::query_as(
            r#"
            SELECT competition_id, name, qualification_series, finals_series,
                   award_standard_medals, split_group_c, scope, is_external
            FROM competitions
            WHERE competition_id = $1
            "#,
        )
        .bind(competition_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(CompetitionConfig::try_from).transpose()
    }

    async fn registrations(&self, competition_id: i64) -> Result<Vec<Registration>> {
        let rows: Vec<RegistrationRow> = sqlx::query_as(
            r#"
            SELECT r.member_id,
                   m.first_name || ' ' || m.last_name AS member_name,
                   m.club,
                   r.shooting_class
            FROM registrations r
            INNER JOIN members m ON m.member_id = r.member_id
            WHERE r.competition_id = $1
            ORDER BY m.last_name, m.first_name, r.member_id
            "#,
        )
        .bind(competition_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| Registration {
                member_id: row.member_id,
                member_name: row.member_name,
                club: row.club,
                shooting_class: row.shooting_class,
            })
            .collect())
    }

    async fn start_list(&self, competition_id: i64) -> Result<Option<Vec<StartListEntry>>> {
        let rows: Vec<StartListRow> = sqlx::query_as(
            r#"
            SELECT team_number, position, member_id, weapon_class
            FROM start_list_entries
            WHERE competition_id = $1
            ORDER BY team_number, position
            "#,
        )
        .bind(competition_id)
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Ok(None);
        }

        Ok(Some(
            rows.into_iter()
                .map(|row| StartListEntry {
                    team_number: row.team_number,
                    position: row.position,
                    member_id: row.member_id,
                    weapon_class: row.weapon_class,
                })
                .collect(),
        ))
    }

    async fn member_name(&self, member_id: i64) -> Result<Option<String>> {
        let name: Option<String> = sqlx::query_scalar(
            r#"
            SELECT first_name || ' ' || last_name
            FROM members
            WHERE member_id = $1
            "#,
        )
        .bind(member_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(name)
    }
}
