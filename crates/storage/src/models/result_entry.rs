use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::shot::{SHOTS_PER_SERIES, Shot};

/// Identity of a stored series result. Team and position are deliberately
/// absent so reshuffling a start list never orphans a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResultKey {
    pub competition_id: i64,
    pub member_id: i64,
    pub series_number: i32,
}

impl ResultKey {
    pub fn new(competition_id: i64, member_id: i64, series_number: i32) -> Self {
        Self {
            competition_id,
            member_id,
            series_number,
        }
    }
}

/// One competitor's shots for one series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ResultEntry {
    pub result_id: Uuid,
    pub competition_id: i64,
    pub member_id: i64,
    pub series_number: i32,
    pub shooting_class: String,
    #[schema(value_type = Vec<String>)]
    pub shots: Vec<Shot>,
    pub total: i32,
    pub inner_tens: i32,
    pub team_number: i32,
    pub position: i32,
    pub entered_by: i64,
    pub modified_by: i64,
    pub entered_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

impl ResultEntry {
    pub fn key(&self) -> ResultKey {
        ResultKey::new(self.competition_id, self.member_id, self.series_number)
    }
}

/// Validated, scored input for a result upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSeriesResult {
    pub key: ResultKey,
    pub shooting_class: String,
    pub shots: [Shot; SHOTS_PER_SERIES],
    pub total: i32,
    pub inner_tens: i32,
    pub team_number: i32,
    pub position: i32,
    pub officer_id: i64,
}

impl NewSeriesResult {
    /// Row produced when the key has no stored result yet.
    pub fn into_entry(self, result_id: Uuid, now: DateTime<Utc>) -> ResultEntry {
        ResultEntry {
            result_id,
            competition_id: self.key.competition_id,
            member_id: self.key.member_id,
            series_number: self.key.series_number,
            shooting_class: self.shooting_class,
            shots: self.shots.to_vec(),
            total: self.total,
            inner_tens: self.inner_tens,
            team_number: self.team_number,
            position: self.position,
            entered_by: self.officer_id,
            modified_by: self.officer_id,
            entered_at: now,
            last_modified: now,
        }
    }

    /// Overwrites score-bearing fields and display metadata on an existing
    /// row, keeping its id and creation metadata.
    pub fn apply_to(self, existing: &mut ResultEntry, now: DateTime<Utc>) {
        existing.shooting_class = self.shooting_class;
        existing.shots = self.shots.to_vec();
        existing.total = self.total;
        existing.inner_tens = self.inner_tens;
        existing.team_number = self.team_number;
        existing.position = self.position;
        existing.modified_by = self.officer_id;
        existing.last_modified = now;
    }
}
