use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::dto::medals::MedalReport;
use crate::models::WeaponGroup;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SeriesBreakdown {
    pub series_number: i32,
    pub total: i32,
    pub inner_tens: i32,
    pub shots: Vec<String>,
    pub is_final: bool,
}

/// A competitor's aggregated standing within one shooting class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ShooterResult {
    pub rank: u32,
    pub member_id: i64,
    pub member_name: Option<String>,
    pub club: Option<String>,
    pub shooting_class: String,
    pub total_score: i32,
    pub total_inner_tens: i32,
    pub qualification_score: i32,
    pub finals_score: Option<i32>,
    /// Ordered by series number.
    pub series: Vec<SeriesBreakdown>,
}

impl ShooterResult {
    pub fn series_total(&self, series_number: i32) -> Option<i32> {
        self.series
            .iter()
            .find(|s| s.series_number == series_number)
            .map(|s| s.total)
    }

    pub fn recorded_series(&self) -> usize {
        self.series.len()
    }

    pub fn last_series_number(&self) -> i32 {
        self.series.last().map(|s| s.series_number).unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ClassGroup {
    pub class_name: String,
    pub weapon_group: Option<WeaponGroup>,
    pub results: Vec<ShooterResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FinalResultsResponse {
    pub competition_id: i64,
    pub is_official: bool,
    pub last_updated: DateTime<Utc>,
    pub classes: Vec<ClassGroup>,
    pub medals: Option<MedalReport>,
}
