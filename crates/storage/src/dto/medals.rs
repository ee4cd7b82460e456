use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Cohort, WeaponGroup};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum MedalTier {
    Bronze,
    Silver,
    Gold,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MedalAward {
    pub member_id: i64,
    pub member_name: Option<String>,
    pub shooting_class: String,
    pub qualification_score: i32,
    pub tier: Option<MedalTier>,
}

/// Shooters competing against the same threshold table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MedalCohortResult {
    pub label: String,
    pub weapon_group: WeaponGroup,
    /// Present when the weapon group is split into cohorts.
    pub cohort: Option<Cohort>,
    pub participants: u32,
    pub awards: Vec<MedalAward>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MedalReport {
    pub series_count: u32,
    pub cohorts: Vec<MedalCohortResult>,
}

impl MedalReport {
    pub fn tier_for(&self, member_id: i64) -> Option<MedalTier> {
        self.cohorts
            .iter()
            .flat_map(|cohort| cohort.awards.iter())
            .find(|award| award.member_id == member_id)
            .and_then(|award| award.tier)
    }
}
