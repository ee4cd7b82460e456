//! Standard medal awards.
//!
//! Medals are judged on qualification series only, pooled across shooting
//! classes by weapon group. Score thresholds come from a
//! [`ThresholdProvider`] so rule changes stay out of the calculator.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::dto::leaderboard::ShooterResult;
use crate::dto::medals::{MedalAward, MedalCohortResult, MedalReport, MedalTier};
use crate::models::{ClassTaxonomy, Cohort, CompetitionConfig, Registration, ResultEntry, WeaponGroup};
use crate::services::ranking;

/// Minimum qualification totals for each tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdTable {
    pub bronze: i32,
    pub silver: i32,
    pub gold: i32,
}

impl ThresholdTable {
    pub fn tier_for(&self, score: i32) -> Option<MedalTier> {
        if score >= self.gold {
            Some(MedalTier::Gold)
        } else if score >= self.silver {
            Some(MedalTier::Silver)
        } else if score >= self.bronze {
            Some(MedalTier::Bronze)
        } else {
            None
        }
    }

    fn scaled(&self, factor: i32) -> Self {
        Self {
            bronze: self.bronze * factor,
            silver: self.silver * factor,
            gold: self.gold * factor,
        }
    }
}

pub trait ThresholdProvider: Send + Sync {
    /// `None` when no medals are defined for the group at this length.
    fn thresholds(&self, weapon_group: WeaponGroup, series_count: u32) -> Option<ThresholdTable>;
}

/// Thresholds expressed per series and multiplied by the series count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PerSeriesThresholds {
    per_series: BTreeMap<WeaponGroup, ThresholdTable>,
}

impl PerSeriesThresholds {
    pub fn new(per_series: BTreeMap<WeaponGroup, ThresholdTable>) -> Self {
        Self { per_series }
    }

    pub fn standard() -> Self {
        let table = |bronze, silver, gold| ThresholdTable {
            bronze,
            silver,
            gold,
        };

        Self::new(BTreeMap::from([
            (WeaponGroup::A, table(41, 44, 46)),
            (WeaponGroup::B, table(40, 43, 45)),
            (WeaponGroup::C, table(42, 45, 47)),
            (WeaponGroup::R, table(39, 42, 44)),
        ]))
    }
}

impl Default for PerSeriesThresholds {
    fn default() -> Self {
        Self::standard()
    }
}

impl ThresholdProvider for PerSeriesThresholds {
    fn thresholds(&self, weapon_group: WeaponGroup, series_count: u32) -> Option<ThresholdTable> {
        if series_count == 0 {
            return None;
        }
        let factor = i32::try_from(series_count).ok()?;
        self.per_series
            .get(&weapon_group)
            .map(|table| table.scaled(factor))
    }
}

#[derive(Clone)]
pub struct MedalCalculator {
    taxonomy: Arc<ClassTaxonomy>,
    thresholds: Arc<dyn ThresholdProvider>,
}

impl MedalCalculator {
    pub fn new(taxonomy: Arc<ClassTaxonomy>, thresholds: Arc<dyn ThresholdProvider>) -> Self {
        Self {
            taxonomy,
            thresholds,
        }
    }

    /// Returns `None` when the competition does not award standard medals.
    ///
    /// Only shooters who completed every qualification series can earn a
    /// tier; shooters in classes missing from the taxonomy are left out.
    pub fn calculate(
        &self,
        config: &CompetitionConfig,
        entries: &[ResultEntry],
        registrations: &[Registration],
    ) -> Option<MedalReport> {
        if !config.awards_medals() {
            return None;
        }

        let format = &config.format;
        let series_count = format.qualification_series;
        let qualification = entries.iter().filter(|e| !format.is_final(e.series_number));

        let mut cohorts: BTreeMap<(WeaponGroup, Option<Cohort>), Vec<ShooterResult>> =
            BTreeMap::new();
        for shooter in ranking::aggregate(qualification, format, registrations) {
            let Some(class) = self.taxonomy.lookup(&shooter.shooting_class) else {
                tracing::debug!(
                    "Skipping medal evaluation for member {} in unknown class {}",
                    shooter.member_id,
                    shooter.shooting_class
                );
                continue;
            };

            let cohort = (config.split_group_c && class.weapon_group == WeaponGroup::C)
                .then_some(class.cohort);
            cohorts
                .entry((class.weapon_group, cohort))
                .or_default()
                .push(shooter);
        }

        let cohorts = cohorts
            .into_iter()
            .map(|((weapon_group, cohort), shooters)| {
                let table = self.thresholds.thresholds(weapon_group, series_count);
                if table.is_none() {
                    tracing::warn!(
                        "No medal thresholds for weapon group {} over {} series",
                        weapon_group,
                        series_count
                    );
                }

                let mut awards: Vec<MedalAward> = shooters
                    .iter()
                    .map(|shooter| {
                        let complete = shooter.recorded_series() >= series_count as usize;
                        MedalAward {
                            member_id: shooter.member_id,
                            member_name: shooter.member_name.clone(),
                            shooting_class: shooter.shooting_class.clone(),
                            qualification_score: shooter.qualification_score,
                            tier: table
                                .filter(|_| complete)
                                .and_then(|t| t.tier_for(shooter.qualification_score)),
                        }
                    })
                    .collect();
                awards.sort_by(|a, b| {
                    b.qualification_score
                        .cmp(&a.qualification_score)
                        .then_with(|| a.member_id.cmp(&b.member_id))
                });

                MedalCohortResult {
                    label: match cohort {
                        Some(cohort) => format!("{} {}", weapon_group, cohort.label()),
                        None => weapon_group.to_string(),
                    },
                    weapon_group,
                    cohort,
                    participants: shooters.len() as u32,
                    awards,
                }
            })
            .collect();

        Some(MedalReport {
            series_count,
            cohorts,
        })
    }
}
