//! Leaderboard construction.
//!
//! Entries are aggregated per `(member, class)`, ordered by total score,
//! then inner tens, then a pluggable [`TieBreak`], and finally grouped by
//! class in taxonomy order.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::dto::leaderboard::{ClassGroup, SeriesBreakdown, ShooterResult};
use crate::models::{ClassTaxonomy, Registration, ResultEntry, SeriesFormat};

/// Orders two shooters already tied on total score and inner tens.
/// `Ordering::Less` means `a` ranks ahead of `b`.
pub trait TieBreak: Send + Sync {
    fn compare(&self, a: &ShooterResult, b: &ShooterResult, format: &SeriesFormat) -> Ordering;
}

/// Compares series scores from the most recent backwards; the first
/// difference decides. When both shooters completed the finals, the finals
/// series are examined before any qualification series.
///
/// Finals are numbered after qualification, so with the standard layout
/// this yields the same order as a plain last-to-first walk over every
/// series. Any change to series numbering or finals handling must keep
/// finals ahead of qualification explicitly.
#[derive(Debug, Clone, Copy, Default)]
pub struct Countback;

impl Countback {
    fn compare_series(
        a: &ShooterResult,
        b: &ShooterResult,
        series_numbers: impl Iterator<Item = i32>,
    ) -> Ordering {
        for series_number in series_numbers {
            let a_score = a.series_total(series_number).unwrap_or(0);
            let b_score = b.series_total(series_number).unwrap_or(0);
            let ordering = b_score.cmp(&a_score);
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

impl TieBreak for Countback {
    fn compare(&self, a: &ShooterResult, b: &ShooterResult, format: &SeriesFormat) -> Ordering {
        let qualification = format.qualification_series as i32;
        let all_series = format.total_series() as i32;
        let shot_finals = |s: &ShooterResult| s.recorded_series() >= all_series as usize;

        if format.has_finals() && shot_finals(a) && shot_finals(b) {
            return Self::compare_series(a, b, (qualification + 1..=all_series).rev())
                .then_with(|| Self::compare_series(a, b, (1..=qualification).rev()));
        }

        let last = a.last_series_number().max(b.last_series_number());
        Self::compare_series(a, b, (1..=last).rev())
    }
}

#[derive(Clone)]
pub struct RankingEngine {
    taxonomy: Arc<ClassTaxonomy>,
    tie_break: Arc<dyn TieBreak>,
}

impl RankingEngine {
    pub fn new(taxonomy: Arc<ClassTaxonomy>) -> Self {
        Self {
            taxonomy,
            tie_break: Arc::new(Countback),
        }
    }

    pub fn with_tie_break(mut self, tie_break: Arc<dyn TieBreak>) -> Self {
        self.tie_break = tie_break;
        self
    }

    pub fn taxonomy(&self) -> &ClassTaxonomy {
        &self.taxonomy
    }

    /// Full ranking order: total desc, inner tens desc, then the tie-break.
    pub fn compare(&self, a: &ShooterResult, b: &ShooterResult, format: &SeriesFormat) -> Ordering {
        b.total_score
            .cmp(&a.total_score)
            .then_with(|| b.total_inner_tens.cmp(&a.total_inner_tens))
            .then_with(|| self.tie_break.compare(a, b, format))
    }

    /// Builds ranked class groups from the raw entries of one competition.
    pub fn rank(
        &self,
        entries: &[ResultEntry],
        format: &SeriesFormat,
        registrations: &[Registration],
    ) -> Vec<ClassGroup> {
        let mut by_class: BTreeMap<String, Vec<ShooterResult>> = BTreeMap::new();
        for shooter in aggregate(entries, format, registrations) {
            by_class
                .entry(shooter.shooting_class.clone())
                .or_default()
                .push(shooter);
        }

        let mut groups: Vec<ClassGroup> = by_class
            .into_iter()
            .map(|(class_name, mut results)| {
                // Stable sort: complete ties keep member-id order.
                results.sort_by(|a, b| self.compare(a, b, format));
                self.assign_ranks(&mut results, format);

                ClassGroup {
                    weapon_group: self.taxonomy.lookup(&class_name).map(|c| c.weapon_group),
                    class_name,
                    results,
                }
            })
            .collect();

        groups.sort_by(|a, b| {
            self.taxonomy
                .sort_key(&a.class_name)
                .cmp(&self.taxonomy.sort_key(&b.class_name))
        });
        groups
    }

    fn assign_ranks(&self, results: &mut [ShooterResult], format: &SeriesFormat) {
        for i in 0..results.len() {
            let tied =
                i > 0 && self.compare(&results[i - 1], &results[i], format) == Ordering::Equal;
            results[i].rank = if tied { results[i - 1].rank } else { i as u32 + 1 };
        }
    }
}

/// Sums every `(member, class)` pair's series, ordered by member id.
/// Ranks are left at zero.
pub fn aggregate<'a>(
    entries: impl IntoIterator<Item = &'a ResultEntry>,
    format: &SeriesFormat,
    registrations: &[Registration],
) -> Vec<ShooterResult> {
    let registered: HashMap<i64, &Registration> =
        registrations.iter().map(|r| (r.member_id, r)).collect();

    let mut grouped: BTreeMap<(i64, &str), Vec<&ResultEntry>> = BTreeMap::new();
    for entry in entries {
        grouped
            .entry((entry.member_id, entry.shooting_class.as_str()))
            .or_default()
            .push(entry);
    }

    grouped
        .into_iter()
        .map(|((member_id, shooting_class), mut rows)| {
            rows.sort_by_key(|row| row.series_number);

            let series: Vec<SeriesBreakdown> = rows
                .iter()
                .map(|row| SeriesBreakdown {
                    series_number: row.series_number,
                    total: row.total,
                    inner_tens: row.inner_tens,
                    shots: row.shots.iter().map(|shot| shot.to_string()).collect(),
                    is_final: format.is_final(row.series_number),
                })
                .collect();

            let qualification_score = series.iter().filter(|s| !s.is_final).map(|s| s.total).sum();
            let finals: Vec<i32> = series.iter().filter(|s| s.is_final).map(|s| s.total).collect();
            let registration = registered.get(&member_id);

            ShooterResult {
                rank: 0,
                member_id,
                member_name: registration.map(|r| r.member_name.clone()),
                club: registration.and_then(|r| r.club.clone()),
                shooting_class: shooting_class.to_string(),
                total_score: series.iter().map(|s| s.total).sum(),
                total_inner_tens: series.iter().map(|s| s.inner_tens).sum(),
                qualification_score,
                finals_score: (!finals.is_empty()).then(|| finals.iter().sum()),
                series,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::models::Shot;

    /// Builds a plausible five-shot series adding up to `total`.
    fn shots_for(total: i32, inner_tens: i32) -> Vec<Shot> {
        let base = (total / 5) as u8;
        let extra = (total % 5) as usize;
        (0..5)
            .map(|i| {
                let value = if i < extra { base + 1 } else { base };
                if value == 10 && (i as i32) < inner_tens {
                    Shot::InnerTen
                } else {
                    Shot::Points(value)
                }
            })
            .collect()
    }

    fn entry(member_id: i64, class: &str, series_number: i32, total: i32, inner_tens: i32) -> ResultEntry {
        let now = Utc::now();
        ResultEntry {
            result_id: Uuid::new_v4(),
            competition_id: 1,
            member_id,
            series_number,
            shooting_class: class.to_string(),
            shots: shots_for(total, inner_tens),
            total,
            inner_tens,
            team_number: 1,
            position: member_id as i32,
            entered_by: 99,
            modified_by: 99,
            entered_at: now,
            last_modified: now,
        }
    }

    fn engine() -> RankingEngine {
        RankingEngine::new(Arc::new(ClassTaxonomy::standard()))
    }

    fn order(group: &ClassGroup) -> Vec<i64> {
        group.results.iter().map(|r| r.member_id).collect()
    }

    #[test]
    fn test_orders_by_total_then_inner_tens() {
        let entries = vec![
            entry(1, "A1", 1, 50, 0),
            entry(2, "A1", 1, 50, 5),
            entry(3, "A1", 1, 45, 0),
        ];
        let groups = engine().rank(&entries, &SeriesFormat::new(1, 0), &[]);

        assert_eq!(groups.len(), 1);
        assert_eq!(order(&groups[0]), vec![2, 1, 3]);
        let ranks: Vec<u32> = groups[0].results.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    #[test]
    fn test_countback_uses_latest_series_first() {
        // Equal totals and inner tens; member 1 shot 44 last, member 2 shot 43 last.
        let entries = vec![
            entry(2, "B1", 1, 44, 0),
            entry(2, "B1", 2, 43, 0),
            entry(1, "B1", 1, 43, 0),
            entry(1, "B1", 2, 44, 0),
        ];
        let groups = engine().rank(&entries, &SeriesFormat::new(2, 0), &[]);

        assert_eq!(order(&groups[0]), vec![1, 2]);
        assert_eq!(groups[0].results[1].rank, 2);
    }

    #[test]
    fn test_finals_decide_before_qualification() {
        let format = SeriesFormat::new(4, 2);
        let mut entries = Vec::new();
        // Member 1 is weaker in the last qualification series but stronger in the last final.
        for (series, total) in [(1, 45), (2, 45), (3, 45), (4, 40), (5, 47), (6, 48)] {
            entries.push(entry(1, "C1", series, total, 0));
        }
        for (series, total) in [(1, 40), (2, 45), (3, 45), (4, 45), (5, 48), (6, 47)] {
            entries.push(entry(2, "C1", series, total, 0));
        }
        let groups = engine().rank(&entries, &format, &[]);
        let results = &groups[0].results;

        assert_eq!(order(&groups[0]), vec![1, 2]);
        assert_eq!(results[0].finals_score, Some(95));
        assert_eq!(results[0].qualification_score, 175);
        assert!(results[0].series[4].is_final);
    }

    #[test]
    fn test_countback_without_finals_record_compares_all_series() {
        let format = SeriesFormat::new(2, 1);
        let entries = vec![
            entry(1, "A2", 1, 45, 0),
            entry(1, "A2", 2, 40, 0),
            entry(2, "A2", 1, 40, 0),
            entry(2, "A2", 2, 45, 0),
        ];
        let groups = engine().rank(&entries, &format, &[]);

        assert_eq!(order(&groups[0]), vec![2, 1]);
        assert_eq!(groups[0].results[0].finals_score, None);
    }

    #[test]
    fn test_identical_records_share_rank_in_member_order() {
        let entries = vec![
            entry(9, "R1", 1, 47, 1),
            entry(4, "R1", 1, 47, 1),
            entry(6, "R1", 1, 48, 0),
        ];
        let groups = engine().rank(&entries, &SeriesFormat::new(1, 0), &[]);
        let ranks: Vec<(i64, u32)> = groups[0].results.iter().map(|r| (r.member_id, r.rank)).collect();

        assert_eq!(ranks, vec![(6, 1), (4, 2), (9, 2)]);
    }

    #[test]
    fn test_classes_follow_taxonomy_not_alphabet() {
        let entries = vec![
            entry(1, "R1", 1, 40, 0),
            entry(2, "Open", 1, 40, 0),
            entry(3, "CD1", 1, 40, 0),
            entry(4, "C3", 1, 40, 0),
            entry(5, "A3", 1, 40, 0),
        ];
        let groups = engine().rank(&entries, &SeriesFormat::new(1, 0), &[]);
        let classes: Vec<&str> = groups.iter().map(|g| g.class_name.as_str()).collect();

        assert_eq!(classes, vec!["A3", "C3", "CD1", "R1", "Open"]);
        assert_eq!(groups[4].weapon_group, None);
    }

    #[test]
    fn test_member_in_two_classes_is_ranked_in_each() {
        let entries = vec![entry(1, "A1", 1, 40, 0), entry(1, "C1", 2, 42, 0)];
        let groups = engine().rank(&entries, &SeriesFormat::new(2, 0), &[]);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].results[0].total_score, 40);
        assert_eq!(groups[1].results[0].total_score, 42);
    }

    #[test]
    fn test_registrations_enrich_results() {
        let registrations = vec![Registration {
            member_id: 1,
            member_name: "Karin Lind".to_string(),
            club: Some("Norrby PK".to_string()),
            shooting_class: "A1".to_string(),
        }];
        let groups = engine().rank(&[entry(1, "A1", 1, 40, 0)], &SeriesFormat::new(1, 0), &registrations);
        let result = &groups[0].results[0];

        assert_eq!(result.member_name.as_deref(), Some("Karin Lind"));
        assert_eq!(result.club.as_deref(), Some("Norrby PK"));
    }

    struct ReverseMemberId;

    impl TieBreak for ReverseMemberId {
        fn compare(&self, a: &ShooterResult, b: &ShooterResult, _: &SeriesFormat) -> Ordering {
            b.member_id.cmp(&a.member_id)
        }
    }

    #[test]
    fn test_tie_break_is_swappable() {
        let entries = vec![entry(1, "A1", 1, 40, 0), entry(2, "A1", 1, 40, 0)];
        let engine = engine().with_tie_break(Arc::new(ReverseMemberId));
        let groups = engine.rank(&entries, &SeriesFormat::new(1, 0), &[]);

        assert_eq!(order(&groups[0]), vec![2, 1]);
    }

    #[test]
    fn test_finals_first_matches_last_to_first_walk() {
        let format = SeriesFormat::new(4, 2);
        let shooters = [
            [45, 45, 45, 40, 47, 48],
            [40, 45, 45, 45, 48, 47],
            [45, 44, 45, 45, 47, 48],
            [45, 45, 45, 45, 47, 47],
        ];
        let entries: Vec<ResultEntry> = shooters
            .iter()
            .enumerate()
            .flat_map(|(i, totals)| {
                totals
                    .iter()
                    .enumerate()
                    .map(move |(n, total)| entry(i as i64 + 1, "C1", n as i32 + 1, *total, 0))
            })
            .collect();
        let results = aggregate(&entries, &format, &[]);

        for a in &results {
            for b in &results {
                assert_eq!(
                    Countback.compare(a, b, &format),
                    Countback::compare_series(a, b, (1..=6).rev()),
                    "members {} and {}",
                    a.member_id,
                    b.member_id
                );
            }
        }
    }
}
