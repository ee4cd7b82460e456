use std::cmp::Ordering;
use std::sync::Arc;

use chrono::Utc;
use proptest::prelude::*;
use uuid::Uuid;

use storage::models::{ClassTaxonomy, ResultEntry, SeriesFormat, Shot};
use storage::services::ranking::RankingEngine;
use storage::services::scoring;

fn shot_strategy() -> impl Strategy<Value = Shot> {
    prop_oneof![
        (0u8..=10).prop_map(Shot::Points),
        Just(Shot::InnerTen),
    ]
}

fn series_strategy() -> impl Strategy<Value = [Shot; 5]> {
    prop::array::uniform5(shot_strategy())
}

fn entry(member_id: i64, series_number: i32, shots: [Shot; 5]) -> ResultEntry {
    let score = scoring::score(&shots);
    let now = Utc::now();
    ResultEntry {
        result_id: Uuid::new_v4(),
        competition_id: 1,
        member_id,
        series_number,
        shooting_class: "B1".to_string(),
        shots: shots.to_vec(),
        total: score.total,
        inner_tens: score.inner_tens,
        team_number: 1,
        position: 1,
        entered_by: 1,
        modified_by: 1,
        entered_at: now,
        last_modified: now,
    }
}

proptest! {
    #[test]
    fn series_score_stays_in_bounds(shots in series_strategy()) {
        let score = scoring::score(&shots);
        let tokens: Vec<String> = shots.iter().map(Shot::to_string).collect();

        prop_assert!((0..=50).contains(&score.total));
        prop_assert!((0..=5).contains(&score.inner_tens));
        prop_assert!(score.inner_tens * 10 <= score.total);
        prop_assert_eq!(scoring::parse_series(&tokens).unwrap(), shots);
    }

    #[test]
    fn ranking_is_a_consistent_order(
        shooters in prop::collection::vec(prop::collection::vec(series_strategy(), 3), 1..12)
    ) {
        let format = SeriesFormat::new(3, 0);
        let entries: Vec<ResultEntry> = shooters
            .iter()
            .enumerate()
            .flat_map(|(i, series)| {
                series
                    .iter()
                    .enumerate()
                    .map(move |(n, shots)| entry(i as i64 + 1, n as i32 + 1, *shots))
            })
            .collect();

        let engine = RankingEngine::new(Arc::new(ClassTaxonomy::standard()));
        let classes = engine.rank(&entries, &format, &[]);
        prop_assert_eq!(classes.len(), 1);
        let results = &classes[0].results;
        prop_assert_eq!(results.len(), shooters.len());

        for (i, pair) in results.windows(2).enumerate() {
            let ordering = engine.compare(&pair[0], &pair[1], &format);
            prop_assert_ne!(ordering, Ordering::Greater);
            prop_assert!(pair[0].total_score >= pair[1].total_score);
            if ordering == Ordering::Equal {
                prop_assert_eq!(pair[1].rank, pair[0].rank);
                prop_assert!(pair[0].member_id < pair[1].member_id);
            } else {
                prop_assert_eq!(pair[1].rank, i as u32 + 2);
            }
        }
        prop_assert_eq!(results[0].rank, 1);
    }
}
