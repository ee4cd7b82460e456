use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dto::leaderboard::ClassGroup;
use crate::dto::medals::MedalReport;

/// Payload captured when results are declared official.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrozenResults {
    pub classes: Vec<ClassGroup>,
    pub medals: Option<MedalReport>,
}

/// Publication state of one competition's results.
///
/// Preliminary snapshots carry no payload and are recomputed on every read;
/// official ones are served verbatim until unfrozen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSnapshot {
    pub competition_id: i64,
    pub is_official: bool,
    pub last_updated: DateTime<Utc>,
    pub frozen: Option<FrozenResults>,
}

impl ResultSnapshot {
    pub fn official(competition_id: i64, frozen: FrozenResults, now: DateTime<Utc>) -> Self {
        Self {
            competition_id,
            is_official: true,
            last_updated: now,
            frozen: Some(frozen),
        }
    }

    pub fn preliminary(competition_id: i64, now: DateTime<Utc>) -> Self {
        Self {
            competition_id,
            is_official: false,
            last_updated: now,
            frozen: None,
        }
    }

    pub fn frozen_results(&self) -> Option<&FrozenResults> {
        if self.is_official {
            self.frozen.as_ref()
        } else {
            None
        }
    }
}
