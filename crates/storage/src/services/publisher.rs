use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::{Result, StorageError};
use crate::models::{FrozenResults, ResultSnapshot};
use crate::repository::SnapshotStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicationState {
    /// Readers recompute from live entries.
    Preliminary,
    /// Readers get the stored snapshot verbatim.
    Official(ResultSnapshot),
}

/// Two-state machine over a competition's published results:
/// `Preliminary --freeze--> Official --unfreeze--> Preliminary`.
#[derive(Clone)]
pub struct SnapshotPublisher {
    store: Arc<dyn SnapshotStore>,
}

impl SnapshotPublisher {
    pub fn new(store: Arc<dyn SnapshotStore>) -> Self {
        Self { store }
    }

    pub async fn state(&self, competition_id: i64) -> Result<PublicationState> {
        let snapshot = self.store.get(competition_id).await?;

        Ok(match snapshot {
            Some(snapshot) if snapshot.frozen_results().is_some() => {
                PublicationState::Official(snapshot)
            }
            _ => PublicationState::Preliminary,
        })
    }

    /// Stores `frozen` as the official result. If another caller froze the
    /// competition first, their snapshot wins and is returned instead.
    pub async fn freeze(
        &self,
        competition_id: i64,
        frozen: FrozenResults,
        now: DateTime<Utc>,
    ) -> Result<ResultSnapshot> {
        let snapshot = ResultSnapshot::official(competition_id, frozen, now);

        if self.store.freeze(&snapshot).await? {
            tracing::info!("Results for competition {} are now official", competition_id);
            return Ok(snapshot);
        }

        match self.state(competition_id).await? {
            PublicationState::Official(existing) => Ok(existing),
            PublicationState::Preliminary => Err(StorageError::ConstraintViolation(format!(
                "snapshot for competition {} changed while freezing",
                competition_id
            ))),
        }
    }

    /// Returns whether the competition was official.
    pub async fn unfreeze(&self, competition_id: i64, now: DateTime<Utc>) -> Result<bool> {
        let unfrozen = self.store.unfreeze(competition_id, now).await?;
        if unfrozen {
            tracing::info!(
                "Results for competition {} returned to preliminary",
                competition_id
            );
        }
        Ok(unfrozen)
    }
}
