//! Entry point for the request surface.
//!
//! [`ResultsEngine`] wires the stores, the lease manager, the ranking and
//! medal engines and the snapshot publisher together. Every lookup against
//! the registration directory happens before the first write, so a failed
//! lookup never leaves a partial submission behind.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use chrono::{Duration, Utc};
use validator::Validate;

use crate::Database;
use crate::dto::leaderboard::{ClassGroup, FinalResultsResponse};
use crate::dto::medals::MedalReport;
use crate::dto::results::{
    LeaseRequest, LeaseResponse, ReleaseLeaseResponse, ScoringSheetRow, SheetSeries,
    SubmitSeriesRequest, SubmitSeriesResponse,
};
use crate::error::{Result, StorageError};
use crate::models::{
    ClassTaxonomy, CompetitionConfig, FrozenResults, LeaseOutcome, NewSeriesResult, Registration,
    ResultEntry, ResultKey,
};
use crate::repository::{
    CompetitionDirectory, DirectoryRepository, ResultRepository, ResultStore, SessionRepository,
    SessionStore, SnapshotRepository, SnapshotStore,
};
use crate::services::medals::{MedalCalculator, PerSeriesThresholds, ThresholdProvider};
use crate::services::publisher::{PublicationState, SnapshotPublisher};
use crate::services::ranking::{RankingEngine, TieBreak};
use crate::services::scoring;
use crate::services::session_lock::{DEFAULT_LEASE_TTL_SECONDS, SessionLockManager};

/// Backing stores for a [`ResultsEngine`].
#[derive(Clone)]
pub struct EngineStores {
    pub results: Arc<dyn ResultStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub snapshots: Arc<dyn SnapshotStore>,
    pub directory: Arc<dyn CompetitionDirectory>,
}

impl EngineStores {
    pub fn postgres(db: &Database) -> Self {
        let pool = db.pool().clone();
        Self {
            results: Arc::new(ResultRepository::new(pool.clone())),
            sessions: Arc::new(SessionRepository::new(pool.clone())),
            snapshots: Arc::new(SnapshotRepository::new(pool.clone())),
            directory: Arc::new(DirectoryRepository::new(pool)),
        }
    }
}

/// Policy knobs of the engine.
#[derive(Clone)]
pub struct EngineSettings {
    pub lease_ttl: Duration,
    pub taxonomy: ClassTaxonomy,
    pub thresholds: Arc<dyn ThresholdProvider>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            lease_ttl: Duration::seconds(DEFAULT_LEASE_TTL_SECONDS),
            taxonomy: ClassTaxonomy::standard(),
            thresholds: Arc::new(PerSeriesThresholds::standard()),
        }
    }
}

#[derive(Clone)]
pub struct ResultsEngine {
    results: Arc<dyn ResultStore>,
    directory: Arc<dyn CompetitionDirectory>,
    locks: SessionLockManager,
    publisher: SnapshotPublisher,
    ranking: RankingEngine,
    medals: MedalCalculator,
}

impl ResultsEngine {
    pub fn new(stores: EngineStores, settings: EngineSettings) -> Result<Self> {
        let taxonomy = Arc::new(settings.taxonomy);

        Ok(Self {
            results: stores.results,
            directory: stores.directory,
            locks: SessionLockManager::new(stores.sessions, settings.lease_ttl)?,
            publisher: SnapshotPublisher::new(stores.snapshots),
            ranking: RankingEngine::new(taxonomy.clone()),
            medals: MedalCalculator::new(taxonomy, settings.thresholds),
        })
    }

    pub fn with_tie_break(mut self, tie_break: Arc<dyn TieBreak>) -> Self {
        self.ranking = self.ranking.with_tie_break(tie_break);
        self
    }

    pub fn lease_ttl(&self) -> Duration {
        self.locks.ttl()
    }

    pub async fn acquire_edit_lease(
        &self,
        competition_id: i64,
        request: &LeaseRequest,
    ) -> Result<LeaseResponse> {
        require_positive("competition_id", competition_id)?;
        request.validate()?;

        let config = self.competition_config(competition_id).await?;
        require_series_in_range(&config, request.series_number)?;

        let key = request.session_key(competition_id);
        match self.locks.try_acquire(key, request.officer_id).await? {
            LeaseOutcome::Granted(session) => Ok(LeaseResponse::Granted {
                lease_id: session.lease_id,
                holder_id: session.holder_id,
                expires_at: session.expires_at(self.locks.ttl()),
            }),
            LeaseOutcome::Conflict { holder_id } => Ok(LeaseResponse::Conflict {
                holder_id,
                holder_name: self.holder_name(holder_id).await,
            }),
        }
    }

    pub async fn release_edit_lease(
        &self,
        competition_id: i64,
        request: &LeaseRequest,
    ) -> Result<ReleaseLeaseResponse> {
        require_positive("competition_id", competition_id)?;
        request.validate()?;

        let released = self
            .locks
            .release(request.session_key(competition_id), request.officer_id)
            .await?;

        Ok(ReleaseLeaseResponse { released })
    }

    /// Records one series. The slot lease is taken (or refreshed) first; a
    /// conflict leaves the stored results untouched.
    pub async fn submit_series_result(
        &self,
        competition_id: i64,
        request: &SubmitSeriesRequest,
    ) -> Result<SubmitSeriesResponse> {
        require_positive("competition_id", competition_id)?;
        request.validate()?;
        let shots = scoring::parse_series(request.shots.as_slice())?;

        let config = self.competition_config(competition_id).await?;
        require_series_in_range(&config, request.series_number)?;

        let registrations = self.registrations(competition_id).await?;
        if !registrations.iter().any(|r| r.member_id == request.member_id) {
            tracing::debug!(
                "Member {} is not registered for competition {}",
                request.member_id,
                competition_id
            );
            return Err(StorageError::NotFound);
        }

        let key = request.lease_request().session_key(competition_id);
        if let LeaseOutcome::Conflict { holder_id } =
            self.locks.try_acquire(key, request.officer_id).await?
        {
            return Ok(SubmitSeriesResponse::Conflict {
                holder_id,
                holder_name: self.holder_name(holder_id).await,
            });
        }

        let score = scoring::score(&shots);
        let entry = self
            .results
            .upsert(NewSeriesResult {
                key: ResultKey::new(competition_id, request.member_id, request.series_number),
                shooting_class: request.shooting_class.clone(),
                shots,
                total: score.total,
                inner_tens: score.inner_tens,
                team_number: request.team_number,
                position: request.position,
                officer_id: request.officer_id,
            })
            .await?;

        tracing::debug!(
            "Recorded series {} for member {} in competition {}: {} ({}x)",
            entry.series_number,
            entry.member_id,
            competition_id,
            entry.total,
            entry.inner_tens
        );

        Ok(SubmitSeriesResponse::Recorded {
            result_id: entry.result_id,
            total: entry.total,
            inner_tens: entry.inner_tens,
        })
    }

    pub async fn delete_series_result(
        &self,
        competition_id: i64,
        member_id: i64,
        series_number: i32,
    ) -> Result<()> {
        require_positive("competition_id", competition_id)?;
        require_positive("member_id", member_id)?;
        require_positive("series_number", i64::from(series_number))?;

        let key = ResultKey::new(competition_id, member_id, series_number);
        if !self.results.delete(key).await? {
            return Err(StorageError::NotFound);
        }

        tracing::info!(
            "Deleted series {} of member {} in competition {}",
            series_number,
            member_id,
            competition_id
        );
        Ok(())
    }

    pub async fn list_series_results(&self, competition_id: i64) -> Result<Vec<ResultEntry>> {
        require_positive("competition_id", competition_id)?;
        self.results.list(competition_id).await
    }

    /// Always recomputed from the stored entries.
    pub async fn live_leaderboard(&self, competition_id: i64) -> Result<Vec<ClassGroup>> {
        let results = self.compute(competition_id).await?;
        Ok(results.classes)
    }

    pub async fn medal_report(&self, competition_id: i64) -> Result<Option<MedalReport>> {
        let results = self.compute(competition_id).await?;
        Ok(results.medals)
    }

    /// Official snapshot when frozen, otherwise a fresh preliminary result.
    pub async fn final_results(&self, competition_id: i64) -> Result<FinalResultsResponse> {
        require_positive("competition_id", competition_id)?;

        match self.publisher.state(competition_id).await? {
            PublicationState::Official(snapshot) => {
                let frozen = snapshot.frozen.unwrap_or_else(|| FrozenResults {
                    classes: Vec::new(),
                    medals: None,
                });
                Ok(FinalResultsResponse {
                    competition_id,
                    is_official: true,
                    last_updated: snapshot.last_updated,
                    classes: frozen.classes,
                    medals: frozen.medals,
                })
            }
            PublicationState::Preliminary => {
                let results = self.compute(competition_id).await?;
                Ok(FinalResultsResponse {
                    competition_id,
                    is_official: false,
                    last_updated: Utc::now(),
                    classes: results.classes,
                    medals: results.medals,
                })
            }
        }
    }

    /// Computes the results once and declares them official. Freezing an
    /// already official competition returns the existing snapshot.
    pub async fn freeze_results(&self, competition_id: i64) -> Result<FinalResultsResponse> {
        require_positive("competition_id", competition_id)?;

        if let PublicationState::Preliminary = self.publisher.state(competition_id).await? {
            let results = self.compute(competition_id).await?;
            self.publisher
                .freeze(competition_id, results, Utc::now())
                .await?;
        }

        self.final_results(competition_id).await
    }

    pub async fn unfreeze_results(&self, competition_id: i64) -> Result<FinalResultsResponse> {
        require_positive("competition_id", competition_id)?;

        self.publisher.unfreeze(competition_id, Utc::now()).await?;
        self.final_results(competition_id).await
    }

    /// One row per competitor for the range officers, in start-list order
    /// when a start list exists. Results are matched by member, so scores
    /// of competitors dropped from a regenerated start list still appear.
    pub async fn scoring_sheet(&self, competition_id: i64) -> Result<Vec<ScoringSheetRow>> {
        require_positive("competition_id", competition_id)?;
        self.competition_config(competition_id).await?;

        let registrations = self.registrations(competition_id).await?;
        let start_list = self
            .directory
            .start_list(competition_id)
            .await
            .map_err(external)?;
        let entries = self.results.list(competition_id).await?;

        let registered: HashMap<i64, &Registration> =
            registrations.iter().map(|r| (r.member_id, r)).collect();
        let mut by_member: BTreeMap<i64, Vec<&ResultEntry>> = BTreeMap::new();
        for entry in &entries {
            by_member.entry(entry.member_id).or_default().push(entry);
        }

        let slots: Vec<(Option<i32>, Option<i32>, i64, Option<&str>)> = match &start_list {
            Some(list) => list
                .iter()
                .map(|slot| {
                    (
                        Some(slot.team_number),
                        Some(slot.position),
                        slot.member_id,
                        Some(slot.weapon_class.as_str()),
                    )
                })
                .collect(),
            None => registrations
                .iter()
                .map(|r| (None, None, r.member_id, None))
                .collect(),
        };

        let mut listed = HashSet::new();
        let mut rows = Vec::with_capacity(slots.len());
        for (team_number, position, member_id, slot_class) in slots {
            listed.insert(member_id);
            let member_entries = by_member.get(&member_id).map(Vec::as_slice).unwrap_or(&[]);
            let shooting_class = registered
                .get(&member_id)
                .map(|r| r.shooting_class.as_str())
                .or_else(|| member_entries.first().map(|e| e.shooting_class.as_str()))
                .or(slot_class)
                .unwrap_or_default()
                .to_string();
            rows.push(sheet_row(
                team_number,
                position,
                member_id,
                registered.get(&member_id).map(|r| r.member_name.clone()),
                shooting_class,
                member_entries,
            ));
        }

        for (member_id, member_entries) in &by_member {
            if listed.contains(member_id) {
                continue;
            }
            let last = member_entries.last().copied();
            rows.push(sheet_row(
                last.map(|e| e.team_number),
                last.map(|e| e.position),
                *member_id,
                registered.get(member_id).map(|r| r.member_name.clone()),
                last.map(|e| e.shooting_class.clone()).unwrap_or_default(),
                member_entries,
            ));
        }

        Ok(rows)
    }

    pub async fn sweep_expired_leases(&self) -> Result<u64> {
        let swept = self.locks.sweep_expired(Utc::now()).await?;
        if swept > 0 {
            tracing::info!("Deactivated {} expired edit leases", swept);
        }
        Ok(swept)
    }

    async fn compute(&self, competition_id: i64) -> Result<FrozenResults> {
        require_positive("competition_id", competition_id)?;

        let config = self.competition_config(competition_id).await?;
        let registrations = self.registrations(competition_id).await?;
        let entries = self.results.list(competition_id).await?;

        let classes = self.ranking.rank(&entries, &config.format, &registrations);
        let medals = self.medals.calculate(&config, &entries, &registrations);

        Ok(FrozenResults { classes, medals })
    }

    async fn competition_config(&self, competition_id: i64) -> Result<CompetitionConfig> {
        self.directory
            .competition_config(competition_id)
            .await
            .map_err(external)?
            .ok_or(StorageError::NotFound)
    }

    async fn registrations(&self, competition_id: i64) -> Result<Vec<Registration>> {
        self.directory
            .registrations(competition_id)
            .await
            .map_err(external)
    }

    async fn holder_name(&self, holder_id: i64) -> String {
        match self.directory.member_name(holder_id).await {
            Ok(Some(name)) => name,
            Ok(None) => format!("Officer #{}", holder_id),
            Err(e) => {
                tracing::warn!("Could not resolve lease holder {}: {}", holder_id, e);
                format!("Officer #{}", holder_id)
            }
        }
    }
}

fn sheet_row(
    team_number: Option<i32>,
    position: Option<i32>,
    member_id: i64,
    member_name: Option<String>,
    shooting_class: String,
    entries: &[&ResultEntry],
) -> ScoringSheetRow {
    let mut series: Vec<SheetSeries> = entries
        .iter()
        .map(|e| SheetSeries {
            series_number: e.series_number,
            total: e.total,
            inner_tens: e.inner_tens,
        })
        .collect();
    series.sort_by_key(|s| s.series_number);

    ScoringSheetRow {
        team_number,
        position,
        member_id,
        member_name,
        shooting_class,
        total: series.iter().map(|s| s.total).sum(),
        inner_tens: series.iter().map(|s| s.inner_tens).sum(),
        series,
    }
}

/// Directory failures surface as collaborator errors; store errors that are
/// already domain outcomes pass through unchanged.
fn external(error: StorageError) -> StorageError {
    match error {
        StorageError::ExternalCollaborator(_) | StorageError::NotFound => error,
        other => StorageError::ExternalCollaborator(other.to_string()),
    }
}

fn require_positive(field: &str, value: i64) -> Result<()> {
    if value > 0 {
        Ok(())
    } else {
        Err(StorageError::Validation(format!(
            "{}: must be positive, got {}",
            field, value
        )))
    }
}

fn require_series_in_range(config: &CompetitionConfig, series_number: i32) -> Result<()> {
    if config.format.contains(series_number) {
        Ok(())
    } else {
        Err(StorageError::Validation(format!(
            "series_number: competition {} has series 1 to {}, got {}",
            config.competition_id,
            config.format.total_series(),
            series_number
        )))
    }
}
