use axum::{
    Json,
    extract::{Path, State},
};
use storage::{
    ResultsEngine,
    dto::{
        leaderboard::{ClassGroup, FinalResultsResponse},
        medals::MedalReport,
    },
};

use crate::error::WebError;

#[utoipa::path(
    get,
    path = "/api/competitions/{competition_id}/leaderboard",
    params(
        ("competition_id" = i64, Path, description = "Competition id")
    ),
    responses(
        (status = 200, description = "Live standings grouped by shooting class", body = Vec<ClassGroup>),
        (status = 404, description = "Competition not found")
    ),
    tag = "standings"
)]
pub async fn get_leaderboard(
    State(engine): State<ResultsEngine>,
    Path(competition_id): Path<i64>,
) -> Result<Json<Vec<ClassGroup>>, WebError> {
    let classes = engine.live_leaderboard(competition_id).await?;

    Ok(Json(classes))
}

#[utoipa::path(
    get,
    path = "/api/competitions/{competition_id}/final-results",
    params(
        ("competition_id" = i64, Path, description = "Competition id")
    ),
    responses(
        (status = 200, description = "Official snapshot if frozen, otherwise preliminary results", body = FinalResultsResponse),
        (status = 404, description = "Competition not found")
    ),
    tag = "standings"
)]
pub async fn get_final_results(
    State(engine): State<ResultsEngine>,
    Path(competition_id): Path<i64>,
) -> Result<Json<FinalResultsResponse>, WebError> {
    let results = engine.final_results(competition_id).await?;

    Ok(Json(results))
}

#[utoipa::path(
    post,
    path = "/api/competitions/{competition_id}/final-results/freeze",
    params(
        ("competition_id" = i64, Path, description = "Competition id")
    ),
    responses(
        (status = 200, description = "Results are official", body = FinalResultsResponse),
        (status = 404, description = "Competition not found")
    ),
    tag = "standings"
)]
pub async fn freeze_results(
    State(engine): State<ResultsEngine>,
    Path(competition_id): Path<i64>,
) -> Result<Json<FinalResultsResponse>, WebError> {
    let results = engine.freeze_results(competition_id).await?;

    Ok(Json(results))
}

#[utoipa::path(
    post,
    path = "/api/competitions/{competition_id}/final-results/unfreeze",
    params(
        ("competition_id" = i64, Path, description = "Competition id")
    ),
    responses(
        (status = 200, description = "Results are preliminary again", body = FinalResultsResponse),
        (status = 404, description = "Competition not found")
    ),
    tag = "standings"
)]
pub async fn unfreeze_results(
    State(engine): State<ResultsEngine>,
    Path(competition_id): Path<i64>,
) -> Result<Json<FinalResultsResponse>, WebError> {
    let results = engine.unfreeze_results(competition_id).await?;

    Ok(Json(results))
}

#[utoipa::path(
    get,
    path = "/api/competitions/{competition_id}/medals",
    params(
        ("competition_id" = i64, Path, description = "Competition id")
    ),
    responses(
        (status = 200, description = "Standard medal awards, null when the competition awards none", body = Option<MedalReport>),
        (status = 404, description = "Competition not found")
    ),
    tag = "standings"
)]
pub async fn get_medals(
    State(engine): State<ResultsEngine>,
    Path(competition_id): Path<i64>,
) -> Result<Json<Option<MedalReport>>, WebError> {
    let report = engine.medal_report(competition_id).await?;

    Ok(Json(report))
}
