use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::{
    ResultsEngine,
    dto::results::{ScoringSheetRow, SubmitSeriesRequest, SubmitSeriesResponse},
    models::ResultEntry,
};
use validator::Validate;

use crate::error::WebError;

#[utoipa::path(
    get,
    path = "/api/competitions/{competition_id}/results",
    params(
        ("competition_id" = i64, Path, description = "Competition id")
    ),
    responses(
        (status = 200, description = "Every recorded series of the competition", body = Vec<ResultEntry>)
    ),
    tag = "results"
)]
pub async fn list_series_results(
    State(engine): State<ResultsEngine>,
    Path(competition_id): Path<i64>,
) -> Result<Json<Vec<ResultEntry>>, WebError> {
    let entries = engine.list_series_results(competition_id).await?;

    Ok(Json(entries))
}

#[utoipa::path(
    post,
    path = "/api/competitions/{competition_id}/results",
    params(
        ("competition_id" = i64, Path, description = "Competition id")
    ),
    request_body = SubmitSeriesRequest,
    responses(
        (status = 200, description = "Series recorded", body = SubmitSeriesResponse),
        (status = 400, description = "Malformed series or series number out of range"),
        (status = 404, description = "Competition or registration not found"),
        (status = 409, description = "Slot is held by another officer", body = SubmitSeriesResponse),
        (status = 502, description = "Registration directory unavailable")
    ),
    tag = "results"
)]
pub async fn submit_series_result(
    State(engine): State<ResultsEngine>,
    Path(competition_id): Path<i64>,
    Json(req): Json<SubmitSeriesRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let response = engine.submit_series_result(competition_id, &req).await?;
    let status = match response {
        SubmitSeriesResponse::Recorded { .. } => StatusCode::OK,
        SubmitSeriesResponse::Conflict { .. } => StatusCode::CONFLICT,
    };

    Ok((status, Json(response)).into_response())
}

#[utoipa::path(
    delete,
    path = "/api/competitions/{competition_id}/results/{member_id}/{series_number}",
    params(
        ("competition_id" = i64, Path, description = "Competition id"),
        ("member_id" = i64, Path, description = "Competitor member id"),
        ("series_number" = i32, Path, description = "Series number, starting at 1")
    ),
    responses(
        (status = 204, description = "Series deleted"),
        (status = 404, description = "No such series recorded")
    ),
    tag = "results"
)]
pub async fn delete_series_result(
    State(engine): State<ResultsEngine>,
    Path((competition_id, member_id, series_number)): Path<(i64, i64, i32)>,
) -> Result<StatusCode, WebError> {
    engine
        .delete_series_result(competition_id, member_id, series_number)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/competitions/{competition_id}/scoring-sheet",
    params(
        ("competition_id" = i64, Path, description = "Competition id")
    ),
    responses(
        (status = 200, description = "Scoring sheet in start-list order", body = Vec<ScoringSheetRow>),
        (status = 404, description = "Competition not found")
    ),
    tag = "results"
)]
pub async fn get_scoring_sheet(
    State(engine): State<ResultsEngine>,
    Path(competition_id): Path<i64>,
) -> Result<Json<Vec<ScoringSheetRow>>, WebError> {
    let rows = engine.scoring_sheet(competition_id).await?;

    Ok(Json(rows))
}
