use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::{
    ResultsEngine,
    dto::results::{LeaseRequest, LeaseResponse, ReleaseLeaseResponse},
};
use validator::Validate;

use crate::error::WebError;

#[utoipa::path(
    post,
    path = "/api/competitions/{competition_id}/leases",
    params(
        ("competition_id" = i64, Path, description = "Competition id")
    ),
    request_body = LeaseRequest,
    responses(
        (status = 200, description = "Lease granted or refreshed", body = LeaseResponse),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Competition not found"),
        (status = 409, description = "Slot is held by another officer", body = LeaseResponse)
    ),
    tag = "leases"
)]
pub async fn acquire_lease(
    State(engine): State<ResultsEngine>,
    Path(competition_id): Path<i64>,
    Json(req): Json<LeaseRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let response = engine.acquire_edit_lease(competition_id, &req).await?;
    let status = match response {
        LeaseResponse::Granted { .. } => StatusCode::OK,
        LeaseResponse::Conflict { .. } => StatusCode::CONFLICT,
    };

    Ok((status, Json(response)).into_response())
}

#[utoipa::path(
    delete,
    path = "/api/competitions/{competition_id}/leases",
    params(
        ("competition_id" = i64, Path, description = "Competition id")
    ),
    request_body = LeaseRequest,
    responses(
        (status = 200, description = "Whether the caller's lease was released", body = ReleaseLeaseResponse),
        (status = 400, description = "Validation error")
    ),
    tag = "leases"
)]
pub async fn release_lease(
    State(engine): State<ResultsEngine>,
    Path(competition_id): Path<i64>,
    Json(req): Json<LeaseRequest>,
) -> Result<Json<ReleaseLeaseResponse>, WebError> {
    req.validate()?;

    let response = engine.release_edit_lease(competition_id, &req).await?;

    Ok(Json(response))
}
