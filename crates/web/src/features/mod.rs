use axum::Router;
use storage::ResultsEngine;

pub mod leases;
pub mod results;
pub mod standings;

/// Every per-competition route, mounted under `/api/competitions/:competition_id`.
pub fn routes() -> Router<ResultsEngine> {
    let competition = Router::new()
        .merge(leases::routes::routes())
        .merge(results::routes::routes())
        .merge(standings::routes::routes());

    Router::new().nest("/api/competitions/:competition_id", competition)
}
