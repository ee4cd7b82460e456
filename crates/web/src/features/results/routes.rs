use axum::{
    Router,
    routing::{delete, get},
};
use storage::ResultsEngine;

use super::handlers::{delete_series_result, get_scoring_sheet, list_series_results, submit_series_result};

pub fn routes() -> Router<ResultsEngine> {
    Router::new()
        .route("/results", get(list_series_results).post(submit_series_result))
        .route(
            "/results/:member_id/:series_number",
            delete(delete_series_result),
        )
        .route("/scoring-sheet", get(get_scoring_sheet))
}
