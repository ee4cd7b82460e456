use axum::{
    Router,
    routing::{get, post},
};
use storage::ResultsEngine;

use super::handlers::{
    freeze_results, get_final_results, get_leaderboard, get_medals, unfreeze_results,
};

pub fn routes() -> Router<ResultsEngine> {
    Router::new()
        .route("/leaderboard", get(get_leaderboard))
        .route("/final-results", get(get_final_results))
        .route("/final-results/freeze", post(freeze_results))
        .route("/final-results/unfreeze", post(unfreeze_results))
        .route("/medals", get(get_medals))
}
