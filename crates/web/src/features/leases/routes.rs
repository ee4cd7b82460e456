use axum::{Router, routing::post};
use storage::ResultsEngine;

use super::handlers::{acquire_lease, release_lease};

pub fn routes() -> Router<ResultsEngine> {
    Router::new().route("/leases", post(acquire_lease).delete(release_lease))
}
