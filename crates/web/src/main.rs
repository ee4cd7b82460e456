use std::time::Duration;

use anyhow::Context;
use axum::Router;
use storage::{
    Database, ResultsEngine,
    services::engine::EngineStores,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod error;
mod features;
mod sweeper;

use config::Config;
use features::{leases, results, standings};

#[derive(OpenApi)]
#[openapi(
    paths(
        leases::handlers::acquire_lease,
        leases::handlers::release_lease,
        results::handlers::list_series_results,
        results::handlers::submit_series_result,
        results::handlers::delete_series_result,
        results::handlers::get_scoring_sheet,
        standings::handlers::get_leaderboard,
        standings::handlers::get_final_results,
        standings::handlers::freeze_results,
        standings::handlers::unfreeze_results,
        standings::handlers::get_medals,
    ),
    components(
        schemas(
            storage::dto::results::LeaseRequest,
            storage::dto::results::LeaseResponse,
            storage::dto::results::ReleaseLeaseResponse,
            storage::dto::results::SubmitSeriesRequest,
            storage::dto::results::SubmitSeriesResponse,
            storage::dto::results::ScoringSheetRow,
            storage::dto::results::SheetSeries,
            storage::dto::leaderboard::ClassGroup,
            storage::dto::leaderboard::ShooterResult,
            storage::dto::leaderboard::SeriesBreakdown,
            storage::dto::leaderboard::FinalResultsResponse,
            storage::dto::medals::MedalReport,
            storage::dto::medals::MedalCohortResult,
            storage::dto::medals::MedalAward,
            storage::dto::medals::MedalTier,
            storage::models::ResultEntry,
            storage::models::WeaponGroup,
            storage::models::Cohort,
        )
    ),
    tags(
        (name = "leases", description = "Edit leases on scoring slots"),
        (name = "results", description = "Series result entry"),
        (name = "standings", description = "Leaderboards, official results and medals"),
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting shooting results API");

    let config = Config::from_env().context("Failed to load API configuration")?;
    tracing::info!("Configuration loaded successfully");

    tracing::info!(
        "Connecting to database at: {}",
        config
            .database_url
            .split('@')
            .next_back()
            .unwrap_or("unknown")
    );
    let db = Database::new(&config.database_url)
        .await
        .context("Failed to initialize database")?;
    tracing::info!("Database connection established");

    tracing::info!("Running database migrations");
    db.run_migrations()
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Database migrations completed successfully");

    let settings = config
        .engine_settings()
        .context("Failed to load engine settings")?;
    let engine = ResultsEngine::new(EngineStores::postgres(&db), settings)
        .context("Failed to build results engine")?;
    tracing::info!("Edit leases expire after {}s", engine.lease_ttl().num_seconds());

    let sweeper = sweeper::spawn_lease_sweeper(
        engine.clone(),
        Duration::from_secs(config.lease_sweep_interval_seconds),
    );

    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(features::routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(engine);

    let bind_address = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting server at http://{}", bind_address);
    tracing::info!(
        "Swagger UI available at http://{}/swagger-ui/",
        bind_address
    );

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
