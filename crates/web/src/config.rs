use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, ensure};
use chrono::Duration;
use storage::models::ClassTaxonomy;
use storage::services::engine::EngineSettings;
use storage::services::medals::PerSeriesThresholds;
use storage::services::session_lock::DEFAULT_LEASE_TTL_SECONDS;

const DEFAULT_SWEEP_INTERVAL_SECONDS: u64 = 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub lease_ttl_seconds: i64,
    pub lease_sweep_interval_seconds: u64,
    pub class_taxonomy_path: Option<PathBuf>,
    pub medal_thresholds_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let config = Self {
            host: std::env::var("HOST").context("Cannot load HOST env variable")?,
            port: std::env::var("PORT")
                .context("PORT must be a number")?
                .parse()?,
            database_url: std::env::var("DATABASE_URL")
                .context("Cannot load DATABASE_URL env variable")?,
            lease_ttl_seconds: optional_var("LEASE_TTL_SECONDS")?
                .unwrap_or(DEFAULT_LEASE_TTL_SECONDS),
            lease_sweep_interval_seconds: optional_var("LEASE_SWEEP_INTERVAL_SECONDS")?
                .unwrap_or(DEFAULT_SWEEP_INTERVAL_SECONDS),
            class_taxonomy_path: std::env::var_os("CLASS_TAXONOMY_PATH").map(PathBuf::from),
            medal_thresholds_path: std::env::var_os("MEDAL_THRESHOLDS_PATH").map(PathBuf::from),
        };

        ensure!(
            config.lease_ttl_seconds > 0,
            "LEASE_TTL_SECONDS must be positive, got {}",
            config.lease_ttl_seconds
        );
        ensure!(
            config.lease_sweep_interval_seconds > 0,
            "LEASE_SWEEP_INTERVAL_SECONDS must be positive"
        );

        Ok(config)
    }

    /// Builds engine settings, replacing the built-in class table and medal
    /// thresholds with the configured JSON files when present.
    pub fn engine_settings(&self) -> Result<EngineSettings> {
        let mut settings = EngineSettings {
            lease_ttl: Duration::seconds(self.lease_ttl_seconds),
            ..EngineSettings::default()
        };

        if let Some(path) = &self.class_taxonomy_path {
            let taxonomy: ClassTaxonomy = read_json(path)?;
            tracing::info!(
                "Loaded {} shooting classes from {}",
                taxonomy.classes().len(),
                path.display()
            );
            settings.taxonomy = taxonomy;
        }

        if let Some(path) = &self.medal_thresholds_path {
            let thresholds: PerSeriesThresholds = read_json(path)?;
            tracing::info!("Loaded medal thresholds from {}", path.display());
            settings.thresholds = Arc::new(thresholds);
        }

        Ok(settings)
    }
}

fn optional_var<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(value) => value
            .parse()
            .map(Some)
            .with_context(|| format!("{} must be a number", name)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Cannot load {} env variable", name)),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid JSON in {}", path.display()))
}
