use std::time::Duration;

use storage::ResultsEngine;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

/// Periodically deactivates lapsed edit leases so idle slots do not keep
/// showing a holder. Expiry itself never depends on this task.
pub fn spawn_lease_sweeper(engine: ResultsEngine, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!("Lease sweeper started, interval {:?}", every);

        loop {
            ticker.tick().await;
            if let Err(e) = engine.sweep_expired_leases().await {
                tracing::error!("Lease sweep failed: {}", e);
            }
        }
    })
}
