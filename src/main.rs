mod cache;
mod config;
mod error;
mod pipeline;
mod service;
mod simulator;
mod store;
mod telemetry;
#[cfg(test)]
mod test_support;

use crate::cache::{MemoryStatusCache, StatusCache};
use crate::config::Config;
use crate::pipeline::{event_queue, spawn_workers};
use crate::service::VehicleService;
use crate::store::{PgVehicleStore, VehicleStore};
use anyhow::Result;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn init_tracing() -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,fleet_tracker=info".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .try_init()
        .map_err(|err| anyhow::anyhow!(err.to_string()))?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing()?;

    let pool = store::connect_lazy(&config.database_url, config.db_pool_size)?;
    let store: Arc<dyn VehicleStore> = Arc::new(PgVehicleStore::new(pool));
    let status_cache: Arc<dyn StatusCache> = Arc::new(MemoryStatusCache::new());
    let service = VehicleService::new(store, status_cache, config.status_ttl());

    let (queue, rx) = event_queue(config.queue_capacity);
    let stats = queue.stats();
    let workers = spawn_workers(config.workers, rx, service, stats.clone());
    tracing::info!(
        workers = config.workers,
        queue_capacity = config.queue_capacity,
        "ingest pipeline started"
    );

    let cancel = CancellationToken::new();
    let simulator_handle = match (config.simulator_enabled, config.simulator_vehicle_id) {
        (true, Some(vehicle_id)) => {
            let queue = queue.clone();
            let cancel = cancel.clone();
            let interval = config.simulator_interval();
            Some(tokio::spawn(simulator::run(
                vehicle_id, interval, queue, cancel,
            )))
        }
        (true, None) => {
            tracing::info!("simulator enabled but FLEET_SIMULATOR_VEHICLE_ID is not set; not starting");
            None
        }
        _ => None,
    };

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");

    // Cooperative shutdown: stop the producer, close the channel by dropping
    // our handle, then let workers finish draining buffered events.
    cancel.cancel();
    if let Some(handle) = simulator_handle {
        let _ = handle.await;
    }
    drop(queue);
    for handle in workers {
        let _ = handle.await;
    }

    tracing::info!(
        processed = stats.processed.load(Ordering::Relaxed),
        failed = stats.failed.load(Ordering::Relaxed),
        recovered_panics = stats.recovered_panics.load(Ordering::Relaxed),
        "ingest pipeline drained"
    );

    Ok(())
}
