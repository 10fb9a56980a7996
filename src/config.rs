use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub db_pool_size: u32,
    pub workers: usize,
    pub queue_capacity: usize,
    pub status_ttl_secs: u64,
    pub simulator_enabled: bool,
    pub simulator_vehicle_id: Option<Uuid>,
    pub simulator_interval_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let database_url = env::var("FLEET_DATABASE_URL")
            .or_else(|_| env::var("DATABASE_URL"))
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .context("FLEET_DATABASE_URL or DATABASE_URL is required")?;

        let db_pool_size = env::var("FLEET_DB_POOL_SIZE")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);
        let workers = env::var("FLEET_WORKERS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(4);
        let queue_capacity = env::var("FLEET_QUEUE_CAPACITY")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(10);
        let status_ttl_secs = env::var("FLEET_STATUS_TTL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(5 * 60);

        let simulator_enabled = env::var("FLEET_SIMULATOR")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(true);
        let simulator_vehicle_id = env::var("FLEET_SIMULATOR_VEHICLE_ID")
            .ok()
            .and_then(|v| Uuid::parse_str(v.trim()).ok());
        let simulator_interval_ms = env::var("FLEET_SIMULATOR_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(2000);

        Ok(Self {
            database_url,
            db_pool_size,
            workers,
            queue_capacity,
            status_ttl_secs,
            simulator_enabled,
            simulator_vehicle_id,
            simulator_interval_ms,
        })
    }

    pub fn status_ttl(&self) -> Duration {
        Duration::from_secs(self.status_ttl_secs)
    }

    pub fn simulator_interval(&self) -> Duration {
        Duration::from_millis(self.simulator_interval_ms)
    }
}
