use crate::telemetry::{Trip, VehicleStatus};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;

/// Authoritative record of vehicle state. Implementations must be safe for
/// concurrent use by every worker in the pool.
#[async_trait]
pub trait VehicleStore: Send + Sync {
    /// Insert-or-overwrite the latest status for a vehicle.
    async fn upsert_status(&self, vehicle_id: Uuid, status: &VehicleStatus) -> Result<()>;

    /// Latest status, or `None` when the vehicle has never reported.
    async fn get_status(&self, vehicle_id: Uuid) -> Result<Option<VehicleStatus>>;

    /// Trips starting at or after `since`, most recent first.
    async fn find_trips_since(&self, vehicle_id: Uuid, since: DateTime<Utc>) -> Result<Vec<Trip>>;
}

pub fn connect_lazy(database_url: &str, max_connections: u32) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(8))
        .connect_lazy(database_url)
        .with_context(|| format!("Failed to create lazy database pool for {database_url}"))
}

/// Postgres-backed store. Status lives as a `jsonb` column on the vehicle row
/// so a single upsert covers both "new vehicle" and "latest wins".
#[derive(Clone)]
pub struct PgVehicleStore {
    pool: PgPool,
}

impl PgVehicleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VehicleStore for PgVehicleStore {
    async fn upsert_status(&self, vehicle_id: Uuid, status: &VehicleStatus) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO vehicles (id, last_status)
            VALUES ($1, $2)
            ON CONFLICT (id) DO UPDATE
            SET last_status = EXCLUDED.last_status
            "#,
        )
        .bind(vehicle_id)
        .bind(Json(status))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_status(&self, vehicle_id: Uuid) -> Result<Option<VehicleStatus>> {
        let row: Option<Option<Json<VehicleStatus>>> =
            sqlx::query_scalar("SELECT last_status FROM vehicles WHERE id = $1")
                .bind(vehicle_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.flatten().map(|status| status.0))
    }

    async fn find_trips_since(&self, vehicle_id: Uuid, since: DateTime<Utc>) -> Result<Vec<Trip>> {
        let trips = sqlx::query_as::<_, Trip>(
            r#"
            SELECT id, vehicle_id, start_time, end_time, mileage, avg_speed
            FROM trips
            WHERE vehicle_id = $1 AND start_time >= $2
            ORDER BY start_time DESC
            "#,
        )
        .bind(vehicle_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;
        Ok(trips)
    }
}
