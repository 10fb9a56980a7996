use crate::cache::StatusCache;
use crate::error::ServiceError;
use crate::store::VehicleStore;
use crate::telemetry::{StatusEvent, Trip, VehicleStatus};
use chrono::Duration as ChronoDuration;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;


pub const DEFAULT_STATUS_TTL: Duration = Duration::from_secs(5 * 60);
const TRIP_WINDOW_HOURS: i64 = 24;

/// Write-through ingest plus cache-aside reads over injected store and cache
/// handles. Safe to clone across workers.
#[derive(Clone)]
pub struct VehicleService {
    store: Arc<dyn VehicleStore>,
    cache: Arc<dyn StatusCache>,
    status_ttl: Duration,
}

impl VehicleService {
    pub fn new(
        store: Arc<dyn VehicleStore>,
        cache: Arc<dyn StatusCache>,
        status_ttl: Duration,
    ) -> Self {
        Self {
            store,
            cache,
            status_ttl,
        }
    }

    /// Persist one status event: durable store first, cache second. A cache
    /// failure after a successful store write surfaces as
    /// `ServiceError::CachePartial` so callers can tell partial success from
    /// a lost event.
    pub async fn ingest(&self, event: &StatusEvent) -> Result<(), ServiceError> {
        if event.vehicle_id.is_nil() {
            return Err(ServiceError::Validation);
        }

        self.store
            .upsert_status(event.vehicle_id, &event.status)
            .await
            .map_err(ServiceError::Store)?;

        // Only reached after the durable write: never cache unpersisted data.
        self.cache
            .set(event.vehicle_id, &event.status, self.status_ttl)
            .await
            .map_err(ServiceError::CachePartial)?;

        Ok(())
    }

    /// Latest status for a vehicle: cache fast path, store fallback with
    /// best-effort repopulation. `Ok(None)` means the vehicle has never
    /// reported, which is not a failure.
    pub async fn get_status(
        &self,
        vehicle_id: Uuid,
    ) -> Result<Option<VehicleStatus>, ServiceError> {
        match self.cache.get(vehicle_id).await {
            Ok(Some(status)) => return Ok(Some(status)),
            Ok(None) => {}
            Err(err) => {
                // A broken cache must not break reads; the store still answers.
                tracing::warn!(vehicle = %vehicle_id, error = %err, "status cache read failed");
            }
        }

        let status = self
            .store
            .get_status(vehicle_id)
            .await
            .map_err(ServiceError::Store)?;

        if let Some(status) = &status {
            if let Err(err) = self.cache.set(vehicle_id, status, self.status_ttl).await {
                tracing::debug!(vehicle = %vehicle_id, error = %err, "status cache repopulation failed");
            }
        }

        Ok(status)
    }

    /// Trips from the last 24 hours, most recent first. Not cached.
    pub async fn get_trips(&self, vehicle_id: Uuid) -> Result<Vec<Trip>, ServiceError> {
        let since = Utc::now() - ChronoDuration::hours(TRIP_WINDOW_HOURS);
        self.store
            .find_trips_since(vehicle_id, since)
            .await
            .map_err(ServiceError::Store)
    }
}
