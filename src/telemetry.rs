use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Latest known state of one vehicle. Persisted as `jsonb` in the `vehicles`
/// table and mirrored into the status cache on every successful ingest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleStatus {
    /// `[lat, lon]`
    pub location: [f64; 2],
    pub speed: f64,
    pub timestamp: DateTime<Utc>,
}

/// One telemetry sample as produced onto the event channel. Timestamps are
/// producer-assigned; nothing downstream enforces per-vehicle ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusEvent {
    pub vehicle_id: Uuid,
    pub status: VehicleStatus,
}

/// A completed or open journey, produced by store-side aggregation. Read-only
/// here; `end_time` is absent while the trip is still open.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Trip {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub mileage: f64,
    pub avg_speed: f64,
}
