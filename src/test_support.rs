use crate::cache::StatusCache;
use crate::store::VehicleStore;
use crate::telemetry::{StatusEvent, Trip, VehicleStatus};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex as StdMutex;
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

pub fn sample_status(speed: f64) -> VehicleStatus {
    VehicleStatus {
        location: [25.276987, 55.296249],
        speed,
        timestamp: Utc::now(),
    }
}

pub fn sample_event(vehicle_id: Uuid, speed: f64) -> StatusEvent {
    StatusEvent {
        vehicle_id,
        status: sample_status(speed),
    }
}

/// In-memory `VehicleStore` with call counters and failure/panic injection.
#[derive(Default)]
pub struct MemoryVehicleStore {
    statuses: Mutex<HashMap<Uuid, VehicleStatus>>,
    trips: Mutex<Vec<Trip>>,
    pub upsert_calls: AtomicU64,
    pub get_calls: AtomicU64,
    fail_upserts: AtomicBool,
    panic_on: StdMutex<Option<Uuid>>,
}

impl MemoryVehicleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_upserts(&self, fail: bool) {
        self.fail_upserts.store(fail, Ordering::SeqCst);
    }

    /// Any upsert for this vehicle panics, simulating an unexpected runtime
    /// fault inside a worker's event processing.
    pub fn panic_on(&self, vehicle_id: Uuid) {
        *self.panic_on.lock().unwrap() = Some(vehicle_id);
    }

    pub async fn seed_status(&self, vehicle_id: Uuid, status: VehicleStatus) {
        self.statuses.lock().await.insert(vehicle_id, status);
    }

    pub async fn seed_trip(&self, trip: Trip) {
        self.trips.lock().await.push(trip);
    }

    pub async fn stored_status(&self, vehicle_id: Uuid) -> Option<VehicleStatus> {
        self.statuses.lock().await.get(&vehicle_id).cloned()
    }
}

#[async_trait]
impl VehicleStore for MemoryVehicleStore {
    async fn upsert_status(&self, vehicle_id: Uuid, status: &VehicleStatus) -> Result<()> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        let poison = *self.panic_on.lock().unwrap();
        if poison == Some(vehicle_id) {
            panic!("injected store panic for vehicle {vehicle_id}");
        }
        if self.fail_upserts.load(Ordering::SeqCst) {
            return Err(anyhow!("injected store failure"));
        }
        self.statuses
            .lock()
            .await
            .insert(vehicle_id, status.clone());
        Ok(())
    }

    async fn get_status(&self, vehicle_id: Uuid) -> Result<Option<VehicleStatus>> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.statuses.lock().await.get(&vehicle_id).cloned())
    }

    async fn find_trips_since(&self, vehicle_id: Uuid, since: DateTime<Utc>) -> Result<Vec<Trip>> {
        let mut trips: Vec<Trip> = self
            .trips
            .lock()
            .await
            .iter()
            .filter(|trip| trip.vehicle_id == vehicle_id && trip.start_time >= since)
            .cloned()
            .collect();
        trips.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(trips)
    }
}

/// In-memory `StatusCache` with call counters and failure injection. Entries
/// never expire; TTL handling belongs to `MemoryStatusCache` and its tests.
#[derive(Default)]
pub struct MockStatusCache {
    entries: Mutex<HashMap<Uuid, VehicleStatus>>,
    pub set_calls: AtomicU64,
    pub get_calls: AtomicU64,
    last_ttl: StdMutex<Option<Duration>>,
    fail_sets: AtomicBool,
    fail_gets: AtomicBool,
}

impl MockStatusCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_sets(&self, fail: bool) {
        self.fail_sets.store(fail, Ordering::SeqCst);
    }

    pub fn fail_gets(&self, fail: bool) {
        self.fail_gets.store(fail, Ordering::SeqCst);
    }

    pub fn last_ttl(&self) -> Option<Duration> {
        *self.last_ttl.lock().unwrap()
    }

    pub async fn cached_status(&self, vehicle_id: Uuid) -> Option<VehicleStatus> {
        self.entries.lock().await.get(&vehicle_id).cloned()
    }
}

#[async_trait]
impl StatusCache for MockStatusCache {
    async fn set(&self, vehicle_id: Uuid, status: &VehicleStatus, ttl: Duration) -> Result<()> {
        self.set_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_sets.load(Ordering::SeqCst) {
            return Err(anyhow!("injected cache set failure"));
        }
        *self.last_ttl.lock().unwrap() = Some(ttl);
        self.entries
            .lock()
            .await
            .insert(vehicle_id, status.clone());
        Ok(())
    }

    async fn get(&self, vehicle_id: Uuid) -> Result<Option<VehicleStatus>> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_gets.load(Ordering::SeqCst) {
            return Err(anyhow!("injected cache get failure"));
        }
        Ok(self.entries.lock().await.get(&vehicle_id).cloned())
    }
}
