use crate::telemetry::VehicleStatus;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use uuid::Uuid;

/// Best-effort acceleration layer for status reads. A miss is `Ok(None)`,
/// never an error; the durable store remains the correctness backstop.
#[async_trait]
pub trait StatusCache: Send + Sync {
    async fn set(&self, vehicle_id: Uuid, status: &VehicleStatus, ttl: Duration) -> Result<()>;

    async fn get(&self, vehicle_id: Uuid) -> Result<Option<VehicleStatus>>;
}

#[derive(Debug, Clone)]
struct Entry {
    status: VehicleStatus,
    expires_at: Instant,
}

/// In-process TTL cache, one live entry per vehicle. Expired entries are
/// dropped on read and swept on write, so expiry can only ever surface as a
/// miss.
#[derive(Debug, Default)]
pub struct MemoryStatusCache {
    entries: Mutex<HashMap<Uuid, Entry>>,
}

impl MemoryStatusCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StatusCache for MemoryStatusCache {
    async fn set(&self, vehicle_id: Uuid, status: &VehicleStatus, ttl: Duration) -> Result<()> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            vehicle_id,
            Entry {
                status: status.clone(),
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, vehicle_id: Uuid) -> Result<Option<VehicleStatus>> {
        let mut entries = self.entries.lock().await;
        match entries.get(&vehicle_id) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.status.clone())),
            Some(_) => {
                entries.remove(&vehicle_id);
                Ok(None)
            }
            None => Ok(None),
        }
    }
}
