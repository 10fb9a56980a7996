use crate::service::VehicleService;
use crate::telemetry::StatusEvent;
use anyhow::Result;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Producer handle over the bounded event channel. `submit` blocks when the
/// channel is full (backpressure); dropping every handle closes the channel,
/// after which workers drain what was accepted and stop.
#[derive(Clone)]
pub struct EventQueue {
    tx: mpsc::Sender<StatusEvent>,
    stats: Arc<PoolStats>,
}

impl EventQueue {
    pub fn stats(&self) -> Arc<PoolStats> {
        self.stats.clone()
    }

    pub async fn submit(&self, event: StatusEvent) -> Result<()> {
        let queue_depth = self.stats.queue_depth.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::trace!(queue_depth, vehicle = %event.vehicle_id, "queued status event");
        if let Err(err) = self.tx.send(event).await {
            self.stats.queue_depth.fetch_sub(1, Ordering::Relaxed);
            return Err(err.into());
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct PoolStats {
    pub queue_depth: AtomicU64,
    pub processed: AtomicU64,
    pub failed: AtomicU64,
    pub recovered_panics: AtomicU64,
    pub last_error: Mutex<Option<String>>,
}

impl PoolStats {
    pub fn new() -> Self {
        Self {
            queue_depth: AtomicU64::new(0),
            processed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            recovered_panics: AtomicU64::new(0),
            last_error: Mutex::new(None),
        }
    }

    pub fn record_error(&self, err: impl Into<String>) {
        if let Ok(mut guard) = self.last_error.lock() {
            *guard = Some(err.into());
        }
    }
}

pub fn event_queue(capacity: usize) -> (EventQueue, mpsc::Receiver<StatusEvent>) {
    let (tx, rx) = mpsc::channel(capacity);
    let queue = EventQueue {
        tx,
        stats: Arc::new(PoolStats::new()),
    };
    (queue, rx)
}

/// Launches `count` workers draining one shared receiver. Returns without
/// blocking; workers run until the channel closes and is fully drained.
pub fn spawn_workers(
    count: usize,
    rx: mpsc::Receiver<StatusEvent>,
    service: VehicleService,
    stats: Arc<PoolStats>,
) -> Vec<JoinHandle<()>> {
    let rx = Arc::new(tokio::sync::Mutex::new(rx));
    (0..count)
        .map(|worker| {
            let rx = rx.clone();
            let service = service.clone();
            let stats = stats.clone();
            tokio::spawn(async move {
                tracing::info!(worker, "worker started");
                loop {
                    // Hold the receiver lock only for the handoff so a worker
                    // blocked on a slow ingest never stalls its peers.
                    let event = {
                        let mut rx = rx.lock().await;
                        rx.recv().await
                    };
                    let Some(event) = event else {
                        break;
                    };
                    stats.queue_depth.fetch_sub(1, Ordering::Relaxed);
                    process_event(worker, &service, event, &stats).await;
                }
                tracing::info!(worker, "worker stopped");
            })
        })
        .collect()
}

/// One event, fully contained: an ingest error is logged and dropped, and a
/// panic out of the service or its collaborators is recovered so the worker
/// loop survives poisoned events.
async fn process_event(
    worker: usize,
    service: &VehicleService,
    event: StatusEvent,
    stats: &PoolStats,
) {
    let vehicle = event.vehicle_id;
    match AssertUnwindSafe(service.ingest(&event)).catch_unwind().await {
        Ok(Ok(())) => {
            stats.processed.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(worker, vehicle = %vehicle, "status event ingested");
        }
        Ok(Err(err)) if err.is_partial() => {
            // Durable write landed; only the cache lagged.
            stats.processed.fetch_add(1, Ordering::Relaxed);
            stats.record_error(err.to_string());
            tracing::warn!(worker, vehicle = %vehicle, error = %err, "status event partially ingested");
        }
        Ok(Err(err)) => {
            stats.failed.fetch_add(1, Ordering::Relaxed);
            stats.record_error(err.to_string());
            tracing::error!(worker, vehicle = %vehicle, error = %err, "failed to ingest status event");
        }
        Err(panic) => {
            stats.failed.fetch_add(1, Ordering::Relaxed);
            stats.recovered_panics.fetch_add(1, Ordering::Relaxed);
            let message = panic_message(panic.as_ref());
            stats.record_error(message.clone());
            tracing::error!(worker, vehicle = %vehicle, panic = %message, "recovered panic while ingesting event");
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
