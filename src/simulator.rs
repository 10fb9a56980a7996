use crate::pipeline::EventQueue;
use crate::telemetry::{StatusEvent, VehicleStatus};
use chrono::Utc;
use rand::Rng;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

const BASE_LAT: f64 = 25.276987;
const BASE_LON: f64 = 55.296249;

/// Synthetic telemetry producer: one jittered status event per tick for a
/// single vehicle. Respects channel backpressure and stops on cancellation,
/// dropping its queue handle so workers can drain and exit.
pub async fn run(
    vehicle_id: Uuid,
    interval: Duration,
    queue: EventQueue,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tracing::info!(vehicle = %vehicle_id, interval_ms = interval.as_millis() as u64, "telemetry simulator started");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let event = StatusEvent {
            vehicle_id,
            status: synthetic_status(),
        };
        tokio::select! {
            _ = cancel.cancelled() => break,
            res = queue.submit(event) => {
                if res.is_err() {
                    tracing::warn!(vehicle = %vehicle_id, "event channel closed; stopping simulator");
                    break;
                }
            }
        }
    }

    tracing::info!(vehicle = %vehicle_id, "telemetry simulator stopped");
}

fn synthetic_status() -> VehicleStatus {
    let mut rng = rand::thread_rng();
    VehicleStatus {
        location: [
            BASE_LAT + (rng.gen::<f64>() - 0.5) / 100.0,
            BASE_LON + (rng.gen::<f64>() - 0.5) / 100.0,
        ],
        speed: rng.gen_range(20.0..50.0),
        timestamp: Utc::now(),
    }
}
