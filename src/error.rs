use thiserror::Error;

/// Failure modes of the ingestion service. Absent data is never an error:
/// reads return `Ok(None)` / an empty `Vec` when nothing is found.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The event named no vehicle. Caller-fixable; nothing was written.
    #[error("vehicle id is required")]
    Validation,

    /// The durable store rejected the operation. For writes the cache was
    /// deliberately left untouched, so no unpersisted data can be served.
    #[error("durable store operation failed")]
    Store(#[source] anyhow::Error),

    /// The durable write succeeded but the cache write did not. Data is safe;
    /// the next read for this vehicle pays one extra store round-trip.
    #[error("status persisted but cache write failed")]
    CachePartial(#[source] anyhow::Error),
}

impl ServiceError {
    /// True when the durable write already happened and only the best-effort
    /// cache layer failed. Workers downgrade these to warnings.
    pub fn is_partial(&self) -> bool {
        matches!(self, ServiceError::CachePartial(_))
    }
}
