//! Persistence seam for finished batches.

use super::BatchResult;

/// Stores the artefacts of a finished batch.
///
/// Called once per batch, after every pair has been fetched and before the
/// final progress event.
pub trait BatchStore: Send + Sync {
    /// Error raised when the batch cannot be persisted.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Persist `result`.
    fn save(&self, result: &BatchResult) -> Result<(), Self::Error>;
}
