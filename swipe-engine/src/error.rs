//! Error taxonomy for the recommendation pipeline

use swipe_store::RepositoryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Vector length mismatch. Surfaces out of the pure math utilities only
    /// and indicates a programming error upstream.
    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    /// Rejected at construction: zero weight sums, non-positive epsilon, and
    /// similar nonsense configurations.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O failure from a store collaborator.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
