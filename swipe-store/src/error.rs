//! Error taxonomy for repository collaborators

use thiserror::Error;

/// Any failure reported by a persistent store.
///
/// The engine recovers from these wherever it can still produce a useful
/// response; only batch re-clustering surfaces them to the caller.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Backend I/O failure (connection, query, timeout).
    #[error("storage failure: {0}")]
    Storage(String),

    /// A persisted payload could not be decoded.
    #[error("serialization failure: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Lookup by id found nothing where a row was required.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
}
