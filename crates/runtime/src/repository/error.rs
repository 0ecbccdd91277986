//! Error types raised by repository implementations.

use thiserror::Error;

/// Errors surfaced by repository implementations.
///
/// The store treats every variant as a persistence warning: it is logged and
/// the in-memory index stays authoritative.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("assignment repository lock was poisoned")]
    LockPoisoned,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(String),
}

pub type Result<T> = std::result::Result<T, RepositoryError>;
