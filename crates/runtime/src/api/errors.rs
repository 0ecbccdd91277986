//! Unified error types surfaced by the runtime API.
//!
//! [`EntitlementError`] covers rejected requests; nothing has been mutated
//! when one is returned. [`RuntimeError`] covers lifecycle plumbing.
use chrono::{DateTime, Utc};
use rank_core::{RankLabel, SubjectId, ValidationError};
use thiserror::Error;
use tokio::sync::oneshot;

pub use crate::repository::RepositoryError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("sweep worker command channel closed")]
    CommandChannelClosed,

    #[error("sweep worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("sweep worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("runtime requires a {0} to be configured before building")]
    MissingCollaborator(&'static str),
}

/// A grant, removal or lookup the service refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntitlementError {
    #[error("Player not found.")]
    SubjectNotFound { query: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(
        "{subject} already has VIP '{rank}' until {}.",
        .expires_at.format("%Y-%m-%d %H:%M UTC")
    )]
    AlreadyAssigned {
        subject: SubjectId,
        rank: RankLabel,
        expires_at: DateTime<Utc>,
    },
}

/// Coarse classification of [`EntitlementError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
}

impl EntitlementError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EntitlementError::SubjectNotFound { .. } => ErrorKind::NotFound,
            EntitlementError::Validation(_) => ErrorKind::Validation,
            EntitlementError::AlreadyAssigned { .. } => ErrorKind::Conflict,
        }
    }
}
