//! Badge side effects: making an active rank visible on a connected subject.
//!
//! The service only talks to [`BadgeAdapter`]. Hosts usually build one from
//! several [`BadgeMechanism`]s wrapped in a [`FallbackBadgeAdapter`], because
//! the session APIs able to render a label are not guaranteed to be present on
//! every host version.

mod fallback;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use rank_core::Subject;
use thiserror::Error;

pub use fallback::FallbackBadgeAdapter;

/// Label and color rendered next to a subject's name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Badge {
    pub text: String,
    pub color: String,
}

impl Badge {
    pub const DEFAULT_COLOR: &'static str = "yellow";

    pub fn new(text: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: color.into(),
        }
    }
}

/// Result of a best-effort badge operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeOutcome {
    /// A mechanism completed the operation.
    Succeeded { mechanism: &'static str },
    /// Every mechanism failed or timed out.
    Exhausted,
}

impl BadgeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

/// Failure of a single badge mechanism.
#[derive(Debug, Clone, Error)]
pub enum BadgeError {
    #[error("mechanism unavailable on this host")]
    Unavailable,

    #[error("subject disconnected")]
    Disconnected,

    #[error("rejected by host: {0}")]
    Rejected(String),

    #[error("timed out after {0:?}")]
    TimedOut(Duration),
}

/// Which badge operation is being attempted.
#[derive(Debug, Clone, Copy)]
pub(crate) enum BadgeOp<'a> {
    Apply(&'a Badge),
    Clear,
}

impl fmt::Display for BadgeOp<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BadgeOp::Apply(_) => f.write_str("apply"),
            BadgeOp::Clear => f.write_str("clear"),
        }
    }
}

/// The side-effect contract the entitlement service depends on.
///
/// Both operations are best-effort and report their outcome as a value;
/// callers log it and carry on.
#[async_trait]
pub trait BadgeAdapter: Send + Sync {
    async fn apply(&self, subject: &Subject, badge: &Badge) -> BadgeOutcome;

    async fn clear(&self, subject: &Subject) -> BadgeOutcome;
}

/// One concrete way of rendering a badge through the host's session API.
#[async_trait]
pub trait BadgeMechanism: Send + Sync {
    /// Short name used in logs and [`BadgeOutcome::Succeeded`].
    fn name(&self) -> &'static str;

    async fn apply(&self, subject: &Subject, badge: &Badge) -> Result<(), BadgeError>;

    async fn clear(&self, subject: &Subject) -> Result<(), BadgeError>;
}
