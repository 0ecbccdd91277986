//! Domain types for timed rank entitlements.
//!
//! `rank-core` defines what an entitlement *is*: the subject it binds to, the
//! rank label it displays, the bounded term it lasts, and the resulting
//! [`Assignment`] with its absolute expiry. Everything here is pure; clocks,
//! storage, and side effects live in `rank-runtime`.
pub mod assignment;
pub mod error;
pub mod rank;
pub mod remaining;
pub mod subject;
pub mod term;

pub use assignment::Assignment;
pub use error::ValidationError;
pub use rank::RankLabel;
pub use remaining::Remaining;
pub use subject::{Subject, SubjectId};
pub use term::TermDays;
