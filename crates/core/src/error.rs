//! Validation errors raised before any entitlement is mutated.

use crate::term::TermDays;

/// Input rejected by domain validation.
///
/// Messages are phrased for operators since the command surface relays them
/// verbatim.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Rank text was empty or whitespace only.
    #[error("Rank cannot be empty.")]
    EmptyRank,

    /// Requested term is outside the accepted range of days.
    #[error("Days must be between {min} and {max}.", min = TermDays::MIN, max = TermDays::MAX)]
    DurationOutOfRange {
        /// The rejected number of days.
        days: i64,
    },
}
