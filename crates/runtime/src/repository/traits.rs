//! Repository contract for persisting the assignment index.

use rank_core::Assignment;

use super::error::Result;

/// Outcome of reading a persisted index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Records that decoded successfully, in file order.
    pub assignments: Vec<Assignment>,
    /// Records that were present but could not be decoded.
    pub skipped: usize,
}

/// Durable backing for the assignment index.
///
/// The whole index is written on every save; there is no incremental log.
/// Implementations must make `save_all` atomic from the point of view of a
/// later `load_all`: either the previous or the new contents are observed,
/// never a mix.
pub trait AssignmentRepository: Send + Sync {
    /// Read every persisted record.
    ///
    /// A missing backing file yields an empty report. Individual malformed
    /// records are counted in [`LoadReport::skipped`] instead of failing.
    fn load_all(&self) -> Result<LoadReport>;

    /// Replace the persisted contents with `assignments`.
    fn save_all(&self, assignments: &[Assignment]) -> Result<()>;
}
