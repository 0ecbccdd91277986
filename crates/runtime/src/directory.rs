//! Lookup of connected subjects, implemented by the host.

use rank_core::{Subject, SubjectId};

/// The host's view of who is connected right now.
///
/// Lookups are synchronous snapshots; a subject may disconnect right after
/// being returned, which badge mechanisms must tolerate.
pub trait SessionDirectory: Send + Sync {
    /// Resolve an operator query (subject id or nickname, case-insensitive).
    fn find(&self, query: &str) -> Option<Subject>;

    /// Every currently connected subject.
    fn connected(&self) -> Vec<Subject>;

    /// Connected subject with exactly this id.
    fn get(&self, id: &SubjectId) -> Option<Subject> {
        self.connected().into_iter().find(|subject| &subject.id == id)
    }

    /// Show a short broadcast to the subject. Best-effort; the default drops it.
    fn notify(&self, _subject: &Subject, _message: &str) {}
}
