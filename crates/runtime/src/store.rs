//! The live assignment index and its write-through persistence.
//!
//! # Locking
//!
//! Every read and write of the index happens inside one mutex. Persistence
//! copies the index under that mutex and performs file I/O outside it, under
//! a separate writer mutex. Each mutation bumps a generation counter so a copy
//! taken earlier is never written after a copy taken later.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rank_core::{Assignment, SubjectId};
use tracing::{debug, error, warn};

use crate::repository::AssignmentRepository;

#[derive(Default)]
struct Index {
    entries: HashMap<SubjectId, Assignment>,
    generation: u64,
}

impl Index {
    fn bump(&mut self) {
        self.generation += 1;
    }
}

/// In-memory index of active assignments mirrored to an [`AssignmentRepository`].
///
/// Persistence failures are logged and swallowed: once a mutation is applied
/// in memory it is never rolled back because the disk write failed.
pub struct AssignmentStore {
    index: Mutex<Index>,
    /// Generation of the last snapshot that reached the repository.
    written: Mutex<Option<u64>>,
    repository: Arc<dyn AssignmentRepository>,
}

impl AssignmentStore {
    pub fn new(repository: Arc<dyn AssignmentRepository>) -> Self {
        Self {
            index: Mutex::new(Index::default()),
            written: Mutex::new(None),
            repository,
        }
    }

    // The index is consistent after every critical section, so a poisoned
    // lock still guards valid data.
    fn lock_index(&self) -> MutexGuard<'_, Index> {
        self.index.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the index with the persisted contents.
    ///
    /// Returns the number of assignments loaded. A read failure leaves the
    /// index empty and is logged, never returned.
    pub fn load(&self) -> usize {
        let report = match self.repository.load_all() {
            Ok(report) => report,
            Err(e) => {
                error!("Failed to load assignments, starting empty: {}", e);
                return 0;
            }
        };

        if report.skipped > 0 {
            warn!("Skipped {} malformed assignment record(s)", report.skipped);
        }

        let mut index = self.lock_index();
        index.entries.clear();
        for assignment in report.assignments {
            // Later duplicates win, matching file order.
            index
                .entries
                .insert(assignment.subject_id.clone(), assignment);
        }
        index.bump();
        index.entries.len()
    }

    /// Insert or overwrite the assignment for its subject, then persist.
    ///
    /// Returns the assignment it replaced, if any.
    pub fn put(&self, assignment: Assignment) -> Option<Assignment> {
        let previous = {
            let mut index = self.lock_index();
            let previous = index
                .entries
                .insert(assignment.subject_id.clone(), assignment);
            index.bump();
            previous
        };
        self.persist();
        previous
    }

    /// Insert unless an existing assignment for the subject satisfies `blocks`.
    ///
    /// The check and the insert form one critical section. On conflict the
    /// blocking assignment is returned and nothing is written.
    pub fn put_unless<F>(
        &self,
        assignment: Assignment,
        blocks: F,
    ) -> Result<Option<Assignment>, Assignment>
    where
        F: FnOnce(&Assignment) -> bool,
    {
        let previous = {
            let mut index = self.lock_index();
            if let Some(existing) = index.entries.get(&assignment.subject_id)
                && blocks(existing)
            {
                return Err(existing.clone());
            }
            let previous = index
                .entries
                .insert(assignment.subject_id.clone(), assignment);
            index.bump();
            previous
        };
        self.persist();
        Ok(previous)
    }

    /// Remove the subject's assignment. Persists only if something was removed.
    pub fn remove(&self, subject_id: &SubjectId) -> bool {
        self.remove_if(subject_id, |_| true).is_some()
    }

    /// Remove the subject's assignment only if it satisfies `predicate`.
    pub fn remove_if<F>(&self, subject_id: &SubjectId, predicate: F) -> Option<Assignment>
    where
        F: FnOnce(&Assignment) -> bool,
    {
        let removed = {
            let mut index = self.lock_index();
            if !index.entries.get(subject_id).is_some_and(predicate) {
                return None;
            }
            let removed = index.entries.remove(subject_id);
            index.bump();
            removed
        };
        self.persist();
        removed
    }

    pub fn get(&self, subject_id: &SubjectId) -> Option<Assignment> {
        self.lock_index().entries.get(subject_id).cloned()
    }

    /// Consistent copy of every assignment, ordered by subject id.
    pub fn snapshot(&self) -> Vec<Assignment> {
        self.snapshot_with_generation().1
    }

    pub fn len(&self) -> usize {
        self.lock_index().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_index().entries.is_empty()
    }

    fn snapshot_with_generation(&self) -> (u64, Vec<Assignment>) {
        let (generation, mut records) = {
            let index = self.lock_index();
            (
                index.generation,
                index.entries.values().cloned().collect::<Vec<_>>(),
            )
        };
        records.sort_by(|a, b| a.subject_id.as_str().cmp(b.subject_id.as_str()));
        (generation, records)
    }

    /// Write the full index to the repository.
    ///
    /// Returns `true` when the current contents reached storage (or a newer
    /// snapshot already had). Failures are logged, not propagated.
    pub fn persist(&self) -> bool {
        let (generation, records) = self.snapshot_with_generation();

        let mut written = self.written.lock().unwrap_or_else(PoisonError::into_inner);
        if written.is_some_and(|last| last > generation) {
            debug!(
                "Skipping stale snapshot (generation {} < {})",
                generation,
                written.unwrap_or_default()
            );
            return true;
        }

        match self.repository.save_all(&records) {
            Ok(()) => {
                *written = Some(generation);
                true
            }
            Err(e) => {
                error!(
                    "Failed to persist {} assignment(s): {}",
                    records.len(),
                    e
                );
                false
            }
        }
    }
}
