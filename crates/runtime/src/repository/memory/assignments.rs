use std::sync::RwLock;

use rank_core::Assignment;

use crate::repository::{AssignmentRepository, LoadReport, RepositoryError, Result};

/// In-memory implementation of AssignmentRepository.
///
/// Holds the last saved records; useful for tests and hosts that manage
/// durability elsewhere.
#[derive(Default)]
pub struct InMemoryAssignmentRepository {
    records: RwLock<Vec<Assignment>>,
}

impl InMemoryAssignmentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from previously persisted records.
    pub fn with_records(records: Vec<Assignment>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    /// Records from the most recent save.
    pub fn records(&self) -> Result<Vec<Assignment>> {
        let records = self
            .records
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(records.clone())
    }
}

impl AssignmentRepository for InMemoryAssignmentRepository {
    fn load_all(&self) -> Result<LoadReport> {
        Ok(LoadReport {
            assignments: self.records()?,
            skipped: 0,
        })
    }

    fn save_all(&self, assignments: &[Assignment]) -> Result<()> {
        let mut records = self
            .records
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        *records = assignments.to_vec();
        Ok(())
    }
}
