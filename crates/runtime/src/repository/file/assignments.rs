//! File-based AssignmentRepository implementation.

use std::fs;
use std::path::{Path, PathBuf};

use rank_core::Assignment;

use crate::repository::codec;
use crate::repository::{AssignmentRepository, LoadReport, Result};

/// File-based implementation of AssignmentRepository.
///
/// Keeps the whole index in a single `vip_assignments.jsonl` file under the
/// data directory. Saves write a sibling temp file first and rename it over
/// the previous contents.
///
/// While no `.jsonl` file exists, loads fall back to the older
/// `vip_assignments.txt` in the same directory. It is never written; the
/// first save moves its records into the new file.
pub struct FileAssignmentRepository {
    path: PathBuf,
    legacy_path: PathBuf,
}

impl FileAssignmentRepository {
    pub const FILE_NAME: &'static str = "vip_assignments.jsonl";
    pub const LEGACY_FILE_NAME: &'static str = "vip_assignments.txt";

    /// Create a repository rooted at `data_dir`, creating the directory if needed.
    pub fn new(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        fs::create_dir_all(data_dir)?;
        Ok(Self {
            path: data_dir.join(Self::FILE_NAME),
            legacy_path: data_dir.join(Self::LEGACY_FILE_NAME),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("jsonl.tmp")
    }
}

impl AssignmentRepository for FileAssignmentRepository {
    fn load_all(&self) -> Result<LoadReport> {
        let source = if self.path.exists() {
            &self.path
        } else if self.legacy_path.exists() {
            tracing::info!("Importing assignments from {}", self.legacy_path.display());
            &self.legacy_path
        } else {
            tracing::debug!("No assignment file at {}", self.path.display());
            return Ok(LoadReport::default());
        };

        // Lossy decoding confines invalid bytes to the records that contain them.
        let bytes = fs::read(source)?;
        let contents = String::from_utf8_lossy(&bytes);
        let report = codec::decode(&contents);

        tracing::debug!(
            "Loaded {} assignment(s) from {} ({} skipped)",
            report.assignments.len(),
            source.display(),
            report.skipped
        );

        Ok(report)
    }

    fn save_all(&self, assignments: &[Assignment]) -> Result<()> {
        let contents = codec::encode(assignments)?;
        let temp_path = self.temp_path();

        // Write to temp file
        fs::write(&temp_path, contents)?;

        // Atomic rename
        fs::rename(&temp_path, &self.path)?;

        tracing::debug!(
            "Saved {} assignment(s) to {}",
            assignments.len(),
            self.path.display()
        );

        Ok(())
    }
}
