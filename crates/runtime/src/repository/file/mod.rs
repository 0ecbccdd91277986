//! File-based repository implementations.

mod assignments;

pub use assignments::FileAssignmentRepository;
