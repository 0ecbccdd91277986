//! In-memory repository implementations.

mod assignments;

pub use assignments::InMemoryAssignmentRepository;
