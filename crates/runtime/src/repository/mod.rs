//! Repository layer for the persisted assignment index.
//!
//! Repositories only move whole snapshots of the index to and from durable
//! storage. The live index, its locking and write-through policy belong to
//! [`crate::store::AssignmentStore`].

pub mod codec;
mod error;
mod file;
mod memory;
mod traits;

pub use error::{RepositoryError, Result};
pub use file::FileAssignmentRepository;
pub use memory::InMemoryAssignmentRepository;
pub use traits::{AssignmentRepository, LoadReport};
