//! Worker tasks that back the runtime orchestration.
//!
//! The sweep worker is currently the only background task; commands reach it
//! through [`Command`] over an mpsc channel owned by the runtime handle.

mod sweeper;

pub use sweeper::{Command, SweepWorker};
