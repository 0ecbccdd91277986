//! Runtime for time-limited ranks.
//!
//! This crate wires the assignment store, its repositories, the entitlement
//! service and the expiration sweep worker into a runtime API. Hosts embed
//! [`Runtime`], supply a [`SessionDirectory`] and a [`BadgeAdapter`], and drive
//! commands and join events through [`RuntimeHandle`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream hosts interact with
//! - [`service`] enforces grant, removal and expiry rules
//! - [`store`] owns the live index and write-through persistence
//! - [`badge`] and [`directory`] are the seams a host implements
//! - [`workers`] keeps background tasks internal to the crate
pub mod api;
pub mod badge;
pub mod clock;
pub mod config;
pub mod directory;
pub mod repository;
pub mod runtime;
pub mod service;
pub mod store;

mod workers;

pub use api::{
    CommandResponse, CommandSurface, EntitlementError, ErrorKind, Result, RuntimeError,
    RuntimeHandle,
};
pub use badge::{Badge, BadgeAdapter, BadgeError, BadgeMechanism, BadgeOutcome, FallbackBadgeAdapter};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ReassignPolicy, RuntimeConfig};
pub use directory::SessionDirectory;
pub use repository::{
    AssignmentRepository, FileAssignmentRepository, InMemoryAssignmentRepository, LoadReport,
    RepositoryError,
};
pub use runtime::{Runtime, RuntimeBuilder};
pub use service::{EntitlementService, Grant, JoinOutcome, Removal, SweepReport};
pub use store::AssignmentStore;
