//! High-level runtime orchestrator.
//!
//! The runtime owns the assignment store, the entitlement service and the
//! sweep worker, and exposes a builder-based API so hosts inject their session
//! directory and badge adapter.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::api::{Result, RuntimeError, RuntimeHandle};
use crate::badge::BadgeAdapter;
use crate::clock::{Clock, SystemClock};
use crate::config::RuntimeConfig;
use crate::directory::SessionDirectory;
use crate::repository::{AssignmentRepository, FileAssignmentRepository};
use crate::service::EntitlementService;
use crate::store::AssignmentStore;
use crate::workers::{Command, SweepWorker};

/// Main runtime that owns the timed-rank machinery
///
/// Design: Runtime owns the worker and the store lifecycle.
/// [`RuntimeHandle`] provides a cloneable façade for hosts.
pub struct Runtime {
    config: RuntimeConfig,
    handle: RuntimeHandle,

    // Taken by the worker on the first `initialize`
    command_rx: Option<mpsc::Receiver<Command>>,

    // Background worker
    sweep_worker_handle: Option<JoinHandle<()>>,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Get a cloneable handle to this runtime
    ///
    /// The handle can be shared across clients and async tasks. Sweep
    /// requests are only answered once [`Runtime::initialize`] has run.
    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    pub fn is_initialized(&self) -> bool {
        self.command_rx.is_none()
    }

    /// Load persisted assignments, re-apply badges to connected subjects and
    /// start the sweep worker.
    ///
    /// Calling this again after a successful start does nothing.
    pub async fn initialize(&mut self) {
        let Some(command_rx) = self.command_rx.take() else {
            return;
        };

        let service = Arc::clone(self.handle.service());
        let loaded = service.store().load();
        info!("Loaded {} assignment(s)", loaded);

        let connected = service.directory().connected();
        let applied = service.reapply_all(&connected).await;
        info!(
            "Re-applied {} badge(s) across {} connected subject(s)",
            applied,
            connected.len()
        );

        let worker = SweepWorker::new(service, self.config.sweep_interval, command_rx);
        self.sweep_worker_handle = Some(tokio::spawn(async move {
            worker.run().await;
        }));
    }

    /// Shutdown the runtime gracefully
    ///
    /// Stops the sweep worker, waits for it and writes the index one last time.
    pub async fn shutdown(self) -> Result<()> {
        if let Some(worker) = self.sweep_worker_handle {
            if let Err(e) = self.handle.request_shutdown().await {
                warn!("Sweep worker already gone: {}", e);
            }
            worker.await.map_err(RuntimeError::WorkerJoin)?;
        }

        let store = self.handle.service().store();
        if store.persist() {
            info!("Final persist complete ({} assignment(s))", store.len());
        }

        Ok(())
    }
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    repository: Option<Arc<dyn AssignmentRepository>>,
    badges: Option<Arc<dyn BadgeAdapter>>,
    directory: Option<Arc<dyn SessionDirectory>>,
    clock: Option<Arc<dyn Clock>>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            repository: None,
            badges: None,
            directory: None,
            clock: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Persist somewhere other than the file under `config.data_dir` (optional)
    pub fn repository(mut self, repository: Arc<dyn AssignmentRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Set the required badge adapter
    pub fn badge_adapter(mut self, badges: Arc<dyn BadgeAdapter>) -> Self {
        self.badges = Some(badges);
        self
    }

    /// Set the required session directory
    pub fn directory(mut self, directory: Arc<dyn SessionDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Replace the system clock (optional)
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Build the runtime
    ///
    /// Nothing is loaded and no task is spawned until
    /// [`Runtime::initialize`].
    pub fn build(self) -> Result<Runtime> {
        let badges = self
            .badges
            .ok_or(RuntimeError::MissingCollaborator("badge adapter"))?;
        let directory = self
            .directory
            .ok_or(RuntimeError::MissingCollaborator("session directory"))?;

        let repository: Arc<dyn AssignmentRepository> = match self.repository {
            Some(repository) => repository,
            None => Arc::new(FileAssignmentRepository::new(&self.config.data_dir)?),
        };
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock) as Arc<dyn Clock>);

        let store = Arc::new(AssignmentStore::new(repository));
        let service = EntitlementService::new(store, badges, directory, clock)
            .with_policy(self.config.reassign_policy)
            .with_badge_color(self.config.badge_color.clone());

        let (command_tx, command_rx) = mpsc::channel::<Command>(self.config.command_buffer_size);
        let handle = RuntimeHandle::new(Arc::new(service), command_tx);

        Ok(Runtime {
            config: self.config,
            handle,
            command_rx: Some(command_rx),
            sweep_worker_handle: None,
        })
    }
}
