//! Cloneable façade for issuing commands to the runtime.
//!
//! [`RuntimeHandle`] hides channel plumbing and gives hosts direct access to
//! the [`EntitlementService`] for commands and join events.
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use super::commands::CommandSurface;
use super::errors::{Result, RuntimeError};
use crate::service::{EntitlementService, SweepReport};
use crate::workers::Command;

/// Client-facing handle to interact with the runtime
#[derive(Clone)]
pub struct RuntimeHandle {
    service: Arc<EntitlementService>,
    command_tx: mpsc::Sender<Command>,
}

impl RuntimeHandle {
    pub(crate) fn new(service: Arc<EntitlementService>, command_tx: mpsc::Sender<Command>) -> Self {
        Self {
            service,
            command_tx,
        }
    }

    pub fn service(&self) -> &Arc<EntitlementService> {
        &self.service
    }

    /// Operator command contract backed by this runtime's service.
    pub fn commands(&self) -> CommandSurface {
        CommandSurface::new(Arc::clone(&self.service))
    }

    /// Run an expiration sweep now instead of waiting for the next tick
    pub async fn sweep_now(&self) -> Result<SweepReport> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(Command::SweepNow { reply: reply_tx })
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    pub(crate) async fn request_shutdown(&self) -> Result<()> {
        self.command_tx
            .send(Command::Shutdown)
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)
    }
}
