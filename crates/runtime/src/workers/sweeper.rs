//! Expiration sweep worker.
//!
//! Owns no state of its own: every tick delegates to
//! [`EntitlementService::sweep_expired`], which touches the index only through
//! the store. Ticks that fall behind are skipped rather than bunched up.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

use crate::service::{EntitlementService, SweepReport};

/// Commands that can be sent to the sweep worker
pub enum Command {
    /// Run a sweep immediately and reply with its report
    SweepNow { reply: oneshot::Sender<SweepReport> },

    /// Stop the worker after the current tick
    Shutdown,
}

/// Background worker that evicts expired assignments on a fixed interval.
pub struct SweepWorker {
    service: Arc<EntitlementService>,
    interval: Duration,
    command_rx: mpsc::Receiver<Command>,
}

impl SweepWorker {
    pub fn new(
        service: Arc<EntitlementService>,
        interval: Duration,
        command_rx: mpsc::Receiver<Command>,
    ) -> Self {
        Self {
            service,
            interval,
            command_rx,
        }
    }

    /// Main worker loop
    pub async fn run(mut self) {
        info!("SweepWorker started: interval={:?}", self.interval);

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep().await;
                }

                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(Command::SweepNow { reply }) => {
                            let report = self.sweep().await;
                            let _ = reply.send(report);
                        }
                        Some(Command::Shutdown) => {
                            info!("Shutdown command received");
                            break;
                        }
                        None => {
                            debug!("Command channel closed");
                            break;
                        }
                    }
                }
            }
        }

        info!("SweepWorker stopped");
    }

    async fn sweep(&self) -> SweepReport {
        let report = self.service.sweep_expired().await;
        if report.is_empty() {
            debug!("Sweep found nothing to expire");
        } else {
            info!(
                "Sweep evicted {} assignment(s); badges cleared={}, failed={}",
                report.evicted, report.cleared, report.clear_failures
            );
        }
        report
    }
}
