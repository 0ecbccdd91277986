//! Operator command contract.
//!
//! Hosts parse their own command syntax and call [`CommandSurface`]; every
//! call yields a [`CommandResponse`] ready to show to the issuer.
use std::fmt;
use std::sync::Arc;

use tracing::info;

use crate::service::EntitlementService;

/// Reply to an operator command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResponse {
    pub ok: bool,
    pub message: String,
}

impl CommandResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

impl fmt::Display for CommandResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[derive(Clone)]
pub struct CommandSurface {
    service: Arc<EntitlementService>,
}

impl CommandSurface {
    pub fn new(service: Arc<EntitlementService>) -> Self {
        Self { service }
    }

    /// `vip set <player> <rank> <days>`
    pub async fn grant(&self, issuer: &str, query: &str, rank: &str, days: i64) -> CommandResponse {
        let grant = match self.service.grant(query, rank, days).await {
            Ok(grant) => grant,
            Err(e) => return CommandResponse::failure(e.to_string()),
        };

        let rank = &grant.assignment.rank;
        let nickname = &grant.subject.nickname;
        info!(
            "{} assigned VIP '{}' to {} for {} day(s)",
            issuer, rank, nickname, days
        );
        self.service.notify(
            &grant.subject,
            &format!("You received VIP rank {} for {} days!", rank, days),
        );

        CommandResponse::success(format!(
            "Assigned rank '{}' to {} for {} day(s).",
            rank, nickname, days
        ))
    }

    /// `vip remove <player>`
    pub async fn remove(&self, issuer: &str, query: &str) -> CommandResponse {
        match self.service.remove(query).await {
            Ok(removal) if removal.removed => {
                info!("{} removed VIP from {}", issuer, removal.subject.nickname);
                CommandResponse::success(format!("Removed VIP from {}.", removal.subject.nickname))
            }
            Ok(_) => CommandResponse::failure("Player does not have an active VIP assignment."),
            Err(e) => CommandResponse::failure(e.to_string()),
        }
    }

    /// `vip status <player>`
    pub fn status(&self, query: &str) -> CommandResponse {
        let Some(subject) = self.service.resolve(query) else {
            return CommandResponse::failure("Player not found.");
        };

        match self.service.status(&subject.id) {
            Some(assignment) => {
                let remaining = assignment.remaining_at(self.service.now());
                CommandResponse::success(format!(
                    "VIP '{}' active. Remaining: {}",
                    assignment.rank, remaining
                ))
            }
            None => CommandResponse::success("No active VIP assignment."),
        }
    }
}
