//! Console host for the timed-rank runtime.
//!
//! The `rankd` binary is the composition root: it builds simulated sessions,
//! the badge mechanisms that render on them and a [`rank_runtime::Runtime`],
//! then feeds stdin lines through [`console::Console`].
pub mod config;
pub mod console;
pub mod logging;
pub mod session;

use std::sync::Arc;

use rank_runtime::{FallbackBadgeAdapter, RuntimeConfig};

use crate::session::{ConsoleSessions, RankProperties, ServerRolesText};

pub use config::HostConfig;
pub use console::{Console, ConsoleCommand, Flow};

/// Badge adapter trying typed rank properties first, then role text.
pub fn badge_adapter(sessions: &Arc<ConsoleSessions>, config: &RuntimeConfig) -> FallbackBadgeAdapter {
    FallbackBadgeAdapter::new(config.badge_timeout)
        .with_mechanism(RankProperties::new(Arc::clone(sessions)))
        .with_mechanism(ServerRolesText::new(Arc::clone(sessions)))
}
