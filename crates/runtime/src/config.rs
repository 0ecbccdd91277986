//! Runtime configuration structures and loaders.
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::badge::Badge;

/// What a grant does when the subject already holds an unexpired assignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ReassignPolicy {
    /// Replace the existing assignment (new rank, new term from now).
    #[default]
    Overwrite,
    /// Refuse the grant; the operator must remove the assignment first.
    Reject,
}

/// Configuration shared by the store, service and sweep worker.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Directory holding `vip_assignments.jsonl`.
    pub data_dir: PathBuf,
    /// Period of the expiration sweep. Bounds how long a badge can linger
    /// after its assignment expires.
    pub sweep_interval: Duration,
    /// Upper bound on each badge mechanism attempt.
    pub badge_timeout: Duration,
    pub reassign_policy: ReassignPolicy,
    pub badge_color: String,
    pub command_buffer_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            sweep_interval: Duration::from_secs(60),
            badge_timeout: Duration::from_millis(2000),
            reassign_policy: ReassignPolicy::default(),
            badge_color: Badge::DEFAULT_COLOR.to_string(),
            command_buffer_size: 8,
        }
    }
}

impl RuntimeConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `RANK_DATA_DIR` - Directory for the assignment file (default: platform data dir)
    /// - `SWEEP_INTERVAL_SECS` - Seconds between expiration sweeps (default: 60)
    /// - `BADGE_TIMEOUT_MS` - Timeout per badge mechanism attempt (default: 2000)
    /// - `REASSIGN_POLICY` - `overwrite` or `reject` (default: overwrite)
    /// - `BADGE_COLOR` - Color for applied badges (default: yellow)
    /// - `COMMAND_BUFFER` - Sweep worker command queue size (default: 8)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`RuntimeConfig::from_env`] with variables read through `lookup`.
    /// Unparsable values keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(dir) = lookup("RANK_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }

        if let Some(secs) = read_var::<u64>(&lookup, "SWEEP_INTERVAL_SECS") {
            config.sweep_interval = Duration::from_secs(secs.max(1));
        }

        if let Some(ms) = read_var::<u64>(&lookup, "BADGE_TIMEOUT_MS") {
            config.badge_timeout = Duration::from_millis(ms.max(1));
        }

        if let Some(policy) = read_var::<ReassignPolicy>(&lookup, "REASSIGN_POLICY") {
            config.reassign_policy = policy;
        }

        if let Some(color) = lookup("BADGE_COLOR")
            && !color.trim().is_empty()
        {
            config.badge_color = color.trim().to_string();
        }

        if let Some(capacity) = read_var::<usize>(&lookup, "COMMAND_BUFFER") {
            config.command_buffer_size = capacity.max(1);
        }

        config
    }

    /// Path of the persisted assignment file under `data_dir`.
    pub fn assignments_path(&self) -> PathBuf {
        self.data_dir
            .join(crate::repository::FileAssignmentRepository::FILE_NAME)
    }
}

/// Platform data directory for persisted assignments.
///
/// - Linux: `~/.local/share/rankd` (or `$XDG_DATA_HOME/rankd`)
/// - macOS: `~/Library/Application Support/rankd`
/// - Windows: `%APPDATA%\rankd\data`
/// - Fallback: `./.plugin-data/rankd`
pub fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "rankd")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./.plugin-data/rankd"))
}

fn read_var<T>(lookup: impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    lookup(key)?.trim().parse().ok()
}
