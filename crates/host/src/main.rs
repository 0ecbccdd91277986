//! `rankd`: console host for time-limited VIP ranks.
//!
//! # Architecture
//!
//! This binary is the composition root that assembles:
//! 1. Simulated sessions (directory + badge mechanisms)
//! 2. Runtime (store, service, sweep worker) via RuntimeBuilder
//! 3. Console (stdin command loop)
//!
//! # Examples
//!
//! ```bash
//! SWEEP_INTERVAL_SECS=10 cargo run -p rank-host -- --policy reject
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use rank_host::console::read_line;
use rank_host::session::ConsoleSessions;
use rank_host::{Console, Flow, HostConfig, badge_adapter, logging};
use rank_runtime::{ReassignPolicy, Runtime, RuntimeConfig};
use tokio::io::BufReader;

/// Grants and expires timed VIP ranks for connected players
#[derive(Parser)]
#[command(name = "rankd")]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory holding vip_assignments.jsonl (overrides RANK_DATA_DIR)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Seconds between expiration sweeps (overrides SWEEP_INTERVAL_SECS)
    #[arg(long)]
    sweep_interval: Option<u64>,

    /// Re-grant policy: overwrite or reject (overrides REASSIGN_POLICY)
    #[arg(long, value_parser = parse_policy)]
    policy: Option<ReassignPolicy>,
}

fn parse_policy(raw: &str) -> std::result::Result<ReassignPolicy, String> {
    raw.parse()
        .map_err(|_| format!("expected 'overwrite' or 'reject', got '{}'", raw))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    // 1. Load configuration from environment, then apply flags
    let mut runtime_config = RuntimeConfig::from_env();
    if let Some(dir) = args.data_dir {
        runtime_config.data_dir = dir;
    }
    if let Some(secs) = args.sweep_interval {
        runtime_config.sweep_interval = Duration::from_secs(secs.max(1));
    }
    if let Some(policy) = args.policy {
        runtime_config.reassign_policy = policy;
    }
    let host_config = HostConfig::from_env();

    // 2. Setup logging
    let _guard = logging::setup_logging()?;

    tracing::info!("Starting rankd");

    // 3. Build sessions and runtime
    let sessions = Arc::new(ConsoleSessions::new(!host_config.legacy_sessions));
    let badges = badge_adapter(&sessions, &runtime_config);
    tracing::debug!("Badge mechanisms: {:?}", badges.mechanism_names());

    let mut runtime = Runtime::builder()
        .config(runtime_config)
        .badge_adapter(Arc::new(badges))
        .directory(sessions.clone())
        .build()?;

    let config = runtime.config();
    tracing::info!("Assignments: {}", config.assignments_path().display());
    tracing::info!(
        "Sweep interval: {:?}, policy: {}",
        config.sweep_interval,
        config.reassign_policy
    );
    runtime.initialize().await;

    // 4. Run the console until EOF, quit or Ctrl-C
    let console = Console::new(runtime.handle(), sessions, host_config);
    let mut stdin = BufReader::new(tokio::io::stdin());
    let mut buf = Vec::new();

    loop {
        tokio::select! {
            line = read_line(&mut stdin, &mut buf) => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        tracing::debug!("stdin closed");
                        break;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to read stdin: {}", e);
                        break;
                    }
                };
                let (replies, flow) = console.handle_line(&line).await;
                for reply in replies {
                    println!("{}", reply);
                }
                if flow == Flow::Quit {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
        }
    }

    runtime.shutdown().await?;
    tracing::info!("rankd shutdown complete");
    Ok(())
}
