//! Line-oriented operator console.
//!
//! ```text
//! join <id> <nickname>          connect a simulated player
//! leave <player>                disconnect a player
//! players                       list connected players and their badges
//! vip set <player> <rank> <days>
//! vip remove <player>
//! vip status <player>
//! sweep                         run an expiration sweep now
//! quit
//! ```
//!
//! `<player>` is an id or a nickname; ranks may contain spaces.

use std::sync::Arc;

use rank_core::Subject;
use rank_runtime::{JoinOutcome, RuntimeHandle};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::info;

use crate::config::HostConfig;
use crate::session::ConsoleSessions;

/// Name recorded as the issuer of console commands.
pub const CONSOLE_ISSUER: &str = "console";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Join { id: String, nickname: String },
    Leave { player: String },
    Players,
    VipSet { player: String, rank: String, days: i64 },
    VipRemove { player: String },
    VipStatus { player: String },
    Sweep,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Unknown command '{0}'. Type 'help' for a list.")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Days must be an integer.")]
    DaysNotInteger,
}

impl ConsoleCommand {
    /// Parse one input line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, ParseError> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&head, rest)) = words.split_first() else {
            return Ok(None);
        };

        let command = match head.to_lowercase().as_str() {
            "join" => match rest {
                [id, nickname @ ..] if !nickname.is_empty() => ConsoleCommand::Join {
                    id: id.to_string(),
                    nickname: nickname.join(" "),
                },
                _ => return Err(ParseError::Usage("join <id> <nickname>")),
            },
            "leave" => match rest {
                [player] => ConsoleCommand::Leave {
                    player: player.to_string(),
                },
                _ => return Err(ParseError::Usage("leave <player>")),
            },
            "players" => ConsoleCommand::Players,
            "vip" => Self::parse_vip(rest)?,
            "sweep" => ConsoleCommand::Sweep,
            "help" => ConsoleCommand::Help,
            "quit" | "exit" => ConsoleCommand::Quit,
            other => return Err(ParseError::Unknown(other.to_string())),
        };

        Ok(Some(command))
    }

    fn parse_vip(args: &[&str]) -> Result<Self, ParseError> {
        const USAGE: &str = "vip set <player> <rank> <days> | vip remove <player> | vip status <player>";

        let Some((&sub, rest)) = args.split_first() else {
            return Err(ParseError::Usage(USAGE));
        };

        match (sub.to_lowercase().as_str(), rest) {
            ("set", [player, rank @ .., days]) if !rank.is_empty() => {
                let days = days.parse().map_err(|_| ParseError::DaysNotInteger)?;
                Ok(ConsoleCommand::VipSet {
                    player: player.to_string(),
                    rank: rank.join(" "),
                    days,
                })
            }
            ("set", _) => Err(ParseError::Usage("vip set <player> <rank> <days>")),
            ("remove", [player]) => Ok(ConsoleCommand::VipRemove {
                player: player.to_string(),
            }),
            ("status", [player]) => Ok(ConsoleCommand::VipStatus {
                player: player.to_string(),
            }),
            _ => Err(ParseError::Usage(USAGE)),
        }
    }
}

/// Read one input line, without its line terminator.
///
/// Bytes that are not valid UTF-8 are replaced rather than rejected, so one
/// garbled line cannot end the session. Returns `Ok(None)` at end of input.
pub async fn read_line<R>(reader: &mut R, buf: &mut Vec<u8>) -> std::io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    if reader.read_until(b'\n', buf).await? == 0 {
        return Ok(None);
    }

    let line = String::from_utf8_lossy(buf);
    Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
}

/// What the read loop should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Executes parsed commands against the runtime and the simulated sessions.
pub struct Console {
    handle: RuntimeHandle,
    sessions: Arc<ConsoleSessions>,
    config: HostConfig,
}

impl Console {
    pub fn new(handle: RuntimeHandle, sessions: Arc<ConsoleSessions>, config: HostConfig) -> Self {
        Self {
            handle,
            sessions,
            config,
        }
    }

    /// Parse and run one line, returning the reply lines and the next step.
    pub async fn handle_line(&self, line: &str) -> (Vec<String>, Flow) {
        match ConsoleCommand::parse(line) {
            Ok(Some(command)) => self.execute(command).await,
            Ok(None) => (Vec::new(), Flow::Continue),
            Err(e) => (vec![e.to_string()], Flow::Continue),
        }
    }

    pub async fn execute(&self, command: ConsoleCommand) -> (Vec<String>, Flow) {
        let commands = self.handle.commands();

        let lines = match command {
            ConsoleCommand::Join { id, nickname } => self.join(Subject::new(id, nickname)).await,
            ConsoleCommand::Leave { player } => match self.sessions.disconnect(&player) {
                Some(subject) => {
                    info!("Player left: {}", subject.nickname);
                    vec![format!("{} left.", subject.nickname)]
                }
                None => vec!["Player not found.".to_string()],
            },
            ConsoleCommand::Players => self.players(),
            ConsoleCommand::VipSet { player, rank, days } => {
                vec![commands.grant(CONSOLE_ISSUER, &player, &rank, days).await.message]
            }
            ConsoleCommand::VipRemove { player } => {
                vec![commands.remove(CONSOLE_ISSUER, &player).await.message]
            }
            ConsoleCommand::VipStatus { player } => vec![commands.status(&player).message],
            ConsoleCommand::Sweep => match self.handle.sweep_now().await {
                Ok(report) => vec![format!(
                    "Sweep evicted {} assignment(s), cleared {} badge(s).",
                    report.evicted, report.cleared
                )],
                Err(e) => vec![format!("Sweep failed: {}", e)],
            },
            ConsoleCommand::Help => HELP.lines().map(str::to_string).collect(),
            ConsoleCommand::Quit => return (Vec::new(), Flow::Quit),
        };

        (lines, Flow::Continue)
    }

    async fn join(&self, subject: Subject) -> Vec<String> {
        self.sessions.connect(subject.clone());
        info!("New Player Joined: {}", subject.nickname);

        let mut lines = vec![format!(
            "[hint {}s] {}",
            self.config.welcome_hint_duration.as_secs(),
            self.config.welcome_hint
        )];

        match self.handle.service().on_subject_connected(&subject).await {
            JoinOutcome::Applied(_) => {
                if let Some(assignment) = self.handle.service().status(&subject.id) {
                    lines.push(format!("{} is VIP '{}'.", subject.nickname, assignment.rank));
                }
            }
            JoinOutcome::Evicted => {
                lines.push(format!("{}'s VIP expired while offline.", subject.nickname));
            }
            JoinOutcome::NoAssignment => {}
        }

        lines
    }

    fn players(&self) -> Vec<String> {
        let listing = self.sessions.listing();
        if listing.is_empty() {
            return vec!["No players connected.".to_string()];
        }

        listing
            .into_iter()
            .map(|(subject, badge)| match badge {
                Some(badge) => format!("{} ({}) [{}]", subject.nickname, subject.id, badge),
                None => format!("{} ({})", subject.nickname, subject.id),
            })
            .collect()
    }
}

const HELP: &str = "\
join <id> <nickname>
leave <player>
players
vip set <player> <rank> <days>
vip remove <player>
vip status <player>
sweep
quit";
