//! Simulated player sessions and the badge mechanisms that render on them.
//!
//! [`ConsoleSessions`] plays the role of the game server's session API: it
//! tracks who is connected, exposes the fields a badge can be written to and
//! prints broadcasts to stdout.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use rank_core::{Subject, SubjectId};
use rank_runtime::{Badge, BadgeError, BadgeMechanism, SessionDirectory};
use tracing::{debug, info};

/// Badge-related fields of one connected session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionView {
    pub rank_name: Option<String>,
    pub rank_color: Option<String>,
    pub server_roles: Option<String>,
    /// Number of times the session was pushed to the client.
    pub refreshes: u32,
}

#[derive(Clone, Debug)]
struct Session {
    subject: Subject,
    view: SessionView,
}

/// In-memory session registry.
pub struct ConsoleSessions {
    sessions: Mutex<Vec<Session>>,
    rank_properties: bool,
}

impl ConsoleSessions {
    /// `rank_properties` says whether sessions expose rank name/color fields.
    pub fn new(rank_properties: bool) -> Self {
        Self {
            sessions: Mutex::new(Vec::new()),
            rank_properties,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Session>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a connection; a reconnect replaces the old session.
    pub fn connect(&self, subject: Subject) {
        let mut sessions = self.lock();
        sessions.retain(|s| s.subject.id != subject.id);
        sessions.push(Session {
            subject,
            view: SessionView::default(),
        });
    }

    /// Drop the session matching `query`, returning its subject.
    pub fn disconnect(&self, query: &str) -> Option<Subject> {
        let mut sessions = self.lock();
        let position = sessions.iter().position(|s| matches(&s.subject, query))?;
        Some(sessions.remove(position).subject)
    }

    pub fn view(&self, id: &SubjectId) -> Option<SessionView> {
        self.lock()
            .iter()
            .find(|s| &s.subject.id == id)
            .map(|s| s.view.clone())
    }

    /// Connected subjects with their rendered badge text, if any.
    pub fn listing(&self) -> Vec<(Subject, Option<String>)> {
        self.lock()
            .iter()
            .map(|s| {
                let badge = s.view.rank_name.clone().or_else(|| s.view.server_roles.clone());
                (s.subject.clone(), badge)
            })
            .collect()
    }

    fn update<F>(&self, id: &SubjectId, f: F) -> Result<(), BadgeError>
    where
        F: FnOnce(&mut SessionView),
    {
        let mut sessions = self.lock();
        let session = sessions
            .iter_mut()
            .find(|s| &s.subject.id == id)
            .ok_or(BadgeError::Disconnected)?;
        f(&mut session.view);
        Ok(())
    }
}

fn matches(subject: &Subject, query: &str) -> bool {
    let query = query.trim();
    subject.id == SubjectId::new(query) || subject.nickname.to_lowercase() == query.to_lowercase()
}

impl SessionDirectory for ConsoleSessions {
    fn find(&self, query: &str) -> Option<Subject> {
        self.lock()
            .iter()
            .find(|s| matches(&s.subject, query))
            .map(|s| s.subject.clone())
    }

    fn connected(&self) -> Vec<Subject> {
        self.lock().iter().map(|s| s.subject.clone()).collect()
    }

    fn get(&self, id: &SubjectId) -> Option<Subject> {
        self.lock()
            .iter()
            .find(|s| &s.subject.id == id)
            .map(|s| s.subject.clone())
    }

    fn notify(&self, subject: &Subject, message: &str) {
        info!("Broadcast to {}: {}", subject.nickname, message);
        println!("[to {}] {}", subject.nickname, message);
    }
}

/// Primary mechanism: typed rank name and color fields, then a refresh.
pub struct RankProperties {
    sessions: Arc<ConsoleSessions>,
}

impl RankProperties {
    pub fn new(sessions: Arc<ConsoleSessions>) -> Self {
        Self { sessions }
    }
}

#[async_trait]
impl BadgeMechanism for RankProperties {
    fn name(&self) -> &'static str {
        "rank-properties"
    }

    async fn apply(&self, subject: &Subject, badge: &Badge) -> Result<(), BadgeError> {
        if !self.sessions.rank_properties {
            return Err(BadgeError::Unavailable);
        }
        self.sessions.update(&subject.id, |view| {
            view.rank_name = Some(badge.text.clone());
            view.rank_color = Some(badge.color.clone());
            view.refreshes += 1;
        })
    }

    async fn clear(&self, subject: &Subject) -> Result<(), BadgeError> {
        if !self.sessions.rank_properties {
            return Err(BadgeError::Unavailable);
        }
        self.sessions.update(&subject.id, |view| {
            view.rank_name = None;
            view.rank_color = None;
            view.refreshes += 1;
        })
    }
}

/// Fallback mechanism: the raw role-text field every host version has.
pub struct ServerRolesText {
    sessions: Arc<ConsoleSessions>,
}

impl ServerRolesText {
    pub fn new(sessions: Arc<ConsoleSessions>) -> Self {
        Self { sessions }
    }
}

#[async_trait]
impl BadgeMechanism for ServerRolesText {
    fn name(&self) -> &'static str {
        "server-roles-text"
    }

    async fn apply(&self, subject: &Subject, badge: &Badge) -> Result<(), BadgeError> {
        debug!("Writing role text for {}", subject.nickname);
        self.sessions.update(&subject.id, |view| {
            view.server_roles = Some(badge.text.clone());
        })
    }

    async fn clear(&self, subject: &Subject) -> Result<(), BadgeError> {
        self.sessions.update(&subject.id, |view| {
            view.server_roles = None;
        })
    }
}
