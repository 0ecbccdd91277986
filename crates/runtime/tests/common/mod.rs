//! Shared doubles for runtime integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rank_core::{Subject, SubjectId};
use rank_runtime::{
    AssignmentStore, Badge, BadgeAdapter, BadgeOutcome, EntitlementService,
    InMemoryAssignmentRepository, ManualClock, ReassignPolicy, SessionDirectory,
};

/// Badge adapter that records every call and can be told to fail.
#[derive(Default)]
pub struct RecordingBadges {
    calls: Mutex<Vec<String>>,
    failing: Mutex<bool>,
}

impl RecordingBadges {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == call).count()
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    fn outcome(&self) -> BadgeOutcome {
        if *self.failing.lock().unwrap() {
            BadgeOutcome::Exhausted
        } else {
            BadgeOutcome::Succeeded { mechanism: "recording" }
        }
    }
}

#[async_trait]
impl BadgeAdapter for RecordingBadges {
    async fn apply(&self, subject: &Subject, badge: &Badge) -> BadgeOutcome {
        self.calls
            .lock()
            .unwrap()
            .push(format!("apply:{}:{}", subject.id, badge.text));
        self.outcome()
    }

    async fn clear(&self, subject: &Subject) -> BadgeOutcome {
        self.calls
            .lock()
            .unwrap()
            .push(format!("clear:{}", subject.id));
        self.outcome()
    }
}

/// In-memory session list with recorded notices.
#[derive(Default)]
pub struct TestDirectory {
    online: Mutex<Vec<Subject>>,
    notices: Mutex<Vec<(SubjectId, String)>>,
}

impl TestDirectory {
    pub fn with(subjects: &[Subject]) -> Self {
        let directory = Self::default();
        for subject in subjects {
            directory.connect(subject.clone());
        }
        directory
    }

    pub fn connect(&self, subject: Subject) {
        self.online.lock().unwrap().push(subject);
    }

    pub fn disconnect(&self, id: &str) {
        let id = SubjectId::new(id);
        self.online.lock().unwrap().retain(|s| s.id != id);
    }

    pub fn notices(&self) -> Vec<(SubjectId, String)> {
        self.notices.lock().unwrap().clone()
    }
}

impl SessionDirectory for TestDirectory {
    fn find(&self, query: &str) -> Option<Subject> {
        let id = SubjectId::new(query);
        self.online
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == id || s.nickname.to_lowercase() == query.to_lowercase())
            .cloned()
    }

    fn connected(&self) -> Vec<Subject> {
        self.online.lock().unwrap().clone()
    }

    fn notify(&self, subject: &Subject, message: &str) {
        self.notices
            .lock()
            .unwrap()
            .push((subject.id.clone(), message.to_string()));
    }
}

pub fn player(id: &str, nickname: &str) -> Subject {
    Subject::new(id, nickname)
}

pub fn epoch() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2025-03-01T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

/// A service over an in-memory repository with a manual clock.
pub struct Fixture {
    pub service: Arc<EntitlementService>,
    pub repository: Arc<InMemoryAssignmentRepository>,
    pub badges: Arc<RecordingBadges>,
    pub directory: Arc<TestDirectory>,
    pub clock: Arc<ManualClock>,
}

impl Fixture {
    pub fn new(online: &[Subject]) -> Self {
        Self::with_policy(online, ReassignPolicy::Overwrite)
    }

    pub fn with_policy(online: &[Subject], policy: ReassignPolicy) -> Self {
        let repository = Arc::new(InMemoryAssignmentRepository::new());
        let badges = Arc::new(RecordingBadges::default());
        let directory = Arc::new(TestDirectory::with(online));
        let clock = Arc::new(ManualClock::new(epoch()));

        let store = Arc::new(AssignmentStore::new(repository.clone()));
        let service = EntitlementService::new(
            store,
            badges.clone(),
            directory.clone(),
            clock.clone(),
        )
        .with_policy(policy);

        Self {
            service: Arc::new(service),
            repository,
            badges,
            directory,
            clock,
        }
    }
}
