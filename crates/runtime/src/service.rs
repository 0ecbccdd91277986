//! Business rules for granting, revoking and expiring ranks.
//!
//! [`EntitlementService`] validates requests, mutates the [`AssignmentStore`]
//! and then drives badge side effects. Side effects always run after the store
//! lock has been released and their failures never undo a mutation.
//!
//! Every eviction path (removal, join of an expired subject, sweep) goes
//! through a conditional store removal; only the caller that actually removed
//! the entry issues the badge clear.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rank_core::{Assignment, RankLabel, Subject, SubjectId, TermDays};
use tracing::{debug, info, warn};

use crate::api::errors::EntitlementError;
use crate::badge::{Badge, BadgeAdapter, BadgeOutcome};
use crate::clock::Clock;
use crate::config::ReassignPolicy;
use crate::directory::SessionDirectory;
use crate::store::AssignmentStore;

pub type Result<T> = std::result::Result<T, EntitlementError>;

/// A successful grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    pub subject: Subject,
    pub assignment: Assignment,
    /// The assignment this grant overwrote, expired or not.
    pub replaced: Option<Assignment>,
    pub badge: BadgeOutcome,
}

/// Result of a removal request for a resolved subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removal {
    pub subject: Subject,
    /// Whether an assignment existed and was deleted.
    pub removed: bool,
}

/// What happened when a subject connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    NoAssignment,
    /// The stored assignment had already expired and was removed.
    Evicted,
    /// The active rank was pushed to the session.
    Applied(BadgeOutcome),
}

/// Counters for one expiration pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Assignments removed because they expired.
    pub evicted: usize,
    /// Badges cleared on connected subjects.
    pub cleared: usize,
    pub clear_failures: usize,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.evicted == 0
    }
}

/// A resolved target of an operator command.
struct Target {
    subject: Subject,
    connected: bool,
}

pub struct EntitlementService {
    store: Arc<AssignmentStore>,
    badges: Arc<dyn BadgeAdapter>,
    directory: Arc<dyn SessionDirectory>,
    clock: Arc<dyn Clock>,
    policy: ReassignPolicy,
    badge_color: String,
}

impl EntitlementService {
    pub fn new(
        store: Arc<AssignmentStore>,
        badges: Arc<dyn BadgeAdapter>,
        directory: Arc<dyn SessionDirectory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            badges,
            directory,
            clock,
            policy: ReassignPolicy::default(),
            badge_color: Badge::DEFAULT_COLOR.to_string(),
        }
    }

    pub fn with_policy(mut self, policy: ReassignPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_badge_color(mut self, color: impl Into<String>) -> Self {
        self.badge_color = color.into();
        self
    }

    pub fn store(&self) -> &Arc<AssignmentStore> {
        &self.store
    }

    pub fn directory(&self) -> &Arc<dyn SessionDirectory> {
        &self.directory
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Look up a connected subject by id or nickname.
    pub fn resolve(&self, query: &str) -> Option<Subject> {
        self.directory.find(query.trim())
    }

    /// Grant `rank` to the subject matching `query` for `days` days from now.
    ///
    /// Validation order: subject, rank, duration. Under
    /// [`ReassignPolicy::Reject`] an unexpired assignment blocks the grant;
    /// an expired one that has not been swept yet is overwritten.
    pub async fn grant(&self, query: &str, rank: &str, days: i64) -> Result<Grant> {
        let subject = self
            .resolve(query)
            .ok_or_else(|| EntitlementError::SubjectNotFound {
                query: query.trim().to_string(),
            })?;
        let rank = RankLabel::parse(rank)?;
        let term = TermDays::new(days)?;

        let now = self.clock.now();
        let assignment = Assignment::grant(subject.id.clone(), rank, term, now);

        let replaced = match self.policy {
            ReassignPolicy::Overwrite => self.store.put(assignment.clone()),
            ReassignPolicy::Reject => self
                .store
                .put_unless(assignment.clone(), |existing| !existing.is_expired_at(now))
                .map_err(|existing| EntitlementError::AlreadyAssigned {
                    subject: existing.subject_id,
                    rank: existing.rank,
                    expires_at: existing.expires_at,
                })?,
        };

        info!(
            "Granted rank '{}' to {} ({}) until {}",
            assignment.rank,
            subject.nickname,
            subject.id,
            assignment.expires_at.to_rfc3339()
        );
        if let Some(previous) = &replaced {
            debug!("Replaced previous rank '{}' for {}", previous.rank, subject.id);
        }

        let badge = self.apply_badge(&subject, &assignment).await;

        Ok(Grant {
            subject,
            assignment,
            replaced,
            badge,
        })
    }

    /// Remove the assignment of the subject matching `query`.
    ///
    /// Offline subjects are addressed by their exact id. The badge is cleared
    /// only for a connected subject whose assignment was actually removed.
    pub async fn remove(&self, query: &str) -> Result<Removal> {
        let Target { subject, connected } = self.resolve_target(query)?;

        let removed = self.store.remove(&subject.id);
        if removed {
            info!("Removed rank from {} ({})", subject.nickname, subject.id);
            if connected {
                self.badges.clear(&subject).await;
            }
        }

        Ok(Removal { subject, removed })
    }

    /// The subject's active assignment. Expired entries awaiting the next
    /// sweep are reported as absent.
    pub fn status(&self, subject_id: &SubjectId) -> Option<Assignment> {
        let now = self.clock.now();
        self.store
            .get(subject_id)
            .filter(|assignment| !assignment.is_expired_at(now))
    }

    /// Send a short message to a connected subject.
    pub fn notify(&self, subject: &Subject, message: &str) {
        self.directory.notify(subject, message);
    }

    /// Reconcile a freshly connected subject with its stored assignment.
    pub async fn on_subject_connected(&self, subject: &Subject) -> JoinOutcome {
        let now = self.clock.now();

        let Some(current) = self.store.get(&subject.id) else {
            return JoinOutcome::NoAssignment;
        };

        if !current.is_expired_at(now) {
            return JoinOutcome::Applied(self.apply_badge(subject, &current).await);
        }

        if let Some(expired) = self
            .store
            .remove_if(&subject.id, |assignment| assignment.is_expired_at(now))
        {
            info!(
                "Rank '{}' of {} expired while offline, removed on join",
                expired.rank, subject.nickname
            );
            self.badges.clear(subject).await;
            return JoinOutcome::Evicted;
        }

        // Lost the race to a sweep or a concurrent grant.
        match self.status(&subject.id) {
            Some(fresh) => JoinOutcome::Applied(self.apply_badge(subject, &fresh).await),
            None => JoinOutcome::NoAssignment,
        }
    }

    /// Run join reconciliation for every subject; returns how many had an
    /// active rank applied.
    pub async fn reapply_all(&self, subjects: &[Subject]) -> usize {
        let mut applied = 0;
        for subject in subjects {
            if let JoinOutcome::Applied(_) = self.on_subject_connected(subject).await {
                applied += 1;
            }
        }
        applied
    }

    /// Remove every assignment that has expired and clear connected badges.
    ///
    /// An entry re-granted between the snapshot and its removal is kept. One
    /// re-granted after the removal gets its badge back once the clear is done.
    pub async fn sweep_expired(&self) -> SweepReport {
        let now = self.clock.now();
        let expired: Vec<SubjectId> = self
            .store
            .snapshot()
            .into_iter()
            .filter(|assignment| assignment.is_expired_at(now))
            .map(|assignment| assignment.subject_id)
            .collect();

        let mut report = SweepReport::default();
        for subject_id in expired {
            let Some(removed) = self
                .store
                .remove_if(&subject_id, |assignment| assignment.is_expired_at(now))
            else {
                continue;
            };
            report.evicted += 1;
            info!("Rank '{}' expired for {}", removed.rank, removed.subject_id);

            let Some(subject) = self.directory.get(&subject_id) else {
                continue;
            };
            if self.badges.clear(&subject).await.is_success() {
                report.cleared += 1;
            } else {
                report.clear_failures += 1;
            }

            // A grant landing between the removal and the clear keeps its badge.
            if let Some(fresh) = self.status(&subject_id) {
                debug!("Re-applying rank '{}' granted to {} during sweep", fresh.rank, subject_id);
                self.apply_badge(&subject, &fresh).await;
            }
        }

        report
    }

    fn resolve_target(&self, query: &str) -> Result<Target> {
        if let Some(subject) = self.resolve(query) {
            return Ok(Target {
                subject,
                connected: true,
            });
        }

        let id = SubjectId::new(query.trim());
        match self.store.get(&id) {
            Some(assignment) if !id.is_empty() => {
                let nickname = assignment.subject_id.to_string();
                Ok(Target {
                    subject: Subject::new(assignment.subject_id, nickname),
                    connected: false,
                })
            }
            _ => Err(EntitlementError::SubjectNotFound {
                query: query.trim().to_string(),
            }),
        }
    }

    async fn apply_badge(&self, subject: &Subject, assignment: &Assignment) -> BadgeOutcome {
        let badge = Badge::new(assignment.rank.as_str(), self.badge_color.as_str());
        let outcome = self.badges.apply(subject, &badge).await;
        if !outcome.is_success() {
            warn!(
                "Rank '{}' stays active for {} without a visible badge",
                assignment.rank, subject.nickname
            );
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::repository::InMemoryAssignmentRepository;
    use async_trait::async_trait;
    use chrono::TimeDelta;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl BadgeAdapter for Recorder {
        async fn apply(&self, subject: &Subject, badge: &Badge) -> BadgeOutcome {
            self.calls
                .lock()
                .unwrap()
                .push(format!("apply:{}:{}:{}", subject.id, badge.text, badge.color));
            BadgeOutcome::Succeeded { mechanism: "test" }
        }

        async fn clear(&self, subject: &Subject) -> BadgeOutcome {
            self.calls.lock().unwrap().push(format!("clear:{}", subject.id));
            BadgeOutcome::Succeeded { mechanism: "test" }
        }
    }

    struct Online(Vec<Subject>);

    impl SessionDirectory for Online {
        fn find(&self, query: &str) -> Option<Subject> {
            let id = SubjectId::new(query);
            self.0
                .iter()
                .find(|s| s.id == id || s.nickname.eq_ignore_ascii_case(query))
                .cloned()
        }

        fn connected(&self) -> Vec<Subject> {
            self.0.clone()
        }
    }

    fn service(online: Vec<Subject>) -> (EntitlementService, Arc<Recorder>, Arc<ManualClock>) {
        let store = Arc::new(AssignmentStore::new(Arc::new(
            InMemoryAssignmentRepository::new(),
        )));
        let badges = Arc::new(Recorder::default());
        let clock = Arc::new(ManualClock::starting_now());
        let service = EntitlementService::new(store, badges.clone(), Arc::new(Online(online)), clock.clone());
        (service, badges, clock)
    }

    fn alice() -> Subject {
        Subject::new("alice@steam", "Alice")
    }

    #[tokio::test]
    async fn test_grant_resolves_by_nickname_and_applies_badge() {
        let (service, badges, _clock) = service(vec![alice()]);

        let grant = service.grant("alice", "  VIP ", 3).await.unwrap();

        assert_eq!(grant.subject, alice());
        assert_eq!(grant.assignment.rank.as_str(), "VIP");
        assert_eq!(badges.calls(), vec!["apply:alice@steam:VIP:yellow"]);
    }

    #[tokio::test]
    async fn test_grant_validation_order() {
        let (service, _badges, _clock) = service(vec![alice()]);

        let err = service.grant("bob", "", 0).await.unwrap_err();
        assert_eq!(err.kind(), crate::api::errors::ErrorKind::NotFound);

        let err = service.grant("alice", " ", 0).await.unwrap_err();
        assert_eq!(err.to_string(), "Rank cannot be empty.");

        let err = service.grant("alice", "VIP", 3651).await.unwrap_err();
        assert_eq!(err.to_string(), "Days must be between 1 and 3650.");
        assert!(service.store().is_empty());
    }

    #[tokio::test]
    async fn test_reject_policy_allows_regrant_after_expiry() {
        let (service, _badges, clock) = service(vec![alice()]);
        let service = service.with_policy(ReassignPolicy::Reject);

        service.grant("alice", "VIP", 1).await.unwrap();
        assert!(service.grant("alice", "MVP", 1).await.is_err());

        clock.advance(TimeDelta::days(1));
        let grant = service.grant("alice", "MVP", 1).await.unwrap();
        assert_eq!(grant.replaced.unwrap().rank.as_str(), "VIP");
    }

    #[tokio::test]
    async fn test_join_evicts_expired_and_clears() {
        let (service, badges, clock) = service(vec![alice()]);
        service.grant("alice", "VIP", 1).await.unwrap();
        clock.advance(TimeDelta::hours(25));

        assert!(service.status(&alice().id).is_none());
        assert_eq!(service.on_subject_connected(&alice()).await, JoinOutcome::Evicted);
        assert_eq!(
            service.on_subject_connected(&alice()).await,
            JoinOutcome::NoAssignment
        );
        assert_eq!(badges.calls().last().unwrap(), "clear:alice@steam");
    }

    /// Adapter whose clear lets a pending grant land in the store first.
    struct RegrantOnClear {
        store: Arc<AssignmentStore>,
        pending: Mutex<Option<Assignment>>,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl BadgeAdapter for RegrantOnClear {
        async fn apply(&self, subject: &Subject, badge: &Badge) -> BadgeOutcome {
            self.calls
                .lock()
                .unwrap()
                .push(format!("apply:{}:{}", subject.id, badge.text));
            BadgeOutcome::Succeeded { mechanism: "test" }
        }

        async fn clear(&self, subject: &Subject) -> BadgeOutcome {
            if let Some(assignment) = self.pending.lock().unwrap().take() {
                self.store.put(assignment);
            }
            self.calls.lock().unwrap().push(format!("clear:{}", subject.id));
            BadgeOutcome::Succeeded { mechanism: "test" }
        }
    }

    #[tokio::test]
    async fn test_sweep_reapplies_badge_granted_during_clear() {
        let store = Arc::new(AssignmentStore::new(Arc::new(
            InMemoryAssignmentRepository::new(),
        )));
        let badges = Arc::new(RegrantOnClear {
            store: store.clone(),
            pending: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        });
        let clock = Arc::new(ManualClock::starting_now());
        let service = EntitlementService::new(
            store,
            badges.clone(),
            Arc::new(Online(vec![alice()])),
            clock.clone(),
        );

        service.grant("alice", "VIP", 1).await.unwrap();
        clock.advance(TimeDelta::hours(25));
        *badges.pending.lock().unwrap() = Some(Assignment::grant(
            alice().id,
            RankLabel::parse("MVP").unwrap(),
            TermDays::new(2).unwrap(),
            clock.now(),
        ));

        let report = service.sweep_expired().await;

        assert_eq!(report.evicted, 1);
        assert_eq!(report.cleared, 1);
        assert_eq!(
            *badges.calls.lock().unwrap(),
            vec!["apply:alice@steam:VIP", "clear:alice@steam", "apply:alice@steam:MVP"]
        );
        assert_eq!(service.status(&alice().id).unwrap().rank.as_str(), "MVP");
    }

    #[tokio::test]
    async fn test_remove_offline_subject_by_id() {
        let (service, badges, _clock) = service(vec![alice()]);
        service.grant("alice", "VIP", 1).await.unwrap();

        let offline = {
            let store = service.store().clone();
            let badges: Arc<dyn BadgeAdapter> = badges.clone();
            EntitlementService::new(store, badges, Arc::new(Online(Vec::new())), service.clock.clone())
        };

        let removal = offline.remove("ALICE@steam").await.unwrap();
        assert!(removal.removed);
        assert!(!badges.calls().iter().any(|c| c.starts_with("clear")));

        assert!(offline.remove("alice@steam").await.is_err());
    }
}
