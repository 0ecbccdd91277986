use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rank_core::Subject;
use tracing::{debug, warn};

use super::{Badge, BadgeAdapter, BadgeError, BadgeMechanism, BadgeOp, BadgeOutcome};

/// Tries mechanisms in order until one succeeds.
///
/// Each attempt is bounded by `attempt_timeout` so a hung session API cannot
/// stall the sweep or a command.
pub struct FallbackBadgeAdapter {
    mechanisms: Vec<Arc<dyn BadgeMechanism>>,
    attempt_timeout: Duration,
}

impl FallbackBadgeAdapter {
    pub fn new(attempt_timeout: Duration) -> Self {
        Self {
            mechanisms: Vec::new(),
            attempt_timeout,
        }
    }

    /// Append a mechanism; earlier mechanisms are preferred.
    pub fn with_mechanism(mut self, mechanism: impl BadgeMechanism + 'static) -> Self {
        self.mechanisms.push(Arc::new(mechanism));
        self
    }

    pub fn mechanism_names(&self) -> Vec<&'static str> {
        self.mechanisms.iter().map(|m| m.name()).collect()
    }

    async fn run(&self, subject: &Subject, op: BadgeOp<'_>) -> BadgeOutcome {
        for mechanism in &self.mechanisms {
            let attempt = match op {
                BadgeOp::Apply(badge) => mechanism.apply(subject, badge),
                BadgeOp::Clear => mechanism.clear(subject),
            };

            let error = match tokio::time::timeout(self.attempt_timeout, attempt).await {
                Ok(Ok(())) => {
                    debug!(
                        "Badge {} for {} via {}",
                        op,
                        subject.nickname,
                        mechanism.name()
                    );
                    return BadgeOutcome::Succeeded {
                        mechanism: mechanism.name(),
                    };
                }
                Ok(Err(e)) => e,
                Err(_) => BadgeError::TimedOut(self.attempt_timeout),
            };

            debug!(
                "Badge {} via {} failed for {}: {}",
                op,
                mechanism.name(),
                subject.nickname,
                error
            );
        }

        match op {
            BadgeOp::Apply(badge) => warn!(
                "Could not set badge for {}. RankText={}",
                subject.nickname, badge.text
            ),
            BadgeOp::Clear => warn!("Could not clear badge for {}", subject.nickname),
        }
        BadgeOutcome::Exhausted
    }
}

#[async_trait]
impl BadgeAdapter for FallbackBadgeAdapter {
    async fn apply(&self, subject: &Subject, badge: &Badge) -> BadgeOutcome {
        self.run(subject, BadgeOp::Apply(badge)).await
    }

    async fn clear(&self, subject: &Subject) -> BadgeOutcome {
        self.run(subject, BadgeOp::Clear).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mechanism with a scripted result that records every call.
    struct Scripted {
        name: &'static str,
        result: Result<(), BadgeError>,
        delay: Option<Duration>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl Scripted {
        fn new(name: &'static str, result: Result<(), BadgeError>, calls: &Arc<Mutex<Vec<String>>>) -> Self {
            Self {
                name,
                result,
                delay: None,
                calls: Arc::clone(calls),
            }
        }

        fn hanging(name: &'static str, calls: &Arc<Mutex<Vec<String>>>) -> Self {
            Self {
                delay: Some(Duration::from_secs(3600)),
                ..Self::new(name, Ok(()), calls)
            }
        }

        async fn attempt(&self, op: &str) -> Result<(), BadgeError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("{}:{}", self.name, op));
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.result.clone()
        }
    }

    #[async_trait]
    impl BadgeMechanism for Scripted {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn apply(&self, _subject: &Subject, _badge: &Badge) -> Result<(), BadgeError> {
            self.attempt("apply").await
        }

        async fn clear(&self, _subject: &Subject) -> Result<(), BadgeError> {
            self.attempt("clear").await
        }
    }

    fn subject() -> Subject {
        Subject::new("p1@steam", "Player One")
    }

    #[tokio::test]
    async fn test_primary_success_skips_fallback() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let adapter = FallbackBadgeAdapter::new(Duration::from_secs(1))
            .with_mechanism(Scripted::new("primary", Ok(()), &calls))
            .with_mechanism(Scripted::new("secondary", Ok(()), &calls));

        let outcome = adapter.apply(&subject(), &Badge::new("VIP", "yellow")).await;

        assert_eq!(outcome, BadgeOutcome::Succeeded { mechanism: "primary" });
        assert_eq!(*calls.lock().unwrap(), vec!["primary:apply"]);
    }

    #[tokio::test]
    async fn test_falls_back_in_order() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let adapter = FallbackBadgeAdapter::new(Duration::from_secs(1))
            .with_mechanism(Scripted::new("primary", Err(BadgeError::Unavailable), &calls))
            .with_mechanism(Scripted::new("secondary", Ok(()), &calls));

        let outcome = adapter.clear(&subject()).await;

        assert_eq!(outcome, BadgeOutcome::Succeeded { mechanism: "secondary" });
        assert_eq!(
            *calls.lock().unwrap(),
            vec!["primary:clear", "secondary:clear"]
        );
    }

    #[tokio::test]
    async fn test_exhaustion_is_reported_not_raised() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let adapter = FallbackBadgeAdapter::new(Duration::from_secs(1))
            .with_mechanism(Scripted::new("primary", Err(BadgeError::Disconnected), &calls))
            .with_mechanism(Scripted::new(
                "secondary",
                Err(BadgeError::Rejected("no permission".into())),
                &calls,
            ));

        let outcome = adapter.apply(&subject(), &Badge::new("VIP", "yellow")).await;

        assert_eq!(outcome, BadgeOutcome::Exhausted);
        assert_eq!(calls.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_mechanism_times_out_and_falls_back() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let adapter = FallbackBadgeAdapter::new(Duration::from_millis(250))
            .with_mechanism(Scripted::hanging("primary", &calls))
            .with_mechanism(Scripted::new("secondary", Ok(()), &calls));

        let outcome = adapter.apply(&subject(), &Badge::new("VIP", "yellow")).await;

        assert_eq!(outcome, BadgeOutcome::Succeeded { mechanism: "secondary" });
    }

    #[tokio::test]
    async fn test_no_mechanisms_is_exhausted() {
        let adapter = FallbackBadgeAdapter::new(Duration::from_secs(1));
        assert!(adapter.mechanism_names().is_empty());
        assert_eq!(adapter.clear(&subject()).await, BadgeOutcome::Exhausted);
    }
}
