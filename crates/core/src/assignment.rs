//! The assignment record binding a subject to a rank until an absolute expiry.

use chrono::{DateTime, TimeDelta, Utc};

use crate::rank::RankLabel;
use crate::remaining::Remaining;
use crate::subject::SubjectId;
use crate::term::TermDays;

/// One active entitlement. At most one exists per [`SubjectId`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Assignment {
    pub subject_id: SubjectId,
    pub rank: RankLabel,
    /// Absolute expiry in UTC.
    pub expires_at: DateTime<Utc>,
}

impl Assignment {
    /// Creates an assignment whose term starts at `granted_at`.
    pub fn grant(
        subject_id: SubjectId,
        rank: RankLabel,
        term: TermDays,
        granted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            subject_id,
            rank,
            expires_at: term.expires_from(granted_at),
        }
    }

    /// Rebuilds an assignment from stored parts.
    pub fn from_parts(subject_id: SubjectId, rank: RankLabel, expires_at: DateTime<Utc>) -> Self {
        Self {
            subject_id,
            rank,
            expires_at,
        }
    }

    /// An assignment expiring exactly at `now` is already expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Time left at `now`, never negative.
    pub fn time_left(&self, now: DateTime<Utc>) -> TimeDelta {
        (self.expires_at - now).max(TimeDelta::zero())
    }

    pub fn remaining_at(&self, now: DateTime<Utc>) -> Remaining {
        Remaining::from_delta(self.time_left(now))
    }
}
