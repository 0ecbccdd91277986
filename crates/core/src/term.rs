use chrono::{DateTime, TimeDelta, Utc};

use crate::error::ValidationError;

/// Entitlement term in whole days, bounded to `[MIN, MAX]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TermDays(u16);

impl TermDays {
    pub const MIN: u16 = 1;
    /// Ten years.
    pub const MAX: u16 = 3650;

    pub fn new(days: i64) -> Result<Self, ValidationError> {
        if days < i64::from(Self::MIN) || days > i64::from(Self::MAX) {
            return Err(ValidationError::DurationOutOfRange { days });
        }
        Ok(Self(days as u16))
    }

    pub const fn days(self) -> u16 {
        self.0
    }

    pub fn as_delta(self) -> TimeDelta {
        TimeDelta::days(i64::from(self.0))
    }

    /// Absolute expiry of a term starting at `start`.
    pub fn expires_from(self, start: DateTime<Utc>) -> DateTime<Utc> {
        start + self.as_delta()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_inclusive_bounds() {
        assert_eq!(TermDays::new(1).unwrap().days(), 1);
        assert_eq!(TermDays::new(3650).unwrap().days(), 3650);
    }

    #[test]
    fn rejects_out_of_range() {
        for days in [0, -1, 3651, i64::MAX, i64::MIN] {
            assert_eq!(
                TermDays::new(days),
                Err(ValidationError::DurationOutOfRange { days })
            );
        }
    }

    #[test]
    fn expiry_is_start_plus_whole_days() {
        let start = DateTime::parse_from_rfc3339("2025-03-01T12:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let expiry = TermDays::new(2).unwrap().expires_from(start);
        assert_eq!(expiry.to_rfc3339(), "2025-03-03T12:30:00+00:00");
    }

    #[test]
    fn error_message_names_the_range() {
        let err = TermDays::new(0).unwrap_err();
        assert_eq!(err.to_string(), "Days must be between 1 and 3650.");
    }
}
