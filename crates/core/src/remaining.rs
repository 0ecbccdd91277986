//! Human-readable decomposition of the time left on an assignment.

use std::fmt;

use chrono::TimeDelta;

/// Time left split into whole days, hours and minutes.
///
/// Each unit is floored; seconds are dropped. Negative input clamps to zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Remaining {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
}

impl Remaining {
    pub fn from_delta(delta: TimeDelta) -> Self {
        let secs = delta.num_seconds().max(0);
        Self {
            days: secs / 86_400,
            hours: secs % 86_400 / 3_600,
            minutes: secs % 3_600 / 60,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.days == 0 && self.hours == 0 && self.minutes == 0
    }
}

impl fmt::Display for Remaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d {}h {}m", self.days, self.hours, self.minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floors_each_unit() {
        let delta = TimeDelta::days(2) + TimeDelta::hours(5) + TimeDelta::seconds(59 * 60 + 59);
        let remaining = Remaining::from_delta(delta);
        assert_eq!(
            remaining,
            Remaining {
                days: 2,
                hours: 5,
                minutes: 59
            }
        );
        assert_eq!(remaining.to_string(), "2d 5h 59m");
    }

    #[test]
    fn negative_clamps_to_zero() {
        let remaining = Remaining::from_delta(TimeDelta::minutes(-90));
        assert!(remaining.is_zero());
        assert_eq!(remaining.to_string(), "0d 0h 0m");
    }

    #[test]
    fn just_under_a_day() {
        let remaining = Remaining::from_delta(TimeDelta::days(1) - TimeDelta::seconds(1));
        assert_eq!(remaining.to_string(), "0d 23h 59m");
    }
}
