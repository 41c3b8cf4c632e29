//! Completed intervals of tracked time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ValidationError, epoch_millis};

/// A completed interval of tracked time.
///
/// `duration` is stored alongside `start`/`end` so aggregation never has to
/// touch timestamps twice. It is only computed by [`TimeEntry::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeEntry {
    /// When the interval began.
    #[serde(with = "epoch_millis")]
    pub start: DateTime<Utc>,

    /// When the interval ended (exclusive).
    #[serde(with = "epoch_millis")]
    pub end: DateTime<Utc>,

    /// Whole seconds between `start` and `end`, rounded down.
    pub duration: i64,
}

impl TimeEntry {
    /// Creates an entry for `[start, end)`, deriving its duration.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ValidationError> {
        if end <= start {
            return Err(ValidationError::InvalidInterval { start, end });
        }
        Ok(Self {
            start,
            end,
            duration: interval_seconds(start, end),
        })
    }

    /// Checks the interval invariants of an entry that came from storage.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.end <= self.start {
            return Err(ValidationError::InvalidInterval {
                start: self.start,
                end: self.end,
            });
        }
        if self.duration < 0 {
            return Err(ValidationError::NegativeDuration {
                value: self.duration,
            });
        }
        let expected = interval_seconds(self.start, self.end);
        if self.duration != expected {
            return Err(ValidationError::InconsistentDuration {
                expected,
                actual: self.duration,
            });
        }
        Ok(())
    }

    /// Half-open overlap test: touching intervals do not overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Whole seconds in `[start, end)`, rounded down. Callers ensure `end > start`.
fn interval_seconds(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    (end - start).num_milliseconds() / 1000
}
