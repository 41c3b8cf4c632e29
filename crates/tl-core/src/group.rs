//! Named buckets of tracked work.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entry::TimeEntry;
use crate::types::{GroupId, epoch_millis_option};

/// A named bucket of tracked work.
///
/// The group owns its entries. While `running` is set, `started_at` marks an
/// interval that has not been materialized into `logs` yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    /// Durable identifier. Older files have none, so one is generated on load.
    #[serde(default = "GroupId::generate")]
    pub id: GroupId,

    /// Display name, unique among groups.
    pub name: String,

    /// Completed entries, in no particular order.
    #[serde(default)]
    pub logs: Vec<TimeEntry>,

    /// Whether a timer is currently running.
    #[serde(default)]
    pub running: bool,

    /// When the running timer was started.
    #[serde(default, with = "epoch_millis_option")]
    pub started_at: Option<DateTime<Utc>>,

    /// Archived groups keep their logs but drop out of reports.
    #[serde(default)]
    pub archived: bool,
}

impl Group {
    /// Creates an empty, idle group with a fresh ID.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: GroupId::generate(),
            name: name.into(),
            logs: Vec::new(),
            running: false,
            started_at: None,
            archived: false,
        }
    }

    /// Sum of all well-formed completed entries, in seconds.
    pub fn logged_seconds(&self) -> i64 {
        self.logs
            .iter()
            .filter(|entry| entry.validate().is_ok())
            .fold(0, |total, entry| total.saturating_add(entry.duration))
    }

    /// Seconds elapsed on the running timer, if any.
    ///
    /// Display-only: reports never include this.
    pub fn live_elapsed(&self, now: DateTime<Utc>) -> Option<i64> {
        if !self.running {
            return None;
        }
        let started_at = self.started_at?;
        Some(((now - started_at).num_milliseconds() / 1000).max(0))
    }

    /// Logged time plus any live timer, for status displays.
    pub fn total_with_live(&self, now: DateTime<Utc>) -> i64 {
        self.logged_seconds()
            .saturating_add(self.live_elapsed(now).unwrap_or(0))
    }
}
