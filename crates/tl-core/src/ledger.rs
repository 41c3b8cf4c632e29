//! Mutation operations on a group collection.
//!
//! Groups are addressed by their durable [`GroupId`], never by position.
//! Entries are addressed by their index within the owning group's `logs`.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::entry::TimeEntry;
use crate::group::Group;
use crate::types::{GroupId, ValidationError};

/// Errors from ledger operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Input failed validation.
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    /// No group matches the given ID or name.
    #[error("group not found: {0}")]
    UnknownGroup(String),

    /// Another group already uses this name.
    #[error("a group named {0:?} already exists")]
    DuplicateName(String),

    /// The operation is not allowed on archived groups.
    #[error("group {0:?} is archived")]
    Archived(String),

    /// A timer is already running for the group.
    #[error("timer for {0:?} is already running")]
    AlreadyRunning(String),

    /// No timer is running for the group.
    #[error("timer for {0:?} is not running")]
    NotRunning(String),

    /// The entry index is past the end of the group's logs.
    #[error("group {group:?} has no entry #{index}")]
    EntryOutOfRange { group: String, index: usize },
}

/// An owned collection of groups with the operations that mutate it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    groups: Vec<Group>,
}

impl Ledger {
    pub const fn new(groups: Vec<Group>) -> Self {
        Self { groups }
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn into_groups(self) -> Vec<Group> {
        self.groups
    }

    /// Non-archived groups, in collection order.
    pub fn active(&self) -> impl Iterator<Item = &Group> {
        self.groups.iter().filter(|group| !group.archived)
    }

    pub fn get(&self, id: &GroupId) -> Option<&Group> {
        self.groups.iter().find(|group| &group.id == id)
    }

    /// Looks a group up by exact name, falling back to its ID.
    pub fn find(&self, name_or_id: &str) -> Option<&Group> {
        self.groups
            .iter()
            .find(|group| group.name == name_or_id)
            .or_else(|| self.groups.iter().find(|group| group.id.as_str() == name_or_id))
    }

    /// Like [`Ledger::find`], returning the ID or an error.
    pub fn resolve(&self, name_or_id: &str) -> Result<GroupId, LedgerError> {
        self.find(name_or_id)
            .map(|group| group.id.clone())
            .ok_or_else(|| LedgerError::UnknownGroup(name_or_id.to_string()))
    }

    fn get_mut(&mut self, id: &GroupId) -> Result<&mut Group, LedgerError> {
        self.groups
            .iter_mut()
            .find(|group| &group.id == id)
            .ok_or_else(|| LedgerError::UnknownGroup(id.to_string()))
    }

    /// Creates an empty group. The name is trimmed and must be unique.
    pub fn add_group(&mut self, name: &str) -> Result<GroupId, LedgerError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::Empty {
                field: "group name",
            }
            .into());
        }
        if self.groups.iter().any(|group| group.name == name) {
            return Err(LedgerError::DuplicateName(name.to_string()));
        }

        let group = Group::new(name);
        let id = group.id.clone();
        tracing::info!(group = name, %id, "created group");
        self.groups.push(group);
        Ok(id)
    }

    /// Removes a group and all of its entries.
    pub fn delete_group(&mut self, id: &GroupId) -> Result<Group, LedgerError> {
        let position = self
            .groups
            .iter()
            .position(|group| &group.id == id)
            .ok_or_else(|| LedgerError::UnknownGroup(id.to_string()))?;
        let removed = self.groups.remove(position);
        tracing::info!(group = %removed.name, entries = removed.logs.len(), "deleted group");
        Ok(removed)
    }

    /// Archives a group. A running timer is cancelled without being logged.
    pub fn archive(&mut self, id: &GroupId) -> Result<(), LedgerError> {
        let group = self.get_mut(id)?;
        if group.running {
            tracing::info!(group = %group.name, "discarding running timer on archive");
        }
        group.archived = true;
        group.running = false;
        group.started_at = None;
        Ok(())
    }

    /// Restores an archived group.
    pub fn unarchive(&mut self, id: &GroupId) -> Result<(), LedgerError> {
        self.get_mut(id)?.archived = false;
        Ok(())
    }

    /// Starts the group's timer at `now`.
    pub fn start_timer(&mut self, id: &GroupId, now: DateTime<Utc>) -> Result<(), LedgerError> {
        let group = self.get_mut(id)?;
        if group.archived {
            return Err(LedgerError::Archived(group.name.clone()));
        }
        if group.running {
            return Err(LedgerError::AlreadyRunning(group.name.clone()));
        }
        group.running = true;
        group.started_at = Some(now);
        tracing::info!(group = %group.name, started_at = %now, "timer started");
        Ok(())
    }

    /// Stops the group's timer at `now` and logs the interval.
    pub fn stop_timer(&mut self, id: &GroupId, now: DateTime<Utc>) -> Result<TimeEntry, LedgerError> {
        let group = self.get_mut(id)?;
        let started_at = match (group.running, group.started_at) {
            (true, Some(started_at)) => started_at,
            _ => return Err(LedgerError::NotRunning(group.name.clone())),
        };

        let entry = TimeEntry::new(started_at, now)?;
        group.running = false;
        group.started_at = None;
        group.logs.insert(0, entry.clone());
        tracing::info!(group = %group.name, duration = entry.duration, "timer stopped");
        Ok(entry)
    }

    /// Logs a manually entered interval.
    pub fn add_entry(
        &mut self,
        id: &GroupId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<TimeEntry, LedgerError> {
        let entry = TimeEntry::new(start, end)?;
        let group = self.get_mut(id)?;
        group.logs.insert(0, entry.clone());
        tracing::info!(group = %group.name, duration = entry.duration, "added entry");
        Ok(entry)
    }

    /// Replaces the entry at `index` with a new interval, returning the old one.
    pub fn edit_entry(
        &mut self,
        id: &GroupId,
        index: usize,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<TimeEntry, LedgerError> {
        let entry = TimeEntry::new(start, end)?;
        let group = self.get_mut(id)?;
        let Some(slot) = group.logs.get_mut(index) else {
            return Err(LedgerError::EntryOutOfRange {
                group: group.name.clone(),
                index,
            });
        };
        let previous = std::mem::replace(slot, entry);
        tracing::info!(group = %group.name, index, "edited entry");
        Ok(previous)
    }

    /// Removes the entry at `index`.
    pub fn delete_entry(&mut self, id: &GroupId, index: usize) -> Result<TimeEntry, LedgerError> {
        let group = self.get_mut(id)?;
        if index >= group.logs.len() {
            return Err(LedgerError::EntryOutOfRange {
                group: group.name.clone(),
                index,
            });
        }
        let removed = group.logs.remove(index);
        tracing::info!(group = %group.name, index, "deleted entry");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{Duration, TimeZone};

    fn t(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 3, hour, minute, 0).unwrap()
    }

    fn ledger_with(names: &[&str]) -> (Ledger, Vec<GroupId>) {
        let mut ledger = Ledger::default();
        let ids = names
            .iter()
            .map(|name| ledger.add_group(name).unwrap())
            .collect();
        (ledger, ids)
    }

    #[test]
    fn add_group_trims_and_rejects_duplicates() {
        let (mut ledger, ids) = ledger_with(&["  Research "]);
        assert_eq!(ledger.get(&ids[0]).unwrap().name, "Research");
        assert_eq!(
            ledger.add_group("Research"),
            Err(LedgerError::DuplicateName("Research".into()))
        );
        assert_eq!(
            ledger.add_group("   "),
            Err(LedgerError::Invalid(ValidationError::Empty {
                field: "group name"
            }))
        );
    }

    #[test]
    fn ids_survive_deleting_earlier_groups() {
        let (mut ledger, ids) = ledger_with(&["A", "B", "C"]);
        ledger.delete_group(&ids[0]).unwrap();

        ledger.start_timer(&ids[2], t(9, 0)).unwrap();
        assert!(ledger.get(&ids[2]).unwrap().running);
        assert!(!ledger.get(&ids[1]).unwrap().running);
        assert_eq!(
            ledger.delete_group(&ids[0]),
            Err(LedgerError::UnknownGroup(ids[0].to_string()))
        );
    }

    #[test]
    fn find_matches_name_then_id() {
        let (ledger, ids) = ledger_with(&["Alpha"]);
        assert_eq!(ledger.find("Alpha").unwrap().id, ids[0]);
        assert_eq!(ledger.find(ids[0].as_str()).unwrap().name, "Alpha");
        assert!(ledger.find("Beta").is_none());
        assert_eq!(
            ledger.resolve("Beta"),
            Err(LedgerError::UnknownGroup("Beta".into()))
        );
    }

    #[test]
    fn timer_round_trip_logs_an_entry() {
        let (mut ledger, ids) = ledger_with(&["Focus"]);
        ledger.start_timer(&ids[0], t(9, 0)).unwrap();
        assert_eq!(
            ledger.start_timer(&ids[0], t(9, 5)),
            Err(LedgerError::AlreadyRunning("Focus".into()))
        );

        let entry = ledger
            .stop_timer(&ids[0], t(10, 30) + Duration::milliseconds(500))
            .unwrap();
        assert_eq!(entry.start, t(9, 0));
        assert_eq!(entry.duration, 5400);

        let group = ledger.get(&ids[0]).unwrap();
        assert!(!group.running);
        assert!(group.started_at.is_none());
        assert_eq!(group.logs, vec![entry]);

        assert_eq!(
            ledger.stop_timer(&ids[0], t(11, 0)),
            Err(LedgerError::NotRunning("Focus".into()))
        );
    }

    #[test]
    fn stop_before_start_is_rejected_and_keeps_timer() {
        let (mut ledger, ids) = ledger_with(&["Focus"]);
        ledger.start_timer(&ids[0], t(9, 0)).unwrap();
        assert!(matches!(
            ledger.stop_timer(&ids[0], t(8, 0)),
            Err(LedgerError::Invalid(ValidationError::InvalidInterval { .. }))
        ));
        assert!(ledger.get(&ids[0]).unwrap().running);
    }

    #[test]
    fn archive_cancels_timer_and_blocks_start() {
        let (mut ledger, ids) = ledger_with(&["Old"]);
        ledger.start_timer(&ids[0], t(9, 0)).unwrap();
        ledger.archive(&ids[0]).unwrap();

        let group = ledger.get(&ids[0]).unwrap();
        assert!(group.archived);
        assert!(!group.running);
        assert!(group.logs.is_empty());
        assert_eq!(ledger.active().count(), 0);

        assert_eq!(
            ledger.start_timer(&ids[0], t(10, 0)),
            Err(LedgerError::Archived("Old".into()))
        );

        ledger.unarchive(&ids[0]).unwrap();
        assert!(ledger.start_timer(&ids[0], t(10, 0)).is_ok());
    }

    #[test]
    fn manual_entries_can_be_edited_and_deleted() {
        let (mut ledger, ids) = ledger_with(&["Manual"]);
        ledger.add_entry(&ids[0], t(9, 0), t(10, 0)).unwrap();
        ledger.add_entry(&ids[0], t(13, 0), t(13, 45)).unwrap();

        // newest first
        let logs = &ledger.get(&ids[0]).unwrap().logs;
        assert_eq!(logs[0].duration, 2700);
        assert_eq!(logs[1].duration, 3600);

        let previous = ledger.edit_entry(&ids[0], 1, t(9, 0), t(9, 15)).unwrap();
        assert_eq!(previous.duration, 3600);
        assert_eq!(ledger.get(&ids[0]).unwrap().logs[1].duration, 900);

        let removed = ledger.delete_entry(&ids[0], 0).unwrap();
        assert_eq!(removed.duration, 2700);
        assert_eq!(ledger.get(&ids[0]).unwrap().logs.len(), 1);

        assert_eq!(
            ledger.delete_entry(&ids[0], 5),
            Err(LedgerError::EntryOutOfRange {
                group: "Manual".into(),
                index: 5
            })
        );
    }

    #[test]
    fn invalid_manual_intervals_are_rejected() {
        let (mut ledger, ids) = ledger_with(&["Manual"]);
        assert!(matches!(
            ledger.add_entry(&ids[0], t(10, 0), t(10, 0)),
            Err(LedgerError::Invalid(_))
        ));
        ledger.add_entry(&ids[0], t(9, 0), t(10, 0)).unwrap();
        assert!(matches!(
            ledger.edit_entry(&ids[0], 0, t(11, 0), t(10, 0)),
            Err(LedgerError::Invalid(_))
        ));
        assert_eq!(ledger.get(&ids[0]).unwrap().logs[0].duration, 3600);
    }
}
