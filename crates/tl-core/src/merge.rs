//! Combining two copies of a group collection.

use std::collections::HashSet;

use crate::group::Group;
use crate::ledger::LedgerError;
use crate::types::GroupId;

/// Checks an incoming collection before it replaces or joins local data.
///
/// Group names must be unique after trimming. A repeated ID is replaced with a
/// fresh one so every group stays individually addressable.
pub fn normalize_imported(groups: Vec<Group>) -> Result<Vec<Group>, LedgerError> {
    let mut seen_names = HashSet::new();
    let mut seen_ids = HashSet::new();
    let mut normalized = Vec::with_capacity(groups.len());

    for mut group in groups {
        if !seen_names.insert(group.name.trim().to_string()) {
            return Err(LedgerError::DuplicateName(group.name.trim().to_string()));
        }
        if !seen_ids.insert(group.id.clone()) {
            let fresh = GroupId::generate();
            tracing::warn!(group = %group.name, old = %group.id, new = %fresh, "reassigned repeated group id");
            group.id = fresh.clone();
            seen_ids.insert(fresh);
        }
        normalized.push(group);
    }
    Ok(normalized)
}

/// Merges `remote` into `local`.
///
/// If either side is empty the other is returned unchanged. Otherwise every
/// local group is kept as-is and remote groups are appended only when
/// neither their ID nor their name exists locally. Local wins on conflict.
pub fn merge_groups(local: Vec<Group>, remote: Vec<Group>) -> Vec<Group> {
    if local.is_empty() {
        return remote;
    }
    if remote.is_empty() {
        return local;
    }

    let known_ids: HashSet<_> = local.iter().map(|group| group.id.clone()).collect();
    let known_names: HashSet<_> = local.iter().map(|group| group.name.clone()).collect();

    let mut merged = local;
    let mut added = 0;
    for group in remote {
        if known_ids.contains(&group.id) || known_names.contains(&group.name) {
            tracing::debug!(group = %group.name, "keeping local copy");
            continue;
        }
        merged.push(group);
        added += 1;
    }
    tracing::info!(added, total = merged.len(), "merged group collections");
    merged
}
