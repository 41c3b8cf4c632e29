//! Cross-group overlap detection.
//!
//! # Algorithm Summary
//!
//! 1. Flatten every entry of every group, tagged with its owner
//! 2. Stable-sort by start time
//! 3. Sweep forward from each entry until a later entry starts at or after its
//!    end; every entry passed on the way overlaps it
//!
//! Because the list is start-sorted, the inner scan stops at the first
//! non-overlapping entry. Input without overlaps costs one comparison per
//! entry after the sort.
//!
//! Overlaps between two entries of the same group are not reported.

use serde::Serialize;

use crate::entry::TimeEntry;
use crate::group::Group;
use crate::types::GroupId;

/// A time entry tagged with the group that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggedEntry<'a> {
    pub group_id: &'a GroupId,
    pub group: &'a str,
    #[serde(flatten)]
    pub entry: &'a TimeEntry,
}

/// Two entries from different groups whose intervals intersect.
///
/// `first` never starts after `second`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OverlapPair<'a> {
    pub first: LoggedEntry<'a>,
    pub second: LoggedEntry<'a>,
}

/// Finds every pair of overlapping entries across different groups.
///
/// Archived groups are not filtered here; pass only the groups to check.
/// Pairs come out in discovery order: by the first entry's start, then by
/// the second entry's start.
pub fn find_overlaps(groups: &[Group]) -> Vec<OverlapPair<'_>> {
    let entries = flatten_sorted(groups);
    let (pairs, comparisons) = sweep(&entries);
    tracing::debug!(
        entries = entries.len(),
        comparisons,
        overlaps = pairs.len(),
        "overlap sweep finished"
    );
    pairs
}

fn flatten_sorted(groups: &[Group]) -> Vec<LoggedEntry<'_>> {
    let mut entries: Vec<LoggedEntry<'_>> = groups
        .iter()
        .flat_map(|group| {
            group.logs.iter().filter_map(move |entry| {
                if let Err(err) = entry.validate() {
                    tracing::warn!(group = %group.name, %err, "skipping malformed entry");
                    return None;
                }
                Some(LoggedEntry {
                    group_id: &group.id,
                    group: &group.name,
                    entry,
                })
            })
        })
        .collect();

    // sort_by_key is stable: equal starts keep input order
    entries.sort_by_key(|logged| logged.entry.start);
    entries
}

/// Returns the overlapping pairs and the number of forward comparisons made.
fn sweep<'a>(entries: &[LoggedEntry<'a>]) -> (Vec<OverlapPair<'a>>, usize) {
    let mut pairs = Vec::new();
    let mut comparisons = 0;

    for (i, first) in entries.iter().enumerate() {
        for second in &entries[i + 1..] {
            comparisons += 1;
            if second.entry.start >= first.entry.end {
                break;
            }
            if first.group_id != second.group_id {
                pairs.push(OverlapPair {
                    first: *first,
                    second: *second,
                });
            }
        }
    }

    (pairs, comparisons)
}
