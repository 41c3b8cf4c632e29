//! Core domain logic for timelog.
//!
//! This crate contains the fundamental types and logic for:
//! - Reporting: per-day and per-group monthly totals
//! - Overlap detection: conflicting entries across groups
//! - Ledger: timer and entry mutations on an id-indexed group collection
//!
//! Reporting and overlap detection are pure functions of their inputs.

mod entry;
mod group;
pub mod ledger;
pub mod merge;
mod month;
pub mod overlap;
pub mod report;
pub mod types;

pub use entry::TimeEntry;
pub use group::Group;
pub use ledger::{Ledger, LedgerError};
pub use merge::{merge_groups, normalize_imported};
pub use month::YearMonth;
pub use overlap::{LoggedEntry, OverlapPair, find_overlaps};
pub use report::{
    Report, Selection, compute_month_report, compute_month_report_in, month_entries_in,
};
pub use types::{GroupId, ValidationError};
