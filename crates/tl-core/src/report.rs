//! Monthly report aggregation.
//!
//! Totals completed entries per day and per group for one calendar month.
//!
//! # Rules
//!
//! - Archived groups never contribute, whatever the selection says.
//! - Entries are bucketed by their `start` only; an entry crossing midnight is
//!   not split, and one that starts in the previous month is not counted.
//! - Running timers are not counted. Live time is a display concern, see
//!   [`Group::live_elapsed`](crate::Group::live_elapsed).
//! - Entries with a broken interval are skipped and logged, the rest of the
//!   report is still produced.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Local, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use crate::entry::TimeEntry;
use crate::group::Group;
use crate::month::YearMonth;

/// Which groups a report covers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Selection {
    /// Every non-archived group.
    #[default]
    All,
    /// Only non-archived groups with one of these names.
    Groups(BTreeSet<String>),
}

impl Selection {
    /// Sentinel name meaning "every group".
    pub const ALL: &'static str = "all";

    /// Builds a selection from a list of names.
    ///
    /// An empty list and the single-element list `["all"]` both mean
    /// [`Selection::All`]; an empty list never means "nothing".
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        match names.as_slice() {
            [] => Self::All,
            [only] if only == Self::ALL => Self::All,
            _ => Self::Groups(names.into_iter().collect()),
        }
    }

    /// Whether a group with this name is covered.
    pub fn includes(&self, name: &str) -> bool {
        match self {
            Self::All => true,
            Self::Groups(names) => names.contains(name),
        }
    }

    /// Names for display; `["all"]` for [`Selection::All`].
    pub fn names(&self) -> Vec<&str> {
        match self {
            Self::All => vec![Self::ALL],
            Self::Groups(names) => names.iter().map(String::as_str).collect(),
        }
    }
}

/// Aggregated totals for one month and selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Sum of all counted durations, in seconds.
    pub total_seconds: i64,

    /// Seconds per local calendar day. Days without entries are absent.
    pub days: BTreeMap<NaiveDate, i64>,

    /// Seconds per group name. Groups with no time are absent.
    pub group_totals: BTreeMap<String, i64>,

    /// Number of groups with a nonzero total.
    pub group_count: usize,
}

impl Report {
    /// Per-day totals for every day of `month`, with zeros filled in.
    pub fn daily_series(&self, month: YearMonth) -> Vec<(NaiveDate, i64)> {
        month
            .days()
            .map(|day| (day, self.days.get(&day).copied().unwrap_or(0)))
            .collect()
    }

    /// Group totals sorted by time descending, then name.
    pub fn ranked_groups(&self) -> Vec<(&str, i64)> {
        let mut ranked: Vec<_> = self
            .group_totals
            .iter()
            .map(|(name, seconds)| (name.as_str(), *seconds))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked
    }
}

/// Computes the report for `month` in the local time zone.
pub fn compute_month_report(groups: &[Group], selection: &Selection, month: YearMonth) -> Report {
    compute_month_report_in(groups, selection, month, &Local)
}

/// Computes the report for `month`, reading calendar days in `tz`.
pub fn compute_month_report_in<Tz: TimeZone>(
    groups: &[Group],
    selection: &Selection,
    month: YearMonth,
    tz: &Tz,
) -> Report {
    let mut report = Report::default();
    let mut per_group: BTreeMap<&str, i64> = BTreeMap::new();

    for (group, entry) in month_entries_in(groups, selection, month, tz) {
        let day = entry.start.with_timezone(tz).date_naive();
        report.total_seconds = report.total_seconds.saturating_add(entry.duration);
        let day_total = report.days.entry(day).or_insert(0);
        *day_total = day_total.saturating_add(entry.duration);
        let group_total = per_group.entry(group.name.as_str()).or_insert(0);
        *group_total = group_total.saturating_add(entry.duration);
    }

    report.group_totals = per_group
        .into_iter()
        .filter(|(_, seconds)| *seconds > 0)
        .map(|(name, seconds)| (name.to_string(), seconds))
        .collect();
    report.group_count = report.group_totals.len();
    tracing::debug!(
        %month,
        total_seconds = report.total_seconds,
        groups = report.group_count,
        days = report.days.len(),
        "computed month report"
    );
    report
}

/// The entries a month report counts, paired with their group, in group order.
///
/// Applies the archive and selection filters, the month window on `start`,
/// and drops malformed entries with a warning.
pub fn month_entries_in<'a, Tz: TimeZone>(
    groups: &'a [Group],
    selection: &Selection,
    month: YearMonth,
    tz: &Tz,
) -> Vec<(&'a Group, &'a TimeEntry)> {
    let (month_start, month_end) = month.window_in(tz);

    let retained = groups
        .iter()
        .filter(|group| !group.archived && selection.includes(&group.name));

    let mut counted = Vec::new();
    for group in retained {
        for entry in &group.logs {
            if entry.start < month_start || entry.start > month_end {
                continue;
            }
            if let Err(err) = entry.validate() {
                tracing::warn!(group = %group.name, %err, "skipping malformed entry");
                continue;
            }
            counted.push((group, entry));
        }
    }
    counted
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{DateTime, Duration, FixedOffset, Utc};

    fn month(s: &str) -> YearMonth {
        s.parse().unwrap()
    }

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn entry(start: DateTime<Utc>, minutes: i64) -> TimeEntry {
        TimeEntry::new(start, start + Duration::minutes(minutes)).unwrap()
    }

    fn group(name: &str, logs: Vec<TimeEntry>) -> Group {
        let mut group = Group::new(name);
        group.logs = logs;
        group
    }

    fn report(groups: &[Group], selection: &Selection, m: &str) -> Report {
        compute_month_report_in(groups, selection, month(m), &Utc)
    }

    fn sample_groups() -> Vec<Group> {
        vec![
            group(
                "Analysis",
                vec![
                    entry(utc(2024, 1, 5, 9, 0), 60),
                    entry(utc(2024, 1, 5, 14, 0), 30),
                    entry(utc(2024, 2, 1, 9, 0), 45),
                ],
            ),
            group("Writing", vec![entry(utc(2024, 1, 12, 10, 0), 120)]),
            group("Meetings", vec![entry(utc(2023, 12, 20, 10, 0), 60)]),
        ]
    }

    #[test]
    fn concrete_two_group_scenario() {
        let t0 = utc(2024, 1, 5, 9, 0);
        let groups = vec![
            group("A", vec![entry(t0, 60)]),
            group("B", vec![entry(t0 + Duration::minutes(30), 60)]),
        ];

        let report = report(&groups, &Selection::All, "2024-01");

        assert_eq!(report.total_seconds, 7200);
        assert_eq!(report.group_totals.get("A"), Some(&3600));
        assert_eq!(report.group_totals.get("B"), Some(&3600));
        assert_eq!(report.group_count, 2);
        assert_eq!(
            report.days.get(&NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()),
            Some(&7200)
        );
    }

    #[test]
    fn totals_are_conserved() {
        let groups = sample_groups();
        for m in ["2023-12", "2024-01", "2024-02", "2024-03"] {
            let report = report(&groups, &Selection::All, m);
            assert_eq!(report.total_seconds, report.group_totals.values().sum::<i64>());
            assert_eq!(report.total_seconds, report.days.values().sum::<i64>());
        }
    }

    #[test]
    fn computation_is_idempotent() {
        let groups = sample_groups();
        let selection = Selection::from_names(["Analysis"]);
        let first = report(&groups, &selection, "2024-01");
        let second = report(&groups, &selection, "2024-01");
        assert_eq!(first, second);
    }

    #[test]
    fn month_boundary_is_inclusive_to_the_last_millisecond() {
        let last_ms = utc(2024, 1, 31, 23, 59) + Duration::milliseconds(59_999);
        let first_ms = utc(2024, 2, 1, 0, 0);
        let groups = vec![
            group(
                "Late",
                vec![TimeEntry::new(last_ms, last_ms + Duration::minutes(10)).unwrap()],
            ),
            group("Early", vec![entry(first_ms, 10)]),
        ];

        let january = report(&groups, &Selection::All, "2024-01");
        assert_eq!(january.group_totals.keys().collect::<Vec<_>>(), vec!["Late"]);
        assert_eq!(
            january.days.keys().collect::<Vec<_>>(),
            vec![&NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()]
        );

        let february = report(&groups, &Selection::All, "2024-02");
        assert_eq!(february.group_totals.keys().collect::<Vec<_>>(), vec!["Early"]);
    }

    #[test]
    fn entries_crossing_midnight_are_not_split() {
        let groups = vec![group("Night", vec![entry(utc(2024, 1, 31, 23, 0), 120)])];

        let january = report(&groups, &Selection::All, "2024-01");
        assert_eq!(january.total_seconds, 7200);
        assert_eq!(
            january.days.get(&NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()),
            Some(&7200)
        );

        let february = report(&groups, &Selection::All, "2024-02");
        assert_eq!(february, Report::default());
    }

    #[test]
    fn days_use_the_given_time_zone() {
        // 23:30 UTC on Jan 31 is already Feb 1 at UTC+2
        let groups = vec![group("Shift", vec![entry(utc(2024, 1, 31, 23, 30), 15)])];
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();

        let january = compute_month_report_in(&groups, &Selection::All, month("2024-01"), &tz);
        assert_eq!(january.total_seconds, 0);

        let february = compute_month_report_in(&groups, &Selection::All, month("2024-02"), &tz);
        assert_eq!(
            february.days.keys().collect::<Vec<_>>(),
            vec![&NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()]
        );
    }

    #[test]
    fn empty_selection_equals_all_sentinel() {
        let groups = sample_groups();
        let empty: Vec<String> = Vec::new();
        for m in ["2024-01", "2024-02"] {
            assert_eq!(
                report(&groups, &Selection::from_names(empty.clone()), m),
                report(&groups, &Selection::from_names(["all"]), m)
            );
        }
        assert_eq!(Selection::from_names(empty), Selection::All);
    }

    #[test]
    fn explicit_selection_filters_by_name() {
        let groups = sample_groups();
        let report = report(&groups, &Selection::from_names(["Writing"]), "2024-01");
        assert_eq!(report.total_seconds, 7200);
        assert_eq!(report.group_count, 1);
        assert!(report.group_totals.contains_key("Writing"));
        assert!(!report.group_totals.contains_key("Analysis"));
    }

    #[test]
    fn archived_groups_never_contribute() {
        let mut groups = sample_groups();
        groups[1].archived = true;

        for selection in [
            Selection::All,
            Selection::from_names(["Writing"]),
            Selection::from_names(["Writing", "Analysis"]),
        ] {
            let report = report(&groups, &selection, "2024-01");
            assert!(!report.group_totals.contains_key("Writing"));
        }
    }

    #[test]
    fn groups_without_time_are_omitted() {
        let groups = sample_groups();
        let report = report(&groups, &Selection::All, "2024-01");
        assert!(!report.group_totals.contains_key("Meetings"));
        assert_eq!(report.group_count, 2);
        assert_eq!(report.days.len(), 2);
    }

    #[test]
    fn running_timers_are_not_counted() {
        let mut groups = sample_groups();
        groups[1].running = true;
        groups[1].started_at = Some(utc(2024, 1, 20, 9, 0));

        let report = report(&groups, &Selection::All, "2024-01");
        assert_eq!(report.group_totals.get("Writing"), Some(&7200));
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let start = utc(2024, 1, 8, 9, 0);
        let groups = vec![group(
            "Mixed",
            vec![
                entry(start, 30),
                TimeEntry {
                    start,
                    end: start,
                    duration: 0,
                },
                TimeEntry {
                    start,
                    end: start + Duration::minutes(5),
                    duration: -300,
                },
            ],
        )];

        let report = report(&groups, &Selection::All, "2024-01");
        assert_eq!(report.total_seconds, 1800);
        assert_eq!(report.group_totals.get("Mixed"), Some(&1800));
    }

    #[test]
    fn durations_that_disagree_with_their_interval_are_skipped() {
        let start = utc(2024, 1, 8, 9, 0);
        let groups = vec![
            group(
                "Imported",
                vec![TimeEntry {
                    start,
                    end: start + Duration::hours(1),
                    duration: 3_600_000,
                }],
            ),
            group(
                "Corrupt",
                vec![
                    TimeEntry {
                        start,
                        end: start + Duration::hours(1),
                        duration: i64::MAX,
                    },
                    TimeEntry {
                        start: start + Duration::hours(2),
                        end: start + Duration::hours(3),
                        duration: i64::MAX,
                    },
                ],
            ),
            group("Clean", vec![entry(start, 60)]),
        ];

        let report = report(&groups, &Selection::All, "2024-01");
        assert_eq!(report.total_seconds, 3600);
        assert_eq!(report.days.values().sum::<i64>(), 3600);
        assert_eq!(report.group_totals.get("Imported"), None);
        assert_eq!(report.group_totals.get("Corrupt"), None);
        assert_eq!(report.group_count, 1);
    }

    #[test]
    fn month_entries_match_what_the_report_counts() {
        let mut groups = sample_groups();
        groups.push(group("Hidden", vec![entry(utc(2024, 1, 3, 9, 0), 60)]));
        groups.last_mut().unwrap().archived = true;

        let counted = month_entries_in(&groups, &Selection::All, month("2024-01"), &Utc);
        let summed: i64 = counted.iter().map(|(_, e)| e.duration).sum();
        let report = report(&groups, &Selection::All, "2024-01");

        assert_eq!(summed, report.total_seconds);
        assert!(counted.iter().all(|(g, _)| g.name != "Hidden"));
    }

    #[test]
    fn daily_series_fills_every_day() {
        let groups = sample_groups();
        let m = month("2024-01");
        let report = report(&groups, &Selection::All, "2024-01");
        let series = report.daily_series(m);

        assert_eq!(series.len(), 31);
        assert_eq!(series[4], (NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(), 5400));
        assert_eq!(series[0].1, 0);
        assert_eq!(series.iter().map(|(_, s)| s).sum::<i64>(), report.total_seconds);
    }

    #[test]
    fn ranked_groups_sort_by_time_then_name() {
        let mut report = Report::default();
        report.group_totals.insert("b".into(), 60);
        report.group_totals.insert("a".into(), 60);
        report.group_totals.insert("c".into(), 600);
        assert_eq!(report.ranked_groups(), vec![("c", 600), ("a", 60), ("b", 60)]);
    }

    #[test]
    fn report_serializes_in_camel_case() {
        let groups = sample_groups();
        let report = report(&groups, &Selection::All, "2024-01");
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["totalSeconds"], 12600);
        assert_eq!(json["groupCount"], 2);
        assert_eq!(json["days"]["2024-01-05"], 5400);
        assert_eq!(json["groupTotals"]["Writing"], 7200);
    }
}
