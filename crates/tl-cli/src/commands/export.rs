//! Export commands: JSON document, entry CSV, report CSV.

use std::fmt::{Display, Write as _};
use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, SecondsFormat, TimeZone, Utc};

use tl_core::{Group, Selection, TimeEntry, YearMonth, month_entries_in};
use tl_db::{Store, to_json};

use super::util::{resolve_month, selection};
use crate::cli::ReportScope;

const CSV_HEADER: &str = "Group,Start,End,Duration(seconds),Date";

pub fn json<W: Write>(writer: &mut W, store: &dyn Store) -> Result<()> {
    let groups = store.load()?;
    let rendered = to_json(&groups).context("failed to serialize groups")?;
    writeln!(writer, "{rendered}")?;
    Ok(())
}

pub fn csv<W: Write>(writer: &mut W, store: &dyn Store) -> Result<()> {
    let groups = store.load()?;
    write!(writer, "{}", format_csv(&groups, &Local))?;
    Ok(())
}

pub fn report_csv<W: Write>(writer: &mut W, store: &dyn Store, scope: &ReportScope) -> Result<()> {
    let groups = store.load()?;
    let month = resolve_month(scope)?;
    write!(
        writer,
        "{}",
        format_report_csv(&groups, &selection(scope), month, &Local)
    )?;
    Ok(())
}

/// Every entry of every group, archived ones included.
pub fn format_csv<Tz: TimeZone>(groups: &[Group], tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    let mut output = String::new();
    writeln!(output, "{CSV_HEADER}").unwrap();
    for group in groups {
        for entry in &group.logs {
            writeln!(output, "{}", csv_row(group, entry, tz)).unwrap();
        }
    }
    output
}

/// Entries counted by the month report, with an extra `Hours` column.
#[allow(clippy::cast_precision_loss)]
pub fn format_report_csv<Tz: TimeZone>(
    groups: &[Group],
    selection: &Selection,
    month: YearMonth,
    tz: &Tz,
) -> String
where
    Tz::Offset: Display,
{
    let mut output = String::new();
    writeln!(output, "{CSV_HEADER},Hours").unwrap();
    for (group, entry) in month_entries_in(groups, selection, month, tz) {
        let hours = entry.duration as f64 / 3600.0;
        writeln!(output, "{},{hours:.2}", csv_row(group, entry, tz)).unwrap();
    }
    output
}

fn csv_row<Tz: TimeZone>(group: &Group, entry: &TimeEntry, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    format!(
        "{},{},{},{},{}",
        quote(&group.name),
        quote(&iso_millis(entry.start)),
        quote(&iso_millis(entry.end)),
        entry.duration,
        quote(&entry.start.with_timezone(tz).format("%a %b %d %Y").to_string())
    )
}

fn iso_millis(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{Duration, FixedOffset};
    use insta::assert_snapshot;

    fn sample() -> Vec<Group> {
        let start = Utc.with_ymd_and_hms(2024, 1, 31, 23, 30, 0).unwrap();

        let mut late = Group::new("Late \"night\" work");
        late.logs
            .push(TimeEntry::new(start, start + Duration::minutes(45)).unwrap());

        let mut feb = Group::new("Feb");
        let feb_start = Utc.with_ymd_and_hms(2024, 2, 2, 9, 0, 0).unwrap();
        feb.logs
            .push(TimeEntry::new(feb_start, feb_start + Duration::seconds(5_000)).unwrap());

        let mut archived = Group::new("Old");
        archived.archived = true;
        archived
            .logs
            .push(TimeEntry::new(feb_start, feb_start + Duration::hours(1)).unwrap());

        vec![late, feb, archived]
    }

    #[test]
    fn test_csv_lists_every_entry() {
        assert_snapshot!(format_csv(&sample(), &Utc), @r#"
        Group,Start,End,Duration(seconds),Date
        "Late ""night"" work","2024-01-31T23:30:00.000Z","2024-02-01T00:15:00.000Z",2700,"Wed Jan 31 2024"
        "Feb","2024-02-02T09:00:00.000Z","2024-02-02T10:23:20.000Z",5000,"Fri Feb 02 2024"
        "Old","2024-02-02T09:00:00.000Z","2024-02-02T10:00:00.000Z",3600,"Fri Feb 02 2024"
        "#);
    }

    #[test]
    fn test_csv_date_uses_local_zone() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let output = format_csv(&sample()[..1], &tz);
        assert!(output.ends_with(",2700,\"Thu Feb 01 2024\"\n"));
    }

    #[test]
    fn test_report_csv_filters_month_and_archived() {
        let month: YearMonth = "2024-02".parse().unwrap();
        assert_snapshot!(format_report_csv(&sample(), &Selection::All, month, &Utc), @r#"
        Group,Start,End,Duration(seconds),Date,Hours
        "Feb","2024-02-02T09:00:00.000Z","2024-02-02T10:23:20.000Z",5000,"Fri Feb 02 2024",1.39
        "#);
    }

    #[test]
    fn test_report_csv_respects_selection() {
        let month: YearMonth = "2024-01".parse().unwrap();
        let output = format_report_csv(&sample(), &Selection::from_names(["Feb"]), month, &Utc);
        assert_eq!(output, "Group,Start,End,Duration(seconds),Date,Hours\n");
    }
}
