//! Overlap warnings across groups.

use std::fmt::Display;
use std::io::Write;

use anyhow::Result;
use chrono::{Local, TimeZone};

use tl_core::{Group, LoggedEntry, OverlapPair, find_overlaps};
use tl_db::Store;

use super::util::format_local;

pub fn run<W: Write>(writer: &mut W, store: &dyn Store, include_archived: bool, json: bool) -> Result<()> {
    let groups: Vec<Group> = store
        .load()?
        .into_iter()
        .filter(|group| include_archived || !group.archived)
        .collect();
    let pairs = find_overlaps(&groups);

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&pairs)?)?;
    } else {
        write!(writer, "{}", format_overlaps(&pairs, &Local))?;
    }
    Ok(())
}

/// One warning line per overlapping pair.
pub fn format_overlaps<Tz: TimeZone>(pairs: &[OverlapPair<'_>], tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    use std::fmt::Write;

    let mut output = String::new();
    if pairs.is_empty() {
        writeln!(output, "No overlapping entries.").unwrap();
        return output;
    }

    let noun = if pairs.len() == 1 { "overlap" } else { "overlaps" };
    writeln!(output, "Found {} {noun}:", pairs.len()).unwrap();
    for pair in pairs {
        writeln!(
            output,
            "{} overlaps {}",
            describe(&pair.first, tz),
            describe(&pair.second, tz)
        )
        .unwrap();
    }
    output
}

fn describe<Tz: TimeZone>(logged: &LoggedEntry<'_>, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    format!(
        "{} [{} - {}]",
        logged.group,
        format_local(logged.entry.start, tz),
        format_local(logged.entry.end, tz)
    )
}
