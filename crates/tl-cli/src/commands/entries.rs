//! Manual entry commands.

use std::fmt::Display;
use std::io::Write;

use anyhow::Result;
use chrono::{Local, TimeZone};

use tl_core::Group;
use tl_db::Store;

use super::util::{format_hm, format_local, load_ledger, parse_datetime, save_ledger};

pub fn add<W: Write>(
    writer: &mut W,
    store: &mut dyn Store,
    group: &str,
    start: &str,
    end: &str,
) -> Result<()> {
    let (start, end) = (parse_datetime(start)?, parse_datetime(end)?);
    let mut ledger = load_ledger(store)?;
    let id = ledger.resolve(group)?;
    let entry = ledger.add_entry(&id, start, end)?;
    save_ledger(store, &ledger)?;
    writeln!(writer, "Logged {} to {group:?}", format_hm(entry.duration))?;
    Ok(())
}

pub fn edit<W: Write>(
    writer: &mut W,
    store: &mut dyn Store,
    group: &str,
    index: usize,
    start: &str,
    end: &str,
) -> Result<()> {
    let (start, end) = (parse_datetime(start)?, parse_datetime(end)?);
    let mut ledger = load_ledger(store)?;
    let id = ledger.resolve(group)?;
    let previous = ledger.edit_entry(&id, index, start, end)?;
    save_ledger(store, &ledger)?;
    writeln!(
        writer,
        "Updated entry #{index} of {group:?} (was {})",
        format_hm(previous.duration)
    )?;
    Ok(())
}

pub fn delete<W: Write>(writer: &mut W, store: &mut dyn Store, group: &str, index: usize) -> Result<()> {
    let mut ledger = load_ledger(store)?;
    let id = ledger.resolve(group)?;
    let removed = ledger.delete_entry(&id, index)?;
    save_ledger(store, &ledger)?;
    writeln!(
        writer,
        "Deleted entry #{index} of {group:?} ({})",
        format_hm(removed.duration)
    )?;
    Ok(())
}

pub fn list<W: Write>(writer: &mut W, store: &dyn Store, group: &str, json: bool) -> Result<()> {
    let ledger = load_ledger(store)?;
    let id = ledger.resolve(group)?;
    let Some(group) = ledger.get(&id) else {
        anyhow::bail!("group not found: {group}");
    };

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&group.logs)?)?;
    } else {
        write!(writer, "{}", format_entry_list(group, &Local))?;
    }
    Ok(())
}

/// One line per entry: index, local interval, duration.
pub fn format_entry_list<Tz: TimeZone>(group: &Group, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    use std::fmt::Write;

    let mut output = String::new();
    writeln!(output, "Entries for {}:", group.name).unwrap();
    if group.logs.is_empty() {
        writeln!(output, "(none)").unwrap();
        return output;
    }

    let width = (group.logs.len() - 1).to_string().len();
    for (index, entry) in group.logs.iter().enumerate() {
        writeln!(
            output,
            "#{index:<width$}  {} - {}  {}",
            format_local(entry.start, tz),
            format_local(entry.end, tz),
            format_hm(entry.duration)
        )
        .unwrap();
    }
    output
}
