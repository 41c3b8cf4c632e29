//! Group management commands.

use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

use tl_core::Group;
use tl_db::Store;

use super::util::{format_hm, load_ledger, save_ledger};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GroupSummary<'a> {
    id: &'a str,
    name: &'a str,
    entries: usize,
    logged_seconds: i64,
    running: bool,
    archived: bool,
}

pub fn add<W: Write>(writer: &mut W, store: &mut dyn Store, name: &str) -> Result<()> {
    let mut ledger = load_ledger(store)?;
    let id = ledger.add_group(name)?;
    save_ledger(store, &ledger)?;
    writeln!(writer, "Created group {:?} ({id})", name.trim())?;
    Ok(())
}

pub fn delete<W: Write>(writer: &mut W, store: &mut dyn Store, group: &str) -> Result<()> {
    let mut ledger = load_ledger(store)?;
    let id = ledger.resolve(group)?;
    let removed = ledger.delete_group(&id)?;
    save_ledger(store, &ledger)?;
    writeln!(
        writer,
        "Deleted group {:?} and {} entries",
        removed.name,
        removed.logs.len()
    )?;
    Ok(())
}

pub fn archive<W: Write>(writer: &mut W, store: &mut dyn Store, group: &str) -> Result<()> {
    let mut ledger = load_ledger(store)?;
    let id = ledger.resolve(group)?;
    let was_running = ledger.get(&id).is_some_and(|g| g.running);
    ledger.archive(&id)?;
    save_ledger(store, &ledger)?;
    writeln!(writer, "Archived {group:?}")?;
    if was_running {
        writeln!(writer, "Running timer was discarded.")?;
    }
    Ok(())
}

pub fn unarchive<W: Write>(writer: &mut W, store: &mut dyn Store, group: &str) -> Result<()> {
    let mut ledger = load_ledger(store)?;
    let id = ledger.resolve(group)?;
    ledger.unarchive(&id)?;
    save_ledger(store, &ledger)?;
    writeln!(writer, "Unarchived {group:?}")?;
    Ok(())
}

pub fn list<W: Write>(
    writer: &mut W,
    store: &dyn Store,
    include_archived: bool,
    json: bool,
    now: DateTime<Utc>,
) -> Result<()> {
    let groups = store.load()?;
    let shown: Vec<&Group> = groups
        .iter()
        .filter(|g| include_archived || !g.archived)
        .collect();

    if json {
        let summaries: Vec<GroupSummary<'_>> = shown
            .iter()
            .map(|g| GroupSummary {
                id: g.id.as_str(),
                name: &g.name,
                entries: g.logs.len(),
                logged_seconds: g.logged_seconds(),
                running: g.running,
                archived: g.archived,
            })
            .collect();
        writeln!(writer, "{}", serde_json::to_string_pretty(&summaries)?)?;
        return Ok(());
    }

    write!(writer, "{}", format_group_list(&shown, now))?;
    Ok(())
}

/// Renders the group table: name, total (with live time), and markers.
pub fn format_group_list(groups: &[&Group], now: DateTime<Utc>) -> String {
    use std::fmt::Write;

    if groups.is_empty() {
        return "No groups. Create one with 'tl group add <name>'.\n".to_string();
    }

    let width = groups.iter().map(|g| g.name.chars().count()).max().unwrap_or(0);
    let mut output = String::new();
    for group in groups {
        let mut line = format!(
            "{:<width$}  {:>8}",
            group.name,
            format_hm(group.total_with_live(now))
        );
        if group.running {
            line.push_str("  (running)");
        }
        if group.archived {
            line.push_str("  (archived)");
        }
        writeln!(output, "{line}").unwrap();
    }
    output
}
