//! Start/stop timer commands.

use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Local, Utc};

use tl_db::Store;

use super::util::{format_clock, format_local, load_ledger, save_ledger};

pub fn start<W: Write>(
    writer: &mut W,
    store: &mut dyn Store,
    group: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    let mut ledger = load_ledger(store)?;
    let id = ledger.resolve(group)?;
    ledger.start_timer(&id, now)?;
    save_ledger(store, &ledger)?;
    writeln!(writer, "Started {group:?} at {}", format_local(now, &Local))?;
    Ok(())
}

pub fn stop<W: Write>(
    writer: &mut W,
    store: &mut dyn Store,
    group: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    let mut ledger = load_ledger(store)?;
    let id = ledger.resolve(group)?;
    let entry = ledger.stop_timer(&id, now)?;
    save_ledger(store, &ledger)?;
    writeln!(writer, "Stopped {group:?} after {}", format_clock(entry.duration))?;
    Ok(())
}
