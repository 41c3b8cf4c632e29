//! Shared utilities for CLI commands.

use std::fmt::Display;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Local, LocalResult, NaiveDateTime, TimeZone, Utc};
use regex::Regex;

use tl_core::{Ledger, Selection, YearMonth};
use tl_db::Store;

use crate::cli::ReportScope;

/// Pre-compiled regex for relative time parsing.
static RELATIVE_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s+(minute|hour|day|week)s?\s+ago$").unwrap());

/// Conservative bounds for relative time parsing (~1000 years in minutes).
const MAX_RELATIVE_MINUTES: i64 = 1000 * 365 * 24 * 60;

/// Local wall-clock formats accepted on the command line.
const LOCAL_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

/// Parse a datetime string relative to the current local time.
///
/// Supports:
/// - RFC 3339: "2026-01-15T10:30:00Z"
/// - Local wall clock: "2026-01-15 10:30" or "2026-01-15 10:30:45"
/// - Relative: "2 hours ago", "30 minutes ago", "1 day ago", "1 week ago"
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
    parse_datetime_at(s, Utc::now(), &Local)
}

/// Like [`parse_datetime`], with an explicit clock and zone.
pub fn parse_datetime_at<Tz: TimeZone>(s: &str, now: DateTime<Utc>, tz: &Tz) -> Result<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Some(naive) = LOCAL_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
    {
        return match tz.from_local_datetime(&naive) {
            LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
            // Repeated hour at a DST change: take the first occurrence
            LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
            LocalResult::None => anyhow::bail!("{s} does not exist in local time"),
        };
    }

    let Some(caps) = RELATIVE_TIME_RE.captures(s) else {
        anyhow::bail!(
            "Invalid datetime: {s}. Use RFC 3339 (e.g., 2026-01-15T10:30:00Z), local (e.g., '2026-01-15 10:30') or relative (e.g., '2 hours ago')"
        );
    };

    let n: i64 = caps[1]
        .parse()
        .context("failed to parse number in relative time")?;

    let (max_for_unit, minutes_per_unit) = match &caps[2] {
        "minute" => (MAX_RELATIVE_MINUTES, 1),
        "hour" => (MAX_RELATIVE_MINUTES / 60, 60),
        "day" => (MAX_RELATIVE_MINUTES / (60 * 24), 60 * 24),
        "week" => (MAX_RELATIVE_MINUTES / (60 * 24 * 7), 60 * 24 * 7),
        unit => anyhow::bail!("Unknown time unit: {unit}"),
    };

    if n > max_for_unit {
        anyhow::bail!("Relative time value too large: {n} {}", &caps[2]);
    }

    Ok(now - Duration::minutes(n * minutes_per_unit))
}

/// Resolves `--month` / `--offset` to a calendar month.
pub fn resolve_month(scope: &ReportScope) -> Result<YearMonth> {
    let base = match scope.month.as_deref() {
        Some(text) => text.parse::<YearMonth>()?,
        None => YearMonth::current()?,
    };
    Ok(base.offset(scope.offset)?)
}

/// The group selection named by repeated `--group` flags.
pub fn selection(scope: &ReportScope) -> Selection {
    Selection::from_names(scope.groups.iter().cloned())
}

/// Formats seconds as `H:MMh`. Negative values show as zero.
pub fn format_hm(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    format!("{hours}:{minutes:02}h")
}

/// Formats seconds as `H:MM:SS`, for live timers.
pub fn format_clock(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{hours}:{minutes:02}:{secs:02}")
}

/// Formats an instant as `YYYY-MM-DD HH:MM` in `tz`.
pub fn format_local<Tz: TimeZone>(instant: DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    instant.with_timezone(tz).format("%Y-%m-%d %H:%M").to_string()
}

/// Loads the full collection into a ledger.
pub fn load_ledger(store: &dyn Store) -> Result<Ledger> {
    let groups = store.load().context("failed to load groups")?;
    Ok(Ledger::new(groups))
}

/// Writes the ledger back to the store.
pub fn save_ledger(store: &mut dyn Store, ledger: &Ledger) -> Result<()> {
    store.save(ledger.groups()).context("failed to save groups")
}
