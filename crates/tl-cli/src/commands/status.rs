//! Status command for showing running timers.

use std::fmt::Display;
use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Local, TimeZone, Utc};

use tl_core::Group;
use tl_db::Store;

use super::util::{format_clock, format_local};

pub fn run<W: Write>(writer: &mut W, store: &dyn Store, now: DateTime<Utc>) -> Result<()> {
    let groups = store.load()?;
    write!(writer, "{}", format_status(&groups, now, &Local))?;
    Ok(())
}

/// Lists running timers with their live elapsed time.
pub fn format_status<Tz: TimeZone>(groups: &[Group], now: DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    use std::fmt::Write;

    let running: Vec<(&Group, DateTime<Utc>, i64)> = groups
        .iter()
        .filter_map(|group| {
            let started_at = group.started_at?;
            let elapsed = group.live_elapsed(now)?;
            Some((group, started_at, elapsed))
        })
        .collect();

    let mut output = String::new();
    if running.is_empty() {
        writeln!(output, "No timers running.").unwrap();
        return output;
    }

    writeln!(output, "Running timers:").unwrap();
    let width = running
        .iter()
        .map(|(group, _, _)| group.name.chars().count())
        .max()
        .unwrap_or(0);
    for (group, started_at, elapsed) in running {
        writeln!(
            output,
            "{:<width$}  {:>8}  since {}",
            group.name,
            format_clock(elapsed),
            format_local(started_at, tz)
        )
        .unwrap();
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Duration;
    use insta::assert_snapshot;

    #[test]
    fn test_status_lists_running_timers() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 5, 9, 0, 0).unwrap();

        let mut analysis = Group::new("Analysis");
        analysis.running = true;
        analysis.started_at = Some(t0);

        let idle = Group::new("Idle");

        let mut qa = Group::new("QA");
        qa.running = true;
        qa.started_at = Some(t0 + Duration::minutes(50));

        let now = t0 + Duration::seconds(3725);
        let output = format_status(&[analysis, idle, qa], now, &Utc);
        assert_snapshot!(output, @r"
        Running timers:
        Analysis   1:02:05  since 2024-01-05 09:00
        QA         0:12:05  since 2024-01-05 09:50
        ");
    }

    #[test]
    fn test_status_with_nothing_running() {
        let output = format_status(&[Group::new("Idle")], Utc::now(), &Utc);
        assert_snapshot!(output, @"No timers running.");
    }
}
