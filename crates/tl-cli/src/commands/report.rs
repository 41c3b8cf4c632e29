//! Monthly report command.
//!
//! Renders the aggregate for one calendar month as text or JSON. The text
//! layout has three sections: per-group totals with a bar relative to the
//! busiest group, per-day totals, and a summary.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

use tl_core::{Report, Selection, YearMonth, compute_month_report};
use tl_db::Store;

use super::util::{format_hm, resolve_month, selection};
use crate::cli::ReportScope;

/// A computed report plus the context needed to render it.
#[derive(Debug)]
pub struct MonthReport {
    pub month: YearMonth,
    pub selection: Selection,
    pub report: Report,
    pub generated_at: DateTime<Utc>,
    pub timezone: String,
}

// ========== Progress Bar ==========

/// Generates a 10-character progress bar.
/// Values <5% of max get a single block for visibility.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn progress_bar(value: i64, max: i64) -> String {
    if max <= 0 || value <= 0 {
        return "░░░░░░░░░░".to_string();
    }

    let ratio = value as f64 / max as f64;
    let filled = if ratio < 0.05 {
        1
    } else {
        (ratio * 10.0).round().min(10.0) as usize
    };

    let empty = 10 - filled;
    format!("{}{}", "█".repeat(filled), "░".repeat(empty))
}

// ========== Text Output ==========

pub fn format_report(data: &MonthReport) -> String {
    let mut output = String::new();
    let report = &data.report;

    writeln!(
        output,
        "MONTHLY REPORT: {}",
        data.month.first_day().format("%B %Y")
    )
    .unwrap();
    writeln!(output, "Groups: {}", data.selection.names().join(", ")).unwrap();

    if report.days.is_empty() {
        writeln!(output).unwrap();
        writeln!(output, "No time recorded this month.").unwrap();
        return output;
    }

    let ranked = report.ranked_groups();
    let top = ranked.first().map_or(0, |(_, seconds)| *seconds);
    let width = ranked
        .iter()
        .map(|(name, _)| name.chars().count())
        .max()
        .unwrap_or(0);

    writeln!(output).unwrap();
    writeln!(output, "BY GROUP").unwrap();
    writeln!(output, "────────").unwrap();
    for (name, seconds) in &ranked {
        writeln!(
            output,
            "{name:<width$}  {}  {:>7}",
            progress_bar(*seconds, top),
            format_hm(*seconds)
        )
        .unwrap();
    }

    writeln!(output).unwrap();
    writeln!(output, "BY DAY").unwrap();
    writeln!(output, "──────").unwrap();
    for (day, seconds) in &report.days {
        writeln!(
            output,
            "{}  {:>7}",
            day.format("%Y-%m-%d %a"),
            format_hm(*seconds)
        )
        .unwrap();
    }

    writeln!(output).unwrap();
    writeln!(output, "SUMMARY").unwrap();
    writeln!(output, "───────").unwrap();
    writeln!(output, "Total tracked:     {}", format_hm(report.total_seconds)).unwrap();
    writeln!(output, "Groups worked on:  {}", report.group_count).unwrap();
    writeln!(output, "Days with time:    {}", report.days.len()).unwrap();

    output
}

// ========== JSON Output ==========

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReport<'a> {
    generated_at: String,
    timezone: &'a str,
    month: String,
    selection: Vec<&'a str>,
    total_seconds: i64,
    group_count: usize,
    groups: Vec<JsonGroup<'a>>,
    days: Vec<JsonDay>,
}

#[derive(Serialize)]
struct JsonGroup<'a> {
    name: &'a str,
    seconds: i64,
}

#[derive(Serialize)]
struct JsonDay {
    date: String,
    seconds: i64,
}

/// Formats a report as JSON. `days` covers every day of the month, zeros included.
pub fn format_report_json(data: &MonthReport) -> Result<String> {
    let report = &data.report;
    let json = JsonReport {
        generated_at: data.generated_at.to_rfc3339(),
        timezone: &data.timezone,
        month: data.month.to_string(),
        selection: data.selection.names(),
        total_seconds: report.total_seconds,
        group_count: report.group_count,
        groups: report
            .ranked_groups()
            .into_iter()
            .map(|(name, seconds)| JsonGroup { name, seconds })
            .collect(),
        days: report
            .daily_series(data.month)
            .into_iter()
            .map(|(day, seconds)| JsonDay {
                date: day.format("%Y-%m-%d").to_string(),
                seconds,
            })
            .collect(),
    };

    Ok(serde_json::to_string_pretty(&json)?)
}

// ========== Public Interface ==========

/// Runs the report command.
pub fn run<W: Write>(writer: &mut W, store: &dyn Store, scope: &ReportScope, json: bool) -> Result<()> {
    let groups = store.load()?;
    let month = resolve_month(scope)?;
    let selection = selection(scope);
    let report = compute_month_report(&groups, &selection, month);

    let data = MonthReport {
        month,
        selection,
        report,
        generated_at: Utc::now(),
        timezone: iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string()),
    };

    if json {
        writeln!(writer, "{}", format_report_json(&data)?)?;
    } else {
        write!(writer, "{}", format_report(&data))?;
    }
    Ok(())
}
