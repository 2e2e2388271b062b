use anyhow::{bail, Result};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;

use crate::model::Task;

const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Both collections in their persisted shape, for `list --json`.
#[derive(Serialize)]
pub struct Listing<'a> {
    pub tasks: &'a [Task],
    #[serde(rename = "deletedTasks")]
    pub deleted_tasks: &'a [Task],
}

/// `YYYY-MM-DD HH:MM` in local time.
pub fn format_datetime(at: DateTime<Utc>) -> String {
    format_datetime_in(at, &Local)
}

pub fn format_datetime_in<Tz: TimeZone>(at: DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.with_timezone(tz).format(DISPLAY_FORMAT).to_string()
}

/// Parse a reminder time typed by a user, interpreting bare times as local.
pub fn parse_when(input: &str) -> Result<DateTime<Utc>> {
    parse_when_in(input, &Local)
}

/// Accepts `YYYY-MM-DD HH:MM`, `YYYY-MM-DDTHH:MM` (both in `tz`), or a full
/// RFC 3339 timestamp.
pub fn parse_when_in<Tz: TimeZone>(input: &str, tz: &Tz) -> Result<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(input) {
        return Ok(at.with_timezone(&Utc));
    }
    for format in [DISPLAY_FORMAT, "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return match tz.from_local_datetime(&naive).earliest() {
                Some(at) => Ok(at.with_timezone(&Utc)),
                None => bail!("'{input}' does not exist in the local time zone"),
            };
        }
    }
    bail!("invalid time '{input}': expected YYYY-MM-DD HH:MM")
}

/// One-line metadata for a task, e.g. `Added: 2025-01-01 09:00 | Reminder: ...`.
pub fn format_meta(task: &Task) -> String {
    let mut parts = Vec::new();
    if let Some(at) = task.deleted_at {
        parts.push(format!("Deleted: {}", format_datetime(at)));
    }
    parts.push(format!("Added: {}", format_datetime(task.added_at)));
    if let Some(at) = task.reminder {
        let fired = if task.reminder_notified { " (sent)" } else { "" };
        parts.push(format!("Reminder: {}{fired}", format_datetime(at)));
    }
    if let Some(at) = task.completed_at {
        parts.push(format!("Completed: {}", format_datetime(at)));
    }
    parts.join(" | ")
}

fn push_task(out: &mut String, position: usize, task: &Task) {
    out.push_str(&format!("{position:>3}. {} {}\n", task.icon(), task.text));
    out.push_str(&format!("     {}\n", format_meta(task)));
}

/// Pending, completed, and deleted sections. Positions are 1-based and
/// match what `done`, `rm`, and `undo` accept.
pub fn format_listing(active: &[Task], deleted: &[Task]) -> String {
    let mut out = String::new();
    for (title, completed) in [("Pending", false), ("Completed", true)] {
        out.push_str(&format!("{title}:\n"));
        let mut any = false;
        for (i, task) in active.iter().enumerate() {
            if task.completed != completed {
                continue;
            }
            push_task(&mut out, i + 1, task);
            any = true;
        }
        if !any {
            out.push_str("  (none)\n");
        }
        out.push('\n');
    }
    out.push_str("Deleted:\n");
    if deleted.is_empty() {
        out.push_str("  (none)\n");
    }
    for (i, task) in deleted.iter().enumerate() {
        push_task(&mut out, i + 1, task);
    }
    out
}

/// The banner shown when a reminder fires.
pub fn format_reminder(task: &Task) -> String {
    format!("\u{23f0} Reminder: \"{}\"", task.text)
}
