pub mod grouping;

use ansi_term::{Colour as AnsiColour, Style};

use crate::{
    db::models::{Colour, Job, LogRecord},
    journal::entities::{JournalEntry, NO_JOB},
};

/// What the empty views say instead of erroring.
pub const EMPTY_NOTICE: &str = "nothing to see here";

pub fn swatch(colour: &Colour) -> String {
    colour.terminal().paint("■").to_string()
}

/// Heading for a job group. Falls back to the bare id when the job isn't in
/// the entity store, and to a dimmed marker for untracked entries.
pub fn job_heading(job_id: i64, job: Option<&Job>) -> String {
    match job {
        Some(job) => format!(
            "{} {}",
            swatch(&job.colour),
            Style::new().bold().paint(job.label())
        ),
        None if job_id == NO_JOB => Style::new().dimmed().paint("(no job)").to_string(),
        None => Style::new().bold().paint(format!("#{job_id}")).to_string(),
    }
}

pub fn entry_line(entry: &JournalEntry, show_date: bool, show_job: bool) -> String {
    let time_format = if show_date { "%Y-%m-%d %H:%M" } else { "%H:%M" };
    let mut line = entry.written.format(time_format).to_string();
    if show_job {
        line.push_str(&format!(
            "  {}",
            AnsiColour::Cyan.paint(format!("#{}", entry.job))
        ));
    }
    line.push_str("  ");
    line.push_str(&entry.message);
    line
}

pub fn record_line(record: &LogRecord, show_job: bool) -> String {
    let local = record.timestamp.with_timezone(&chrono::Local);
    let mut line = format!("{}  {}", record.id, local.format("%H:%M"));
    if show_job {
        line.push_str(&format!(
            "  {}",
            AnsiColour::Cyan.paint(format!("#{}", record.job_id))
        ));
    }
    line.push_str("  ");
    line.push_str(&record.message);
    line
}
