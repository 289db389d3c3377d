use anyhow::{bail, Result};
use chrono::{Local, Utc};
use clap::Parser;
use tracing::debug;

use crate::{
    db::{
        jobs::JobRepository,
        records::{NewRecord, RecordRepository},
    },
    journal::{
        entities::{JournalEntry, NO_JOB},
        store::JournalStorage,
    },
};

use super::{AppContext, DEFAULT_CATEGORY};

#[derive(Debug, Parser)]
pub struct AddCommand {
    #[arg(
        short,
        long,
        default_value = DEFAULT_CATEGORY,
        help = "Journal category to write to"
    )]
    category: String,
    #[arg(
        short,
        long,
        help = "Job the entry belongs to. Defaults to the session job"
    )]
    job: Option<i64>,
    #[arg(required = true, help = "The entry text")]
    message: Vec<String>,
}

/// Command to process `add`. Appends one timestamped line to the category
/// file, and mirrors it into the entity store when the job is known there.
pub async fn process_add_command(
    AddCommand {
        category,
        job,
        message,
    }: AddCommand,
    ctx: &AppContext,
) -> Result<()> {
    let message = message.join(" ");
    let message = message.trim();
    if message.is_empty() {
        bail!("Refusing to record an empty entry");
    }

    let job = job.or(ctx.session.job).unwrap_or(NO_JOB);
    let now = Local::now();
    let entry = JournalEntry::new(now.naive_local(), job, message);

    ctx.storage.append(&category, vec![entry.clone()]).await?;

    if job != NO_JOB && ctx.db.jobs().exists(job)? {
        ctx.db.records().create(NewRecord {
            job_id: job,
            timestamp: now.with_timezone(&Utc),
            message: message.to_string(),
        })?;
        debug!("Mirrored entry for job {job} into the entity store");
    }

    println!("{}", entry.to_line());
    Ok(())
}
