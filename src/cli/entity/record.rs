use anyhow::{anyhow, bail, Result};
use chrono::Utc;
use clap::Subcommand;

use crate::{
    cli::{
        output::{grouping::group_by_job, job_heading, record_line, EMPTY_NOTICE},
        parse_when, AppContext, DateStyle,
    },
    db::{
        jobs::JobRepository,
        records::{NewRecord, RecordRepository},
    },
    utils::time::local_day_bounds,
};

#[derive(Subcommand, Debug)]
pub enum RecordCommand {
    #[command(about = "Write a time record straight into the entity store")]
    Log {
        #[arg(required = true, help = "The record text")]
        message: Vec<String>,
        #[arg(long, help = "Job the record belongs to. Defaults to the session job")]
        job: Option<i64>,
    },
    #[command(about = "List records of a day grouped by job, or of one job")]
    List {
        #[arg(
            long = "date",
            short,
            help = "Day to show. Examples are \"yesterday\", \"15/03/2025\""
        )]
        date: Option<String>,
        #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
        date_style: DateStyle,
        #[arg(long, help = "Every record of this job instead of a day view")]
        job: Option<i64>,
    },
    #[command(about = "Delete a record")]
    Delete { id: i64 },
}

pub fn process_record_command(command: RecordCommand, ctx: &AppContext) -> Result<()> {
    let repo = ctx.db.records();
    match command {
        RecordCommand::Log { message, job } => {
            let Some(job) = job.or(ctx.session.job) else {
                bail!("No job given and none pinned. Pass --job or run `daybook use job`");
            };
            let message = message.join(" ");
            let id = repo.create(NewRecord {
                job_id: job,
                timestamp: Utc::now(),
                message,
            })?;
            println!("Recorded {id} under job {job}");
        }
        RecordCommand::List {
            date,
            date_style,
            job,
        } => {
            if let Some(job) = job {
                let records = repo.list_for_job(job)?;
                if records.is_empty() {
                    println!("{EMPTY_NOTICE}");
                    return Ok(());
                }
                for record in &records {
                    let local = record.timestamp.with_timezone(&chrono::Local);
                    println!("{}  {}", local.format("%Y-%m-%d"), record_line(record, false));
                }
                return Ok(());
            }

            let day = match date {
                Some(raw) => parse_when(&raw, date_style)?,
                None => ctx.session.date_or_today(),
            };
            let (start, end) =
                local_day_bounds(day).ok_or_else(|| anyhow!("Can't resolve day {day}"))?;
            let records = repo.list_between(start, end)?;
            if records.is_empty() {
                println!("{EMPTY_NOTICE}");
                return Ok(());
            }

            let jobs = ctx.db.jobs();
            for (job_id, group) in group_by_job(records) {
                let job = jobs.get(job_id)?;
                println!("{}", job_heading(job_id, job.as_ref()));
                for record in &group {
                    println!("  {}", record_line(record, false));
                }
            }
        }
        RecordCommand::Delete { id } => {
            repo.soft_delete(id)?;
            println!("Deleted record {id}");
        }
    }
    Ok(())
}
