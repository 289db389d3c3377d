use anyhow::Result;
use chrono::NaiveDate;
use clap::Parser;

use crate::{
    db::jobs::JobRepository,
    journal::store::JournalStorage,
    utils::{
        percentage::{count_percentage, Percentage},
        time::date_prefix,
    },
};

use super::{
    output::{entry_line, grouping::group_by_job, job_heading, EMPTY_NOTICE},
    parse_when, AppContext, DateStyle, DEFAULT_CATEGORY,
};

#[derive(Debug, Parser)]
pub struct TodayCommand {
    #[arg(short, long, default_value = DEFAULT_CATEGORY, help = "Journal category to read")]
    category: String,
    #[command(flatten)]
    view: DayView,
}

#[derive(Debug, Parser)]
pub struct LogCommand {
    #[arg(
        long = "date",
        short,
        help = "Day to show. Examples are \"yesterday\", \"last friday\", \"15/03/2025\""
    )]
    date: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
    #[arg(short, long, default_value = DEFAULT_CATEGORY, help = "Journal category to read")]
    category: String,
    #[command(flatten)]
    view: DayView,
}

#[derive(Debug, Parser)]
pub struct DayView {
    #[arg(short, long, help = "Group entries by job")]
    grouped: bool,
    #[arg(
        long = "min-share",
        requires = "grouped",
        help = "Hide job groups holding less than the specified percentage of the day's entries"
    )]
    min_share: Option<Percentage>,
}

/// Command to process `today`. Shows the journal for the pinned session date,
/// or the actual today when nothing is pinned.
pub async fn process_today_command(
    TodayCommand { category, view }: TodayCommand,
    ctx: &AppContext,
) -> Result<()> {
    let date = ctx.session.date_or_today();
    print_day(ctx, &category, date, view).await
}

/// Command to process `log`, the same view for an arbitrary day.
pub async fn process_log_command(
    LogCommand {
        date,
        date_style,
        category,
        view,
    }: LogCommand,
    ctx: &AppContext,
) -> Result<()> {
    let date = match date {
        Some(raw) => parse_when(&raw, date_style)?,
        None => ctx.session.date_or_today(),
    };
    print_day(ctx, &category, date, view).await
}

async fn print_day(
    ctx: &AppContext,
    category: &str,
    date: NaiveDate,
    DayView { grouped, min_share }: DayView,
) -> Result<()> {
    let entries = ctx.storage.entries_for(category, date).await?;
    if entries.is_empty() {
        println!("{EMPTY_NOTICE}");
        return Ok(());
    }

    println!("{} ({} entries)", date_prefix(date), entries.len());
    if !grouped {
        for entry in &entries {
            println!("{}", entry_line(entry, false, true));
        }
        return Ok(());
    }

    let total = entries.len();
    let jobs = ctx.db.jobs();
    for (job_id, group) in group_by_job(entries) {
        if let Some(min) = min_share {
            if *count_percentage(group.len(), total) < *min {
                continue;
            }
        }
        let job = jobs.get(job_id)?;
        println!();
        println!("{}", job_heading(job_id, job.as_ref()));
        for entry in &group {
            println!("  {}", entry_line(entry, false, false));
        }
    }
    Ok(())
}
