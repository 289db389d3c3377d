use anyhow::Result;
use chrono::Datelike;
use clap::Parser;
use futures::{stream, StreamExt};
use tracing::error;

use crate::{
    db::jobs::JobRepository,
    journal::store::JournalStorage,
    utils::{
        percentage::count_percentage,
        time::{date_prefix, same_day_years_back},
    },
};

use super::{
    output::{grouping::group_by_job, job_heading, EMPTY_NOTICE},
    parse_when, AppContext, DateStyle, DEFAULT_CATEGORY,
};

#[derive(Debug, Parser)]
pub struct HistoryCommand {
    #[arg(
        long = "date",
        short,
        help = "Day to look up. Examples are \"yesterday\", \"15/03/2025\""
    )]
    date: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
    #[arg(
        short,
        long,
        default_value_t = 5,
        value_parser = clap::value_parser!(u32).range(1..=100),
        help = "How many past years to look at"
    )]
    years: u32,
    #[arg(short, long, default_value = DEFAULT_CATEGORY, help = "Journal category to read")]
    category: String,
}

/// Command to process `history`. Looks up the same calendar day in each of
/// the previous years. The per-year scans are independent file reads, so they
/// run on a buffered stream instead of one after another.
pub async fn process_history_command(
    HistoryCommand {
        date,
        date_style,
        years,
        category,
    }: HistoryCommand,
    ctx: &AppContext,
) -> Result<()> {
    let date = match date {
        Some(raw) => parse_when(&raw, date_style)?,
        None => ctx.session.date_or_today(),
    };

    let storage = &ctx.storage;
    let scans = stream::iter(1..=years as i32)
        .map(|back| {
            let category = category.clone();
            async move {
                match same_day_years_back(date, back) {
                    Some(day) => (back, Some((day, storage.entries_for(&category, day).await))),
                    None => (back, None),
                }
            }
        })
        .buffered(4)
        .collect::<Vec<_>>()
        .await;

    println!("{} in previous years:", date.format("%B %e"));
    let jobs = ctx.db.jobs();
    for (back, scan) in scans {
        match scan {
            None => {
                // Feb 29 in a non-leap year.
                println!("{}        no such day", date.year() - back);
            }
            Some((day, Ok(entries))) if entries.is_empty() => {
                println!("{}  {EMPTY_NOTICE}", date_prefix(day));
            }
            Some((day, Ok(entries))) => {
                let total = entries.len();
                let busiest = group_by_job(entries)
                    .into_iter()
                    .max_by_key(|(_, group)| group.len());
                match busiest {
                    Some((job_id, group)) => {
                        let job = jobs.get(job_id)?;
                        println!(
                            "{}  {} entries, mostly {} ({}%)",
                            date_prefix(day),
                            total,
                            job_heading(job_id, job.as_ref()),
                            *count_percentage(group.len(), total) as i32
                        );
                    }
                    None => println!("{}  {} entries", date_prefix(day), total),
                }
            }
            Some((day, Err(e))) => {
                error!("Failed to read journal for {day}: {e}");
                println!("{}  unreadable", date_prefix(day));
            }
        }
    }
    Ok(())
}
