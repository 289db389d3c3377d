use anyhow::{bail, Result};
use clap::Subcommand;

use crate::{
    cli::{parse_when, AppContext, DateStyle},
    db::tasks::{NewTask, TaskListQuery, TaskRepository},
    utils::time::local_day_bounds,
};

#[derive(Subcommand, Debug)]
pub enum TaskCommand {
    #[command(about = "Create a task")]
    Create {
        content: String,
        #[arg(long, help = "Job the task belongs to. Defaults to the session job")]
        job: Option<i64>,
        #[arg(long, help = "Due day, e.g. \"friday\" or \"15/03/2025\"")]
        due: Option<String>,
        #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
        date_style: DateStyle,
    },
    #[command(about = "List open tasks")]
    List {
        #[arg(long, help = "Only tasks of this job. Defaults to the session job")]
        job: Option<i64>,
        #[arg(long, help = "Ignore the session job and list every job's tasks")]
        all_jobs: bool,
        #[arg(long, help = "Include completed and cancelled tasks")]
        closed: bool,
    },
    #[command(about = "Mark a task completed")]
    Done { id: i64 },
    #[command(about = "Mark a task cancelled")]
    Cancel { id: i64 },
    #[command(about = "Delete a task for good")]
    Delete { id: i64 },
}

pub fn process_task_command(command: TaskCommand, ctx: &AppContext) -> Result<()> {
    let repo = ctx.db.tasks();
    match command {
        TaskCommand::Create {
            content,
            job,
            due,
            date_style,
        } => {
            let Some(job) = job.or(ctx.session.job) else {
                bail!("No job given and none pinned. Pass --job or run `daybook use job`");
            };
            let due = match due {
                Some(raw) => {
                    let day = parse_when(&raw, date_style)?;
                    let (_, end) = local_day_bounds(day)
                        .ok_or_else(|| anyhow::anyhow!("Can't resolve day {day}"))?;
                    Some(end)
                }
                None => None,
            };
            let id = repo.create(NewTask {
                job_id: job,
                content,
                due,
            })?;
            println!("Created task {id} under job {job}");
        }
        TaskCommand::List {
            job,
            all_jobs,
            closed,
        } => {
            let job = if all_jobs { None } else { job.or(ctx.session.job) };
            let tasks = repo.list(&TaskListQuery {
                job,
                include_closed: closed,
            })?;
            if tasks.is_empty() {
                println!("No tasks");
                return Ok(());
            }
            for task in tasks {
                let state = if task.completed.is_some() {
                    "[x]"
                } else if task.cancelled.is_some() {
                    "[-]"
                } else {
                    "[ ]"
                };
                let due = task
                    .due
                    .map(|d| format!(" due {}", d.with_timezone(&chrono::Local).format("%Y-%m-%d")))
                    .unwrap_or_default();
                println!("{state} {}  {} (job {}){}", task.id, task.content, task.job_id, due);
            }
        }
        TaskCommand::Done { id } => {
            repo.complete(id)?;
            println!("Completed task {id}");
        }
        TaskCommand::Cancel { id } => {
            repo.cancel(id)?;
            println!("Cancelled task {id}");
        }
        TaskCommand::Delete { id } => {
            repo.delete(id)?;
            println!("Deleted task {id}");
        }
    }
    Ok(())
}
