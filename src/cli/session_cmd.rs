use anyhow::{bail, Result};
use clap::Subcommand;

use crate::{
    db::{
        companies::CompanyRepository,
        jobs::JobRepository,
        projects::ProjectRepository,
        tasks::{TaskListQuery, TaskRepository},
    },
    utils::time::date_prefix,
};

use super::{output::job_heading, parse_when, AppContext, DateStyle};

#[derive(Subcommand, Debug)]
pub enum UseCommand {
    #[command(about = "Pin a job as the current one")]
    Job { id: i64 },
    #[command(about = "Pin the day journal commands default to")]
    Date {
        when: String,
        #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
        date_style: DateStyle,
    },
    #[command(about = "Pin a company")]
    Company { id: i64 },
    #[command(about = "Pin a project")]
    Project { id: i64 },
    #[command(about = "Drop every pinned selection")]
    Clear,
}

#[derive(Subcommand, Debug)]
pub enum PlanCommand {
    #[command(about = "Add a job to the plan")]
    AddJob { id: i64 },
    #[command(about = "Add a task to the plan")]
    AddTask { id: i64 },
    #[command(about = "Take a job off the plan")]
    RemoveJob { id: i64 },
    #[command(about = "Take a task off the plan")]
    RemoveTask { id: i64 },
    #[command(about = "Show the planned jobs with their open tasks")]
    Show,
    #[command(about = "Empty the plan")]
    Clear,
}

/// Command to process `use`. Pins a selection the other commands default to.
pub fn process_use_command(command: UseCommand, ctx: &mut AppContext) -> Result<()> {
    match command {
        UseCommand::Job { id } => {
            if !ctx.db.jobs().exists(id)? {
                bail!("Job {id} is not in the entity store. Create it with `daybook job create {id}`");
            }
            ctx.session.job = Some(id);
            println!("Current job is now {id}");
        }
        UseCommand::Date { when, date_style } => {
            let date = parse_when(&when, date_style)?;
            ctx.session.date = Some(date);
            println!("Journal commands now default to {}", date_prefix(date));
        }
        UseCommand::Company { id } => {
            if ctx.db.companies().get(id)?.filter(|c| c.alive).is_none() {
                bail!("Company {id} is not in the entity store");
            }
            ctx.session.company = Some(id);
            println!("Current company is now {id}");
        }
        UseCommand::Project { id } => {
            if ctx.db.projects().get(id)?.filter(|p| p.alive).is_none() {
                bail!("Project {id} is not in the entity store");
            }
            ctx.session.project = Some(id);
            println!("Current project is now {id}");
        }
        UseCommand::Clear => {
            ctx.session.clear();
            println!("Cleared current selections");
        }
    }
    ctx.save_session()
}

/// Command to process `status`. Prints the session with entity names
/// resolved where the entity store knows them.
pub fn process_status_command(ctx: &AppContext) -> Result<()> {
    let session = &ctx.session;

    match session.job {
        Some(id) => {
            let job = ctx.db.jobs().get(id)?;
            println!("job:     {}", job_heading(id, job.as_ref()));
        }
        None => println!("job:     -"),
    }
    match session.date {
        Some(date) => println!("date:    {}", date_prefix(date)),
        None => println!("date:    - (today)"),
    }
    match session.company {
        Some(id) => {
            let name = ctx
                .db
                .companies()
                .get(id)?
                .map(|c| c.name)
                .unwrap_or_else(|| "unknown".to_string());
            println!("company: {name} ({id})");
        }
        None => println!("company: -"),
    }
    match session.project {
        Some(id) => {
            let name = ctx
                .db
                .projects()
                .get(id)?
                .map(|p| p.name)
                .unwrap_or_else(|| "unknown".to_string());
            println!("project: {name} ({id})");
        }
        None => println!("project: -"),
    }
    println!(
        "plan:    {} jobs, {} tasks",
        session.plan.jobs.len(),
        session.plan.tasks.len()
    );
    Ok(())
}

/// Command to process `plan`. The plan is a scratch set of ids living in the
/// session file; jobs and tasks don't know they are planned.
pub fn process_plan_command(command: PlanCommand, ctx: &mut AppContext) -> Result<()> {
    match command {
        PlanCommand::AddJob { id } => {
            if !ctx.db.jobs().exists(id)? {
                bail!("Job {id} is not in the entity store");
            }
            if ctx.session.plan_job(id) {
                println!("Planned job {id}");
            } else {
                println!("Job {id} was already planned");
            }
        }
        PlanCommand::AddTask { id } => {
            let Some(task) = ctx.db.tasks().get(id)? else {
                bail!("Task {id} is not in the entity store");
            };
            if !task.is_open() {
                bail!("Task {id} is already closed");
            }
            if ctx.session.plan_task(id) {
                println!("Planned task {id}");
            } else {
                println!("Task {id} was already planned");
            }
        }
        PlanCommand::RemoveJob { id } => {
            if !ctx.session.unplan_job(id) {
                bail!("Job {id} is not on the plan");
            }
            println!("Removed job {id} from the plan");
        }
        PlanCommand::RemoveTask { id } => {
            if !ctx.session.unplan_task(id) {
                bail!("Task {id} is not on the plan");
            }
            println!("Removed task {id} from the plan");
        }
        PlanCommand::Show => return show_plan(ctx),
        PlanCommand::Clear => {
            ctx.session.plan = Default::default();
            println!("Plan cleared");
        }
    }
    ctx.save_session()
}

fn show_plan(ctx: &AppContext) -> Result<()> {
    let plan = &ctx.session.plan;
    if plan.is_empty() {
        println!("Nothing planned");
        return Ok(());
    }

    for job_id in &plan.jobs {
        let job = ctx.db.jobs().get(*job_id)?;
        println!("{}", job_heading(*job_id, job.as_ref()));
        let open = ctx.db.tasks().list(&TaskListQuery {
            job: Some(*job_id),
            include_closed: false,
        })?;
        for task in open {
            println!("  [ ] {} ({})", task.content, task.id);
        }
    }

    for task_id in &plan.tasks {
        match ctx.db.tasks().get(*task_id)? {
            Some(task) if task.is_open() => {
                println!("task {}: [ ] {} (job {})", task.id, task.content, task.job_id)
            }
            Some(task) => println!("task {}: closed, consider removing it from the plan", task.id),
            None => println!("task {task_id}: gone from the entity store"),
        }
    }
    Ok(())
}
