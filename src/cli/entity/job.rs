use anyhow::{bail, Result};
use clap::Subcommand;

use crate::{
    cli::{
        output::{grouping::group_jobs_by_project, job_heading, swatch},
        AppContext,
    },
    db::{
        jobs::{JobRepository, JobUpdate, NewJob},
        projects::ProjectRepository,
        tasks::{TaskListQuery, TaskRepository},
    },
};

#[derive(Subcommand, Debug)]
pub enum JobCommand {
    #[command(about = "Create a job under a numeric id of your choosing")]
    Create {
        id: i64,
        #[arg(long, help = "Owning project. Defaults to the session project")]
        project: Option<i64>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, help = "Ticket or issue link")]
        uri: Option<String>,
    },
    #[command(about = "List jobs")]
    List {
        #[arg(long, help = "Only jobs of this project. Defaults to the session project")]
        project: Option<i64>,
        #[arg(long, help = "Ignore the session project and list everything")]
        everywhere: bool,
        #[arg(short, long, help = "Group jobs by project")]
        grouped: bool,
        #[arg(long, help = "Include deleted jobs")]
        all: bool,
    },
    #[command(about = "Show one job with its open tasks")]
    Show { id: i64 },
    #[command(about = "Change a job's title, uri or project")]
    Update {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        uri: Option<String>,
        #[arg(long)]
        project: Option<i64>,
    },
    #[command(about = "Delete a job. Its id stays reserved, journal lines keep pointing at it")]
    Delete { id: i64 },
}

pub fn process_job_command(command: JobCommand, ctx: &AppContext) -> Result<()> {
    let repo = ctx.db.jobs();
    match command {
        JobCommand::Create {
            id,
            project,
            title,
            uri,
        } => {
            let project = project.or(ctx.session.project);
            repo.create(NewJob {
                id,
                project_id: project,
                title,
                uri,
                colour: None,
            })?;
            println!("Created job {id}");
        }
        JobCommand::List {
            project,
            everywhere,
            grouped,
            all,
        } => {
            let project = if everywhere {
                None
            } else {
                project.or(ctx.session.project)
            };
            let jobs = repo.list(project, all)?;
            if jobs.is_empty() {
                println!("No jobs yet");
                return Ok(());
            }
            if !grouped {
                for job in jobs {
                    let marker = if job.alive { "" } else { " (deleted)" };
                    println!("{} {}{}", swatch(&job.colour), job.label(), marker);
                }
                return Ok(());
            }

            let projects = ctx.db.projects();
            for (project_id, group) in group_jobs_by_project(jobs) {
                match project_id {
                    Some(id) => {
                        let name = projects
                            .get(id)?
                            .map(|p| p.name)
                            .unwrap_or_else(|| "unknown project".to_string());
                        println!("{name} ({id})");
                    }
                    None => println!("(no project)"),
                }
                for job in &group {
                    println!("  {} {}", swatch(&job.colour), job.label());
                }
            }
        }
        JobCommand::Show { id } => {
            let Some(job) = repo.get(id)? else {
                bail!("Job {id} doesn't exist");
            };
            println!("{}", job_heading(id, Some(&job)));
            if let Some(uri) = &job.uri {
                println!("uri: {uri}");
            }
            if let Some(project) = job.project_id {
                println!("project: {project}");
            }
            println!("created: {}", job.created.format("%Y-%m-%d"));
            if !job.alive {
                println!("deleted");
            }
            let open = ctx.db.tasks().list(&TaskListQuery {
                job: Some(id),
                include_closed: false,
            })?;
            if !open.is_empty() {
                println!("open tasks:");
                for task in open {
                    println!("  [ ] {} ({})", task.content, task.id);
                }
            }
        }
        JobCommand::Update {
            id,
            title,
            uri,
            project,
        } => {
            repo.update(
                id,
                JobUpdate {
                    title: title.as_deref(),
                    uri: uri.as_deref(),
                    project_id: project,
                },
            )?;
            println!("Updated job {id}");
        }
        JobCommand::Delete { id } => {
            repo.soft_delete(id)?;
            println!("Deleted job {id}");
        }
    }
    Ok(())
}
