use anyhow::{bail, Result};
use clap::Subcommand;

use crate::{
    cli::{output::swatch, AppContext},
    db::{
        jobs::JobRepository,
        projects::{NewProject, ProjectRepository},
    },
};

#[derive(Subcommand, Debug)]
pub enum ProjectCommand {
    #[command(about = "Create a project")]
    Create {
        name: String,
        #[arg(long, help = "Owning company. Defaults to the session company")]
        company: Option<i64>,
        #[arg(long, help = "Short label. Derived from the name when omitted")]
        abbreviation: Option<String>,
    },
    #[command(about = "List projects")]
    List {
        #[arg(long, help = "Only projects of this company. Defaults to the session company")]
        company: Option<i64>,
        #[arg(long, help = "Ignore the session company and list everything")]
        everywhere: bool,
        #[arg(long, help = "Include deleted projects")]
        all: bool,
    },
    #[command(about = "Show one project and its jobs")]
    Show { id: i64 },
    #[command(about = "Rename a project or move it to another company")]
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        company: Option<i64>,
    },
    #[command(about = "Delete a project. Its jobs stay around")]
    Delete { id: i64 },
}

pub fn process_project_command(command: ProjectCommand, ctx: &AppContext) -> Result<()> {
    let repo = ctx.db.projects();
    match command {
        ProjectCommand::Create {
            name,
            company,
            abbreviation,
        } => {
            let company = company.or(ctx.session.company);
            let id = repo.create(NewProject {
                company_id: company,
                name,
                abbreviation,
                colour: None,
            })?;
            println!("Created project {id}");
        }
        ProjectCommand::List {
            company,
            everywhere,
            all,
        } => {
            let company = if everywhere {
                None
            } else {
                company.or(ctx.session.company)
            };
            let projects = repo.list(company, all)?;
            if projects.is_empty() {
                println!("No projects yet");
                return Ok(());
            }
            for project in projects {
                let marker = if project.alive { "" } else { " (deleted)" };
                let owner = project
                    .company_id
                    .map(|id| format!(" company {id}"))
                    .unwrap_or_default();
                println!(
                    "{} {}  {} [{}]{}{}",
                    swatch(&project.colour),
                    project.id,
                    project.name,
                    project.abbreviation,
                    owner,
                    marker
                );
            }
        }
        ProjectCommand::Show { id } => {
            let Some(project) = repo.get(id)? else {
                bail!("Project {id} doesn't exist");
            };
            println!("{} {} [{}]", swatch(&project.colour), project.name, project.abbreviation);
            println!("created: {}", project.created.format("%Y-%m-%d"));
            if let Some(company) = project.company_id {
                println!("company: {company}");
            }
            if !project.alive {
                println!("deleted");
            }
            let jobs = ctx.db.jobs().list(Some(id), false)?;
            if !jobs.is_empty() {
                println!("jobs:");
                for job in jobs {
                    println!("  {}", job.label());
                }
            }
        }
        ProjectCommand::Update { id, name, company } => {
            repo.update(id, name.as_deref(), company)?;
            println!("Updated project {id}");
        }
        ProjectCommand::Delete { id } => {
            repo.soft_delete(id)?;
            println!("Deleted project {id}");
        }
    }
    Ok(())
}
