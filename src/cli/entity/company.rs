use anyhow::{bail, Result};
use clap::Subcommand;

use crate::{
    cli::{output::swatch, AppContext},
    db::{
        companies::{CompanyRepository, NewCompany},
        projects::ProjectRepository,
    },
};

#[derive(Subcommand, Debug)]
pub enum CompanyCommand {
    #[command(about = "Create a company")]
    Create {
        name: String,
        #[arg(long, help = "Short label. Derived from the name when omitted")]
        abbreviation: Option<String>,
    },
    #[command(about = "List companies")]
    List {
        #[arg(long, help = "Include deleted companies")]
        all: bool,
    },
    #[command(about = "Show one company and its projects")]
    Show { id: i64 },
    #[command(about = "Change a company's name or abbreviation")]
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        abbreviation: Option<String>,
    },
    #[command(about = "Delete a company. Its projects stay around")]
    Delete { id: i64 },
}

pub fn process_company_command(command: CompanyCommand, ctx: &AppContext) -> Result<()> {
    let repo = ctx.db.companies();
    match command {
        CompanyCommand::Create { name, abbreviation } => {
            let id = repo.create(NewCompany {
                name,
                abbreviation,
                colour: None,
            })?;
            println!("Created company {id}");
        }
        CompanyCommand::List { all } => {
            let companies = repo.list(all)?;
            if companies.is_empty() {
                println!("No companies yet");
                return Ok(());
            }
            for company in companies {
                let marker = if company.alive { "" } else { " (deleted)" };
                println!(
                    "{} {}  {} [{}]{}",
                    swatch(&company.colour),
                    company.id,
                    company.name,
                    company.abbreviation,
                    marker
                );
            }
        }
        CompanyCommand::Show { id } => {
            let Some(company) = repo.get(id)? else {
                bail!("Company {id} doesn't exist");
            };
            println!("{} {} [{}]", swatch(&company.colour), company.name, company.abbreviation);
            println!("created: {}", company.created.format("%Y-%m-%d"));
            if !company.alive {
                println!("deleted");
            }
            let projects = ctx.db.projects().list(Some(id), false)?;
            if !projects.is_empty() {
                println!("projects:");
                for project in projects {
                    println!("  {}  {}", project.id, project.name);
                }
            }
        }
        CompanyCommand::Update {
            id,
            name,
            abbreviation,
        } => {
            repo.update(id, name.as_deref(), abbreviation.as_deref())?;
            println!("Updated company {id}");
        }
        CompanyCommand::Delete { id } => {
            repo.soft_delete(id)?;
            println!("Deleted company {id}");
        }
    }
    Ok(())
}
