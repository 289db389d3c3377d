use anyhow::Result;
use clap::Subcommand;

use crate::{
    cli::AppContext,
    db::people::{NewPerson, PersonRepository},
};

#[derive(Subcommand, Debug)]
pub enum PersonCommand {
    #[command(about = "Add a person")]
    Create {
        name: String,
        #[arg(long, help = "Company they belong to. Defaults to the session company")]
        company: Option<i64>,
        #[arg(long, help = "Their role, e.g. \"CTO\"")]
        title: Option<String>,
    },
    #[command(about = "List people")]
    List {
        #[arg(long, help = "Only people of this company")]
        company: Option<i64>,
    },
    #[command(about = "Remove a person")]
    Delete { id: i64 },
}

pub fn process_person_command(command: PersonCommand, ctx: &AppContext) -> Result<()> {
    let repo = ctx.db.people();
    match command {
        PersonCommand::Create {
            name,
            company,
            title,
        } => {
            let company = company.or(ctx.session.company);
            let id = repo.create(NewPerson {
                company_id: company,
                name,
                title,
            })?;
            println!("Added person {id}");
        }
        PersonCommand::List { company } => {
            let people = repo.list(company)?;
            if people.is_empty() {
                println!("No people yet");
                return Ok(());
            }
            for person in people {
                let title = person
                    .title
                    .map(|t| format!(", {t}"))
                    .unwrap_or_default();
                let company = person
                    .company_id
                    .map(|id| format!(" (company {id})"))
                    .unwrap_or_default();
                println!("{}  {}{}{}", person.id, person.name, title, company);
            }
        }
        PersonCommand::Delete { id } => {
            repo.delete(id)?;
            println!("Removed person {id}");
        }
    }
    Ok(())
}
