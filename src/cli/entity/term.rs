use anyhow::Result;
use clap::Subcommand;

use crate::{
    cli::AppContext,
    db::terms::{NewTerm, TermRepository},
};

#[derive(Subcommand, Debug)]
pub enum TermCommand {
    #[command(about = "Define a term")]
    Create {
        name: String,
        definition: String,
        #[arg(long, help = "Job whose glossary this belongs to")]
        job: Option<i64>,
    },
    #[command(about = "List terms")]
    List {
        #[arg(long, help = "Only the glossary of this job")]
        job: Option<i64>,
    },
    #[command(about = "Remove a term")]
    Delete { id: i64 },
}

pub fn process_term_command(command: TermCommand, ctx: &AppContext) -> Result<()> {
    let repo = ctx.db.terms();
    match command {
        TermCommand::Create {
            name,
            definition,
            job,
        } => {
            let id = repo.create(NewTerm {
                job_id: job,
                name,
                definition,
            })?;
            println!("Defined term {id}");
        }
        TermCommand::List { job } => {
            let terms = repo.list(job)?;
            if terms.is_empty() {
                println!("No terms yet");
                return Ok(());
            }
            for term in terms {
                let scope = term
                    .job_id
                    .map(|id| format!(" (job {id})"))
                    .unwrap_or_default();
                println!("{}  {}: {}{}", term.id, term.name, term.definition, scope);
            }
        }
        TermCommand::Delete { id } => {
            repo.delete(id)?;
            println!("Removed term {id}");
        }
    }
    Ok(())
}
