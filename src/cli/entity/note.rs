use anyhow::{bail, Result};
use clap::Subcommand;

use crate::{
    cli::AppContext,
    db::notes::{NewNote, NoteRepository},
};

#[derive(Subcommand, Debug)]
pub enum NoteCommand {
    #[command(about = "Create a note")]
    Create {
        title: String,
        #[arg(long, default_value = "", help = "Initial note body")]
        content: String,
        #[arg(long, help = "Job the note belongs to")]
        job: Option<i64>,
    },
    #[command(about = "List notes")]
    List {
        #[arg(long, help = "Only notes of this job")]
        job: Option<i64>,
    },
    #[command(about = "Show a note's newest content")]
    Show { id: i64 },
    #[command(about = "Write a new version of a note")]
    Update {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
    },
    #[command(about = "List every version of a note")]
    Versions { id: i64 },
    #[command(about = "Star or unstar one version")]
    Star {
        id: i64,
        version: i64,
        #[arg(long, help = "Remove the star instead")]
        unstar: bool,
    },
    #[command(about = "Delete a note. Versions are kept")]
    Delete { id: i64 },
}

pub fn process_note_command(command: NoteCommand, ctx: &AppContext) -> Result<()> {
    let repo = ctx.db.notes();
    match command {
        NoteCommand::Create {
            title,
            content,
            job,
        } => {
            let id = repo.create(NewNote {
                job_id: job,
                title,
                content,
            })?;
            println!("Created note {id}");
        }
        NoteCommand::List { job } => {
            let notes = repo.list(job)?;
            if notes.is_empty() {
                println!("No notes yet");
                return Ok(());
            }
            for note in notes {
                let owner = note
                    .job_id
                    .map(|id| format!(" job {id}"))
                    .unwrap_or_default();
                println!("{}  {}{}", note.id, note.title, owner);
            }
        }
        NoteCommand::Show { id } => {
            let Some(note) = repo.get(id)? else {
                bail!("Note {id} doesn't exist");
            };
            let versions = repo.versions(id)?;
            let Some(latest) = versions.last() else {
                bail!("Note {id} has no versions");
            };
            println!("{}", note.title);
            if let Some(job) = note.job_id {
                println!("job: {job}");
            }
            println!(
                "{} versions, last written {}",
                versions.len(),
                latest.created.format("%Y-%m-%d %H:%M")
            );
            if !latest.content.is_empty() {
                println!();
                println!("{}", latest.content);
            }
        }
        NoteCommand::Update { id, title, content } => {
            repo.update(id, title.as_deref(), content.as_deref())?;
            println!("Updated note {id}");
        }
        NoteCommand::Versions { id } => {
            if repo.get(id)?.is_none() {
                bail!("Note {id} doesn't exist");
            }
            for (index, version) in repo.versions(id)?.iter().enumerate() {
                let star = if version.starred { "*" } else { " " };
                println!(
                    "{star} {}  v{}  {}  {}",
                    version.id,
                    index + 1,
                    version.created.format("%Y-%m-%d %H:%M"),
                    version.title
                );
            }
        }
        NoteCommand::Star { id, version, unstar } => {
            repo.star(id, version, !unstar)?;
            println!("{} version {version}", if unstar { "Unstarred" } else { "Starred" });
        }
        NoteCommand::Delete { id } => {
            repo.soft_delete(id)?;
            println!("Deleted note {id}");
        }
    }
    Ok(())
}
