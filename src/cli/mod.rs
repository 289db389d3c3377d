pub mod add;
pub mod backup;
pub mod day;
pub mod entity;
pub mod history;
pub mod output;
pub mod search;
pub mod session_cmd;

use std::{fmt::Display, path::PathBuf};

use anyhow::{anyhow, Result};
use chrono::{Local, NaiveDate};
use chrono_english::parse_date_string;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::level_filters::LevelFilter;

use crate::{
    db::Database,
    journal::store::JournalStorageImpl,
    session::Session,
    utils::{
        dir::{application_dir, database_path, journal_dir, session_path},
        logging::{enable_logging, CLI_PREFIX},
    },
};

use self::{
    add::AddCommand,
    backup::BackupCommand,
    day::{LogCommand, TodayCommand},
    entity::{
        company::CompanyCommand, job::JobCommand, note::NoteCommand, person::PersonCommand,
        project::ProjectCommand, record::RecordCommand, task::TaskCommand, term::TermCommand,
    },
    history::HistoryCommand,
    search::SearchCommand,
    session_cmd::{PlanCommand, UseCommand},
};

/// Category journal commands write to when none is given.
pub const DEFAULT_CATEGORY: &str = "daily";

#[derive(Parser, Debug)]
#[command(name = "Daybook", version, long_about = None)]
#[command(about = "Command line work journal and time tracker", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, help = "Enable logging")]
    log: bool,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Record an entry in the journal")]
    Add(AddCommand),
    #[command(about = "Show the journal for the current day")]
    Today(TodayCommand),
    #[command(about = "Show the journal for any day")]
    Log(LogCommand),
    #[command(about = "Search the journal for a piece of text")]
    Search(SearchCommand),
    #[command(about = "Copy the journal into a timestamped backup directory")]
    Backup(BackupCommand),
    #[command(about = "Show what happened on this day in previous years")]
    History(HistoryCommand),
    #[command(subcommand, about = "Pin the current job, date, company or project")]
    Use(UseCommand),
    #[command(about = "Show the current session")]
    Status,
    #[command(subcommand, about = "Maintain the set of jobs and tasks planned for the day")]
    Plan(PlanCommand),
    #[command(subcommand, about = "Manage companies")]
    Company(CompanyCommand),
    #[command(subcommand, about = "Manage projects")]
    Project(ProjectCommand),
    #[command(subcommand, about = "Manage jobs")]
    Job(JobCommand),
    #[command(subcommand, about = "Manage notes and their versions")]
    Note(NoteCommand),
    #[command(subcommand, about = "Manage job tasks")]
    Task(TaskCommand),
    #[command(subcommand, about = "Manage time records in the entity store")]
    Record(RecordCommand),
    #[command(subcommand, about = "Manage people")]
    Person(PersonCommand),
    #[command(subcommand, about = "Manage the taxonomy glossary")]
    Term(TermCommand),
}

/// Everything a command needs: the entity store, the journal and the session.
pub struct AppContext {
    pub db: Database,
    pub storage: JournalStorageImpl,
    pub session: Session,
    pub dir: PathBuf,
    session_file: PathBuf,
}

impl AppContext {
    fn new(dir: PathBuf) -> Result<Self> {
        let db = Database::open(&database_path(&dir))?;
        let storage = JournalStorageImpl::new(journal_dir(&dir))?;
        let session_file = session_path(&dir);
        let session = Session::load(&session_file);
        Ok(Self {
            db,
            storage,
            session,
            dir,
            session_file,
        })
    }

    pub fn save_session(&self) -> Result<()> {
        self.session.save(&self.session_file)
    }
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let dir = application_dir(args.dir.clone())?;

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(CLI_PREFIX, &dir, logging_level, args.log)?;

    let mut ctx = AppContext::new(dir)?;

    match args.commands {
        Commands::Add(command) => add::process_add_command(command, &ctx).await,
        Commands::Today(command) => day::process_today_command(command, &ctx).await,
        Commands::Log(command) => day::process_log_command(command, &ctx).await,
        Commands::Search(command) => search::process_search_command(command, &ctx).await,
        Commands::Backup(command) => backup::process_backup_command(command, &ctx).await,
        Commands::History(command) => history::process_history_command(command, &ctx).await,
        Commands::Use(command) => session_cmd::process_use_command(command, &mut ctx),
        Commands::Status => session_cmd::process_status_command(&ctx),
        Commands::Plan(command) => session_cmd::process_plan_command(command, &mut ctx),
        Commands::Company(command) => entity::company::process_company_command(command, &ctx),
        Commands::Project(command) => entity::project::process_project_command(command, &ctx),
        Commands::Job(command) => entity::job::process_job_command(command, &ctx),
        Commands::Note(command) => entity::note::process_note_command(command, &ctx),
        Commands::Task(command) => entity::task::process_task_command(command, &ctx),
        Commands::Record(command) => entity::record::process_record_command(command, &ctx),
        Commands::Person(command) => entity::person::process_person_command(command, &ctx),
        Commands::Term(command) => entity::term::process_term_command(command, &ctx),
    }
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum DateStyle {
    #[default]
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

/// Turns inputs like "yesterday", "15/03/2025" or "last friday" into a
/// calendar day.
pub fn parse_when(input: &str, style: DateStyle) -> Result<NaiveDate> {
    let now = Local::now();
    let parsed = parse_date_string(input, now, style.into())
        .map_err(|e| anyhow!("Failed to parse date {input:?}: {e}"))?;
    Ok(parsed.with_timezone(&Local).date_naive())
}
