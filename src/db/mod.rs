pub mod companies;
pub mod jobs;
pub mod models;
pub mod notes;
pub mod people;
pub mod projects;
pub mod records;
pub mod tasks;
pub mod terms;

use std::{
    error::Error,
    fmt::{Display, Formatter},
    path::Path,
};

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::Connection;

use self::{
    companies::SqliteCompanyRepository, jobs::SqliteJobRepository, notes::SqliteNoteRepository,
    people::SqlitePersonRepository, projects::SqliteProjectRepository,
    records::SqliteRecordRepository, tasks::SqliteTaskRepository, terms::SqliteTermRepository,
};

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for entity persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    NotFound { entity: &'static str, id: i64 },
    InvalidData(String),
    Sqlite(rusqlite::Error),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { entity, id } => write!(f, "{entity} {id} not found"),
            Self::InvalidData(message) => write!(f, "{message}"),
            Self::Sqlite(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::NotFound { .. } | Self::InvalidData(_) => None,
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS companies (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    abbreviation TEXT NOT NULL,
    colour TEXT NOT NULL,
    alive INTEGER NOT NULL DEFAULT 1,
    created INTEGER NOT NULL,
    updated INTEGER
);
CREATE TABLE IF NOT EXISTS projects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    company_id INTEGER REFERENCES companies(id),
    name TEXT NOT NULL,
    abbreviation TEXT NOT NULL,
    colour TEXT NOT NULL,
    alive INTEGER NOT NULL DEFAULT 1,
    created INTEGER NOT NULL,
    updated INTEGER
);
CREATE TABLE IF NOT EXISTS jobs (
    id INTEGER PRIMARY KEY,
    project_id INTEGER REFERENCES projects(id),
    title TEXT,
    uri TEXT,
    colour TEXT NOT NULL,
    alive INTEGER NOT NULL DEFAULT 1,
    created INTEGER NOT NULL,
    updated INTEGER
);
CREATE TABLE IF NOT EXISTS notes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    job_id INTEGER REFERENCES jobs(id),
    title TEXT NOT NULL,
    alive INTEGER NOT NULL DEFAULT 1,
    created INTEGER NOT NULL,
    updated INTEGER
);
CREATE TABLE IF NOT EXISTS note_versions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    note_id INTEGER NOT NULL REFERENCES notes(id),
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    starred INTEGER NOT NULL DEFAULT 0,
    created INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    job_id INTEGER NOT NULL REFERENCES jobs(id),
    content TEXT NOT NULL,
    due INTEGER,
    completed INTEGER,
    cancelled INTEGER,
    created INTEGER NOT NULL,
    updated INTEGER
);
CREATE TABLE IF NOT EXISTS records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    uuid TEXT NOT NULL UNIQUE,
    job_id INTEGER NOT NULL REFERENCES jobs(id),
    timestamp INTEGER NOT NULL,
    message TEXT NOT NULL,
    alive INTEGER NOT NULL DEFAULT 1
);
CREATE TABLE IF NOT EXISTS people (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    company_id INTEGER REFERENCES companies(id),
    name TEXT NOT NULL,
    title TEXT,
    created INTEGER NOT NULL,
    updated INTEGER
);
CREATE TABLE IF NOT EXISTS terms (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    job_id INTEGER REFERENCES jobs(id),
    name TEXT NOT NULL,
    definition TEXT NOT NULL,
    created INTEGER NOT NULL,
    updated INTEGER
);
CREATE INDEX IF NOT EXISTS idx_records_timestamp ON records(timestamp);
CREATE INDEX IF NOT EXISTS idx_tasks_job ON tasks(job_id);
CREATE INDEX IF NOT EXISTS idx_note_versions_note ON note_versions(note_id);
";

/// Owns the SQLite connection behind every entity repository.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> RepoResult<Self> {
        let conn = Connection::open(path)?;
        Self::init(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> RepoResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(&conn)?;
        Ok(Self { conn })
    }

    fn init(conn: &Connection) -> RepoResult<()> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    pub fn companies(&self) -> SqliteCompanyRepository<'_> {
        SqliteCompanyRepository::new(&self.conn)
    }

    pub fn projects(&self) -> SqliteProjectRepository<'_> {
        SqliteProjectRepository::new(&self.conn)
    }

    pub fn jobs(&self) -> SqliteJobRepository<'_> {
        SqliteJobRepository::new(&self.conn)
    }

    pub fn notes(&self) -> SqliteNoteRepository<'_> {
        SqliteNoteRepository::new(&self.conn)
    }

    pub fn tasks(&self) -> SqliteTaskRepository<'_> {
        SqliteTaskRepository::new(&self.conn)
    }

    pub fn records(&self) -> SqliteRecordRepository<'_> {
        SqliteRecordRepository::new(&self.conn)
    }

    pub fn people(&self) -> SqlitePersonRepository<'_> {
        SqlitePersonRepository::new(&self.conn)
    }

    pub fn terms(&self) -> SqliteTermRepository<'_> {
        SqliteTermRepository::new(&self.conn)
    }
}

pub(crate) fn to_epoch(moment: DateTime<Utc>) -> i64 {
    moment.timestamp()
}

pub(crate) fn from_epoch(seconds: i64) -> RepoResult<DateTime<Utc>> {
    Utc.timestamp_opt(seconds, 0)
        .single()
        .ok_or_else(|| RepoError::InvalidData(format!("timestamp {seconds} is out of range")))
}

pub(crate) fn parse_colour(raw: &str) -> RepoResult<models::Colour> {
    models::Colour::parse(raw)
        .map_err(|e| RepoError::InvalidData(format!("invalid colour value `{raw}`: {e}")))
}
