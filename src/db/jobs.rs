use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use super::{
    from_epoch,
    models::{Colour, Job},
    parse_colour, to_epoch, RepoError, RepoResult,
};

#[derive(Debug, Clone, Default)]
pub struct NewJob {
    /// User-chosen numeric id, the one journal lines carry.
    pub id: i64,
    pub project_id: Option<i64>,
    pub title: Option<String>,
    pub uri: Option<String>,
    pub colour: Option<Colour>,
}

#[derive(Debug, Clone, Default)]
pub struct JobUpdate<'a> {
    pub title: Option<&'a str>,
    pub uri: Option<&'a str>,
    pub project_id: Option<i64>,
}

impl JobUpdate<'_> {
    fn is_empty(&self) -> bool {
        self.title.is_none() && self.uri.is_none() && self.project_id.is_none()
    }
}

/// Repository interface for job CRUD operations.
pub trait JobRepository {
    fn create(&self, job: NewJob) -> RepoResult<i64>;
    fn get(&self, id: i64) -> RepoResult<Option<Job>>;
    /// Whether an alive job with this id exists.
    fn exists(&self, id: i64) -> RepoResult<bool>;
    fn list(&self, project: Option<i64>, include_dead: bool) -> RepoResult<Vec<Job>>;
    fn update(&self, id: i64, update: JobUpdate<'_>) -> RepoResult<()>;
    fn soft_delete(&self, id: i64) -> RepoResult<()>;
}

pub struct SqliteJobRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteJobRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn project_exists(&self, id: i64) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM projects WHERE id = ?1 AND alive = 1);",
            [id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }
}

impl JobRepository for SqliteJobRepository<'_> {
    fn create(&self, job: NewJob) -> RepoResult<i64> {
        if job.id <= 0 {
            return Err(RepoError::InvalidData(format!(
                "job id must be a positive number, got {}",
                job.id
            )));
        }
        let taken: Option<i64> = self
            .conn
            .query_row("SELECT id FROM jobs WHERE id = ?1;", [job.id], |row| {
                row.get(0)
            })
            .optional()?;
        if taken.is_some() {
            return Err(RepoError::InvalidData(format!(
                "job id {} is already in use",
                job.id
            )));
        }
        if let Some(project) = job.project_id {
            if !self.project_exists(project)? {
                return Err(RepoError::NotFound {
                    entity: "project",
                    id: project,
                });
            }
        }
        let colour = match job.colour {
            Some(colour) => colour,
            None => {
                let seed = job.title.clone().unwrap_or_else(|| job.id.to_string());
                Colour::from_name(&seed)
            }
        };

        self.conn.execute(
            "INSERT INTO jobs (id, project_id, title, uri, colour, alive, created)
             VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6);",
            params![
                job.id,
                job.project_id,
                job.title,
                job.uri,
                colour.encode(),
                to_epoch(Utc::now())
            ],
        )?;
        Ok(job.id)
    }

    fn get(&self, id: i64) -> RepoResult<Option<Job>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, project_id, title, uri, colour, alive, created, updated
             FROM jobs WHERE id = ?1;",
        )?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(hydrate(row)?)),
            None => Ok(None),
        }
    }

    fn exists(&self, id: i64) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM jobs WHERE id = ?1 AND alive = 1);",
            [id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn list(&self, project: Option<i64>, include_dead: bool) -> RepoResult<Vec<Job>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, project_id, title, uri, colour, alive, created, updated
             FROM jobs
             WHERE (alive = 1 OR ?1) AND (?2 IS NULL OR project_id = ?2)
             ORDER BY id ASC;",
        )?;
        let mut rows = stmt.query(params![include_dead, project])?;
        let mut jobs = Vec::new();
        while let Some(row) = rows.next()? {
            jobs.push(hydrate(row)?);
        }
        Ok(jobs)
    }

    fn update(&self, id: i64, update: JobUpdate<'_>) -> RepoResult<()> {
        if update.is_empty() {
            return Err(RepoError::InvalidData(
                "nothing to update, pass a title, uri or project".to_string(),
            ));
        }
        if let Some(project) = update.project_id {
            if !self.project_exists(project)? {
                return Err(RepoError::NotFound {
                    entity: "project",
                    id: project,
                });
            }
        }
        let changed = self.conn.execute(
            "UPDATE jobs
             SET title = COALESCE(?2, title),
                 uri = COALESCE(?3, uri),
                 project_id = COALESCE(?4, project_id),
                 updated = ?5
             WHERE id = ?1 AND alive = 1;",
            params![
                id,
                update.title,
                update.uri,
                update.project_id,
                to_epoch(Utc::now())
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: "job", id });
        }
        Ok(())
    }

    fn soft_delete(&self, id: i64) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE jobs SET alive = 0, updated = ?2 WHERE id = ?1 AND alive = 1;",
            params![id, to_epoch(Utc::now())],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: "job", id });
        }
        Ok(())
    }
}

fn hydrate(row: &rusqlite::Row<'_>) -> RepoResult<Job> {
    let colour: String = row.get("colour")?;
    let updated: Option<i64> = row.get("updated")?;
    Ok(Job {
        id: row.get("id")?,
        project_id: row.get("project_id")?,
        title: row.get("title")?,
        uri: row.get("uri")?,
        colour: parse_colour(&colour)?,
        alive: row.get("alive")?,
        created: from_epoch(row.get("created")?)?,
        updated: updated.map(from_epoch).transpose()?,
    })
}

#[cfg(test)]
mod tests {
    use crate::db::{Database, RepoError};

    use super::{JobRepository, JobUpdate, NewJob};

    fn job(id: i64) -> NewJob {
        NewJob {
            id,
            ..Default::default()
        }
    }

    #[test]
    fn test_create_with_user_chosen_id() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.jobs().create(job(11)).unwrap(), 11);
        assert!(db.jobs().exists(11).unwrap());
        assert!(!db.jobs().exists(12).unwrap());
    }

    #[test]
    fn test_duplicate_and_invalid_ids_are_rejected() {
        let db = Database::open_in_memory().unwrap();
        db.jobs().create(job(11)).unwrap();
        assert!(matches!(
            db.jobs().create(job(11)),
            Err(RepoError::InvalidData(_))
        ));
        assert!(matches!(
            db.jobs().create(job(0)),
            Err(RepoError::InvalidData(_))
        ));
    }

    #[test]
    fn test_dead_job_id_stays_reserved() {
        // Journal lines keep referencing the id, so deleting must not free it
        // for reuse.
        let db = Database::open_in_memory().unwrap();
        db.jobs().create(job(11)).unwrap();
        db.jobs().soft_delete(11).unwrap();

        assert!(!db.jobs().exists(11).unwrap());
        assert!(matches!(
            db.jobs().create(job(11)),
            Err(RepoError::InvalidData(_))
        ));
    }

    #[test]
    fn test_update_title() {
        let db = Database::open_in_memory().unwrap();
        db.jobs().create(job(5)).unwrap();
        db.jobs()
            .update(
                5,
                JobUpdate {
                    title: Some("Support rotation"),
                    ..Default::default()
                },
            )
            .unwrap();

        let fetched = db.jobs().get(5).unwrap().unwrap();
        assert_eq!(fetched.title.as_deref(), Some("Support rotation"));
        assert_eq!(fetched.label(), "Support rotation (5)");
    }
}
