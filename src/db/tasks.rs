use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::{from_epoch, models::LogTask, to_epoch, RepoError, RepoResult};

#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub job_id: i64,
    pub content: String,
    pub due: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct TaskListQuery {
    pub job: Option<i64>,
    /// Completed and cancelled tasks are hidden unless asked for.
    pub include_closed: bool,
}

/// Repository interface for job tasks.
pub trait TaskRepository {
    fn create(&self, task: NewTask) -> RepoResult<i64>;
    fn get(&self, id: i64) -> RepoResult<Option<LogTask>>;
    fn list(&self, query: &TaskListQuery) -> RepoResult<Vec<LogTask>>;
    fn complete(&self, id: i64) -> RepoResult<()>;
    fn cancel(&self, id: i64) -> RepoResult<()>;
    fn delete(&self, id: i64) -> RepoResult<()>;
}

pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn close(&self, id: i64, column: &'static str) -> RepoResult<()> {
        let task = self
            .get(id)?
            .ok_or(RepoError::NotFound { entity: "task", id })?;
        if !task.is_open() {
            return Err(RepoError::InvalidData(format!("task {id} is already closed")));
        }
        let now = to_epoch(Utc::now());
        self.conn.execute(
            &format!("UPDATE tasks SET {column} = ?2, updated = ?2 WHERE id = ?1;"),
            params![id, now],
        )?;
        Ok(())
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn create(&self, task: NewTask) -> RepoResult<i64> {
        let content = task.content.trim();
        if content.is_empty() {
            return Err(RepoError::InvalidData("task content is empty".to_string()));
        }
        let job_alive: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM jobs WHERE id = ?1 AND alive = 1);",
            [task.job_id],
            |row| row.get(0),
        )?;
        if job_alive != 1 {
            return Err(RepoError::NotFound {
                entity: "job",
                id: task.job_id,
            });
        }

        self.conn.execute(
            "INSERT INTO tasks (job_id, content, due, created) VALUES (?1, ?2, ?3, ?4);",
            params![
                task.job_id,
                content,
                task.due.map(to_epoch),
                to_epoch(Utc::now())
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get(&self, id: i64) -> RepoResult<Option<LogTask>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, job_id, content, due, completed, cancelled, created, updated
             FROM tasks WHERE id = ?1;",
        )?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(hydrate(row)?)),
            None => Ok(None),
        }
    }

    fn list(&self, query: &TaskListQuery) -> RepoResult<Vec<LogTask>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, job_id, content, due, completed, cancelled, created, updated
             FROM tasks
             WHERE (?1 IS NULL OR job_id = ?1)
               AND (?2 OR (completed IS NULL AND cancelled IS NULL))
             ORDER BY job_id ASC, id ASC;",
        )?;
        let mut rows = stmt.query(params![query.job, query.include_closed])?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(hydrate(row)?);
        }
        Ok(tasks)
    }

    fn complete(&self, id: i64) -> RepoResult<()> {
        self.close(id, "completed")
    }

    fn cancel(&self, id: i64) -> RepoResult<()> {
        self.close(id, "cancelled")
    }

    fn delete(&self, id: i64) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: "task", id });
        }
        Ok(())
    }
}

fn hydrate(row: &rusqlite::Row<'_>) -> RepoResult<LogTask> {
    let due: Option<i64> = row.get("due")?;
    let completed: Option<i64> = row.get("completed")?;
    let cancelled: Option<i64> = row.get("cancelled")?;
    let updated: Option<i64> = row.get("updated")?;
    Ok(LogTask {
        id: row.get("id")?,
        job_id: row.get("job_id")?,
        content: row.get("content")?,
        due: due.map(from_epoch).transpose()?,
        completed: completed.map(from_epoch).transpose()?,
        cancelled: cancelled.map(from_epoch).transpose()?,
        created: from_epoch(row.get("created")?)?,
        updated: updated.map(from_epoch).transpose()?,
    })
}

#[cfg(test)]
mod tests {
    use crate::db::jobs::{JobRepository, NewJob};
    use crate::db::{Database, RepoError};

    use super::{NewTask, TaskListQuery, TaskRepository};

    fn db_with_job(id: i64) -> Database {
        let db = Database::open_in_memory().unwrap();
        db.jobs()
            .create(NewJob {
                id,
                ..Default::default()
            })
            .unwrap();
        db
    }

    fn task(job_id: i64, content: &str) -> NewTask {
        NewTask {
            job_id,
            content: content.to_string(),
            due: None,
        }
    }

    #[test]
    fn test_create_requires_live_job() {
        let db = db_with_job(11);
        assert!(db.tasks().create(task(11, "write report")).is_ok());
        assert!(matches!(
            db.tasks().create(task(99, "orphan")),
            Err(RepoError::NotFound { entity: "job", .. })
        ));
    }

    #[test]
    fn test_complete_hides_from_open_list() {
        let db = db_with_job(11);
        let open = db.tasks().create(task(11, "keep")).unwrap();
        let done = db.tasks().create(task(11, "finish")).unwrap();

        db.tasks().complete(done).unwrap();

        let listed = db.tasks().list(&TaskListQuery::default()).unwrap();
        assert_eq!(listed.iter().map(|t| t.id).collect::<Vec<_>>(), vec![open]);

        let all = db
            .tasks()
            .list(&TaskListQuery {
                include_closed: true,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().any(|t| t.id == done && t.completed.is_some()));
    }

    #[test]
    fn test_closing_twice_is_rejected() {
        let db = db_with_job(11);
        let id = db.tasks().create(task(11, "once")).unwrap();
        db.tasks().cancel(id).unwrap();

        assert!(matches!(
            db.tasks().complete(id),
            Err(RepoError::InvalidData(_))
        ));
    }

    #[test]
    fn test_delete_is_hard() {
        let db = db_with_job(11);
        let id = db.tasks().create(task(11, "gone")).unwrap();
        db.tasks().delete(id).unwrap();

        assert!(db.tasks().get(id).unwrap().is_none());
        assert!(matches!(
            db.tasks().delete(id),
            Err(RepoError::NotFound { .. })
        ));
    }
}
