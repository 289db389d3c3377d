use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{from_epoch, models::LogRecord, to_epoch, RepoError, RepoResult};

#[derive(Debug, Clone)]
pub struct NewRecord {
    pub job_id: i64,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

/// Repository interface for entity-side time entries.
pub trait RecordRepository {
    fn create(&self, record: NewRecord) -> RepoResult<i64>;
    /// Records with `start <= timestamp < end`, oldest first.
    fn list_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> RepoResult<Vec<LogRecord>>;
    fn list_for_job(&self, job: i64) -> RepoResult<Vec<LogRecord>>;
    fn soft_delete(&self, id: i64) -> RepoResult<()>;
}

pub struct SqliteRecordRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRecordRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl RecordRepository for SqliteRecordRepository<'_> {
    fn create(&self, record: NewRecord) -> RepoResult<i64> {
        let message = record.message.trim();
        if message.is_empty() {
            return Err(RepoError::InvalidData("record message is empty".to_string()));
        }
        let job_alive: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM jobs WHERE id = ?1 AND alive = 1);",
            [record.job_id],
            |row| row.get(0),
        )?;
        if job_alive != 1 {
            return Err(RepoError::NotFound {
                entity: "job",
                id: record.job_id,
            });
        }

        self.conn.execute(
            "INSERT INTO records (uuid, job_id, timestamp, message, alive)
             VALUES (?1, ?2, ?3, ?4, 1);",
            params![
                Uuid::new_v4().to_string(),
                record.job_id,
                to_epoch(record.timestamp),
                message
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn list_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> RepoResult<Vec<LogRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, uuid, job_id, timestamp, message, alive
             FROM records
             WHERE alive = 1 AND timestamp >= ?1 AND timestamp < ?2
             ORDER BY timestamp ASC, id ASC;",
        )?;
        let mut rows = stmt.query(params![to_epoch(start), to_epoch(end)])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(hydrate(row)?);
        }
        Ok(records)
    }

    fn list_for_job(&self, job: i64) -> RepoResult<Vec<LogRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, uuid, job_id, timestamp, message, alive
             FROM records
             WHERE alive = 1 AND job_id = ?1
             ORDER BY timestamp ASC, id ASC;",
        )?;
        let mut rows = stmt.query([job])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(hydrate(row)?);
        }
        Ok(records)
    }

    fn soft_delete(&self, id: i64) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE records SET alive = 0 WHERE id = ?1 AND alive = 1;",
            [id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "record",
                id,
            });
        }
        Ok(())
    }
}

fn hydrate(row: &rusqlite::Row<'_>) -> RepoResult<LogRecord> {
    let uuid: String = row.get("uuid")?;
    Ok(LogRecord {
        id: row.get("id")?,
        uuid: Uuid::parse_str(&uuid)
            .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{uuid}`")))?,
        job_id: row.get("job_id")?,
        timestamp: from_epoch(row.get("timestamp")?)?,
        message: row.get("message")?,
        alive: row.get("alive")?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use crate::db::jobs::{JobRepository, NewJob};
    use crate::db::{Database, RepoError};

    use super::{NewRecord, RecordRepository};

    fn db_with_jobs() -> Database {
        let db = Database::open_in_memory().unwrap();
        for id in [4, 11] {
            db.jobs()
                .create(NewJob {
                    id,
                    ..Default::default()
                })
                .unwrap();
        }
        db
    }

    #[test]
    fn test_list_between_is_half_open() {
        let db = db_with_jobs();
        let start = Utc.with_ymd_and_hms(2025, 3, 15, 0, 0, 0).unwrap();
        let end = start + Duration::days(1);

        for (offset, message) in [
            (Duration::seconds(-1), "day before"),
            (Duration::zero(), "first of day"),
            (Duration::hours(23), "last of day"),
            (Duration::days(1), "next day"),
        ] {
            db.records()
                .create(NewRecord {
                    job_id: 11,
                    timestamp: start + offset,
                    message: message.to_string(),
                })
                .unwrap();
        }

        let day = db.records().list_between(start, end).unwrap();
        assert_eq!(
            day.iter().map(|r| r.message.as_str()).collect::<Vec<_>>(),
            vec!["first of day", "last of day"]
        );
    }

    #[test]
    fn test_records_require_live_job() {
        let db = db_with_jobs();
        assert!(matches!(
            db.records().create(NewRecord {
                job_id: 404,
                timestamp: Utc::now(),
                message: "x".to_string(),
            }),
            Err(RepoError::NotFound { entity: "job", .. })
        ));
    }

    #[test]
    fn test_soft_delete_hides_record() {
        let db = db_with_jobs();
        let id = db
            .records()
            .create(NewRecord {
                job_id: 4,
                timestamp: Utc::now(),
                message: "oops".to_string(),
            })
            .unwrap();

        db.records().soft_delete(id).unwrap();
        assert!(db.records().list_for_job(4).unwrap().is_empty());
    }

    #[test]
    fn test_uuid_round_trips() {
        let db = db_with_jobs();
        db.records()
            .create(NewRecord {
                job_id: 4,
                timestamp: Utc::now(),
                message: "x".to_string(),
            })
            .unwrap();
        let records = db.records().list_for_job(4).unwrap();
        assert_eq!(records.len(), 1);
        assert!(!records[0].uuid.is_nil());
    }
}
