use chrono::Utc;
use rusqlite::{params, Connection};

use super::{from_epoch, models::TaxonomyTerm, to_epoch, RepoError, RepoResult};

#[derive(Debug, Clone, Default)]
pub struct NewTerm {
    pub job_id: Option<i64>,
    pub name: String,
    pub definition: String,
}

/// Repository interface for taxonomy terms, the per-job glossary.
pub trait TermRepository {
    fn create(&self, term: NewTerm) -> RepoResult<i64>;
    fn list(&self, job: Option<i64>) -> RepoResult<Vec<TaxonomyTerm>>;
    fn delete(&self, id: i64) -> RepoResult<()>;
}

pub struct SqliteTermRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTermRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl TermRepository for SqliteTermRepository<'_> {
    fn create(&self, term: NewTerm) -> RepoResult<i64> {
        let name = term.name.trim();
        let definition = term.definition.trim();
        if name.is_empty() || definition.is_empty() {
            return Err(RepoError::InvalidData(
                "a term needs both a name and a definition".to_string(),
            ));
        }
        if let Some(job) = term.job_id {
            let exists: i64 = self.conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM jobs WHERE id = ?1 AND alive = 1);",
                [job],
                |row| row.get(0),
            )?;
            if exists != 1 {
                return Err(RepoError::NotFound {
                    entity: "job",
                    id: job,
                });
            }
        }

        self.conn.execute(
            "INSERT INTO terms (job_id, name, definition, created) VALUES (?1, ?2, ?3, ?4);",
            params![term.job_id, name, definition, to_epoch(Utc::now())],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn list(&self, job: Option<i64>) -> RepoResult<Vec<TaxonomyTerm>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, job_id, name, definition, created, updated
             FROM terms
             WHERE ?1 IS NULL OR job_id = ?1
             ORDER BY name COLLATE NOCASE ASC, id ASC;",
        )?;
        let mut rows = stmt.query([job])?;
        let mut terms = Vec::new();
        while let Some(row) = rows.next()? {
            let updated: Option<i64> = row.get("updated")?;
            terms.push(TaxonomyTerm {
                id: row.get("id")?,
                job_id: row.get("job_id")?,
                name: row.get("name")?,
                definition: row.get("definition")?,
                created: from_epoch(row.get("created")?)?,
                updated: updated.map(from_epoch).transpose()?,
            });
        }
        Ok(terms)
    }

    fn delete(&self, id: i64) -> RepoResult<()> {
        let changed = self.conn.execute("DELETE FROM terms WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: "term", id });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::db::jobs::{JobRepository, NewJob};
    use crate::db::{Database, RepoError};

    use super::{NewTerm, TermRepository};

    #[test]
    fn test_terms_need_name_and_definition() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(
            db.terms().create(NewTerm {
                name: "UAT".to_string(),
                definition: "  ".to_string(),
                ..Default::default()
            }),
            Err(RepoError::InvalidData(_))
        ));
    }

    #[test]
    fn test_job_scoped_glossary() {
        let db = Database::open_in_memory().unwrap();
        db.jobs()
            .create(NewJob {
                id: 11,
                ..Default::default()
            })
            .unwrap();

        db.terms()
            .create(NewTerm {
                job_id: Some(11),
                name: "UAT".to_string(),
                definition: "user acceptance testing".to_string(),
            })
            .unwrap();
        db.terms()
            .create(NewTerm {
                name: "OOO".to_string(),
                definition: "out of office".to_string(),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(db.terms().list(Some(11)).unwrap().len(), 1);
        assert_eq!(db.terms().list(None).unwrap().len(), 2);
    }
}
