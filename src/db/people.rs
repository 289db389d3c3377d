use chrono::Utc;
use rusqlite::{params, Connection};

use super::{from_epoch, models::Person, to_epoch, RepoError, RepoResult};

#[derive(Debug, Clone, Default)]
pub struct NewPerson {
    pub company_id: Option<i64>,
    pub name: String,
    pub title: Option<String>,
}

/// Repository interface for people.
pub trait PersonRepository {
    fn create(&self, person: NewPerson) -> RepoResult<i64>;
    fn list(&self, company: Option<i64>) -> RepoResult<Vec<Person>>;
    fn delete(&self, id: i64) -> RepoResult<()>;
}

pub struct SqlitePersonRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePersonRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl PersonRepository for SqlitePersonRepository<'_> {
    fn create(&self, person: NewPerson) -> RepoResult<i64> {
        let name = person.name.trim();
        if name.is_empty() {
            return Err(RepoError::InvalidData("person name is empty".to_string()));
        }
        if let Some(company) = person.company_id {
            let exists: i64 = self.conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM companies WHERE id = ?1 AND alive = 1);",
                [company],
                |row| row.get(0),
            )?;
            if exists != 1 {
                return Err(RepoError::NotFound {
                    entity: "company",
                    id: company,
                });
            }
        }

        self.conn.execute(
            "INSERT INTO people (company_id, name, title, created) VALUES (?1, ?2, ?3, ?4);",
            params![person.company_id, name, person.title, to_epoch(Utc::now())],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn list(&self, company: Option<i64>) -> RepoResult<Vec<Person>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, company_id, name, title, created, updated
             FROM people
             WHERE ?1 IS NULL OR company_id = ?1
             ORDER BY name COLLATE NOCASE ASC, id ASC;",
        )?;
        let mut rows = stmt.query([company])?;
        let mut people = Vec::new();
        while let Some(row) = rows.next()? {
            let updated: Option<i64> = row.get("updated")?;
            people.push(Person {
                id: row.get("id")?,
                company_id: row.get("company_id")?,
                name: row.get("name")?,
                title: row.get("title")?,
                created: from_epoch(row.get("created")?)?,
                updated: updated.map(from_epoch).transpose()?,
            });
        }
        Ok(people)
    }

    fn delete(&self, id: i64) -> RepoResult<()> {
        let changed = self.conn.execute("DELETE FROM people WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "person",
                id,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::db::companies::{CompanyRepository, NewCompany};
    use crate::db::{Database, RepoError};

    use super::{NewPerson, PersonRepository};

    #[test]
    fn test_people_sort_by_name() {
        let db = Database::open_in_memory().unwrap();
        for name in ["zoe", "Adam"] {
            db.people()
                .create(NewPerson {
                    name: name.to_string(),
                    ..Default::default()
                })
                .unwrap();
        }

        let names: Vec<String> = db
            .people()
            .list(None)
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Adam", "zoe"]);
    }

    #[test]
    fn test_company_scoping() {
        let db = Database::open_in_memory().unwrap();
        let acme = db
            .companies()
            .create(NewCompany {
                name: "Acme".to_string(),
                ..Default::default()
            })
            .unwrap();
        db.people()
            .create(NewPerson {
                company_id: Some(acme),
                name: "Insider".to_string(),
                title: Some("CTO".to_string()),
            })
            .unwrap();
        db.people()
            .create(NewPerson {
                name: "Freelancer".to_string(),
                ..Default::default()
            })
            .unwrap();

        let scoped = db.people().list(Some(acme)).unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].title.as_deref(), Some("CTO"));

        assert!(matches!(
            db.people().create(NewPerson {
                company_id: Some(999),
                name: "Ghost".to_string(),
                ..Default::default()
            }),
            Err(RepoError::NotFound { .. })
        ));
    }
}
