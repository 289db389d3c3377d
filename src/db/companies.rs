use chrono::Utc;
use rusqlite::{params, Connection};

use super::{
    from_epoch,
    models::{derive_abbreviation, Colour, Company},
    parse_colour, to_epoch, RepoError, RepoResult,
};

#[derive(Debug, Clone, Default)]
pub struct NewCompany {
    pub name: String,
    pub abbreviation: Option<String>,
    pub colour: Option<Colour>,
}

/// Repository interface for company CRUD operations.
pub trait CompanyRepository {
    fn create(&self, company: NewCompany) -> RepoResult<i64>;
    fn get(&self, id: i64) -> RepoResult<Option<Company>>;
    fn list(&self, include_dead: bool) -> RepoResult<Vec<Company>>;
    fn update(&self, id: i64, name: Option<&str>, abbreviation: Option<&str>) -> RepoResult<()>;
    fn soft_delete(&self, id: i64) -> RepoResult<()>;
}

pub struct SqliteCompanyRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCompanyRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl CompanyRepository for SqliteCompanyRepository<'_> {
    fn create(&self, company: NewCompany) -> RepoResult<i64> {
        let name = company.name.trim();
        if name.is_empty() {
            return Err(RepoError::InvalidData("company name is empty".to_string()));
        }
        let abbreviation = company
            .abbreviation
            .unwrap_or_else(|| derive_abbreviation(name));
        let colour = company.colour.unwrap_or_else(|| Colour::from_name(name));

        self.conn.execute(
            "INSERT INTO companies (name, abbreviation, colour, alive, created)
             VALUES (?1, ?2, ?3, 1, ?4);",
            params![name, abbreviation, colour.encode(), to_epoch(Utc::now())],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get(&self, id: i64) -> RepoResult<Option<Company>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, abbreviation, colour, alive, created, updated
             FROM companies WHERE id = ?1;",
        )?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(hydrate(row)?)),
            None => Ok(None),
        }
    }

    fn list(&self, include_dead: bool) -> RepoResult<Vec<Company>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, abbreviation, colour, alive, created, updated
             FROM companies
             WHERE alive = 1 OR ?1
             ORDER BY id ASC;",
        )?;
        let mut rows = stmt.query([include_dead])?;
        let mut companies = Vec::new();
        while let Some(row) = rows.next()? {
            companies.push(hydrate(row)?);
        }
        Ok(companies)
    }

    fn update(&self, id: i64, name: Option<&str>, abbreviation: Option<&str>) -> RepoResult<()> {
        if name.is_none() && abbreviation.is_none() {
            return Err(RepoError::InvalidData(
                "nothing to update, pass a name or an abbreviation".to_string(),
            ));
        }
        let changed = self.conn.execute(
            "UPDATE companies
             SET name = COALESCE(?2, name),
                 abbreviation = COALESCE(?3, abbreviation),
                 updated = ?4
             WHERE id = ?1 AND alive = 1;",
            params![id, name, abbreviation, to_epoch(Utc::now())],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "company",
                id,
            });
        }
        Ok(())
    }

    fn soft_delete(&self, id: i64) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE companies SET alive = 0, updated = ?2 WHERE id = ?1 AND alive = 1;",
            params![id, to_epoch(Utc::now())],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "company",
                id,
            });
        }
        Ok(())
    }
}

fn hydrate(row: &rusqlite::Row<'_>) -> RepoResult<Company> {
    let colour: String = row.get("colour")?;
    let updated: Option<i64> = row.get("updated")?;
    Ok(Company {
        id: row.get("id")?,
        name: row.get("name")?,
        abbreviation: row.get("abbreviation")?,
        colour: parse_colour(&colour)?,
        alive: row.get("alive")?,
        created: from_epoch(row.get("created")?)?,
        updated: updated.map(from_epoch).transpose()?,
    })
}

#[cfg(test)]
mod tests {
    use crate::db::{Database, RepoError};

    use super::{CompanyRepository, NewCompany};

    fn named(name: &str) -> NewCompany {
        NewCompany {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_fills_defaults() {
        let db = Database::open_in_memory().unwrap();
        let id = db.companies().create(named("Acme Widget Co")).unwrap();

        let company = db.companies().get(id).unwrap().unwrap();
        assert_eq!(company.abbreviation, "AWC");
        assert!(company.alive);
        assert!(company.updated.is_none());
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(
            db.companies().create(named("  ")),
            Err(RepoError::InvalidData(_))
        ));
    }

    #[test]
    fn test_soft_delete_hides_from_list() {
        let db = Database::open_in_memory().unwrap();
        let repo = db.companies();
        let keep = repo.create(named("Keep")).unwrap();
        let drop = repo.create(named("Drop")).unwrap();

        repo.soft_delete(drop).unwrap();

        let alive: Vec<i64> = repo.list(false).unwrap().iter().map(|c| c.id).collect();
        assert_eq!(alive, vec![keep]);
        assert_eq!(repo.list(true).unwrap().len(), 2);
        // A second delete no longer finds the row.
        assert!(matches!(
            repo.soft_delete(drop),
            Err(RepoError::NotFound { .. })
        ));
    }

    #[test]
    fn test_update_touches_timestamp() {
        let db = Database::open_in_memory().unwrap();
        let repo = db.companies();
        let id = repo.create(named("Before")).unwrap();

        repo.update(id, Some("After"), None).unwrap();

        let company = repo.get(id).unwrap().unwrap();
        assert_eq!(company.name, "After");
        assert_eq!(company.abbreviation, "B");
        assert!(company.updated.is_some());
    }
}
