use chrono::Utc;
use rusqlite::{params, Connection};

use super::{
    from_epoch,
    models::{derive_abbreviation, Colour, Project},
    parse_colour, to_epoch, RepoError, RepoResult,
};

#[derive(Debug, Clone, Default)]
pub struct NewProject {
    pub company_id: Option<i64>,
    pub name: String,
    pub abbreviation: Option<String>,
    pub colour: Option<Colour>,
}

/// Repository interface for project CRUD operations.
pub trait ProjectRepository {
    fn create(&self, project: NewProject) -> RepoResult<i64>;
    fn get(&self, id: i64) -> RepoResult<Option<Project>>;
    /// Alive projects, optionally scoped to one company.
    fn list(&self, company: Option<i64>, include_dead: bool) -> RepoResult<Vec<Project>>;
    fn update(&self, id: i64, name: Option<&str>, company: Option<i64>) -> RepoResult<()>;
    fn soft_delete(&self, id: i64) -> RepoResult<()>;
}

pub struct SqliteProjectRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProjectRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn company_exists(&self, id: i64) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM companies WHERE id = ?1 AND alive = 1);",
            [id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }
}

impl ProjectRepository for SqliteProjectRepository<'_> {
    fn create(&self, project: NewProject) -> RepoResult<i64> {
        let name = project.name.trim();
        if name.is_empty() {
            return Err(RepoError::InvalidData("project name is empty".to_string()));
        }
        if let Some(company) = project.company_id {
            if !self.company_exists(company)? {
                return Err(RepoError::NotFound {
                    entity: "company",
                    id: company,
                });
            }
        }
        let abbreviation = project
            .abbreviation
            .unwrap_or_else(|| derive_abbreviation(name));
        let colour = project.colour.unwrap_or_else(|| Colour::from_name(name));

        self.conn.execute(
            "INSERT INTO projects (company_id, name, abbreviation, colour, alive, created)
             VALUES (?1, ?2, ?3, ?4, 1, ?5);",
            params![
                project.company_id,
                name,
                abbreviation,
                colour.encode(),
                to_epoch(Utc::now())
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get(&self, id: i64) -> RepoResult<Option<Project>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, company_id, name, abbreviation, colour, alive, created, updated
             FROM projects WHERE id = ?1;",
        )?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(hydrate(row)?)),
            None => Ok(None),
        }
    }

    fn list(&self, company: Option<i64>, include_dead: bool) -> RepoResult<Vec<Project>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, company_id, name, abbreviation, colour, alive, created, updated
             FROM projects
             WHERE (alive = 1 OR ?1) AND (?2 IS NULL OR company_id = ?2)
             ORDER BY id ASC;",
        )?;
        let mut rows = stmt.query(params![include_dead, company])?;
        let mut projects = Vec::new();
        while let Some(row) = rows.next()? {
            projects.push(hydrate(row)?);
        }
        Ok(projects)
    }

    fn update(&self, id: i64, name: Option<&str>, company: Option<i64>) -> RepoResult<()> {
        if name.is_none() && company.is_none() {
            return Err(RepoError::InvalidData(
                "nothing to update, pass a name or a company".to_string(),
            ));
        }
        if let Some(company) = company {
            if !self.company_exists(company)? {
                return Err(RepoError::NotFound {
                    entity: "company",
                    id: company,
                });
            }
        }
        let changed = self.conn.execute(
            "UPDATE projects
             SET name = COALESCE(?2, name),
                 company_id = COALESCE(?3, company_id),
                 updated = ?4
             WHERE id = ?1 AND alive = 1;",
            params![id, name, company, to_epoch(Utc::now())],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "project",
                id,
            });
        }
        Ok(())
    }

    fn soft_delete(&self, id: i64) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE projects SET alive = 0, updated = ?2 WHERE id = ?1 AND alive = 1;",
            params![id, to_epoch(Utc::now())],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "project",
                id,
            });
        }
        Ok(())
    }
}

fn hydrate(row: &rusqlite::Row<'_>) -> RepoResult<Project> {
    let colour: String = row.get("colour")?;
    let updated: Option<i64> = row.get("updated")?;
    Ok(Project {
        id: row.get("id")?,
        company_id: row.get("company_id")?,
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
    use crate::db::companies::{CompanyRepository, NewCompany};
    use crate::db::{Database, RepoError};

    use super::{NewProject, ProjectRepository};

    fn sample(company: Option<i64>, name: &str) -> NewProject {
        NewProject {
            company_id: company,
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_under_company_and_filter() {
        let db = Database::open_in_memory().unwrap();
        let acme = db
            .companies()
            .create(NewCompany {
                name: "Acme".to_string(),
                ..Default::default()
            })
            .unwrap();

        let scoped = db.projects().create(sample(Some(acme), "Platform")).unwrap();
        db.projects().create(sample(None, "Homeless")).unwrap();

        let filtered = db.projects().list(Some(acme), false).unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, scoped);
        assert_eq!(db.projects().list(None, false).unwrap().len(), 2);
    }

    #[test]
    fn test_create_under_unknown_company_fails() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(
            db.projects().create(sample(Some(99), "Orphan")),
            Err(RepoError::NotFound { entity: "company", .. })
        ));
    }

    #[test]
    fn test_reassign_company() {
        let db = Database::open_in_memory().unwrap();
        let first = db
            .companies()
            .create(NewCompany {
                name: "First".to_string(),
                ..Default::default()
            })
            .unwrap();
        let second = db
            .companies()
            .create(NewCompany {
                name: "Second".to_string(),
                ..Default::default()
            })
            .unwrap();
        let project = db.projects().create(sample(Some(first), "Move me")).unwrap();

        db.projects().update(project, None, Some(second)).unwrap();

        let moved = db.projects().get(project).unwrap().unwrap();
        assert_eq!(moved.company_id, Some(second));
    }
}
