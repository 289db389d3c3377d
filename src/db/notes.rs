use chrono::Utc;
use rusqlite::{params, Connection};

use super::{
    from_epoch,
    models::{Note, NoteVersion},
    to_epoch, RepoError, RepoResult,
};

#[derive(Debug, Clone, Default)]
pub struct NewNote {
    pub job_id: Option<i64>,
    pub title: String,
    pub content: String,
}

/// Repository interface for notes and their version history.
///
/// A note row carries identity and lifecycle; its text lives in
/// `note_versions`. Every content change appends a version, nothing is
/// rewritten in place.
pub trait NoteRepository {
    fn create(&self, note: NewNote) -> RepoResult<i64>;
    fn get(&self, id: i64) -> RepoResult<Option<Note>>;
    fn latest_version(&self, note_id: i64) -> RepoResult<Option<NoteVersion>>;
    fn list(&self, job: Option<i64>) -> RepoResult<Vec<Note>>;
    /// Appends a new version, carrying the missing half over from the latest
    /// one. Returns the new version id.
    fn update(&self, id: i64, title: Option<&str>, content: Option<&str>) -> RepoResult<i64>;
    /// Versions of a note, oldest first.
    fn versions(&self, note_id: i64) -> RepoResult<Vec<NoteVersion>>;
    fn star(&self, note_id: i64, version_id: i64, starred: bool) -> RepoResult<()>;
    fn soft_delete(&self, id: i64) -> RepoResult<()>;
}

pub struct SqliteNoteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn job_exists(&self, id: i64) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM jobs WHERE id = ?1 AND alive = 1);",
            [id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn create(&self, note: NewNote) -> RepoResult<i64> {
        let title = note.title.trim();
        if title.is_empty() {
            return Err(RepoError::InvalidData("note title is empty".to_string()));
        }
        if let Some(job) = note.job_id {
            if !self.job_exists(job)? {
                return Err(RepoError::NotFound {
                    entity: "job",
                    id: job,
                });
            }
        }

        let now = to_epoch(Utc::now());
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO notes (job_id, title, alive, created) VALUES (?1, ?2, 1, ?3);",
            params![note.job_id, title, now],
        )?;
        let note_id = tx.last_insert_rowid();
        tx.execute(
            "INSERT INTO note_versions (note_id, title, content, starred, created)
             VALUES (?1, ?2, ?3, 0, ?4);",
            params![note_id, title, note.content, now],
        )?;
        tx.commit()?;
        Ok(note_id)
    }

    fn get(&self, id: i64) -> RepoResult<Option<Note>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, job_id, title, alive, created, updated FROM notes WHERE id = ?1;",
        )?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(hydrate_note(row)?)),
            None => Ok(None),
        }
    }

    fn latest_version(&self, note_id: i64) -> RepoResult<Option<NoteVersion>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, note_id, title, content, starred, created
             FROM note_versions
             WHERE note_id = ?1
             ORDER BY id DESC
             LIMIT 1;",
        )?;
        let mut rows = stmt.query([note_id])?;
        match rows.next()? {
            Some(row) => Ok(Some(hydrate_version(row)?)),
            None => Ok(None),
        }
    }

    fn list(&self, job: Option<i64>) -> RepoResult<Vec<Note>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, job_id, title, alive, created, updated
             FROM notes
             WHERE alive = 1 AND (?1 IS NULL OR job_id = ?1)
             ORDER BY id ASC;",
        )?;
        let mut rows = stmt.query([job])?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(hydrate_note(row)?);
        }
        Ok(notes)
    }

    fn update(&self, id: i64, title: Option<&str>, content: Option<&str>) -> RepoResult<i64> {
        if title.is_none() && content.is_none() {
            return Err(RepoError::InvalidData(
                "nothing to update, pass a title or content".to_string(),
            ));
        }
        let Some(note) = self.get(id)? else {
            return Err(RepoError::NotFound { entity: "note", id });
        };
        if !note.alive {
            return Err(RepoError::NotFound { entity: "note", id });
        }
        let latest = self
            .latest_version(id)?
            .ok_or_else(|| RepoError::InvalidData(format!("note {id} has no versions")))?;

        let title = title.unwrap_or(&latest.title);
        let content = content.unwrap_or(&latest.content);
        let now = to_epoch(Utc::now());

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO note_versions (note_id, title, content, starred, created)
             VALUES (?1, ?2, ?3, 0, ?4);",
            params![id, title, content, now],
        )?;
        let version_id = tx.last_insert_rowid();
        tx.execute(
            "UPDATE notes SET title = ?2, updated = ?3 WHERE id = ?1;",
            params![id, title, now],
        )?;
        tx.commit()?;
        Ok(version_id)
    }

    fn versions(&self, note_id: i64) -> RepoResult<Vec<NoteVersion>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, note_id, title, content, starred, created
             FROM note_versions
             WHERE note_id = ?1
             ORDER BY id ASC;",
        )?;
        let mut rows = stmt.query([note_id])?;
        let mut versions = Vec::new();
        while let Some(row) = rows.next()? {
            versions.push(hydrate_version(row)?);
        }
        Ok(versions)
    }

    fn star(&self, note_id: i64, version_id: i64, starred: bool) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE note_versions SET starred = ?3 WHERE id = ?2 AND note_id = ?1;",
            params![note_id, version_id, starred],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "note version",
                id: version_id,
            });
        }
        Ok(())
    }

    fn soft_delete(&self, id: i64) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE notes SET alive = 0, updated = ?2 WHERE id = ?1 AND alive = 1;",
            params![id, to_epoch(Utc::now())],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: "note", id });
        }
        Ok(())
    }
}

fn hydrate_note(row: &rusqlite::Row<'_>) -> RepoResult<Note> {
    let updated: Option<i64> = row.get("updated")?;
    Ok(Note {
        id: row.get("id")?,
        job_id: row.get("job_id")?,
        title: row.get("title")?,
        alive: row.get("alive")?,
        created: from_epoch(row.get("created")?)?,
        updated: updated.map(from_epoch).transpose()?,
    })
}

fn hydrate_version(row: &rusqlite::Row<'_>) -> RepoResult<NoteVersion> {
    Ok(NoteVersion {
        id: row.get("id")?,
        note_id: row.get("note_id")?,
        title: row.get("title")?,
        content: row.get("content")?,
        starred: row.get("starred")?,
        created: from_epoch(row.get("created")?)?,
    })
}

#[cfg(test)]
mod tests {
    use crate::db::{Database, RepoError};

    use super::{NewNote, NoteRepository};

    fn note(title: &str, content: &str) -> NewNote {
        NewNote {
            job_id: None,
            title: title.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_create_writes_first_version() {
        let db = Database::open_in_memory().unwrap();
        let id = db
            .notes()
            .create(note("Standup notes", "nothing blocked"))
            .unwrap();

        let latest = db.notes().latest_version(id).unwrap().unwrap();
        assert_eq!(latest.title, "Standup notes");
        assert_eq!(latest.content, "nothing blocked");
        assert_eq!(db.notes().versions(id).unwrap().len(), 1);
    }

    #[test]
    fn test_update_appends_and_carries_forward() {
        let db = Database::open_in_memory().unwrap();
        let id = db.notes().create(note("Title", "v1")).unwrap();

        db.notes().update(id, None, Some("v2")).unwrap();
        db.notes().update(id, Some("Renamed"), None).unwrap();

        let versions = db.notes().versions(id).unwrap();
        assert_eq!(versions.len(), 3);
        // Content update kept the title, title update kept the content.
        assert_eq!(versions[1].title, "Title");
        assert_eq!(versions[1].content, "v2");
        assert_eq!(versions[2].title, "Renamed");
        assert_eq!(versions[2].content, "v2");

        let fetched = db.notes().get(id).unwrap().unwrap();
        assert_eq!(fetched.title, "Renamed");
    }

    #[test]
    fn test_update_without_fields_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        let id = db.notes().create(note("Title", "v1")).unwrap();
        assert!(matches!(
            db.notes().update(id, None, None),
            Err(RepoError::InvalidData(_))
        ));
    }

    #[test]
    fn test_star_checks_ownership() {
        let db = Database::open_in_memory().unwrap();
        let first = db.notes().create(note("First", "a")).unwrap();
        let second = db.notes().create(note("Second", "b")).unwrap();
        let second_version = db.notes().versions(second).unwrap()[0].id;

        assert!(matches!(
            db.notes().star(first, second_version, true),
            Err(RepoError::NotFound { .. })
        ));

        db.notes().star(second, second_version, true).unwrap();
        assert!(db.notes().versions(second).unwrap()[0].starred);
    }

    #[test]
    fn test_deleted_note_rejects_updates() {
        let db = Database::open_in_memory().unwrap();
        let id = db.notes().create(note("Gone", "x")).unwrap();
        db.notes().soft_delete(id).unwrap();

        assert!(db.notes().list(None).unwrap().is_empty());
        assert!(matches!(
            db.notes().update(id, Some("new"), None),
            Err(RepoError::NotFound { .. })
        ));
    }
}
