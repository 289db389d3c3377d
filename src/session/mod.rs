use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Jobs and tasks the user queued up for the day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(default)]
    pub jobs: Vec<i64>,
    #[serde(default)]
    pub tasks: Vec<i64>,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty() && self.tasks.is_empty()
    }
}

/// The user's current context, shared by every command. The cli equivalent of
/// the ambient "what am I looking at" state a windowed app keeps in memory;
/// here it has to survive between invocations, so it lives in a file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub job: Option<i64>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub company: Option<i64>,
    #[serde(default)]
    pub project: Option<i64>,
    #[serde(default)]
    pub plan: Plan,
}

impl Session {
    /// Reads the session file. A missing or unreadable file falls back to the
    /// default session so a broken file never locks the user out.
    pub fn load(path: &Path) -> Session {
        let raw = match std::fs::read_to_string(path) {
            Ok(v) => v,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Session::default(),
            Err(e) => {
                warn!("Failed to read session file {path:?}: {e}");
                return Session::default();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(v) => v,
            Err(e) => {
                warn!("Session file {path:?} is corrupt, starting fresh: {e}");
                Session::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(path, raw).with_context(|| format!("Failed to write session to {path:?}"))
    }

    /// The date commands scope to: the pinned one, today otherwise.
    pub fn date_or_today(&self) -> NaiveDate {
        self.date.unwrap_or_else(|| Local::now().date_naive())
    }

    pub fn clear(&mut self) {
        *self = Session {
            plan: std::mem::take(&mut self.plan),
            ..Session::default()
        };
    }

    pub fn plan_job(&mut self, id: i64) -> bool {
        if self.plan.jobs.contains(&id) {
            return false;
        }
        self.plan.jobs.push(id);
        self.plan.jobs.sort_unstable();
        true
    }

    pub fn unplan_job(&mut self, id: i64) -> bool {
        let before = self.plan.jobs.len();
        self.plan.jobs.retain(|v| *v != id);
        self.plan.jobs.len() != before
    }

    pub fn plan_task(&mut self, id: i64) -> bool {
        if self.plan.tasks.contains(&id) {
            return false;
        }
        self.plan.tasks.push(id);
        self.plan.tasks.sort_unstable();
        true
    }

    pub fn unplan_task(&mut self, id: i64) -> bool {
        let before = self.plan.tasks.len();
        self.plan.tasks.retain(|v| *v != id);
        self.plan.tasks.len() != before
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use tempfile::tempdir;

    use super::{Plan, Session};

    #[test]
    fn test_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");

        let session = Session {
            job: Some(11),
            date: NaiveDate::from_ymd_opt(2025, 3, 15),
            company: None,
            project: Some(2),
            plan: Plan {
                jobs: vec![4, 11],
                tasks: vec![],
            },
        };
        session.save(&path).unwrap();

        assert_eq!(Session::load(&path), session);
    }

    #[test]
    fn test_missing_and_corrupt_files_fall_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        assert_eq!(Session::load(&path), Session::default());

        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(Session::load(&path), Session::default());
    }

    #[test]
    fn test_plan_add_remove_is_idempotent() {
        let mut session = Session::default();
        assert!(session.plan_job(11));
        assert!(!session.plan_job(11));
        assert_eq!(session.plan.jobs, vec![11]);

        assert!(session.unplan_job(11));
        assert!(!session.unplan_job(11));
        assert!(session.plan.is_empty());
    }

    #[test]
    fn test_clear_keeps_plan() {
        let mut session = Session {
            job: Some(11),
            ..Session::default()
        };
        session.plan_job(4);

        session.clear();
        assert_eq!(session.job, None);
        assert_eq!(session.plan.jobs, vec![4]);
    }
}
