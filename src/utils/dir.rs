use std::{env, io, path::PathBuf};

use anyhow::Result;

/// Resolves the application directory and makes sure it exists.
///
/// Priority: explicit cli flag, then `DAYBOOK_DIR`, then the platform state
/// directory.
pub fn application_dir(explicit: Option<PathBuf>) -> Result<PathBuf> {
    let path = match explicit.or_else(|| env::var("DAYBOOK_DIR").ok().map(PathBuf::from)) {
        Some(path) => path,
        None => default_application_path(),
    };

    match std::fs::create_dir_all(&path) {
        Ok(_) => Ok(path),
        Err(v) if v.kind() == io::ErrorKind::AlreadyExists => Ok(path),
        Err(v) => Err(v.into()),
    }
}

fn default_application_path() -> PathBuf {
    #[cfg(windows)]
    {
        let mut path =
            PathBuf::from(env::var("APPDATA").expect("APPDATA should be present on Windows"));
        path.push("daybook");
        path
    }
    #[cfg(not(windows))]
    {
        let mut path = env::var("XDG_STATE_HOME")
            .map(PathBuf::from)
            .or_else(|_| {
                env::var("HOME").map(|home| {
                    let mut path = PathBuf::from(home);
                    path.push(".local/state");
                    path
                })
            })
            .expect("Couldn't find neither XDG_STATE_HOME nor HOME");
        path.push("daybook");
        path
    }
}

pub fn journal_dir(application_dir: &std::path::Path) -> PathBuf {
    application_dir.join("journal")
}

pub fn backup_root(application_dir: &std::path::Path) -> PathBuf {
    application_dir.join("backup")
}

pub fn database_path(application_dir: &std::path::Path) -> PathBuf {
    application_dir.join("daybook.db")
}

pub fn session_path(application_dir: &std::path::Path) -> PathBuf {
    application_dir.join("session.json")
}
