use std::{
    future::Future,
    io::ErrorKind,
    ops::Deref,
    path::{Path, PathBuf},
};

use anyhow::{bail, Result};
use chrono::NaiveDate;
use fs4::tokio::AsyncFileExt;
use tokio::{
    fs::File,
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
};
use tracing::{debug, warn};

use crate::utils::time::date_prefix;

use super::entities::JournalEntry;

/// Interface for abstracting storage of journal entries.
pub trait JournalStorage {
    /// Appends entries to the end of a category file, creating it on first use.
    fn append(
        &self,
        category: &str,
        entries: Vec<JournalEntry>,
    ) -> impl Future<Output = Result<()>>;

    /// Retrieves every entry of a category written on a certain day.
    fn entries_for(
        &self,
        category: &str,
        date: NaiveDate,
    ) -> impl Future<Output = Result<Vec<JournalEntry>>> + Send;

    /// Linear scan of a category for lines containing `needle`, ignoring case.
    fn search(
        &self,
        category: &str,
        needle: &str,
    ) -> impl Future<Output = Result<Vec<JournalEntry>>> + Send;

    /// Names of every category that has a file on disk.
    fn categories(&self) -> impl Future<Output = Result<Vec<String>>> + Send;
}

impl<T: Deref> JournalStorage for T
where
    T::Target: JournalStorage,
{
    fn append(
        &self,
        category: &str,
        entries: Vec<JournalEntry>,
    ) -> impl Future<Output = Result<()>> {
        self.deref().append(category, entries)
    }

    fn entries_for(
        &self,
        category: &str,
        date: NaiveDate,
    ) -> impl Future<Output = Result<Vec<JournalEntry>>> + Send {
        self.deref().entries_for(category, date)
    }

    fn search(
        &self,
        category: &str,
        needle: &str,
    ) -> impl Future<Output = Result<Vec<JournalEntry>>> + Send {
        self.deref().search(category, needle)
    }

    fn categories(&self) -> impl Future<Output = Result<Vec<String>>> + Send {
        self.deref().categories()
    }
}

/// The main realization of [JournalStorage]. One flat text file per category,
/// newline-delimited, shared between concurrent daybook invocations through
/// advisory file locks.
pub struct JournalStorageImpl {
    journal_dir: PathBuf,
}

impl JournalStorageImpl {
    pub fn new(journal_dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&journal_dir)?;

        Ok(Self { journal_dir })
    }

    pub fn journal_dir(&self) -> &Path {
        &self.journal_dir
    }

    fn category_path(&self, category: &str) -> Result<PathBuf> {
        if category.is_empty()
            || !category
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
        {
            bail!("Invalid category name {category:?}. Use lowercase letters, digits, - or _");
        }
        Ok(self.journal_dir.join(format!("{category}.log")))
    }

    async fn read_matching(
        &self,
        path: &Path,
        keep: impl Fn(&str) -> bool,
    ) -> Result<Vec<JournalEntry>> {
        async fn extract(
            path: &Path,
            keep: impl Fn(&str) -> bool,
        ) -> std::result::Result<Vec<JournalEntry>, std::io::Error> {
            debug!("Extracting {path:?}");
            let file = File::open(path).await?;
            file.lock_shared()?;
            let buffer = BufReader::new(file);
            let mut lines = buffer.lines();
            let mut entries = vec![];
            while let Ok(Some(line)) = lines.next_line().await {
                if line.trim().is_empty() || !keep(&line) {
                    continue;
                }
                match JournalEntry::parse(&line) {
                    Some(v) => entries.push(v),
                    None => {
                        // ignore illegal values. Might happen after shutdowns
                        warn!("During parsing in path {:?} found illegal line {}", path, &line)
                    }
                }
            }

            lines.into_inner().into_inner().unlock_async().await?;

            Ok(entries)
        }

        match extract(path, keep).await {
            Ok(s) => Ok(s),
            Err(e) => {
                if e.kind() == ErrorKind::NotFound {
                    Ok(vec![])
                } else {
                    Err(e)?
                }
            }
        }
    }
}

impl JournalStorage for JournalStorageImpl {
    async fn append(&self, category: &str, entries: Vec<JournalEntry>) -> Result<()> {
        let path = self.category_path(category)?;

        let file = File::options()
            .append(true)
            .create(true)
            .open(path)
            .await?;

        // Semi-safe acquire-release for a file
        file.lock_exclusive()?;
        let result = append_with_file(file, entries).await;
        result
    }

    async fn entries_for(&self, category: &str, date: NaiveDate) -> Result<Vec<JournalEntry>> {
        let path = self.category_path(category)?;
        let prefix = date_prefix(date);
        self.read_matching(&path, |line| line.starts_with(&prefix))
            .await
    }

    async fn search(&self, category: &str, needle: &str) -> Result<Vec<JournalEntry>> {
        let path = self.category_path(category)?;
        let needle = needle.to_lowercase();
        self.read_matching(&path, |line| line.to_lowercase().contains(&needle))
            .await
    }

    async fn categories(&self) -> Result<Vec<String>> {
        let mut reader = match tokio::fs::read_dir(&self.journal_dir).await {
            Ok(v) => v,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(e.into()),
        };

        let mut categories = vec![];
        while let Some(entry) = reader.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|v| v == "log") {
                if let Some(stem) = path.file_stem() {
                    categories.push(stem.to_string_lossy().to_string());
                }
            }
        }
        categories.sort();
        Ok(categories)
    }
}

async fn append_with_file(mut file: File, entries: Vec<JournalEntry>) -> Result<()> {
    let mut buffer = Vec::<u8>::new();
    for entry in entries {
        buffer.extend_from_slice(entry.to_line().as_bytes());
        buffer.push(b'\n');
    }

    let write_result = async {
        file.write_all(&buffer).await?;
        file.flush().await?;
        Ok(())
    }
    .await;

    file.unlock_async().await?;
    write_result
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::{NaiveDate, NaiveDateTime};
    use tempfile::tempdir;

    use crate::journal::entities::JournalEntry;

    use super::{JournalStorage, JournalStorageImpl};

    fn at(date: (i32, u32, u32), hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(date.0, date.1, date.2)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[tokio::test]
    async fn test_append_then_read_by_day() -> Result<()> {
        let dir = tempdir()?;
        let storage = JournalStorageImpl::new(dir.path().join("journal"))?;

        storage
            .append(
                "daily",
                vec![
                    JournalEntry::new(at((2025, 3, 14), 9, 30), 11, "standup"),
                    JournalEntry::new(at((2025, 3, 15), 10, 0), 11, "code review"),
                    JournalEntry::new(at((2025, 3, 15), 10, 45), 4, "billing call"),
                ],
            )
            .await?;

        let day = storage
            .entries_for("daily", NaiveDate::from_ymd_opt(2025, 3, 15).unwrap())
            .await?;
        assert_eq!(day.len(), 2);
        assert_eq!(day[0].message, "code review");
        assert_eq!(day[1].job, 4);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_category_reads_empty() -> Result<()> {
        let dir = tempdir()?;
        let storage = JournalStorageImpl::new(dir.path().join("journal"))?;

        let day = storage
            .entries_for("daily", NaiveDate::from_ymd_opt(2025, 3, 15).unwrap())
            .await?;
        assert!(day.is_empty());
        assert!(storage.search("daily", "anything").await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_appends_accumulate_in_order() -> Result<()> {
        let dir = tempdir()?;
        let storage = JournalStorageImpl::new(dir.path().join("journal"))?;
        let date = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();

        storage
            .append(
                "daily",
                vec![JournalEntry::new(at((2025, 3, 15), 9, 0), 1, "first")],
            )
            .await?;
        storage
            .append(
                "daily",
                vec![JournalEntry::new(at((2025, 3, 15), 9, 5), 1, "second")],
            )
            .await?;

        let day = storage.entries_for("daily", date).await?;
        assert_eq!(
            day.iter().map(|v| v.message.as_str()).collect::<Vec<_>>(),
            vec!["first", "second"]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_corrupt_lines_are_skipped() -> Result<()> {
        std::sync::LazyLock::force(&crate::utils::logging::TEST_LOGGING);
        let dir = tempdir()?;
        let journal = dir.path().join("journal");
        let storage = JournalStorageImpl::new(journal.clone())?;

        storage
            .append(
                "daily",
                vec![JournalEntry::new(at((2025, 3, 15), 9, 0), 1, "kept")],
            )
            .await?;
        // Simulates a write cut off by a shutdown.
        std::fs::write(
            journal.join("daily.log"),
            "2025-03-15 09:00 - 1 - kept\n2025-03-15 09:3",
        )?;

        let day = storage
            .entries_for("daily", NaiveDate::from_ymd_opt(2025, 3, 15).unwrap())
            .await?;
        assert_eq!(day.len(), 1);
        assert_eq!(day[0].message, "kept");
        Ok(())
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_and_spans_days() -> Result<()> {
        let dir = tempdir()?;
        let storage = JournalStorageImpl::new(dir.path().join("journal"))?;

        storage
            .append(
                "daily",
                vec![
                    JournalEntry::new(at((2025, 3, 14), 9, 0), 11, "Deploy staging"),
                    JournalEntry::new(at((2025, 3, 15), 9, 0), 11, "deploy production"),
                    JournalEntry::new(at((2025, 3, 15), 9, 5), 4, "lunch"),
                ],
            )
            .await?;

        let hits = storage.search("daily", "DEPLOY").await?;
        assert_eq!(hits.len(), 2);
        assert_ne!(hits[0].date(), hits[1].date());

        // Matching runs over the raw line, so job ids and dates hit too.
        let by_date = storage.search("daily", "2025-03-14").await?;
        assert_eq!(by_date.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_categories_listing() -> Result<()> {
        let dir = tempdir()?;
        let storage = JournalStorageImpl::new(dir.path().join("journal"))?;

        let entry = JournalEntry::new(at((2025, 3, 15), 9, 0), 1, "x");
        storage.append("work", vec![entry.clone()]).await?;
        storage.append("daily", vec![entry]).await?;

        assert_eq!(storage.categories().await?, vec!["daily", "work"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_category_names_are_validated() -> Result<()> {
        let dir = tempdir()?;
        let storage = JournalStorageImpl::new(dir.path().join("journal"))?;

        let entry = JournalEntry::new(at((2025, 3, 15), 9, 0), 1, "x");
        assert!(storage.append("../escape", vec![entry.clone()]).await.is_err());
        assert!(storage.append("Daily", vec![entry]).await.is_err());
        Ok(())
    }
}
