use chrono::{NaiveDate, NaiveDateTime};

use crate::utils::time::LINE_TIME_FORMAT;

/// Job id written into lines that aren't tied to any job.
pub const NO_JOB: i64 = 0;

/// One journal line: `<timestamp> - <job id> - <message>`.
///
/// The timestamp is kept naive and local. Journal files are meant to be
/// readable and greppable by the owner, so lines carry wall-clock time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalEntry {
    pub written: NaiveDateTime,
    pub job: i64,
    pub message: String,
}

impl JournalEntry {
    pub fn new(written: NaiveDateTime, job: i64, message: impl Into<String>) -> Self {
        Self {
            written,
            job,
            message: message.into(),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.written.date()
    }

    pub fn to_line(&self) -> String {
        format!(
            "{} - {} - {}",
            self.written.format(LINE_TIME_FORMAT),
            self.job,
            self.message
        )
    }

    /// Parses a stored line. Only the first two separators are structural,
    /// so messages containing " - " survive a round-trip.
    pub fn parse(line: &str) -> Option<JournalEntry> {
        let mut parts = line.splitn(3, " - ");
        let written = NaiveDateTime::parse_from_str(parts.next()?, LINE_TIME_FORMAT).ok()?;
        let job = parts.next()?.trim().parse::<i64>().ok()?;
        let message = parts.next()?.trim_end();
        if message.is_empty() {
            return None;
        }
        Some(JournalEntry::new(written, job, message))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};

    use super::JournalEntry;

    fn moment() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 1, 4)
            .unwrap()
            .and_hms_opt(19, 8, 0)
            .unwrap()
    }

    #[test]
    fn test_line_round_trip() {
        let entry = JournalEntry::new(moment(), 11, "working on the importer");
        let line = entry.to_line();
        assert_eq!(line, "2023-01-04 19:08 - 11 - working on the importer");
        assert_eq!(JournalEntry::parse(&line), Some(entry));
    }

    #[test]
    fn test_message_with_separator_survives() {
        let entry = JournalEntry::new(moment(), 3, "meeting - retro - notes");
        let parsed = JournalEntry::parse(&entry.to_line()).unwrap();
        assert_eq!(parsed.message, "meeting - retro - notes");
        assert_eq!(parsed.job, 3);
    }

    #[test]
    fn test_garbage_lines_are_rejected() {
        assert_eq!(JournalEntry::parse(""), None);
        assert_eq!(JournalEntry::parse("not a line"), None);
        assert_eq!(JournalEntry::parse("2023-01-04 19:08 - eleven - hi"), None);
        assert_eq!(JournalEntry::parse("2023-01-04 - 11 - missing time"), None);
        assert_eq!(JournalEntry::parse("2023-01-04 19:08 - 11 - "), None);
    }

    #[test]
    fn test_no_job_round_trip() {
        let entry = JournalEntry::new(moment(), super::NO_JOB, "untracked thought");
        let parsed = JournalEntry::parse(&entry.to_line()).unwrap();
        assert_eq!(parsed.job, super::NO_JOB);
    }
}
