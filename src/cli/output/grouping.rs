use std::collections::HashMap;

use crate::{
    db::models::{Job, LogRecord, LogTask},
    journal::entities::JournalEntry,
};

/// Anything that can be bucketed under a job.
pub trait JobScoped {
    fn job_id(&self) -> i64;
}

impl JobScoped for JournalEntry {
    fn job_id(&self) -> i64 {
        self.job
    }
}

impl JobScoped for LogRecord {
    fn job_id(&self) -> i64 {
        self.job_id
    }
}

impl JobScoped for LogTask {
    fn job_id(&self) -> i64 {
        self.job_id
    }
}

/// Buckets items by job id. Groups come back sorted by numeric id ascending,
/// items inside a group keep their input order.
pub fn group_by_job<T: JobScoped>(items: Vec<T>) -> Vec<(i64, Vec<T>)> {
    let mut map = HashMap::<i64, Vec<T>>::new();
    for item in items {
        map.entry(item.job_id()).or_default().push(item);
    }

    let mut groups = map.into_iter().collect::<Vec<_>>();
    groups.sort_by_key(|(id, _)| *id);
    groups
}

/// Buckets jobs by owning project, project ids ascending. Jobs without a
/// project land in a trailing `None` group.
pub fn group_jobs_by_project(jobs: Vec<Job>) -> Vec<(Option<i64>, Vec<Job>)> {
    let mut map = HashMap::<Option<i64>, Vec<Job>>::new();
    for job in jobs {
        map.entry(job.project_id).or_default().push(job);
    }

    let mut groups = map.into_iter().collect::<Vec<_>>();
    groups.sort_by_key(|(project, _)| match project {
        Some(id) => (false, *id),
        None => (true, 0),
    });
    groups
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::{
        db::models::{Colour, Job},
        journal::entities::JournalEntry,
    };

    use super::{group_by_job, group_jobs_by_project};

    fn entry(job: i64, message: &str) -> JournalEntry {
        JournalEntry::new(
            NaiveDate::from_ymd_opt(2025, 3, 15)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            job,
            message,
        )
    }

    fn job(id: i64, project: Option<i64>) -> Job {
        Job {
            id,
            project_id: project,
            title: None,
            uri: None,
            colour: Colour::from_name("x"),
            alive: true,
            created: chrono::Utc::now(),
            updated: None,
        }
    }

    #[test]
    fn test_groups_sort_by_job_id() {
        let groups = group_by_job(vec![
            entry(11, "first for 11"),
            entry(4, "billing"),
            entry(11, "second for 11"),
            entry(0, "untracked"),
        ]);

        let keys: Vec<i64> = groups.iter().map(|(id, _)| *id).collect();
        assert_eq!(keys, vec![0, 4, 11]);

        let eleven = &groups[2].1;
        assert_eq!(eleven.len(), 2);
        assert_eq!(eleven[0].message, "first for 11");
        assert_eq!(eleven[1].message, "second for 11");
    }

    #[test]
    fn test_projectless_jobs_come_last() {
        let groups = group_jobs_by_project(vec![
            job(1, None),
            job(2, Some(7)),
            job(3, Some(2)),
            job(4, Some(7)),
        ]);

        let keys: Vec<Option<i64>> = groups.iter().map(|(project, _)| *project).collect();
        assert_eq!(keys, vec![Some(2), Some(7), None]);
        assert_eq!(groups[1].1.len(), 2);
    }
}
