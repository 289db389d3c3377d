use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, Utc};

/// Format of the timestamp leading every journal line.
pub const LINE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// This is the standard way of converting a date to a string in daybook.
/// Journal lines start with it, which is what makes date-prefix filtering work.
pub fn date_prefix(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Directory name for a backup run.
pub fn backup_stamp(moment: NaiveDateTime) -> String {
    moment.format("%Y-%m-%d_%H%M%S").to_string()
}

/// Same calendar day `back` years earlier. Returns None for days that don't
/// exist in the target year (Feb 29).
pub fn same_day_years_back(date: NaiveDate, back: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(date.year() - back, date.month(), date.day())
}

/// The UTC instants a local calendar day starts and ends at. None only for
/// days made invalid by timezone transitions.
pub fn local_day_bounds(date: NaiveDate) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = date
        .and_time(NaiveTime::MIN)
        .and_local_timezone(Local)
        .earliest()?;
    let end = (date + Duration::days(1))
        .and_time(NaiveTime::MIN)
        .and_local_timezone(Local)
        .earliest()?;
    Some((start.with_timezone(&Utc), end.with_timezone(&Utc)))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{date_prefix, same_day_years_back};

    #[test]
    fn test_date_prefix_zero_pads() {
        let date = NaiveDate::from_ymd_opt(2023, 1, 4).unwrap();
        assert_eq!(date_prefix(date), "2023-01-04");
    }

    #[test]
    fn test_same_day_years_back() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        assert_eq!(
            same_day_years_back(date, 2),
            NaiveDate::from_ymd_opt(2023, 3, 15)
        );
    }

    #[test]
    fn test_same_day_years_back_leap_day() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(same_day_years_back(date, 1), None);
        assert_eq!(
            same_day_years_back(date, 4),
            NaiveDate::from_ymd_opt(2020, 2, 29)
        );
    }
}
