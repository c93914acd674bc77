//! File exports: JSON backup, session CSV, and their file names.

mod backup;
mod csv;

pub use self::backup::{parse_backup, Backup, APP_ID, BACKUP_VERSION};
pub use self::csv::{sessions_csv, write_sessions_csv, CSV_HEADER};

use chrono::NaiveDate;

use crate::prompt::day_key;

pub fn backup_file_name(date: NaiveDate) -> String {
    format!("sloth-reading-nest-export-{}.json", day_key(date))
}

pub fn sessions_file_name(date: NaiveDate) -> String {
    format!("sloth-reading-nest-sessions-{}.csv", day_key(date))
}

pub fn card_file_name(date: NaiveDate) -> String {
    format!("sloth-reading-card-{}.png", day_key(date))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_carry_the_day() {
        let day = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        assert_eq!(backup_file_name(day), "sloth-reading-nest-export-2025-01-02.json");
        assert_eq!(sessions_file_name(day), "sloth-reading-nest-sessions-2025-01-02.csv");
        assert_eq!(card_file_name(day), "sloth-reading-card-2025-01-02.png");
    }
}
