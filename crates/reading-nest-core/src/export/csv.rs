//! Session history as CSV, oldest first, for spreadsheets.

use chrono::{SecondsFormat, TimeZone};
use std::collections::HashMap;
use std::fmt::Display;
use std::io::Write;

use crate::error::{CoreError, Result};
use crate::shelf::{Book, Session};

pub const CSV_HEADER: [&str; 8] = [
    "at_iso",
    "at_local",
    "book_id",
    "book_title",
    "book_author",
    "minutes",
    "pages_read",
    "mood_after",
];

/// Write the sessions (stored newest-first) as CSV in chronological order.
///
/// Fields are quoted only when they contain a comma, quote, CR or LF; every
/// record, the last included, ends in `\n`.
pub fn write_sessions_csv<W, Tz>(
    writer: W,
    books: &[Book],
    sessions: &[Session],
    tz: &Tz,
) -> Result<W>
where
    W: Write,
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let by_id: HashMap<&str, &Book> = books.iter().map(|b| (b.id.as_str(), b)).collect();
    let mut out = ::csv::WriterBuilder::new()
        .terminator(::csv::Terminator::Any(b'\n'))
        .quote_style(::csv::QuoteStyle::Necessary)
        .from_writer(writer);

    out.write_record(CSV_HEADER)?;
    for s in sessions.iter().rev() {
        let book = by_id.get(s.book_id.as_str());
        let at = s.at_utc();
        out.write_record([
            at.to_rfc3339_opts(SecondsFormat::Millis, true),
            s.at_in(tz).format("%Y-%m-%d %H:%M:%S").to_string(),
            s.book_id.clone(),
            book.map(|b| b.title.clone()).unwrap_or_default(),
            book.and_then(|b| b.author.clone()).unwrap_or_default(),
            s.minutes.to_string(),
            s.pages_read.map(|p| p.to_string()).unwrap_or_default(),
            s.mood_after.clone().unwrap_or_default(),
        ])?;
    }
    out.flush()?;
    out.into_inner()
        .map_err(|e| CoreError::Io(e.into_error()))
}

/// Same as [`write_sessions_csv`], collected into a string.
pub fn sessions_csv<Tz>(books: &[Book], sessions: &[Session], tz: &Tz) -> Result<String>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let bytes = write_sessions_csv(Vec::new(), books, sessions, tz)?;
    String::from_utf8(bytes).map_err(|e| CoreError::Custom(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shelf::BookStatus;
    use chrono::Utc;

    const HEADER: &str =
        "at_iso,at_local,book_id,book_title,book_author,minutes,pages_read,mood_after\n";

    fn session(id: &str, at: i64, book_id: &str, minutes: u32) -> Session {
        Session {
            id: id.into(),
            at,
            book_id: book_id.into(),
            minutes,
            pages_read: None,
            mood_after: None,
        }
    }

    #[test]
    fn empty_history_is_header_only() {
        let csv = sessions_csv(&[], &[], &Utc).unwrap();
        assert_eq!(csv, HEADER);
    }

    #[test]
    fn rows_are_oldest_first() {
        let mut book = Book::new("b1", "Emma", BookStatus::Reading);
        book.author = Some("Austen".into());
        let mut newer = session("s2", 1_700_000_060_000, "b1", 25);
        newer.pages_read = Some(12);
        newer.mood_after = Some("cozy".into());
        let older = session("s1", 1_700_000_000_000, "b1", 20);

        let csv = sessions_csv(&[book], &[newer, older], &Utc).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[1],
            "2023-11-14T22:13:20.000Z,2023-11-14 22:13:20,b1,Emma,Austen,20,,"
        );
        assert_eq!(
            lines[2],
            "2023-11-14T22:14:20.000Z,2023-11-14 22:14:20,b1,Emma,Austen,25,12,cozy"
        );
        assert!(csv.ends_with('\n'));
    }

    #[test]
    fn special_characters_are_quoted() {
        let mut book = Book::new("b1", "Eats, Shoots \"and\" Leaves", BookStatus::Finished);
        book.author = Some("Truss".into());
        let mut s = session("s1", 0, "b1", 5);
        s.mood_after = Some("line one\nline two".into());

        let csv = sessions_csv(&[book], &[s], &Utc).unwrap();
        assert!(csv.contains(",\"Eats, Shoots \"\"and\"\" Leaves\",Truss,"));
        assert!(csv.contains(",\"line one\nline two\"\n"));
    }

    #[test]
    fn deleted_book_leaves_blank_title() {
        let csv = sessions_csv(&[], &[session("s1", 0, "gone", 5)], &Utc).unwrap();
        assert!(csv.ends_with(",gone,,,5,,\n"));
    }
}
