//! The reading nest: shelf, session history, prompt, and timer in one owner.
//!
//! [`Nest`] is the only way to change the document. Each mutating method
//! builds the next document, persists it, and only then swaps it in, so a
//! failed write leaves both memory and storage at the previous state.

use chrono::{DateTime, Local, NaiveDate, TimeZone};
use std::sync::Arc;

use crate::error::{PreconditionError, Result, ValidationError};
use crate::events::Event;
use crate::export::{parse_backup, Backup};
use crate::prompt::{daily_prompt, random_prompt};
use crate::shelf::{Book, BookStatus, Session};
use crate::stats::ReadingStats;
use crate::storage::{Document, DocumentStore};
use crate::timer::{Clock, SystemClock, TimerEngine};

/// What an import replaced the nest with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub books: usize,
    pub sessions: usize,
}

pub struct Nest<S: DocumentStore> {
    store: S,
    doc: Document,
    timer: TimerEngine,
    clock: Arc<dyn Clock>,
}

impl<S: DocumentStore> Nest<S> {
    /// Load the stored document on the system clock.
    pub fn open(store: S, default_minutes: u32) -> Result<Self> {
        Self::open_with_clock(store, default_minutes, Arc::new(SystemClock))
    }

    pub fn open_with_clock(store: S, default_minutes: u32, clock: Arc<dyn Clock>) -> Result<Self> {
        let mut doc = store.load(default_minutes)?;
        // Held in memory only; the next mutation persists it.
        if doc.adopt_first_reading() {
            tracing::debug!(book = ?doc.now_id, "no active book; picked the first one being read");
        }
        let timer = TimerEngine::with_clock(doc.timer_minutes, clock.clone());
        Ok(Self {
            store,
            doc,
            timer,
            clock,
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn books(&self) -> &[Book] {
        &self.doc.books
    }

    /// Newest first.
    pub fn sessions(&self) -> &[Session] {
        &self.doc.sessions
    }

    pub fn now_id(&self) -> Option<&str> {
        self.doc.now_id.as_deref()
    }

    pub fn prompt(&self) -> Option<&str> {
        self.doc.prompt.as_deref()
    }

    pub fn book(&self, id: &str) -> Option<&Book> {
        self.doc.book(id)
    }

    pub fn active_book(&self) -> Option<&Book> {
        self.doc.active_book()
    }

    /// Latest sessions for one book, newest first.
    pub fn recent_sessions(&self, book_id: &str, limit: usize) -> Vec<&Session> {
        self.doc
            .sessions
            .iter()
            .filter(|s| s.book_id == book_id)
            .take(limit)
            .collect()
    }

    pub fn timer(&self) -> &TimerEngine {
        &self.timer
    }

    /// Start/pause/tick only touch the timer sub-state and are not persisted
    /// with the document.
    pub fn timer_mut(&mut self) -> &mut TimerEngine {
        &mut self.timer
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// The clock's current instant in the local zone.
    pub fn now_local(&self) -> DateTime<Local> {
        self.clock.now().with_timezone(&Local)
    }

    pub fn today(&self) -> NaiveDate {
        self.now_local().date_naive()
    }

    pub fn stats(&self) -> ReadingStats {
        self.stats_at(&self.now_local())
    }

    pub fn stats_at<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> ReadingStats {
        ReadingStats::compute(&self.doc.sessions, now)
    }

    pub fn export_backup(&self) -> Backup {
        Backup::new(self.doc.clone(), self.clock.now_ms())
    }

    /// Adopt a previously persisted timer run if it belongs to the current
    /// session length. Returns whether it was adopted.
    pub fn restore_timer(&mut self, engine: TimerEngine) -> bool {
        let mut engine = engine.normalized();
        if engine.minutes() != self.doc.timer_minutes {
            tracing::debug!("discarding timer state for a different session length");
            return false;
        }
        engine.set_clock(self.clock.clone());
        self.timer = engine;
        true
    }

    // ── Mutations ────────────────────────────────────────────────────

    fn commit(&mut self, next: Document) -> Result<()> {
        self.store.save(&next)?;
        self.doc = next;
        Ok(())
    }

    /// Insert a new book at the front, or replace the one with the same id
    /// in place. A "reading" book becomes active if none is.
    pub fn upsert_book(&mut self, book: Book) -> Result<()> {
        if book.id.trim().is_empty() {
            return Err(ValidationError::EmptyField("id").into());
        }
        if book.title.trim().is_empty() {
            return Err(ValidationError::EmptyField("title").into());
        }

        let mut next = self.doc.clone();
        if next.now_id.is_none() && book.status == BookStatus::Reading {
            next.now_id = Some(book.id.clone());
        }
        match next.books.iter_mut().find(|b| b.id == book.id) {
            Some(slot) => *slot = book,
            None => next.books.insert(0, book),
        }
        self.commit(next)
    }

    /// Remove a book and every session logged against it.
    pub fn delete_book(&mut self, id: &str) -> Result<Option<Book>> {
        let mut next = self.doc.clone();
        let Some(pos) = next.books.iter().position(|b| b.id == id) else {
            return Ok(None);
        };
        let removed = next.books.remove(pos);
        let before = next.sessions.len();
        next.sessions.retain(|s| s.book_id != id);
        if next.now_id.as_deref() == Some(id) {
            next.now_id = None;
        }
        tracing::info!(
            book = id,
            sessions_removed = before - next.sessions.len(),
            "deleted book"
        );
        self.commit(next)?;
        Ok(Some(removed))
    }

    /// Point "now reading" at `id`. Unknown ids are accepted and simply
    /// resolve to no active book.
    pub fn set_active_book(&mut self, id: Option<&str>) -> Result<()> {
        let mut next = self.doc.clone();
        next.now_id = id.filter(|id| !id.is_empty()).map(str::to_string);
        self.commit(next)
    }

    pub fn mark_finished(&mut self, id: &str) -> Result<()> {
        let Some(mut book) = self.book(id).cloned() else {
            return Err(PreconditionError::UnknownBook(id.to_string()).into());
        };
        book.status = BookStatus::Finished;
        book.updated_at = self.clock.now_ms();
        self.upsert_book(book)
    }

    /// Log a session for the active book.
    ///
    /// Minutes are the configured timer length, not the time actually run.
    pub fn log_session(
        &mut self,
        pages_read: Option<u32>,
        mood_after: Option<String>,
    ) -> Result<Session> {
        let book_id = self
            .active_book()
            .map(|b| b.id.clone())
            .ok_or(PreconditionError::NoActiveBook)?;

        let session = Session {
            id: uuid::Uuid::new_v4().to_string(),
            at: self.clock.now_ms(),
            book_id,
            minutes: self.timer.minutes(),
            pages_read,
            mood_after: mood_after.filter(|m| !m.trim().is_empty()),
        };
        let mut next = self.doc.clone();
        next.sessions.insert(0, session.clone());
        self.commit(next)?;
        tracing::info!(book = %session.book_id, minutes = session.minutes, "session logged");
        Ok(session)
    }

    /// Delete the whole session history. Confirmation is the caller's job.
    pub fn clear_sessions(&mut self) -> Result<usize> {
        let mut next = self.doc.clone();
        let cleared = next.sessions.len();
        next.sessions.clear();
        self.commit(next)?;
        Ok(cleared)
    }

    /// Change the session length; the timer is hard-reset.
    pub fn configure_timer(&mut self, minutes: u32) -> Result<Event> {
        let mut next = self.doc.clone();
        next.timer_minutes = crate::timer::clamp_minutes(minutes);
        self.commit(next)?;
        Ok(self.timer.configure(minutes))
    }

    pub fn reset_timer(&mut self) -> Result<Event> {
        self.commit(self.doc.clone())?;
        Ok(self.timer.reset())
    }

    /// Fill in the day's prompt if none is cached.
    pub fn ensure_prompt(&mut self, today: NaiveDate) -> Result<String> {
        if let Some(prompt) = &self.doc.prompt {
            return Ok(prompt.clone());
        }
        self.new_prompt(false, today)
    }

    /// Replace the prompt: the seeded daily one, or a random one if `fresh`.
    pub fn new_prompt(&mut self, fresh: bool, today: NaiveDate) -> Result<String> {
        let prompt = if fresh {
            random_prompt()
        } else {
            daily_prompt(today)
        };
        let mut next = self.doc.clone();
        next.prompt = Some(prompt.to_string());
        self.commit(next)?;
        Ok(prompt.to_string())
    }

    /// Replace everything with the contents of a backup file.
    ///
    /// Nothing changes unless the file validates and the write succeeds.
    pub fn import_backup(&mut self, raw: &str) -> Result<ImportSummary> {
        let mut next = parse_backup(raw, self.doc.timer_minutes)?;
        next.adopt_first_reading();
        let minutes = next.timer_minutes;
        let summary = ImportSummary {
            books: next.books.len(),
            sessions: next.sessions.len(),
        };
        self.commit(next)?;
        if self.timer.minutes() != minutes {
            self.timer.configure(minutes);
        }
        tracing::info!(books = summary.books, sessions = summary.sessions, "imported backup");
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::storage::MemoryStore;
    use crate::timer::ManualClock;

    const T0: i64 = 1_700_000_000_000;

    fn nest() -> (Nest<MemoryStore>, ManualClock) {
        let clock = ManualClock::at_ms(T0);
        let nest = Nest::open_with_clock(MemoryStore::new(), 20, Arc::new(clock.clone())).unwrap();
        (nest, clock)
    }

    fn book(id: &str, status: BookStatus) -> Book {
        Book::new(id, format!("Title {id}"), status)
    }

    fn stored(nest: &Nest<MemoryStore>) -> Document {
        nest.store().load(20).unwrap()
    }

    #[test]
    fn upsert_inserts_at_front_and_replaces_in_place() {
        let (mut nest, _) = nest();
        nest.upsert_book(book("a", BookStatus::ToRead)).unwrap();
        nest.upsert_book(book("b", BookStatus::ToRead)).unwrap();
        nest.upsert_book(book("c", BookStatus::ToRead)).unwrap();
        let ids: Vec<_> = nest.books().iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);

        let mut edited = book("b", BookStatus::Finished);
        edited.title = "Renamed".into();
        nest.upsert_book(edited).unwrap();
        let ids: Vec<_> = nest.books().iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
        assert_eq!(nest.book("b").unwrap().title, "Renamed");
        assert_eq!(stored(&nest), *nest.document());
    }

    #[test]
    fn first_reading_book_becomes_active() {
        let (mut nest, _) = nest();
        nest.upsert_book(book("a", BookStatus::ToRead)).unwrap();
        assert_eq!(nest.now_id(), None);
        nest.upsert_book(book("b", BookStatus::Reading)).unwrap();
        assert_eq!(nest.now_id(), Some("b"));
        nest.upsert_book(book("c", BookStatus::Reading)).unwrap();
        assert_eq!(nest.now_id(), Some("b"));
    }

    #[test]
    fn open_picks_first_reading_book_when_none_is_active() {
        let mut doc = Document::empty(20);
        doc.books = vec![
            book("a", BookStatus::Finished),
            book("b", BookStatus::Reading),
        ];
        let store = MemoryStore::new();
        store.save(&doc).unwrap();

        let mut nest = Nest::open(store, 20).unwrap();
        assert_eq!(nest.now_id(), Some("b"));
        assert_eq!(nest.store().load(20).unwrap().now_id, None);

        let session = nest.log_session(None, None).unwrap();
        assert_eq!(session.book_id, "b");
        assert_eq!(stored(&nest).now_id.as_deref(), Some("b"));
    }

    #[test]
    fn import_without_active_book_picks_first_reading() {
        let (mut nest, _) = nest();
        let raw = r#"{"app": "sloth-reading-nest", "version": 1, "data": {
            "books": [{"id": "x", "title": "Kindred", "status": "reading"}],
            "nowId": null
        }}"#;
        nest.import_backup(raw).unwrap();
        assert_eq!(nest.now_id(), Some("x"));
        assert_eq!(stored(&nest).now_id.as_deref(), Some("x"));
    }

    #[test]
    fn upsert_rejects_missing_id_or_title() {
        let (mut nest, _) = nest();
        let err = nest.upsert_book(Book::new("", "T", BookStatus::Reading)).unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::EmptyField("id"))));
        let err = nest.upsert_book(Book::new("x", "  ", BookStatus::Reading)).unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::EmptyField("title"))));
        assert!(nest.books().is_empty());
        assert!(nest.store().blob().is_none());
    }

    #[test]
    fn delete_cascades_sessions_and_clears_active() {
        let (mut nest, clock) = nest();
        nest.upsert_book(book("a", BookStatus::Reading)).unwrap();
        nest.upsert_book(book("b", BookStatus::ToRead)).unwrap();
        nest.log_session(Some(10), None).unwrap();
        nest.set_active_book(Some("b")).unwrap();
        clock.advance_ms(1_000);
        let kept = nest.log_session(None, Some("calm".into())).unwrap();
        nest.set_active_book(Some("a")).unwrap();
        nest.log_session(None, None).unwrap();

        let removed = nest.delete_book("a").unwrap();
        assert_eq!(removed.map(|b| b.id), Some("a".to_string()));
        assert_eq!(nest.sessions(), &[kept]);
        assert_eq!(nest.now_id(), None);
        assert_eq!(stored(&nest), *nest.document());
    }

    #[test]
    fn delete_unknown_book_is_a_noop() {
        let (mut nest, _) = nest();
        nest.upsert_book(book("a", BookStatus::Reading)).unwrap();
        assert!(nest.delete_book("zzz").unwrap().is_none());
        assert_eq!(nest.books().len(), 1);
        assert_eq!(nest.now_id(), Some("a"));
    }

    #[test]
    fn unknown_active_id_resolves_to_nothing() {
        let (mut nest, _) = nest();
        nest.set_active_book(Some("ghost")).unwrap();
        assert_eq!(nest.now_id(), Some("ghost"));
        assert!(nest.active_book().is_none());
        let err = nest.log_session(None, None).unwrap_err();
        assert!(matches!(err, CoreError::Precondition(PreconditionError::NoActiveBook)));
    }

    #[test]
    fn log_without_active_book_appends_nothing() {
        let (mut nest, _) = nest();
        let err = nest.log_session(Some(3), None).unwrap_err();
        assert!(matches!(err, CoreError::Precondition(PreconditionError::NoActiveBook)));
        assert!(nest.sessions().is_empty());
        assert!(nest.store().blob().is_none());
    }

    #[test]
    fn log_records_configured_minutes_not_elapsed() {
        let (mut nest, clock) = nest();
        nest.upsert_book(book("a", BookStatus::Reading)).unwrap();
        nest.configure_timer(20).unwrap();
        nest.timer_mut().start();
        clock.advance_secs(95.0);
        nest.timer_mut().pause();
        assert_eq!(nest.timer().left_sec(), 1105);

        let session = nest.log_session(Some(4), Some("sleepy".into())).unwrap();
        assert_eq!(session.minutes, 20);
        assert_eq!(session.book_id, "a");
        assert_eq!(session.at, T0 + 95_000);
        assert_eq!(session.pages_read, Some(4));
        assert_eq!(nest.sessions()[0], session);
    }

    #[test]
    fn sessions_are_newest_first() {
        let (mut nest, clock) = nest();
        nest.upsert_book(book("a", BookStatus::Reading)).unwrap();
        let first = nest.log_session(None, None).unwrap();
        clock.advance_ms(10);
        let second = nest.log_session(None, None).unwrap();
        assert_eq!(nest.sessions(), &[second, first]);
        assert_eq!(nest.recent_sessions("a", 1).len(), 1);
    }

    #[test]
    fn blank_mood_is_dropped() {
        let (mut nest, _) = nest();
        nest.upsert_book(book("a", BookStatus::Reading)).unwrap();
        let s = nest.log_session(None, Some("   ".into())).unwrap();
        assert_eq!(s.mood_after, None);
    }

    #[test]
    fn clear_sessions_keeps_books() {
        let (mut nest, _) = nest();
        nest.upsert_book(book("a", BookStatus::Reading)).unwrap();
        nest.log_session(None, None).unwrap();
        nest.log_session(None, None).unwrap();
        assert_eq!(nest.clear_sessions().unwrap(), 2);
        assert!(nest.sessions().is_empty());
        assert_eq!(nest.books().len(), 1);
        assert!(stored(&nest).sessions.is_empty());
    }

    #[test]
    fn configure_timer_persists_minutes() {
        let (mut nest, _) = nest();
        nest.configure_timer(400).unwrap();
        assert_eq!(nest.timer().total_sec(), 10_800);
        assert_eq!(stored(&nest).timer_minutes, 180);
    }

    #[test]
    fn failed_write_changes_nothing() {
        let (mut nest, _) = nest();
        nest.upsert_book(book("a", BookStatus::Reading)).unwrap();
        let before = nest.document().clone();
        nest.store().refuse_writes(true);

        assert!(nest.upsert_book(book("b", BookStatus::Reading)).is_err());
        assert!(nest.delete_book("a").is_err());
        assert!(nest.log_session(None, None).is_err());
        assert!(nest.configure_timer(60).is_err());
        assert_eq!(*nest.document(), before);
        assert_eq!(nest.timer().total_sec(), 1200);
    }

    #[test]
    fn mark_finished_updates_status_and_timestamp() {
        let (mut nest, clock) = nest();
        nest.upsert_book(book("a", BookStatus::Reading)).unwrap();
        clock.advance_ms(5_000);
        nest.mark_finished("a").unwrap();
        let b = nest.book("a").unwrap();
        assert_eq!(b.status, BookStatus::Finished);
        assert_eq!(b.updated_at, T0 + 5_000);
        assert!(matches!(
            nest.mark_finished("nope"),
            Err(CoreError::Precondition(PreconditionError::UnknownBook(_)))
        ));
    }

    #[test]
    fn prompt_is_daily_unless_fresh() {
        let (mut nest, _) = nest();
        let day = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let p = nest.ensure_prompt(day).unwrap();
        assert_eq!(p, daily_prompt(day));
        assert_eq!(nest.ensure_prompt(day).unwrap(), p);
        let fresh = nest.new_prompt(true, day).unwrap();
        assert_eq!(nest.prompt(), Some(fresh.as_str()));
        assert_eq!(stored(&nest).prompt, Some(fresh));
    }

    #[test]
    fn import_replaces_document() {
        let (mut nest, _) = nest();
        nest.upsert_book(book("old", BookStatus::Reading)).unwrap();

        let mut incoming = Document::empty(45);
        incoming.books.push(book("new", BookStatus::Reading));
        incoming.now_id = Some("new".into());
        let raw = Backup::new(incoming.clone(), T0).to_pretty_json().unwrap();

        let summary = nest.import_backup(&raw).unwrap();
        assert_eq!(summary, ImportSummary { books: 1, sessions: 0 });
        assert_eq!(*nest.document(), incoming);
        assert_eq!(nest.timer().total_sec(), 45 * 60);
        assert_eq!(stored(&nest), incoming);
    }

    #[test]
    fn rejected_import_leaves_everything() {
        let (mut nest, _) = nest();
        nest.upsert_book(book("a", BookStatus::Reading)).unwrap();
        let before = nest.document().clone();
        let blob_before = nest.store().blob();

        let err = nest
            .import_backup(r#"{"data": {"books": []}}"#)
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::NotAnExport)));
        assert_eq!(*nest.document(), before);
        assert_eq!(nest.store().blob(), blob_before);
    }

    #[test]
    fn restore_timer_only_for_matching_length() {
        let (mut nest, clock) = nest();
        let mut running = TimerEngine::with_clock(20, Arc::new(clock.clone()));
        running.start();
        clock.advance_secs(60.0);
        assert!(nest.restore_timer(running));
        nest.timer_mut().tick();
        assert_eq!(nest.timer().left_sec(), 1140);

        let other = TimerEngine::new(45);
        assert!(!nest.restore_timer(other));
        assert_eq!(nest.timer().total_sec(), 1200);
    }

    #[test]
    fn stats_use_the_session_history() {
        let (mut nest, _) = nest();
        nest.upsert_book(book("a", BookStatus::Reading)).unwrap();
        nest.log_session(None, None).unwrap();
        let now = nest.clock().now();
        let stats = nest.stats_at(&now);
        assert_eq!(stats.session_count, 1);
        assert_eq!(stats.minutes_last_7_days, 20);
    }
}
