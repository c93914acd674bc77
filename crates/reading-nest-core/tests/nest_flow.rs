//! End-to-end flow over a real SQLite file: shelf, timer, log, export,
//! import into a fresh database, share, card.

use chrono::Utc;
use reading_nest_core::card::{self, CardContent};
use reading_nest_core::export::{sessions_csv, Backup};
use reading_nest_core::storage::{CardConfig, Database, DocumentStore};
use reading_nest_core::timer::ManualClock;
use reading_nest_core::{Book, BookStatus, Clock, Nest, Snapshot, SnapshotView, TimerState};
use std::sync::Arc;
use tempfile::TempDir;

const START_MS: i64 = 1_717_236_000_000; // 2024-06-01T10:00:00Z

fn open(dir: &TempDir, name: &str, clock: &ManualClock) -> Nest<Database> {
    let db = Database::open_at(&dir.path().join(name)).unwrap();
    Nest::open_with_clock(db, 20, Arc::new(clock.clone())).unwrap()
}

#[test]
fn a_reading_afternoon() {
    let dir = TempDir::new().unwrap();
    let clock = ManualClock::at_ms(START_MS);
    let mut nest = open(&dir, "nest.db", &clock);

    let mut book = Book::new("b-walden", "Walden", BookStatus::Reading);
    book.author = Some("Henry David Thoreau".into());
    book.pages = Some(352);
    nest.upsert_book(book).unwrap();
    nest.upsert_book(Book::new("b-emma", "Emma, Volume \"One\"", BookStatus::ToRead))
        .unwrap();
    assert_eq!(nest.active_book().map(|b| b.id.as_str()), Some("b-walden"));

    // 10-minute session, paused halfway, then run out.
    nest.configure_timer(10).unwrap();
    nest.timer_mut().start();
    clock.advance_secs(300.0);
    nest.timer_mut().pause();
    assert_eq!(nest.timer().left_sec(), 300);
    clock.advance_secs(3600.0);
    nest.timer_mut().start();
    clock.advance_secs(299.6);
    assert!(nest.timer_mut().tick().is_some());
    assert_eq!(nest.timer().state(), TimerState::Expired);

    let first = nest.log_session(Some(14), Some("calm".into())).unwrap();
    assert_eq!(first.minutes, 10);

    nest.set_active_book(Some("b-emma")).unwrap();
    clock.advance_ms(60_000);
    nest.log_session(None, None).unwrap();

    let now = clock.now();
    let stats = nest.stats_at(&now);
    assert_eq!(stats.session_count, 2);
    assert_eq!(stats.minutes_today, 20);

    // CSV is oldest first and quotes the awkward title.
    let csv = sessions_csv(nest.books(), nest.sessions(), &Utc).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].contains(",b-walden,Walden,Henry David Thoreau,10,14,calm"));
    assert!(lines[2].contains(",b-emma,\"Emma, Volume \"\"One\"\"\",,10,,"));

    // Everything persisted: reopening the same file sees the same document.
    let reopened = open(&dir, "nest.db", &clock);
    assert_eq!(reopened.document(), nest.document());

    // Backup into a fresh database.
    let raw = nest.export_backup().to_pretty_json().unwrap();
    let mut other = open(&dir, "other.db", &clock);
    let summary = other.import_backup(&raw).unwrap();
    assert_eq!((summary.books, summary.sessions), (2, 2));
    assert_eq!(other.document(), nest.document());
    assert_eq!(other.timer().total_sec(), 600);

    // Share link opens read-only and renders a card.
    let link = Snapshot::capture(&nest)
        .to_link("https://sloth-reading-nest.local/")
        .unwrap();
    let view = SnapshotView::open(&link).unwrap();
    assert_eq!(view.title(), "Emma, Volume \"One\"");
    assert!(view.chips().contains(&"status: to-read".to_string()));

    let options = CardConfig {
        include_stats: true,
        include_prompt: true,
    };
    let content = CardContent::compose(view.snapshot(), None, &options);
    let png = card::render_png(&content).unwrap();
    let decoded = image::load_from_memory(&png).unwrap();
    assert_eq!(decoded.width(), card::WIDTH);
}

#[test]
fn corrupt_slot_starts_fresh_and_heals_on_next_write() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nest.db");
    {
        let db = Database::open_at(&path).unwrap();
        db.write_blob("{ not json").unwrap();
    }
    let clock = ManualClock::at_ms(START_MS);
    let mut nest = open(&dir, "nest.db", &clock);
    assert!(nest.books().is_empty());
    assert_eq!(nest.document().timer_minutes, 20);

    nest.upsert_book(Book::new("b1", "Kindred", BookStatus::Reading)).unwrap();
    let db = Database::open_at(&path).unwrap();
    let raw = db.read_blob().unwrap().unwrap();
    let backup = Backup::new(db.load(20).unwrap(), 0);
    assert!(raw.contains("Kindred"));
    assert_eq!(backup.data.books.len(), 1);
}
