//! Property tests for the document store and the shelf mutations.

use proptest::prelude::*;
use reading_nest_core::storage::{Database, Document, DocumentStore, MemoryStore};
use reading_nest_core::{Book, BookStatus, Nest, Session};
use std::collections::HashMap;

fn status() -> impl Strategy<Value = BookStatus> {
    prop_oneof![
        Just(BookStatus::Reading),
        Just(BookStatus::ToRead),
        Just(BookStatus::Finished),
    ]
}

fn book() -> impl Strategy<Value = Book> {
    (
        "[a-z0-9]{1,8}",
        "\\PC{1,24}",
        proptest::option::of("\\PC{0,16}"),
        proptest::option::of(1u32..2000),
        status(),
        proptest::option::of("[ -~]{0,40}"),
        0i64..2_000_000_000_000,
    )
        .prop_map(|(id, title, author, pages, status, notes, updated_at)| Book {
            id,
            title,
            author,
            pages,
            status,
            notes,
            updated_at,
        })
}

fn session() -> impl Strategy<Value = Session> {
    (
        "[a-f0-9]{8}",
        0i64..2_000_000_000_000,
        "[a-z0-9]{1,8}",
        0u32..600,
        proptest::option::of(0u32..500),
        proptest::option::of("[a-z ]{1,12}"),
    )
        .prop_map(|(id, at, book_id, minutes, pages_read, mood_after)| Session {
            id,
            at,
            book_id,
            minutes,
            pages_read,
            mood_after,
        })
}

fn document() -> impl Strategy<Value = Document> {
    (
        proptest::collection::vec(book(), 0..6),
        proptest::collection::vec(session(), 0..10),
        proptest::option::of("[a-z0-9]{1,8}"),
        proptest::option::of("[ -~]{1,60}"),
        5u32..=180,
    )
        .prop_map(|(books, sessions, now_id, prompt, timer_minutes)| Document {
            books,
            sessions,
            now_id,
            prompt,
            timer_minutes,
        })
}

proptest! {
    #[test]
    fn save_then_load_is_identity(doc in document()) {
        let store = MemoryStore::new();
        store.save(&doc).unwrap();
        prop_assert_eq!(store.load(20).unwrap(), doc);
    }

    #[test]
    fn sqlite_slot_round_trips(doc in document()) {
        let db = Database::open_memory().unwrap();
        db.save(&doc).unwrap();
        prop_assert_eq!(db.load(20).unwrap(), doc);
    }

    #[test]
    fn upserts_keep_one_book_per_id_with_latest_content(
        books in proptest::collection::vec(book(), 1..20)
    ) {
        let mut nest = Nest::open(MemoryStore::new(), 20).unwrap();
        let mut latest: HashMap<String, Book> = HashMap::new();
        for b in &books {
            nest.upsert_book(b.clone()).unwrap_or_else(|e| {
                // Titles made only of whitespace are rejected.
                assert!(b.title.trim().is_empty(), "unexpected error: {e}");
            });
            if !b.title.trim().is_empty() {
                latest.insert(b.id.clone(), b.clone());
            }
        }
        prop_assert_eq!(nest.books().len(), latest.len());
        for b in nest.books() {
            prop_assert_eq!(Some(b), latest.get(&b.id));
        }
    }

    #[test]
    fn delete_removes_exactly_that_books_sessions(doc in document(), pick in 0usize..6) {
        let store = MemoryStore::new();
        store.save(&doc).unwrap();
        let mut nest = Nest::open(store, 20).unwrap();
        let Some(victim) = doc.books.get(pick).map(|b| b.id.clone()) else {
            return Ok(());
        };

        // Opening may have adopted a reading book as the active one.
        let active = nest.now_id().map(str::to_string);
        prop_assert!(doc.now_id.is_none() || active == doc.now_id);

        nest.delete_book(&victim).unwrap();
        let expected: Vec<&Session> =
            doc.sessions.iter().filter(|s| s.book_id != victim).collect();
        let actual: Vec<&Session> = nest.sessions().iter().collect();
        prop_assert_eq!(actual, expected);
        let before = doc.books.iter().filter(|b| b.id == victim).count();
        let after = nest.books().iter().filter(|b| b.id == victim).count();
        prop_assert_eq!(after, before - 1);
        if active.as_deref() == Some(victim.as_str()) {
            prop_assert_eq!(nest.now_id(), None);
        } else {
            prop_assert_eq!(nest.now_id(), active.as_deref());
        }
    }

    #[test]
    fn load_never_fails_on_garbage(raw in "\\PC{0,200}") {
        let store = MemoryStore::with_blob(raw);
        let doc = store.load(20).unwrap();
        prop_assert!((5..=180).contains(&doc.timer_minutes));
    }
}
