//! # Deck Management Journey
//!
//! Import a catalog, search it, track questions, annotate them, pause and
//! resume them, reset one and drop another. The review queue must follow
//! every change.

use chrono::Duration;
use recode_core::{
    parse_catalog, CatalogEntry, LearningState, Pattern, QuestionDifficulty, Rating,
    ReviewSession, ReviewStore, Scheduler, StorageError,
};
use recode_e2e_tests::{TestClock, TestDataFactory, TestDatabaseManager};

#[test]
fn test_import_search_and_track() {
    let clock = TestClock::start();
    let mut db = TestDatabaseManager::new_temp();
    db.seed_catalog();
    assert_eq!(db.question_count(), TestDataFactory::sample_catalog_len());

    // Re-importing the same file adds nothing
    let entries = parse_catalog(&TestDataFactory::sample_catalog_json()).unwrap();
    let summary = db.storage.import_catalog(entries, clock.now()).unwrap();
    assert_eq!(summary.imported, 0);
    assert_eq!(summary.skipped, TestDataFactory::sample_catalog_len());

    let two_pointers = db.storage.search_questions("two pointers").unwrap();
    let names: Vec<&str> = two_pointers.iter().map(|q| q.name.as_str()).collect();
    assert_eq!(names, vec!["Valid Palindrome", "Trapping Rain Water"]);

    for q in &two_pointers {
        db.storage.track(&q.id, clock.now()).unwrap();
    }
    assert_eq!(db.tracked_count(), 2);
    assert_eq!(db.storage.deck_stats(clock.now()).unwrap().due, 2);
}

#[test]
fn test_pause_and_resume_control_the_queue() {
    let clock = TestClock::start();
    let mut db = TestDatabaseManager::new_temp();
    let ids = db.seed_tracked(3, clock.now());

    db.storage.set_suspended(&ids[1], true).unwrap();
    {
        let mut session = ReviewSession::new(&db.storage, Scheduler::default());
        assert_eq!(session.remaining(clock.now()).unwrap(), 2);
        while session.present(clock.now()).unwrap().is_some() {
            let presented = session.current().unwrap().item.question.id.clone();
            assert_ne!(presented, ids[1]);
            session.answer(Rating::Good, clock.now()).unwrap();
        }
        assert_eq!(session.reviewed(), 2);
    }

    // Paused card kept its fresh state
    let paused = db.storage.get_tracked(&ids[1]).unwrap().unwrap();
    assert_eq!(paused.memory.reps, 0);
    assert!(paused.suspended);

    db.storage.set_suspended(&ids[1], false).unwrap();
    let mut session = ReviewSession::new(&db.storage, Scheduler::default());
    let p = session.present(clock.now()).unwrap().unwrap();
    assert_eq!(p.item.question.id, ids[1]);

    let stats = db.storage.deck_stats(clock.now()).unwrap();
    assert_eq!(stats.suspended, 0);
    assert_eq!(stats.due, 1);
    assert_eq!(stats.new, 1);
    assert_eq!(stats.learning, 2);
}

#[test]
fn test_notes_survive_reviews_and_forget() {
    let mut clock = TestClock::start();
    let mut db = TestDatabaseManager::new_temp();
    let id = db.seed_tracked(1, clock.now()).remove(0);

    let hints = vec!["Sort by start".to_string(), "Merge while overlapping".to_string()];
    db.storage.update_notes(&id, "O(n log n)", &hints).unwrap();

    {
        let mut session = ReviewSession::new(&db.storage, Scheduler::default());
        let p = session.present(clock.now()).unwrap().unwrap();
        assert_eq!(p.item.hints, hints);
        session.answer(Rating::Easy, clock.now()).unwrap();
    }
    let reviewed = db.storage.get_tracked(&id).unwrap().unwrap();
    assert_eq!(reviewed.memory.status, LearningState::Review);
    assert_eq!(reviewed.note, "O(n log n)");

    let reset_at = clock.advance_days(2);
    let reset = db.storage.forget(&id, reset_at).unwrap();
    assert_eq!(reset.memory.status, LearningState::New);
    assert_eq!(reset.memory.reps, 0);
    assert_eq!(reset.memory.due, reset_at);
    assert_eq!(reset.hints, hints);

    // Immediately reviewable again
    let session = ReviewSession::new(&db.storage, Scheduler::default());
    assert_eq!(session.remaining(reset_at).unwrap(), 1);
}

#[test]
fn test_untrack_leaves_catalog_intact() {
    let clock = TestClock::start();
    let mut db = TestDatabaseManager::new_temp();
    let ids = db.seed_tracked(2, clock.now());

    assert!(db.storage.untrack(&ids[0]).unwrap());
    assert_eq!(db.tracked_count(), 1);
    assert_eq!(db.question_count(), 2);

    // Tracking again starts over
    let later = clock.now() + Duration::days(7);
    let again = db.storage.track(&ids[0], later).unwrap();
    assert_eq!(again.memory.due, later);
    assert!(db.storage.review_logs(&ids[0]).unwrap().is_empty());
}

#[test]
fn test_operations_on_untracked_questions_fail() {
    let clock = TestClock::start();
    let mut db = TestDatabaseManager::new_temp();
    let id = db.seed_catalog().remove(0);

    assert!(matches!(
        db.storage.set_suspended(&id, true),
        Err(StorageError::NotFound(_))
    ));
    assert!(matches!(
        db.storage.update_notes(&id, "x", &[]),
        Err(StorageError::NotFound(_))
    ));
    assert!(matches!(
        db.storage.forget(&id, clock.now()),
        Err(StorageError::NotFound(_))
    ));
    assert!(!db.storage.untrack(&id).unwrap());
    assert!(db.storage.review_items().unwrap().is_empty());
}

#[test]
fn test_custom_question_add_edit_delete() {
    let mut clock = TestClock::start();
    let mut db = TestDatabaseManager::new_temp();
    db.seed_catalog();
    let catalog_len = TestDataFactory::sample_catalog_len();

    let custom = db
        .storage
        .add_question(
            CatalogEntry {
                name: "LRU Cache".to_string(),
                link: "https://leetcode.com/problems/lru-cache/".to_string(),
                difficulty: QuestionDifficulty::Medium,
                pattern: Pattern::LinkedList,
            },
            clock.now(),
        )
        .unwrap();
    assert_eq!(db.question_count(), catalog_len + 1);

    // A custom question behaves like an imported one
    let found = db.storage.search_questions("lru").unwrap();
    assert_eq!(found, vec![custom.clone()]);
    db.storage.track(&custom.id, clock.now()).unwrap();
    {
        let mut session = ReviewSession::new(&db.storage, Scheduler::default());
        let p = session.present(clock.now()).unwrap().unwrap();
        assert_eq!(p.item.question.id, custom.id);
        session.answer(Rating::Good, clock.now()).unwrap();
    }

    // Names stay unique across imported and custom questions
    let clash = CatalogEntry {
        name: "valid anagram".to_string(),
        link: String::new(),
        difficulty: QuestionDifficulty::Easy,
        pattern: Pattern::Other,
    };
    assert!(matches!(
        db.storage.add_question(clash.clone(), clock.now()),
        Err(StorageError::DuplicateName(_))
    ));
    assert!(matches!(
        db.storage.update_question(&custom.id, clash),
        Err(StorageError::DuplicateName(_))
    ));

    // Editing keeps the review progress
    let edited = db
        .storage
        .update_question(
            &custom.id,
            CatalogEntry {
                name: "LRU Cache".to_string(),
                link: custom.link.clone(),
                difficulty: QuestionDifficulty::Hard,
                pattern: Pattern::LinkedList,
            },
        )
        .unwrap();
    assert_eq!(edited.difficulty, QuestionDifficulty::Hard);
    assert_eq!(edited.created_at, custom.created_at);
    let card = db.storage.get_tracked(&custom.id).unwrap().unwrap();
    assert_eq!(card.memory.status, LearningState::Learning);
    assert_eq!(card.question.difficulty, QuestionDifficulty::Hard);

    // Deleting drops the card and its history from the deck
    clock.advance_days(1);
    assert!(db.storage.delete_question(&custom.id).unwrap());
    assert_eq!(db.question_count(), catalog_len);
    assert!(db.storage.review_logs(&custom.id).unwrap().is_empty());
    assert!(db.storage.review_items().unwrap().is_empty());
    assert_eq!(db.storage.deck_stats(clock.now()).unwrap().total_reviews, 0);
}
