//! # Persistence Journey
//!
//! Everything a session commits must be read back unchanged after the
//! database is closed and reopened.

use recode_core::{LearningState, Rating, ReviewSession, ReviewStore, Scheduler, TrackedQuestion};
use recode_e2e_tests::{TestClock, TestDatabaseManager};

fn snapshot(db: &TestDatabaseManager) -> Vec<TrackedQuestion> {
    db.storage.tracked_questions().unwrap()
}

#[test]
fn test_committed_reviews_survive_reopen() {
    let mut clock = TestClock::start();
    let mut db = TestDatabaseManager::new_temp();
    let ids = db.seed_tracked(4, clock.now());
    db.storage
        .update_notes(&ids[0], "two passes", &["prefix".to_string()])
        .unwrap();
    db.storage.set_suspended(&ids[3], true).unwrap();

    let ratings = [Rating::Forgot, Rating::Hard, Rating::Easy];
    {
        let mut session = ReviewSession::new(&db.storage, Scheduler::default());
        session.present(clock.now()).unwrap();
        for rating in ratings {
            session.answer(rating, clock.now()).unwrap();
        }
        assert!(session.is_idle());
    }

    let before = snapshot(&db);
    let logs_before: Vec<_> = ids
        .iter()
        .map(|id| db.storage.review_logs(id).unwrap())
        .collect();

    db.reopen();

    assert_eq!(snapshot(&db), before);
    for (id, logs) in ids.iter().zip(&logs_before) {
        assert_eq!(&db.storage.review_logs(id).unwrap(), logs);
    }

    // The reopened deck keeps scheduling from the stored state
    let tomorrow = clock.advance_days(1);
    let mut session = ReviewSession::new(&db.storage, Scheduler::default());
    let p = session.present(tomorrow).unwrap().unwrap();
    assert_eq!(p.item.memory.status, LearningState::Learning);
    assert!(p.item.memory.last_review.is_some());
}

#[test]
fn test_stats_match_after_reopen() {
    let clock = TestClock::start();
    let mut db = TestDatabaseManager::new_temp();
    db.seed_catalog();
    db.seed_tracked(5, clock.now());

    {
        let mut session = ReviewSession::new(&db.storage, Scheduler::default());
        session.present(clock.now()).unwrap();
        session.answer(Rating::Good, clock.now()).unwrap();
        session.answer(Rating::Easy, clock.now()).unwrap();
    }

    let before = db.storage.deck_stats(clock.now()).unwrap();
    assert_eq!(before.total_reviews, 2);
    assert_eq!(before.due, 3);

    db.reopen();
    assert_eq!(db.storage.deck_stats(clock.now()).unwrap(), before);
    assert_eq!(db.storage.review_items().unwrap().len(), 5);
}

#[test]
fn test_new_at_path_reuses_existing_file() {
    let clock = TestClock::start();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared.db");

    let ids = {
        let mut first = TestDatabaseManager::new_at_path(path.clone());
        first.seed_tracked(2, clock.now())
    };

    let second = TestDatabaseManager::new_at_path(path);
    assert_eq!(second.tracked_count(), 2);
    assert!(second.storage.get_tracked(&ids[1]).unwrap().is_some());
}
