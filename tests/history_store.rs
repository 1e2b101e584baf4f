//! End-to-end store scenarios: open, record, split, merge, delete, reopen.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use cubelog::{
    History, MoveSequence, Session, SessionId, Solve, SolveId, SolveType, SplitTimes, SyncStamp,
    TimedMoveSequence,
};

fn store_path(dir: &TempDir) -> PathBuf {
    dir.path().join("history-db")
}

fn open(path: &Path) -> History {
    let mut history = History::with_defaults();
    let report = history.open_database(path).expect("open database");
    assert!(report.is_clean(), "load reported errors: {:?}", report.errors);
    history
}

fn solve(id: &str, time_ms: u32, ok: bool) -> Solve {
    Solve {
        id: SolveId::new(id),
        scramble: "R U R' U'".parse::<MoveSequence>().unwrap(),
        created: 1_700_000_000,
        ok,
        time_ms,
        penalty_ms: 0,
        device: "keyboard".to_string(),
        moves: TimedMoveSequence::default(),
        splits: SplitTimes::default(),
        update: SyncStamp {
            id: format!("update-{id}"),
            date: 1_700_000_100,
            sync: String::new(),
        },
        dirty: true,
    }
}

fn snapshot(history: &History) -> (Vec<Session>, Option<SessionId>) {
    (
        history.sessions().to_vec(),
        history.active_session_id().cloned(),
    )
}

#[test]
fn fresh_database_opens_empty() {
    let dir = TempDir::new().unwrap();
    let history = open(&store_path(&dir));
    assert!(history.sessions().is_empty());
    assert!(history.active_session_id().is_none());
    assert!(history.is_database_open());
}

#[test]
fn recorded_solves_feed_session_statistics() {
    let dir = TempDir::new().unwrap();
    let mut history = open(&store_path(&dir));
    for (id, time) in [("s1", 10_000), ("s2", 12_000), ("s3", 11_000)] {
        history
            .record_solve(SolveType::Standard3x3x3, solve(id, time, true))
            .unwrap();
    }

    let session = history.active_session().unwrap();
    assert_eq!(session.best_solve().unwrap().time_ms, 10_000);
    // Three times trim to the median.
    assert_eq!(session.avg_of_last(3, false), Some(11_000));
    assert_eq!(session.session_avg(), Some(11_000));
    assert_eq!(session.avg_of_last(4, false), None);
}

#[test]
fn a_dnf_poisons_small_windows_but_trims_from_larger_ones() {
    let dir = TempDir::new().unwrap();
    let mut history = open(&store_path(&dir));
    for (id, time, ok) in [
        ("s1", 10_000, true),
        ("s2", 0, false),
        ("s3", 11_000, true),
        ("s4", 12_000, true),
        ("s5", 13_000, true),
    ] {
        history
            .record_solve(SolveType::Standard3x3x3, solve(id, time, ok))
            .unwrap();
    }
    let session = history.active_session().unwrap();
    // The last three solves are clean; the trim keeps their median.
    assert_eq!(session.avg_of_last(3, false), Some(12_000));
    // Over all five the DNF is the single trimmed maximum.
    assert_eq!(session.avg_of_last(5, false), Some(12_000));
    // The session average drops DNFs before trimming.
    assert_eq!(session.session_avg(), Some(11_500));
    assert_eq!(session.best_solve().unwrap().time_ms, 10_000);
}

#[test]
fn recording_another_type_switches_sessions() {
    let dir = TempDir::new().unwrap();
    let mut history = open(&store_path(&dir));
    history
        .record_solve(SolveType::Standard3x3x3, solve("s1", 10_000, true))
        .unwrap();
    history
        .record_solve(SolveType::Standard4x4x4, solve("s2", 65_000, true))
        .unwrap();

    assert_eq!(history.sessions().len(), 2);
    assert_eq!(
        history.active_session().unwrap().solve_type,
        SolveType::Standard4x4x4
    );
}

#[test]
fn split_of_the_active_session_promotes_the_tail() {
    let dir = TempDir::new().unwrap();
    let mut history = open(&store_path(&dir));
    for i in 0..5 {
        history
            .record_solve(
                SolveType::Standard3x3x3,
                solve(&format!("s{i}"), 10_000 + i, true),
            )
            .unwrap();
    }
    let original = history.sessions()[0].id.clone();
    let before: Vec<SolveId> = history.sessions()[0]
        .solves
        .iter()
        .map(|s| s.id.clone())
        .collect();

    history.split_session_at_solve(&original, 2).unwrap();

    assert_eq!(history.sessions().len(), 2);
    let head = &history.sessions()[0];
    let tail = &history.sessions()[1];
    assert_eq!(head.id, original);
    assert_eq!(head.solves.len(), 2);
    assert_eq!(tail.solves.len(), 3);
    let after: Vec<SolveId> = head
        .solves
        .iter()
        .chain(tail.solves.iter())
        .map(|s| s.id.clone())
        .collect();
    assert_eq!(after, before);
    assert_eq!(history.active_session_id(), Some(&history.sessions()[1].id));
}

#[test]
fn state_survives_a_reopen_bit_for_bit() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);

    let expected = {
        let mut history = open(&path);
        for i in 0..5 {
            history
                .record_solve(
                    SolveType::Standard3x3x3,
                    solve(&format!("s{i}"), 9_000 + i * 250, i != 1),
                )
                .unwrap();
        }
        let id = history.sessions()[0].id.clone();
        history.split_session_at_solve(&id, 2).unwrap();
        snapshot(&history)
    };

    let reopened = open(&path);
    assert_eq!(snapshot(&reopened), expected);
}

#[test]
fn merge_keeps_shared_solves_until_the_last_referent_dies() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);

    {
        let mut history = open(&path);
        history
            .record_solve(SolveType::Standard3x3x3, solve("a1", 10_000, true))
            .unwrap();
        history
            .record_solve(SolveType::Standard3x3x3, solve("a2", 10_500, true))
            .unwrap();
        history.reset_session().unwrap();
        history
            .record_solve(SolveType::Standard3x3x3, solve("b1", 11_000, true))
            .unwrap();

        let first = history.sessions()[0].id.clone();
        let second = history.sessions()[1].id.clone();
        // Deleting `first` inside the merge must not drop a1/a2: the merged
        // session still references them.
        history.merge_sessions(&first, &second, "merged").unwrap();
    }

    {
        let reopened = open(&path);
        assert_eq!(reopened.sessions().len(), 1);
        let merged = &reopened.sessions()[0];
        assert_eq!(merged.name, "merged");
        let ids: Vec<&str> = merged.solves.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["a1", "a2", "b1"]);
    }

    {
        let mut history = open(&path);
        let id = history.sessions()[0].id.clone();
        history.delete_session(&id).unwrap();
    }

    let emptied = open(&path);
    assert!(emptied.sessions().is_empty());
    assert!(emptied.active_session_id().is_none());
}

#[test]
fn deleting_an_inactive_session_keeps_the_active_one() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);

    {
        let mut history = open(&path);
        history
            .record_solve(SolveType::Standard3x3x3, solve("a1", 10_000, true))
            .unwrap();
        history.reset_session().unwrap();
        history
            .record_solve(SolveType::Standard3x3x3, solve("b1", 11_000, true))
            .unwrap();
        let first = history.sessions()[0].id.clone();
        history.delete_session(&first).unwrap();
        assert_eq!(history.sessions().len(), 1);
        assert!(history.active_session_id().is_some());
    }

    let reopened = open(&path);
    assert_eq!(reopened.sessions().len(), 1);
    let ids: Vec<&str> = reopened.sessions()[0]
        .solves
        .iter()
        .map(|s| s.id.as_str())
        .collect();
    assert_eq!(ids, ["b1"]);
    assert_eq!(
        reopened.active_session_id(),
        Some(&reopened.sessions()[0].id)
    );
}

#[test]
fn reset_session_survives_a_reopen() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);

    {
        let mut history = open(&path);
        history
            .record_solve(SolveType::Standard3x3x3, solve("s1", 10_000, true))
            .unwrap();
        history.reset_session().unwrap();
    }

    let reopened = open(&path);
    assert_eq!(reopened.sessions().len(), 1);
    assert!(reopened.active_session_id().is_none());
}

#[test]
fn a_cancelled_load_keeps_partial_state() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);

    {
        let mut history = open(&path);
        history
            .record_solve(SolveType::Standard3x3x3, solve("s1", 10_000, true))
            .unwrap();
        history.reset_session().unwrap();
        history
            .record_solve(SolveType::Standard3x3x3, solve("s2", 11_000, true))
            .unwrap();
    }

    let mut history = History::with_defaults();
    let report = history
        .open_database_with_progress(&path, |_, _| true)
        .expect("cancelled open still succeeds");
    assert!(report.cancelled);
    assert!(history.sessions().is_empty());
    assert!(history.active_session_id().is_none());
    assert!(history.is_database_open());
}

#[test]
fn progress_reports_session_counts() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);

    {
        let mut history = open(&path);
        for i in 0..3 {
            history
                .record_solve(SolveType::Standard3x3x3, solve(&format!("s{i}"), 10_000, true))
                .unwrap();
            history.reset_session().unwrap();
        }
    }

    let mut seen = Vec::new();
    let mut history = History::with_defaults();
    history
        .open_database_with_progress(&path, |done, total| {
            seen.push((done, total));
            false
        })
        .unwrap();
    assert_eq!(history.sessions().len(), 3);
    assert_eq!(seen.last(), Some(&(3, 3)));
    assert!(seen.iter().all(|&(done, total)| done <= total && total == 3));
}
