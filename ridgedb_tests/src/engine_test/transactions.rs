use ridgedb_core::IsolationLevel;
use tempfile::tempdir;

use super::open;

/// Scenario 4: a rolled-back transaction leaves every table exactly as it
/// was before BEGIN.
#[test]
fn rollback_restores_pre_transaction_state() {
    let dir = tempdir().unwrap();
    let mut engine = open(dir.path());
    engine.create_table("accounts", vec!["id".into(), "balance".into()]).unwrap();
    engine.insert("accounts", vec!["1".into(), "100".into()]).unwrap();

    engine.begin(IsolationLevel::ReadCommitted).unwrap();
    engine.update("accounts", 0, vec!["1".into(), "90".into()]).unwrap();
    engine.rollback().unwrap();

    let (_, rows) = engine.select_all("accounts").unwrap();
    assert_eq!(rows, vec![vec!["1".to_string(), "100".to_string()]]);
}

/// Scenario 5: rolling back to a savepoint then committing keeps exactly the
/// ops before the savepoint.
#[test]
fn savepoint_rollback_then_commit_keeps_only_ops_before_savepoint() {
    let dir = tempdir().unwrap();
    let mut engine = open(dir.path());
    engine.create_table("t", vec!["v".into()]).unwrap();

    engine.begin(IsolationLevel::ReadCommitted).unwrap();
    engine.insert("t", vec!["A".into()]).unwrap();
    engine.savepoint("s1").unwrap();
    engine.insert("t", vec!["B".into()]).unwrap();
    engine.insert("t", vec!["C".into()]).unwrap();
    engine.rollback_to_savepoint("s1").unwrap();
    engine.commit().unwrap();

    let (_, rows) = engine.select_all("t").unwrap();
    assert_eq!(rows, vec![vec!["A".to_string()]]);
}

#[test]
fn beginning_twice_without_commit_or_rollback_errors() {
    let dir = tempdir().unwrap();
    let mut engine = open(dir.path());
    engine.begin(IsolationLevel::Serializable).unwrap();
    assert!(engine.begin(IsolationLevel::ReadCommitted).is_err());
}

#[test]
fn commit_without_active_transaction_errors() {
    let dir = tempdir().unwrap();
    let mut engine = open(dir.path());
    assert!(engine.commit().is_err());
}

#[test]
fn rollback_to_unknown_savepoint_errors_without_touching_buffer() {
    let dir = tempdir().unwrap();
    let mut engine = open(dir.path());
    engine.create_table("t", vec!["v".into()]).unwrap();
    engine.begin(IsolationLevel::ReadCommitted).unwrap();
    engine.insert("t", vec!["A".into()]).unwrap();
    assert!(engine.rollback_to_savepoint("does-not-exist").is_err());
    engine.commit().unwrap();

    let (_, rows) = engine.select_all("t").unwrap();
    assert_eq!(rows, vec![vec!["A".to_string()]]);
}
