use tempfile::tempdir;

use super::open;

#[test]
fn creating_a_table_twice_is_an_error() {
    let dir = tempdir().unwrap();
    let mut engine = open(dir.path());
    engine.create_table("t", vec!["a".into()]).unwrap();
    let err = engine.create_table("t", vec!["a".into()]).unwrap_err();
    assert!(err.to_string().contains("already exists"));
}

#[test]
fn dropping_a_table_unlinks_its_file() {
    let dir = tempdir().unwrap();
    let mut engine = open(dir.path());
    engine.create_table("t", vec!["a".into()]).unwrap();
    assert!(dir.path().join("t.table").exists());
    engine.drop_table("t").unwrap();
    assert!(!dir.path().join("t.table").exists());
}

#[test]
fn create_index_on_unknown_column_is_an_error() {
    let dir = tempdir().unwrap();
    let mut engine = open(dir.path());
    engine.create_table("t", vec!["a".into()]).unwrap();
    assert!(engine.create_index("t", "nope").is_err());
}

#[test]
fn idle_transaction_sweep_aborts_and_frees_the_slot() {
    let dir = tempdir().unwrap();
    let mut engine = open(dir.path());
    engine.begin(ridgedb_core::IsolationLevel::ReadCommitted).unwrap();
    assert!(engine.is_transaction_active());

    let aborted = engine.sweep_expired_transactions(chrono::Duration::seconds(-1));
    assert!(aborted);
    assert!(!engine.is_transaction_active());
    // The slot is free again; a new transaction can begin immediately.
    engine.begin(ridgedb_core::IsolationLevel::ReadCommitted).unwrap();
}
