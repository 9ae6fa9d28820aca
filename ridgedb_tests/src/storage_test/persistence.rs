use ridgedb_core::store::Table;
use ridgedb_core::{Engine, EngineConfig};
use tempfile::tempdir;

#[test]
fn round_trip_preserves_schema_rows_and_indexed_columns() {
    let dir = tempdir().unwrap();
    let mut t = Table::new("widgets".to_string(), vec!["id".into(), "name".into()]);
    t.rows.push(vec!["1".into(), "bolt".into()]);
    t.rows.push(vec!["2".into(), "nut".into()]);
    t.indexed_columns.push("name".into());
    t.persist(dir.path(), true).unwrap();

    let reloaded = Table::load(dir.path(), "widgets").unwrap();
    assert_eq!(reloaded.columns, t.columns);
    assert_eq!(reloaded.rows, t.rows);
    assert_eq!(reloaded.indexed_columns, t.indexed_columns);
}

#[test]
fn wrong_arity_insert_does_not_touch_disk() {
    let dir = tempdir().unwrap();
    let mut engine = Engine::open_with_config(dir.path(), EngineConfig { fsync: false }).unwrap();
    engine.create_table("accounts", vec!["id".into(), "balance".into()]).unwrap();

    let table_before = std::fs::read(dir.path().join("accounts.table")).unwrap();
    let wal_before = std::fs::read(dir.path().join("wal.log")).unwrap();
    let result = engine.insert("accounts", vec!["1".into()]);
    assert!(result.is_err());

    let table_after = std::fs::read(dir.path().join("accounts.table")).unwrap();
    assert_eq!(table_before, table_after, "a failed arity check must not rewrite the table file");
    let wal_after = std::fs::read(dir.path().join("wal.log")).unwrap();
    assert_eq!(wal_before, wal_after, "a failed arity check must not append to the WAL");
}

#[test]
fn deleting_the_only_row_leaves_table_present_with_zero_rows() {
    let dir = tempdir().unwrap();
    let mut engine = Engine::open_with_config(dir.path(), EngineConfig { fsync: false }).unwrap();
    engine.create_table("t", vec!["a".into()]).unwrap();
    engine.insert("t", vec!["only".into()]).unwrap();
    engine.delete("t", 0).unwrap();

    let (_, rows) = engine.select_all("t").unwrap();
    assert!(rows.is_empty());
    // Table itself must still exist (not unlinked).
    assert!(dir.path().join("t.table").exists());
}

#[test]
fn updating_row_index_equal_to_row_count_is_out_of_bounds() {
    let dir = tempdir().unwrap();
    let mut engine = Engine::open_with_config(dir.path(), EngineConfig { fsync: false }).unwrap();
    engine.create_table("t", vec!["a".into()]).unwrap();
    engine.insert("t", vec!["x".into()]).unwrap();

    let err = engine.update("t", 1, vec!["y".into()]).unwrap_err();
    assert!(err.to_string().contains("out of bounds"));
}

#[test]
fn table_names_are_case_insensitive_at_the_engine_boundary() {
    let dir = tempdir().unwrap();
    let mut engine = Engine::open_with_config(dir.path(), EngineConfig { fsync: false }).unwrap();
    engine.create_table("Users", vec!["id".into()]).unwrap();
    engine.insert("USERS", vec!["1".into()]).unwrap();
    let (_, rows) = engine.select_all("users").unwrap();
    assert_eq!(rows.len(), 1);
}
