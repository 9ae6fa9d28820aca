use ridgedb_core::store::TableStore;
use ridgedb_core::wal::{WalEntryKind, WalManager};
use ridgedb_core::{Engine, EngineConfig};
use tempfile::tempdir;

/// Scenario 3: a WAL record was appended and fsynced for a third insert, but
/// the crash happened before that insert's table-file rename completed.
/// Replay on the next open must reconstruct all three rows.
#[test]
fn replay_reconstructs_an_insert_whose_table_file_write_never_happened() {
    let dir = tempdir().unwrap();

    let mut wal = WalManager::new(dir.path().join("wal.log")).unwrap();
    let mut store = TableStore::new(dir.path().to_path_buf(), true);
    let seq = wal.reserve_seq();
    store.create_table("t", vec!["v".into()], seq).unwrap();
    wal.checkpoint().unwrap();

    let seq = wal.reserve_seq();
    store.insert("t", vec!["1".into()], seq).unwrap();
    wal.append(Some("t".into()), WalEntryKind::Insert { values: vec!["1".into()] }, seq).unwrap();
    wal.checkpoint().unwrap();

    let seq = wal.reserve_seq();
    store.insert("t", vec!["2".into()], seq).unwrap();
    wal.append(Some("t".into()), WalEntryKind::Insert { values: vec!["2".into()] }, seq).unwrap();
    wal.checkpoint().unwrap();

    // "Crash": WAL record for the third insert is durable, but the table
    // file is never written — store/wal are dropped here without persisting.
    let seq = wal.reserve_seq();
    wal.append(Some("t".into()), WalEntryKind::Insert { values: vec!["3".into()] }, seq).unwrap();

    let engine = Engine::open_with_config(dir.path(), EngineConfig { fsync: true }).unwrap();
    let (_, rows) = engine.select_all("t").unwrap();
    assert_eq!(rows, vec![vec!["1".to_string()], vec!["2".to_string()], vec!["3".to_string()]]);
}

/// Opposite crash direction: the table file write for an insert completed
/// (and is durable) but the crash landed before the following checkpoint,
/// so the insert's WAL record is still replayed on the next open. Because
/// the table file already carries that record's sequence number as its
/// watermark, replay must recognize the row as already present and skip
/// it rather than inserting it a second time.
#[test]
fn replay_does_not_duplicate_an_insert_already_reflected_on_disk() {
    let dir = tempdir().unwrap();

    let mut wal = WalManager::new(dir.path().join("wal.log")).unwrap();
    let mut store = TableStore::new(dir.path().to_path_buf(), true);
    let seq = wal.reserve_seq();
    store.create_table("t", vec!["v".into()], seq).unwrap();
    wal.append(Some("t".into()), WalEntryKind::CreateTable { columns: vec!["v".into()] }, seq).unwrap();
    wal.checkpoint().unwrap();

    // Table file write for this insert completes and is durable...
    let seq = wal.reserve_seq();
    store.insert("t", vec!["1".into()], seq).unwrap();
    // ...and its WAL record is appended too, but the crash happens before
    // the checkpoint that would mark it consumed.
    wal.append(Some("t".into()), WalEntryKind::Insert { values: vec!["1".into()] }, seq).unwrap();

    let engine = Engine::open_with_config(dir.path(), EngineConfig { fsync: true }).unwrap();
    let (_, rows) = engine.select_all("t").unwrap();
    assert_eq!(rows, vec![vec!["1".to_string()]]);
}

/// Same crash window as above but for a `Delete`: replaying a delete
/// record against a table file that already reflects it must not remove
/// an unrelated row that has since shifted into the deleted position.
#[test]
fn replay_does_not_misapply_a_delete_already_reflected_on_disk() {
    let dir = tempdir().unwrap();

    let mut wal = WalManager::new(dir.path().join("wal.log")).unwrap();
    let mut store = TableStore::new(dir.path().to_path_buf(), true);
    let seq = wal.reserve_seq();
    store.create_table("t", vec!["v".into()], seq).unwrap();
    wal.checkpoint().unwrap();

    for value in ["a", "b", "c"] {
        let seq = wal.reserve_seq();
        store.insert("t", vec![value.to_string()], seq).unwrap();
        wal.append(Some("t".into()), WalEntryKind::Insert { values: vec![value.to_string()] }, seq)
            .unwrap();
    }
    wal.checkpoint().unwrap();

    // Delete position 0 ("a"); the table file write completes, durably
    // shifting "b" into position 0, but the crash happens before the
    // following checkpoint.
    let seq = wal.reserve_seq();
    store.delete("t", 0, seq).unwrap();
    wal.append(Some("t".into()), WalEntryKind::Delete { row_index: 0 }, seq).unwrap();

    let engine = Engine::open_with_config(dir.path(), EngineConfig { fsync: true }).unwrap();
    let (_, rows) = engine.select_all("t").unwrap();
    assert_eq!(rows, vec![vec!["b".to_string()], vec!["c".to_string()]]);
}

/// WAL replay idempotence: a data directory produced by any sequence of
/// operations terminated by a checkpoint reopens to the same observable
/// state.
#[test]
fn reopening_after_a_clean_checkpoint_is_idempotent() {
    let dir = tempdir().unwrap();
    {
        let mut engine = Engine::open_with_config(dir.path(), EngineConfig { fsync: true }).unwrap();
        engine.create_table("t", vec!["a".into(), "b".into()]).unwrap();
        engine.insert("t", vec!["1".into(), "x".into()]).unwrap();
        engine.insert("t", vec!["2".into(), "y".into()]).unwrap();
        engine.create_index("t", "a").unwrap();
    }

    let first_reopen = Engine::open_with_config(dir.path(), EngineConfig { fsync: true }).unwrap();
    let (cols1, rows1) = first_reopen.select_all("t").unwrap();
    drop(first_reopen);

    let second_reopen = Engine::open_with_config(dir.path(), EngineConfig { fsync: true }).unwrap();
    let (cols2, rows2) = second_reopen.select_all("t").unwrap();

    assert_eq!(cols1, cols2);
    assert_eq!(rows1, rows2);
}

#[test]
fn replay_tolerates_a_torn_tail_record() {
    use std::io::Write;

    let dir = tempdir().unwrap();
    {
        let mut engine = Engine::open_with_config(dir.path(), EngineConfig { fsync: true }).unwrap();
        engine.create_table("t", vec!["a".into()]).unwrap();
        engine.insert("t", vec!["kept".into()]).unwrap();
    }

    let mut wal_file = std::fs::OpenOptions::new().append(true).open(dir.path().join("wal.log")).unwrap();
    wal_file.write_all(&500u32.to_le_bytes()).unwrap();
    wal_file.write_all(b"not actually 500 bytes").unwrap();
    drop(wal_file);

    let engine = Engine::open_with_config(dir.path(), EngineConfig { fsync: true }).unwrap();
    let (_, rows) = engine.select_all("t").unwrap();
    assert_eq!(rows, vec![vec!["kept".to_string()]]);
}
