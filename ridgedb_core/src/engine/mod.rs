//! Engine façade: the single entry point wiring the WAL manager, table
//! store, and transaction manager together behind one coarse `&mut self`
//! lock.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::eval;
use crate::store::TableStore;
use crate::txn::{self, BufferedOp, TransactionManager};
use crate::types::{IsolationLevel, Row};
use crate::wal::{WalEntryKind, WalManager, WalRecord};

/// Data-directory path, durability/speed tradeoff, and anything else the
/// teacher's `Database::open` hard-codes that this engine makes a knob of.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Whether table-file and WAL writes call `fsync`. Left on in
    /// production; tests that don't care about crash durability turn it
    /// off to avoid paying real disk sync latency per assertion.
    pub fsync: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { fsync: true }
    }
}

pub struct Engine {
    wal: WalManager,
    store: TableStore,
    txn: TransactionManager,
}

impl Engine {
    pub fn open(data_dir: impl AsRef<Path>) -> EngineResult<Self> {
        Self::open_with_config(data_dir, EngineConfig::default())
    }

    /// Loads every table file under `data_dir`, then replays every WAL
    /// record after the last checkpoint against the loaded store to bring
    /// it up to date with mutations that reached the log but may not have
    /// reached their table file before a crash.
    ///
    /// Each table file carries the sequence number of the last WAL record
    /// it already reflects, so a record whose write landed on disk before a
    /// crash but before the following checkpoint is skipped rather than
    /// reapplied: replay is idempotent, not at-least-once.
    pub fn open_with_config(data_dir: impl AsRef<Path>, config: EngineConfig) -> EngineResult<Self> {
        let root: PathBuf = data_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)
            .map_err(|e| EngineError::Fatal(format!("create data dir '{}': {e}", root.display())))?;

        let mut wal = WalManager::new(root.join("wal.log"))?;
        let mut store = TableStore::new(root.clone(), config.fsync);
        store.load_all()?;

        let records = wal.records_since_last_checkpoint()?;
        let replayed = records.len();
        for record in &records {
            apply_wal_record(&mut store, record);
        }

        tracing::info!(data_dir = %root.display(), replayed, "engine open");

        Ok(Self {
            wal,
            store,
            txn: TransactionManager::new(),
        })
    }

    pub fn is_transaction_active(&self) -> bool {
        self.txn.is_active()
    }

    pub fn create_table(&mut self, name: &str, columns: Vec<String>) -> EngineResult<()> {
        if self.txn.is_active() {
            return self.txn.buffer(BufferedOp::CreateTable { table: name.to_string(), columns });
        }
        let seq = self.wal.reserve_seq();
        self.store.create_table(name, columns.clone(), seq)?;
        self.wal.append(Some(name.to_string()), WalEntryKind::CreateTable { columns }, seq)?;
        self.wal.checkpoint()
    }

    pub fn drop_table(&mut self, name: &str) -> EngineResult<()> {
        if self.txn.is_active() {
            return self.txn.buffer(BufferedOp::DropTable { table: name.to_string() });
        }
        let seq = self.wal.reserve_seq();
        self.store.drop_table(name)?;
        self.wal.append(Some(name.to_string()), WalEntryKind::DropTable, seq)?;
        self.wal.checkpoint()
    }

    /// Inserts a row. Returns the position it lands at — inside a
    /// transaction this is the position in the read-your-writes view, since
    /// the row is only buffered, not yet in the live table.
    pub fn insert(&mut self, name: &str, values: Row) -> EngineResult<usize> {
        if let Some(tx) = self.txn.current() {
            let view = txn::buffered_view(&self.store, &tx.buffer, name)?;
            let position = view.map(|t| t.rows.len()).unwrap_or(0);
            self.txn.buffer(BufferedOp::Insert { table: name.to_string(), values })?;
            return Ok(position);
        }
        let seq = self.wal.reserve_seq();
        let position = self.store.insert(name, values.clone(), seq)?;
        self.wal.append(Some(name.to_string()), WalEntryKind::Insert { values }, seq)?;
        self.wal.checkpoint()?;
        Ok(position)
    }

    pub fn update(&mut self, name: &str, row_index: usize, values: Row) -> EngineResult<()> {
        if self.txn.is_active() {
            return self.txn.buffer(BufferedOp::Update { table: name.to_string(), row_index, values });
        }
        let seq = self.wal.reserve_seq();
        self.store.update(name, row_index, values.clone(), seq)?;
        self.wal.append(Some(name.to_string()), WalEntryKind::Update { row_index, values }, seq)?;
        self.wal.checkpoint()
    }

    pub fn delete(&mut self, name: &str, row_index: usize) -> EngineResult<()> {
        if self.txn.is_active() {
            return self.txn.buffer(BufferedOp::Delete { table: name.to_string(), row_index });
        }
        let seq = self.wal.reserve_seq();
        self.store.delete(name, row_index, seq)?;
        self.wal.append(Some(name.to_string()), WalEntryKind::Delete { row_index }, seq)?;
        self.wal.checkpoint()
    }

    /// Not WAL-logged: it never touches row data, and the updated
    /// `indexed_columns` list is already durable the moment the table file
    /// rename completes.
    pub fn create_index(&mut self, name: &str, column: &str) -> EngineResult<()> {
        if self.txn.is_active() {
            return self
                .txn
                .buffer(BufferedOp::CreateIndex { table: name.to_string(), column: column.to_string() });
        }
        self.store.create_index(name, column)
    }

    pub fn select_all(&self, name: &str) -> EngineResult<(Vec<String>, Vec<Row>)> {
        if let Some(tx) = self.txn.current() {
            let view = txn::buffered_view(&self.store, &tx.buffer, name)?
                .ok_or_else(|| EngineError::TableNotFound(name.to_string()))?;
            return Ok((view.columns, view.rows));
        }
        let (columns, rows) = self.store.select_all(name)?;
        Ok((columns.to_vec(), rows.to_vec()))
    }

    pub fn select_where_eq(&self, name: &str, column: &str, value: &str) -> EngineResult<Vec<Row>> {
        if let Some(tx) = self.txn.current() {
            let view = txn::buffered_view(&self.store, &tx.buffer, name)?
                .ok_or_else(|| EngineError::TableNotFound(name.to_string()))?;
            let col_idx = view
                .column_index(column)
                .ok_or_else(|| EngineError::ColumnNotFound(column.to_string()))?;
            return Ok(view.rows.into_iter().filter(|r| r[col_idx] == value).collect());
        }
        Ok(self.store.select_where_eq(name, column, value)?.into_iter().cloned().collect())
    }

    pub fn select_where(&self, name: &str, expr_source: &str) -> EngineResult<Vec<Row>> {
        let expr = eval::parse_expr(expr_source)?;
        if let Some(tx) = self.txn.current() {
            let view = txn::buffered_view(&self.store, &tx.buffer, name)?
                .ok_or_else(|| EngineError::TableNotFound(name.to_string()))?;
            let mut out = Vec::new();
            for row in &view.rows {
                if eval::eval(&expr, &view.columns, row)? {
                    out.push(row.clone());
                }
            }
            return Ok(out);
        }
        Ok(self.store.select_where(name, &expr)?.into_iter().cloned().collect())
    }

    pub fn begin(&mut self, isolation: IsolationLevel) -> EngineResult<Uuid> {
        self.txn.begin(isolation)
    }

    /// Validates the whole buffer against a cloned snapshot before applying
    /// anything for real, then writes one
    /// WAL envelope — `BeginTx`, one record per op, `CommitTx` — followed by
    /// a checkpoint.
    pub fn commit(&mut self) -> EngineResult<()> {
        let tx = self.txn.take_for_commit()?;

        let mut scratch = self.store.clone();
        for (index, op) in tx.buffer.iter().enumerate() {
            if let Err(source) = txn::apply_buffered_op(&mut scratch, op, 0) {
                tracing::warn!(tx = %tx.id, index, error = %source, "commit validation failed, transaction discarded");
                return Err(EngineError::CommitFailed { index, source: Box::new(source) });
            }
        }

        let begin_seq = self.wal.reserve_seq();
        self.wal.append(None, WalEntryKind::BeginTx { isolation: tx.isolation }, begin_seq)?;
        for op in &tx.buffer {
            let seq = self.wal.reserve_seq();
            txn::apply_buffered_op(&mut self.store, op, seq)?;
            if let Some(kind) = wal_kind_for(op) {
                self.wal.append(Some(op.table_name().to_string()), kind, seq)?;
            }
        }
        let commit_seq = self.wal.reserve_seq();
        self.wal.append(None, WalEntryKind::CommitTx, commit_seq)?;
        self.wal.checkpoint()?;

        tracing::info!(tx = %tx.id, ops = tx.buffer.len(), "transaction commit");
        Ok(())
    }

    pub fn rollback(&mut self) -> EngineResult<()> {
        let tx = self.txn.rollback()?;
        let seq = self.wal.reserve_seq();
        self.wal.append(None, WalEntryKind::RollbackTx, seq)?;
        tracing::info!(tx = %tx.id, "transaction rollback");
        Ok(())
    }

    pub fn savepoint(&mut self, name: &str) -> EngineResult<()> {
        self.txn.savepoint(name)?;
        let depth = self.txn.current().map(|tx| tx.buffer.len()).unwrap_or(0);
        let seq = self.wal.reserve_seq();
        self.wal.append(None, WalEntryKind::Savepoint { name: name.to_string(), depth }, seq)
    }

    pub fn rollback_to_savepoint(&mut self, name: &str) -> EngineResult<()> {
        self.txn.rollback_to_savepoint(name)?;
        let seq = self.wal.reserve_seq();
        self.wal.append(None, WalEntryKind::RollbackToSavepoint { name: name.to_string() }, seq)
    }

    /// Aborts the active transaction if it has been open longer than `ttl`
    ///. Returns true if one was aborted.
    pub fn sweep_expired_transactions(&mut self, ttl: chrono::Duration) -> bool {
        self.txn.sweep_expired(ttl)
    }

    pub fn data_dir(&self) -> &Path {
        self.store.root()
    }
}

fn wal_kind_for(op: &BufferedOp) -> Option<WalEntryKind> {
    match op {
        BufferedOp::CreateTable { columns, .. } => Some(WalEntryKind::CreateTable { columns: columns.clone() }),
        BufferedOp::DropTable { .. } => Some(WalEntryKind::DropTable),
        BufferedOp::CreateIndex { .. } => None,
        BufferedOp::Insert { values, .. } => Some(WalEntryKind::Insert { values: values.clone() }),
        BufferedOp::Update { row_index, values, .. } => {
            Some(WalEntryKind::Update { row_index: *row_index, values: values.clone() })
        }
        BufferedOp::Delete { row_index, .. } => Some(WalEntryKind::Delete { row_index: *row_index }),
    }
}

/// Applies one WAL record during replay unless the table it targets
/// already reflects it (`last_applied_seq >= record.seq`), which happens
/// when a crash lands after the table-file write but before the following
/// checkpoint. Skipping in that case is what makes replay idempotent
/// instead of reapplying an `Insert` as a duplicate row or a `Delete`
/// against a position that has since shifted.
fn apply_wal_record(store: &mut TableStore, record: &WalRecord) {
    let Some(table) = record.table.as_deref() else { return };
    if let Some(applied) = store.last_applied_seq(table) {
        if record.seq <= applied {
            tracing::debug!(table, seq = record.seq, applied, "skipping already-applied WAL record");
            return;
        }
    }
    let result = match &record.kind {
        WalEntryKind::CreateTable { columns } => store.create_table(table, columns.clone(), record.seq),
        WalEntryKind::Insert { values } => store.insert(table, values.clone(), record.seq).map(|_| ()),
        WalEntryKind::Update { row_index, values } => {
            store.update(table, *row_index, values.clone(), record.seq)
        }
        WalEntryKind::Delete { row_index } => store.delete(table, *row_index, record.seq),
        WalEntryKind::DropTable => store.drop_table(table),
        WalEntryKind::Checkpoint
        | WalEntryKind::BeginTx { .. }
        | WalEntryKind::CommitTx
        | WalEntryKind::RollbackTx
        | WalEntryKind::Savepoint { .. }
        | WalEntryKind::RollbackToSavepoint { .. } => return,
    };
    if let Err(e) = result {
        tracing::warn!(table, error = %e, "skipped WAL record during replay");
    }
}
