//! Transaction Manager: one active transaction per connection,
//! buffered mutations, savepoints, and commit/rollback.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::store::{Table, TableStore};
use crate::types::{IsolationLevel, Row, TxState};

/// One buffered mutating call, recorded in transaction order instead of
/// being applied immediately.
#[derive(Debug, Clone)]
pub enum BufferedOp {
    CreateTable { table: String, columns: Vec<String> },
    DropTable { table: String },
    CreateIndex { table: String, column: String },
    Insert { table: String, values: Row },
    Update { table: String, row_index: usize, values: Row },
    Delete { table: String, row_index: usize },
}

impl BufferedOp {
    pub fn table_name(&self) -> &str {
        match self {
            BufferedOp::CreateTable { table, .. }
            | BufferedOp::DropTable { table }
            | BufferedOp::CreateIndex { table, .. }
            | BufferedOp::Insert { table, .. }
            | BufferedOp::Update { table, .. }
            | BufferedOp::Delete { table, .. } => table,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Transaction {
    pub id: Uuid,
    pub state: TxState,
    pub isolation: IsolationLevel,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub buffer: Vec<BufferedOp>,
    savepoints: HashMap<String, usize>,
}

impl Transaction {
    fn new(isolation: IsolationLevel) -> Self {
        Self {
            id: Uuid::new_v4(),
            state: TxState::Active,
            isolation,
            started_at: Utc::now(),
            ended_at: None,
            buffer: Vec::new(),
            savepoints: HashMap::new(),
        }
    }
}

#[derive(Default)]
pub struct TransactionManager {
    current: Option<Transaction>,
}

impl TransactionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    pub fn current(&self) -> Option<&Transaction> {
        self.current.as_ref()
    }

    pub fn begin(&mut self, isolation: IsolationLevel) -> EngineResult<Uuid> {
        if self.current.is_some() {
            return Err(EngineError::TransactionAlreadyActive);
        }
        let tx = Transaction::new(isolation);
        let id = tx.id;
        tracing::info!(%id, %isolation, "transaction begin");
        self.current = Some(tx);
        Ok(id)
    }

    pub fn buffer(&mut self, op: BufferedOp) -> EngineResult<()> {
        let tx = self.current.as_mut().ok_or(EngineError::NoActiveTransaction)?;
        tx.buffer.push(op);
        Ok(())
    }

    pub fn savepoint(&mut self, name: &str) -> EngineResult<()> {
        let tx = self.current.as_mut().ok_or(EngineError::NoActiveTransaction)?;
        let depth = tx.buffer.len();
        tx.savepoints.insert(name.to_string(), depth);
        Ok(())
    }

    /// Truncates the buffer back to the length recorded by `name`. The
    /// savepoint itself remains valid for reuse.
    pub fn rollback_to_savepoint(&mut self, name: &str) -> EngineResult<()> {
        let tx = self.current.as_mut().ok_or(EngineError::NoActiveTransaction)?;
        let depth = *tx
            .savepoints
            .get(name)
            .ok_or_else(|| EngineError::SavepointNotFound(name.to_string()))?;
        tx.buffer.truncate(depth);
        tx.savepoints.retain(|_, d| *d <= depth);
        Ok(())
    }

    /// Discards the whole buffer and marks the transaction RolledBack.
    pub fn rollback(&mut self) -> EngineResult<Transaction> {
        let mut tx = self.current.take().ok_or(EngineError::NoActiveTransaction)?;
        tx.state = TxState::RolledBack;
        tx.ended_at = Some(Utc::now());
        tx.buffer.clear();
        tracing::info!(id = %tx.id, "transaction rollback");
        Ok(tx)
    }

    /// Removes the active transaction so its buffer can be committed by the
    /// caller. The transaction is not marked Committed here — the caller
    /// does that only after every buffered op has actually been applied.
    pub fn take_for_commit(&mut self) -> EngineResult<Transaction> {
        self.current.take().ok_or(EngineError::NoActiveTransaction)
    }

    /// Marks the active transaction Aborted and discards its buffer if it
    /// was started more than `ttl` ago.
    /// Returns true if a transaction was aborted.
    pub fn sweep_expired(&mut self, ttl: chrono::Duration) -> bool {
        let expired = self
            .current
            .as_ref()
            .is_some_and(|tx| Utc::now() - tx.started_at > ttl);
        if expired {
            if let Some(mut tx) = self.current.take() {
                tx.state = TxState::Aborted;
                tx.ended_at = Some(Utc::now());
                tracing::warn!(id = %tx.id, "transaction aborted by idle sweep");
            }
        }
        expired
    }
}

/// Applies one buffered op to `store` as a normal (non-transactional)
/// mutation. Used both for the commit dry run (against a scratch clone,
/// where `seq` is a throwaway placeholder since the clone is discarded)
/// and for the real commit (against the live store, where `seq` is the
/// WAL sequence number the caller is about to log this op under).
pub fn apply_buffered_op(store: &mut TableStore, op: &BufferedOp, seq: u64) -> EngineResult<()> {
    match op {
        BufferedOp::CreateTable { table, columns } => {
            store.create_table(table, columns.clone(), seq)
        }
        BufferedOp::DropTable { table } => store.drop_table(table),
        BufferedOp::CreateIndex { table, column } => store.create_index(table, column),
        BufferedOp::Insert { table, values } => {
            store.insert(table, values.clone(), seq).map(|_| ())
        }
        BufferedOp::Update { table, row_index, values } => {
            store.update(table, *row_index, values.clone(), seq)
        }
        BufferedOp::Delete { table, row_index } => store.delete(table, *row_index, seq),
    }
}

/// Returns the table view a read-your-writes select should see: the
/// committed table (if any) with this transaction's own buffered ops for
/// that table replayed on top, without touching the real store.
pub fn buffered_view(store: &TableStore, buffer: &[BufferedOp], table_name: &str) -> EngineResult<Option<Table>> {
    let key = table_name.to_ascii_lowercase();
    let mut view = store.table(&key).ok().cloned();

    for op in buffer {
        if op.table_name().to_ascii_lowercase() != key {
            continue;
        }
        match op {
            BufferedOp::CreateTable { columns, .. } => {
                view = Some(Table::new(key.clone(), columns.clone()));
            }
            BufferedOp::DropTable { .. } => {
                view = None;
            }
            BufferedOp::CreateIndex { column, .. } => {
                if let Some(t) = view.as_mut() {
                    if !t.indexed_columns.iter().any(|c| c == column) {
                        t.indexed_columns.push(column.clone());
                    }
                }
            }
            BufferedOp::Insert { values, .. } => {
                if let Some(t) = view.as_mut() {
                    t.check_arity(values)?;
                    t.rows.push(values.clone());
                }
            }
            BufferedOp::Update { row_index, values, .. } => {
                if let Some(t) = view.as_mut() {
                    t.check_arity(values)?;
                    if *row_index >= t.rows.len() {
                        return Err(EngineError::RowOutOfBounds(*row_index));
                    }
                    t.rows[*row_index] = values.clone();
                }
            }
            BufferedOp::Delete { row_index, .. } => {
                if let Some(t) = view.as_mut() {
                    if *row_index >= t.rows.len() {
                        return Err(EngineError::RowOutOfBounds(*row_index));
                    }
                    t.rows.remove(*row_index);
                }
            }
        }
    }
    Ok(view)
}
