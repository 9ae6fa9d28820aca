//! WAL Manager: an append-only, length-prefixed, self-describing
//! log of operations preceding data-file mutation.
//!
//! Framing is grounded on the `other_examples` reference
//! `harborgrid-justin-rusty-db::transaction::wal_manager` (4-byte
//! little-endian length prefix + `serde_json` payload, `read_exact` loop
//! that treats a short tail as clean end-of-log) adapted to this engine's
//! single-coarse-lock model: there is no internal buffering or background
//! flush thread — every mutating call suspends only at its own blocking
//! I/O, and `append` fsyncs before returning.

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::types::{IsolationLevel, Row};

/// One type-specific WAL payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WalEntryKind {
    CreateTable { columns: Vec<String> },
    Insert { values: Row },
    Update { row_index: usize, values: Row },
    Delete { row_index: usize },
    DropTable,
    Checkpoint,
    BeginTx { isolation: IsolationLevel },
    CommitTx,
    RollbackTx,
    Savepoint { name: String, depth: usize },
    RollbackToSavepoint { name: String },
}

/// A full WAL record: sequence number, timestamp, optional table name, and
/// a type-specific payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalRecord {
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    pub table: Option<String>,
    pub kind: WalEntryKind,
}

pub struct WalManager {
    path: PathBuf,
    next_seq: u64,
}

impl WalManager {
    pub fn new(path: PathBuf) -> EngineResult<Self> {
        if !path.exists() {
            File::create(&path)
                .map_err(|e| EngineError::Fatal(format!("create WAL file: {e}")))?;
        }
        let mut manager = Self { path, next_seq: 1 };
        if let Some(max_seq) = manager.read_all_tolerant()?.iter().map(|r| r.seq).max() {
            manager.next_seq = max_seq + 1;
        }
        Ok(manager)
    }

    /// Reserves the next sequence number without writing anything. Callers
    /// stamp a store mutation with this number before the WAL record that
    /// names it exists, so a table file and its WAL record always agree on
    /// which mutation they describe.
    pub fn reserve_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    /// Appends one record under the given (already reserved) sequence
    /// number and fsyncs before returning.
    pub fn append(&mut self, table: Option<String>, kind: WalEntryKind, seq: u64) -> EngineResult<()> {
        let record = WalRecord {
            seq,
            timestamp: Utc::now(),
            table,
            kind,
        };
        tracing::debug!(seq, ?record.table, kind = ?record.kind, "wal append");
        let payload = serde_json::to_vec(&record)
            .map_err(|e| EngineError::PersistenceFailed(format!("serialize WAL record: {e}")))?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| EngineError::PersistenceFailed(format!("open WAL for append: {e}")))?;
        file.write_all(&(payload.len() as u32).to_le_bytes())
            .map_err(|e| EngineError::PersistenceFailed(format!("write WAL length prefix: {e}")))?;
        file.write_all(&payload)
            .map_err(|e| EngineError::PersistenceFailed(format!("write WAL payload: {e}")))?;
        file.sync_all()
            .map_err(|e| EngineError::PersistenceFailed(format!("fsync WAL: {e}")))?;
        if seq >= self.next_seq {
            self.next_seq = seq + 1;
        }
        Ok(())
    }

    /// Writes a CHECKPOINT record: the commit point declaring that every
    /// preceding mutation is durably reflected in table files.
    pub fn checkpoint(&mut self) -> EngineResult<()> {
        tracing::info!("wal checkpoint");
        let seq = self.reserve_seq();
        self.append(None, WalEntryKind::Checkpoint, seq)
    }

    /// Resets the segment to empty. Housekeeping only — not called from the
    /// mutation hot path.
    pub fn truncate(&mut self) -> EngineResult<()> {
        File::create(&self.path)
            .map_err(|e| EngineError::PersistenceFailed(format!("truncate WAL: {e}")))?;
        self.next_seq = 1;
        Ok(())
    }

    /// Reads every record after the last CHECKPOINT. A torn record at
    /// the tail (short read) is treated as end-of-log and stops replay
    /// cleanly rather than erroring.
    pub fn records_since_last_checkpoint(&self) -> EngineResult<Vec<WalRecord>> {
        let all = self.read_all_tolerant()?;
        let last_checkpoint = all
            .iter()
            .rposition(|r| matches!(r.kind, WalEntryKind::Checkpoint));
        let start = last_checkpoint.map(|i| i + 1).unwrap_or(0);
        Ok(all[start..].to_vec())
    }

    fn read_all_tolerant(&self) -> EngineResult<Vec<WalRecord>> {
        let mut file = File::open(&self.path)
            .map_err(|e| EngineError::Fatal(format!("open WAL for replay: {e}")))?;
        let mut records = Vec::new();
        loop {
            let mut len_buf = [0u8; 4];
            match file.read_exact(&mut len_buf) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(EngineError::Fatal(format!("read WAL length prefix: {e}"))),
            }
            let len = u32::from_le_bytes(len_buf) as usize;
            let mut payload = vec![0u8; len];
            match file.read_exact(&mut payload) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    tracing::warn!("WAL tail record truncated; stopping replay cleanly");
                    break;
                }
                Err(e) => return Err(EngineError::Fatal(format!("read WAL payload: {e}"))),
            }
            match serde_json::from_slice::<WalRecord>(&payload) {
                Ok(record) => records.push(record),
                Err(_) => {
                    tracing::warn!("WAL tail record malformed; stopping replay cleanly");
                    break;
                }
            }
        }
        Ok(records)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
