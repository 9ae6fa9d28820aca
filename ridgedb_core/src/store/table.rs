use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::types::Row;

/// A named, ordered list of columns plus the rows currently stored under
/// them. Rows are addressed by zero-based position; position
/// is stable within the file but shifts on deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    pub indexed_columns: Vec<String>,
    /// The WAL sequence number of the last mutation reflected on disk.
    /// Lets replay tell "this record is already in this table file" apart
    /// from "this record still needs to be applied", so a record written
    /// but not yet followed by a checkpoint is never replayed twice.
    #[serde(default)]
    pub last_applied_seq: u64,
}

impl Table {
    pub fn new(name: String, columns: Vec<String>) -> Self {
        Self {
            name,
            columns,
            rows: Vec::new(),
            indexed_columns: Vec::new(),
            last_applied_seq: 0,
        }
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.eq_ignore_ascii_case(column))
    }

    pub fn check_arity(&self, values: &[String]) -> EngineResult<()> {
        if values.len() != self.columns.len() {
            return Err(EngineError::ArityMismatch {
                expected: self.columns.len(),
                actual: values.len(),
            });
        }
        Ok(())
    }

    pub fn row_file_name(name: &str) -> String {
        format!("{name}.table")
    }

    pub fn file_path(root: &Path, name: &str) -> PathBuf {
        root.join(Self::row_file_name(name))
    }

    /// Durably persists this table to `<name>.table` in `root`.
    ///
    /// Serializes to a temp file in the same directory, fsyncs the temp
    /// file, renames over the final name, then fsyncs the directory. When
    /// `fsync` is false (test-only speed path) the sync calls are skipped
    /// but the temp-file-then-rename step still runs, so atomicity itself
    /// is still exercised.
    ///
    /// Grounded on the atomic-rename idiom in `onepointking-minisql::storage::save_table`
    /// and `maxBogovick-rustmemodb`'s `io_utils::persist`, extended with
    /// fsync calls that those examples omit.
    pub fn persist(&self, root: &Path, fsync: bool) -> EngineResult<()> {
        let final_path = Self::file_path(root, &self.name);
        let temp_path = root.join(format!("{}.table.tmp", self.name));

        let payload = serde_json::to_vec_pretty(self)
            .map_err(|e| EngineError::PersistenceFailed(format!("serialize table: {e}")))?;

        let mut file = File::create(&temp_path)
            .map_err(|e| EngineError::PersistenceFailed(format!("create temp file: {e}")))?;
        file.write_all(&payload)
            .map_err(|e| EngineError::PersistenceFailed(format!("write temp file: {e}")))?;
        if fsync {
            file.sync_all()
                .map_err(|e| EngineError::PersistenceFailed(format!("fsync temp file: {e}")))?;
        }
        drop(file);

        fs::rename(&temp_path, &final_path)
            .map_err(|e| EngineError::PersistenceFailed(format!("rename into place: {e}")))?;

        if fsync {
            let dir = File::open(root)
                .map_err(|e| EngineError::PersistenceFailed(format!("open dir for fsync: {e}")))?;
            dir.sync_all()
                .map_err(|e| EngineError::PersistenceFailed(format!("fsync dir: {e}")))?;
        }
        Ok(())
    }

    pub fn load(root: &Path, name: &str) -> EngineResult<Self> {
        let path = Self::file_path(root, name);
        let content = fs::read(&path)
            .map_err(|e| EngineError::Fatal(format!("read table file '{}': {e}", path.display())))?;
        serde_json::from_slice(&content)
            .map_err(|e| EngineError::Fatal(format!("malformed table file '{}': {e}", path.display())))
    }

    pub fn unlink(root: &Path, name: &str) -> EngineResult<()> {
        let path = Self::file_path(root, name);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(EngineError::PersistenceFailed(format!(
                "unlink table file '{}': {e}",
                path.display()
            ))),
        }
    }
}
