//! Table Store: in-memory tables plus hash indexes, with atomic
//! on-disk persistence.

mod index;
mod table;

pub use index::TableIndexes;
pub use table::Table;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{EngineError, EngineResult};
use crate::eval::Expr;
use crate::types::Row;

#[derive(Clone)]
pub struct TableStore {
    root: PathBuf,
    fsync: bool,
    tables: HashMap<String, Table>,
    indexes: HashMap<String, TableIndexes>,
}

fn canonical(name: &str) -> String {
    name.to_ascii_lowercase()
}

impl TableStore {
    pub fn new(root: PathBuf, fsync: bool) -> Self {
        Self {
            root,
            fsync,
            tables: HashMap::new(),
            indexes: HashMap::new(),
        }
    }

    /// Loads every `<name>.table` file found directly under `root` into
    /// memory and rebuilds each table's hash indexes from `indexed_columns`
    /// by a full scan.
    pub fn load_all(&mut self) -> EngineResult<()> {
        let entries = std::fs::read_dir(&self.root)
            .map_err(|e| EngineError::Fatal(format!("read data dir: {e}")))?;
        for entry in entries {
            let entry = entry.map_err(|e| EngineError::Fatal(format!("read dir entry: {e}")))?;
            let path = entry.path();
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(name) = file_name.strip_suffix(".table") else {
                continue;
            };
            let table = Table::load(&self.root, name)?;
            let mut indexes = TableIndexes::new();
            indexes.rebuild_all(&table);
            self.tables.insert(canonical(name), table);
            self.indexes.insert(canonical(name), indexes);
        }
        Ok(())
    }

    pub fn table_exists(&self, name: &str) -> bool {
        self.tables.contains_key(&canonical(name))
    }

    pub fn table(&self, name: &str) -> EngineResult<&Table> {
        self.tables
            .get(&canonical(name))
            .ok_or_else(|| EngineError::TableNotFound(name.to_string()))
    }

    fn table_mut(&mut self, name: &str) -> EngineResult<&mut Table> {
        self.tables
            .get_mut(&canonical(name))
            .ok_or_else(|| EngineError::TableNotFound(name.to_string()))
    }

    pub fn create_table(&mut self, name: &str, columns: Vec<String>, seq: u64) -> EngineResult<()> {
        let key = canonical(name);
        if self.tables.contains_key(&key) {
            return Err(EngineError::TableExists(name.to_string()));
        }
        if columns.is_empty() {
            return Err(EngineError::Expression(
                "CREATE TABLE requires at least one column".to_string(),
            ));
        }
        let mut table = Table::new(key.clone(), columns);
        table.last_applied_seq = seq;
        self.persist_checked(&table)?;
        self.tables.insert(key.clone(), table);
        self.indexes.insert(key, TableIndexes::new());
        Ok(())
    }

    /// The WAL sequence number already reflected in `name`'s table file, if
    /// the table exists. Used by replay to skip a record that is already
    /// durable on disk.
    pub fn last_applied_seq(&self, name: &str) -> Option<u64> {
        self.tables.get(&canonical(name)).map(|t| t.last_applied_seq)
    }

    pub fn drop_table(&mut self, name: &str) -> EngineResult<()> {
        let key = canonical(name);
        if !self.tables.contains_key(&key) {
            return Err(EngineError::TableNotFound(name.to_string()));
        }
        Table::unlink(&self.root, &key)?;
        self.tables.remove(&key);
        self.indexes.remove(&key);
        Ok(())
    }

    /// Inserts a row, appending its position to every indexed column's
    /// bucket without a full rebuild. Returns the new
    /// row's position.
    pub fn insert(&mut self, name: &str, values: Row, seq: u64) -> EngineResult<usize> {
        let key = canonical(name);
        let table = self.table_mut(&key)?;
        table.check_arity(&values)?;

        let mut candidate = table.clone();
        candidate.rows.push(values);
        let position = candidate.rows.len() - 1;
        candidate.last_applied_seq = seq;
        self.persist_checked(&candidate)?;

        let indexes = self.indexes.entry(key.clone()).or_default();
        indexes.record_insert(&candidate, &candidate.rows[position], position);
        self.tables.insert(key, candidate);
        Ok(position)
    }

    /// Replaces the row at `position`, then rebuilds every indexed column
    /// by full scan.
    pub fn update(&mut self, name: &str, position: usize, values: Row, seq: u64) -> EngineResult<()> {
        let key = canonical(name);
        let table = self.table_mut(&key)?;
        table.check_arity(&values)?;
        if position >= table.rows.len() {
            return Err(EngineError::RowOutOfBounds(position));
        }

        let mut candidate = table.clone();
        candidate.rows[position] = values;
        candidate.last_applied_seq = seq;
        self.persist_checked(&candidate)?;

        let indexes = self.indexes.entry(key.clone()).or_default();
        indexes.rebuild_all(&candidate);
        self.tables.insert(key, candidate);
        Ok(())
    }

    pub fn delete(&mut self, name: &str, position: usize, seq: u64) -> EngineResult<()> {
        let key = canonical(name);
        let table = self.table_mut(&key)?;
        if position >= table.rows.len() {
            return Err(EngineError::RowOutOfBounds(position));
        }

        let mut candidate = table.clone();
        candidate.rows.remove(position);
        candidate.last_applied_seq = seq;
        self.persist_checked(&candidate)?;

        let indexes = self.indexes.entry(key.clone()).or_default();
        indexes.rebuild_all(&candidate);
        self.tables.insert(key, candidate);
        Ok(())
    }

    /// Installs an equality index on `column`, building it by full scan and
    /// persisting the updated `indexed_columns` list.
    pub fn create_index(&mut self, name: &str, column: &str) -> EngineResult<()> {
        let key = canonical(name);
        let table = self.table_mut(&key)?;
        if table.column_index(column).is_none() {
            return Err(EngineError::ColumnNotFound(column.to_string()));
        }

        let mut candidate = table.clone();
        if !candidate.indexed_columns.iter().any(|c| c == column) {
            candidate.indexed_columns.push(column.to_string());
        }
        self.persist_checked(&candidate)?;

        let indexes = self.indexes.entry(key.clone()).or_default();
        indexes.rebuild_one(&candidate, column);
        self.tables.insert(key, candidate);
        Ok(())
    }

    pub fn select_all(&self, name: &str) -> EngineResult<(&[String], &[Row])> {
        let table = self.table(name)?;
        Ok((&table.columns, &table.rows))
    }

    /// Equality lookup, served from the hash index when one exists on
    /// `column`; otherwise a full scan.
    pub fn select_where_eq(&self, name: &str, column: &str, value: &str) -> EngineResult<Vec<&Row>> {
        let key = canonical(name);
        let table = self.table(&key)?;
        let col_idx = table
            .column_index(column)
            .ok_or_else(|| EngineError::ColumnNotFound(column.to_string()))?;

        if let Some(indexes) = self.indexes.get(&key) {
            if indexes.has_index(column) {
                let positions = indexes.lookup(column, value).unwrap_or(&[]);
                return Ok(positions.iter().map(|&p| &table.rows[p]).collect());
            }
        }

        Ok(table
            .rows
            .iter()
            .filter(|row| row[col_idx] == value)
            .collect())
    }

    /// Evaluates `expr` against every row; bypasses the general evaluator
    /// and serves from the index when `expr` is a single top-level equality
    /// on an indexed column.
    pub fn select_where(&self, name: &str, expr: &Expr) -> EngineResult<Vec<&Row>> {
        let key = canonical(name);
        let table = self.table(&key)?;

        if let Some((column, value)) = expr.as_top_level_eq() {
            if self.indexes.get(&key).is_some_and(|idx| idx.has_index(column)) {
                return self.select_where_eq(&key, column, value);
            }
        }

        let mut out = Vec::new();
        for row in &table.rows {
            if crate::eval::eval(expr, &table.columns, row)? {
                out.push(row);
            }
        }
        Ok(out)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn persist_checked(&self, table: &Table) -> EngineResult<()> {
        table.persist(&self.root, self.fsync)
    }
}
