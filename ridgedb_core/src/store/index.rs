use std::collections::HashMap;

use super::table::Table;

/// An in-memory equality index for one column: value -> ordered row
/// positions. Never persisted — only the owning table's
/// `indexed_columns` list is.
pub type ColumnIndex = HashMap<String, Vec<usize>>;

/// All indexes currently installed on a table, keyed by column name.
#[derive(Debug, Default, Clone)]
pub struct TableIndexes {
    by_column: HashMap<String, ColumnIndex>,
}

impl TableIndexes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_index(&self, column: &str) -> bool {
        self.by_column.contains_key(column)
    }

    pub fn lookup(&self, column: &str, value: &str) -> Option<&[usize]> {
        self.by_column
            .get(column)
            .and_then(|idx| idx.get(value))
            .map(|v| v.as_slice())
    }

    /// Appends `position` to the bucket for `row`'s value in every indexed
    /// column. Used after an insert, where no existing position shifts.
    pub fn record_insert(&mut self, table: &Table, row: &[String], position: usize) {
        for col in &table.indexed_columns {
            let Some(col_idx) = table.column_index(col) else {
                continue;
            };
            let value = row[col_idx].clone();
            self.by_column.entry(col.clone()).or_default().entry(value).or_default().push(position);
        }
    }

    /// Rebuilds every installed index from scratch by a full scan of
    /// `table`. Used after update/delete, where positions shift or values
    /// change in ways that are simpler to recompute than patch in place.
    pub fn rebuild_all(&mut self, table: &Table) {
        for col in table.indexed_columns.clone() {
            self.rebuild_one(table, &col);
        }
    }

    /// Installs (or rebuilds) the index for a single column by full scan.
    pub fn rebuild_one(&mut self, table: &Table, column: &str) {
        let Some(col_idx) = table.column_index(column) else {
            return;
        };
        let mut index: ColumnIndex = HashMap::new();
        for (pos, row) in table.rows.iter().enumerate() {
            index.entry(row[col_idx].clone()).or_default().push(pos);
        }
        self.by_column.insert(column.to_string(), index);
    }

    pub fn drop_all(&mut self) {
        self.by_column.clear();
    }
}
