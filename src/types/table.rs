//! Tabular query results with an identifying key.
//!
//! A [`Table`] keeps columns in projection order and remembers which of them
//! form the identifying key. Writers emit key columns first, then the rest.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::db::{QueryResult, Value};

#[derive(Error, Debug, PartialEq)]
pub enum TableError {
    #[error("Unknown key column '{name}'")]
    UnknownColumn { name: String },

    #[error("Key ({columns}) is not unique: ({key}) occurs {occurrences} times")]
    DuplicateKey {
        columns: String,
        key: String,
        occurrences: usize,
    },

    #[error("Row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        found: usize,
        expected: usize,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    key: Vec<usize>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Build a table with no identifying key.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self, TableError> {
        for (row, cells) in rows.iter().enumerate() {
            if cells.len() != columns.len() {
                return Err(TableError::RaggedRow {
                    row,
                    found: cells.len(),
                    expected: columns.len(),
                });
            }
        }
        Ok(Self {
            columns,
            key: Vec::new(),
            rows,
        })
    }

    pub fn from_query_result(result: QueryResult) -> Result<Self, TableError> {
        Self::new(result.headers, result.rows)
    }

    /// Mark the named columns as the identifying key, in the given order.
    pub fn with_key(mut self, key_columns: &[&str]) -> Result<Self, TableError> {
        self.key = key_columns
            .iter()
            .map(|name| {
                self.column_index(name).ok_or_else(|| TableError::UnknownColumn {
                    name: name.to_string(),
                })
            })
            .collect::<Result<_, _>>()?;
        Ok(self)
    }

    /// Fail if any identifying-key combination appears more than once.
    ///
    /// Keys compare by value kind as well as content, so a missing cell and an
    /// empty string are different keys. The first offending key (in key
    /// order) is reported along with how often it occurs. Rows are never
    /// dropped.
    pub fn ensure_unique_key(&self) -> Result<(), TableError> {
        let mut counts: BTreeMap<Vec<KeyCell<'_>>, (usize, usize)> = BTreeMap::new();
        for (idx, row) in self.rows.iter().enumerate() {
            let key = self.key.iter().map(|&i| KeyCell::from(&row[i])).collect();
            counts.entry(key).or_insert((idx, 0)).1 += 1;
        }

        match counts.into_values().find(|&(_, n)| n > 1) {
            Some((first_row, occurrences)) => Err(TableError::DuplicateKey {
                columns: self.key_columns().join(", "),
                key: self.render_key(first_row),
                occurrences,
            }),
            None => Ok(()),
        }
    }

    fn render_key(&self, row: usize) -> String {
        self.key
            .iter()
            .map(|&i| match &self.rows[row][i] {
                Value::Missing => "NULL".to_string(),
                v => v.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn key_columns(&self) -> Vec<&str> {
        self.key.iter().map(|&i| self.columns[i].as_str()).collect()
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All cells of a named column, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| &r[idx]).collect())
    }

    /// Cell at `row` in the named column.
    pub fn get(&self, row: usize, name: &str) -> Option<&Value> {
        let idx = self.column_index(name)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// Column order used by writers: key columns, then the rest.
    pub fn output_order(&self) -> Vec<usize> {
        let mut order = self.key.clone();
        order.extend((0..self.columns.len()).filter(|i| !self.key.contains(i)));
        order
    }
}

/// Totally ordered view of a key cell.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum KeyCell<'a> {
    Missing,
    Int(i64),
    /// IEEE bits with `-0.0` folded into `0.0`
    Float(u64),
    Text(&'a str),
}

impl<'a> From<&'a Value> for KeyCell<'a> {
    fn from(value: &'a Value) -> Self {
        match value {
            Value::Missing => KeyCell::Missing,
            Value::Int(i) => KeyCell::Int(*i),
            Value::Float(f) if *f == 0.0 => KeyCell::Float(0.0f64.to_bits()),
            Value::Float(f) => KeyCell::Float(f.to_bits()),
            Value::Text(s) => KeyCell::Text(s),
        }
    }
}
