//! Database backend trait.
//!
//! Catalog queries talk to the database through `&mut dyn DatabaseBackend`
//! so that they can run against a live PostgreSQL instance or, in tests, a
//! scripted stand-in.

use super::{DbError, Value};

/// A positional query parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    /// Bound as `int4[]`, used for site-set membership
    IntArray(Vec<i32>),
    Text(String),
}

/// Ordered parameters matching `$1..$n` placeholders.
pub type Params = Vec<SqlParam>;

/// Decoded result of a query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl QueryResult {
    /// Position of a named column in `headers`.
    pub fn column_index(&self, name: &str) -> Result<usize, DbError> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| DbError::MissingColumn {
                name: name.to_string(),
            })
    }
}

/// Trait for databases that can answer catalog queries.
///
/// Access is sequential: one logical caller drives the connection at a time,
/// hence `&mut self`.
pub trait DatabaseBackend {
    /// Execute a query with positional parameters, returning decoded rows.
    fn execute_query(&mut self, sql: &str, params: &Params) -> Result<QueryResult, DbError>;

    /// Execute a query without parameters.
    fn execute_query_no_params(&mut self, sql: &str) -> Result<QueryResult, DbError> {
        self.execute_query(sql, &Params::new())
    }

    /// Check whether a table (or view) is visible on the search path.
    fn relation_exists(&mut self, name: &str) -> Result<bool, DbError>;

    /// Get the backend name for logging/debugging.
    fn backend_name(&self) -> &'static str;
}
