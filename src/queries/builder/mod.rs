//! Query building infrastructure.
//!
//! Catalog queries are described as values rather than hand-written SQL
//! strings:
//!
//! 1. **Query Definition** - [`Select`] records tables, joins, projections,
//!    filters and ordering
//! 2. **Compilation** - the `QueryBuilder` trait renders PostgreSQL text and
//!    the positional parameters that go with it
//! 3. **Execution** - [`CompiledQuery`] runs against a `DatabaseBackend`
//!
//! # Example
//!
//! ```ignore
//! let query = Select::from("siteloc")
//!     .column(col("siteloc", "sitename"), ColumnType::Text)
//!     .filter_in(col("siteloc", "site_"), [44, 759]);
//!
//! let result = CompiledQuery::from_builder(&query).execute(db)?;
//! ```

pub mod params;
pub mod select;

pub use params::ParamBuilder;
pub use select::{col, Col, Filter, Join, Projection, Select};

use crate::db::{DatabaseBackend, DbError, Params, QueryResult};

/// Query definition that can render itself as PostgreSQL.
pub trait QueryBuilder {
    /// Render the query text with `$n` placeholders.
    fn compile(&self) -> String;

    /// Parameters matching the placeholders emitted by `compile`, in order.
    fn parameters(&self) -> Params;

    fn param_count(&self) -> usize {
        self.parameters().len()
    }
}

/// A compiled query ready for execution.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub sql: String,
    pub params: Params,
}

impl CompiledQuery {
    pub fn from_builder(builder: &dyn QueryBuilder) -> Self {
        CompiledQuery {
            sql: builder.compile(),
            params: builder.parameters(),
        }
    }

    pub fn execute(&self, db: &mut dyn DatabaseBackend) -> Result<QueryResult, DbError> {
        db.execute_query(&self.sql, &self.params)
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }
}
