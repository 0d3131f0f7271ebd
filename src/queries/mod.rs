//! Canned queries against the European Pollen Database.
//!
//! Column names are kept as they are in the EPD to keep downstream analysis
//! readable against the EPD documentation.
//!
//! Every catalog entry has the same shape, [`QueryFn`]: it takes a database
//! connection and a set of EPD site numbers and returns a [`Table`].

pub mod builder;
mod health;
mod registry;
mod site_loc_info;
mod site_pollen_abundance;

pub use health::check_connection;
pub use registry::{QueryFn, QueryRegistry};
pub use site_loc_info::{site_loc_info, site_loc_info_select};
pub use site_pollen_abundance::{site_pollen_abundance, site_pollen_abundance_select};

use std::collections::BTreeSet;

use log::debug;
use thiserror::Error;

use crate::db::{DatabaseBackend, DbError};
use crate::types::{Table, TableError};
use builder::{CompiledQuery, Select};

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Could not connect to the EPD: {source}")]
    Connectivity {
        #[source]
        source: DbError,
    },

    #[error("Table '{table}' does not exist. Check the EPD has been restored")]
    MissingTable { table: String },

    #[error("No query named '{name}' (available: {available})")]
    UnknownQuery { name: String, available: String },

    #[error("Data integrity violation: {0}")]
    Integrity(#[from] TableError),

    #[error(transparent)]
    Db(#[from] DbError),
}

/// A set of EPD site numbers (the `site_` field of `siteloc` and `entity`).
///
/// Duplicates and input order are irrelevant; the set is used for filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteIds(BTreeSet<i32>);

impl SiteIds {
    pub fn new(ids: impl IntoIterator<Item = i32>) -> Self {
        Self(ids.into_iter().collect())
    }

    pub fn contains(&self, id: i32) -> bool {
        self.0.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = i32> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<i32> for SiteIds {
    fn from_iter<T: IntoIterator<Item = i32>>(iter: T) -> Self {
        Self::new(iter)
    }
}

/// Run a catalog select and shape the result.
///
/// Tables are reflected before the query runs, so an unrestored database is
/// reported as a missing table rather than a generic query failure. The
/// identifying key must be unique in the result.
pub(crate) fn run_select(
    db: &mut dyn DatabaseBackend,
    select: &Select,
    key: &[&str],
) -> Result<Table, QueryError> {
    for table in select.tables() {
        if !db.relation_exists(table)? {
            return Err(QueryError::MissingTable {
                table: table.to_string(),
            });
        }
    }

    let compiled = CompiledQuery::from_builder(select);
    let result = compiled.execute(db).map_err(|e| match e {
        DbError::UndefinedTable { message } => QueryError::MissingTable {
            table: undefined_relation(&message),
        },
        other => QueryError::Db(other),
    })?;
    debug!("Query returned {} rows", result.rows.len());

    let table = Table::from_query_result(result)?.with_key(key)?;
    table.ensure_unique_key()?;
    Ok(table)
}

/// Pull the relation name out of `relation "x" does not exist`.
fn undefined_relation(message: &str) -> String {
    message
        .split('"')
        .nth(1)
        .map_or_else(|| message.to_string(), str::to_string)
}
