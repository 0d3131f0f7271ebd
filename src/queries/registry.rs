//! Named query registry.
//!
//! Configuration refers to queries by name. The registry maps those names to
//! functions with the common catalog signature; new queries are added by
//! registering them here.

use std::collections::BTreeMap;

use super::{site_loc_info, site_pollen_abundance, QueryError, SiteIds};
use crate::db::DatabaseBackend;
use crate::types::Table;

/// Shape shared by every catalog query.
pub type QueryFn = fn(&mut dyn DatabaseBackend, &SiteIds) -> Result<Table, QueryError>;

#[derive(Debug, Clone)]
pub struct QueryRegistry {
    queries: BTreeMap<String, QueryFn>,
}

impl QueryRegistry {
    /// A registry with no queries.
    pub fn empty() -> Self {
        Self {
            queries: BTreeMap::new(),
        }
    }

    /// Register `query` under `name`, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, query: QueryFn) -> &mut Self {
        self.queries.insert(name.into(), query);
        self
    }

    /// Look up a query by name.
    pub fn resolve(&self, name: &str) -> Result<QueryFn, QueryError> {
        self.queries
            .get(name)
            .copied()
            .ok_or_else(|| QueryError::UnknownQuery {
                name: name.to_string(),
                available: self.names().join(", "),
            })
    }

    pub fn names(&self) -> Vec<&str> {
        self.queries.keys().map(String::as_str).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.queries.contains_key(name)
    }
}

impl Default for QueryRegistry {
    /// The built-in EPD catalog.
    fn default() -> Self {
        let mut registry = Self::empty();
        registry
            .register("site_loc_info", site_loc_info)
            .register("site_pollen_abundance", site_pollen_abundance);
        registry
    }
}
