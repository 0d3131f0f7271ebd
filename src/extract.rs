//! Extraction driver.
//!
//! Resolves every configured query name, runs the queries in order and writes
//! each result to `<output_dir>/<query>.<ext>`. The first failure stops the
//! run: a partially restored database would invalidate later queries too.

use std::fs;
use std::path::PathBuf;

use log::{error, info};
use thiserror::Error;

use crate::db::DatabaseBackend;
use crate::output::{write_table_file, OutputError, OutputFormat};
use crate::queries::{QueryError, QueryFn, QueryRegistry, SiteIds};

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error(transparent)]
    UnknownQuery(QueryError),

    #[error("Query '{name}' failed: {source}")]
    Query {
        name: String,
        #[source]
        source: QueryError,
    },

    #[error("Failed to create output directory '{path}': {source}")]
    OutputDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write results of '{name}': {source}")]
    Write {
        name: String,
        #[source]
        source: OutputError,
    },
}

pub struct Extractor<'a> {
    registry: &'a QueryRegistry,
    output_dir: PathBuf,
    format: OutputFormat,
}

impl<'a> Extractor<'a> {
    pub fn new(registry: &'a QueryRegistry, output_dir: impl Into<PathBuf>, format: OutputFormat) -> Self {
        Self {
            registry,
            output_dir: output_dir.into(),
            format,
        }
    }

    /// Output path for a query's results.
    pub fn output_path(&self, name: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}.{}", name, self.format.extension()))
    }

    /// Run `queries` for `sites`, returning the files written.
    pub fn run(
        &self,
        db: &mut dyn DatabaseBackend,
        queries: &[String],
        sites: &SiteIds,
    ) -> Result<Vec<PathBuf>, ExtractError> {
        let resolved = self.resolve_all(queries)?;

        fs::create_dir_all(&self.output_dir).map_err(|source| ExtractError::OutputDir {
            path: self.output_dir.display().to_string(),
            source,
        })?;

        info!("Extracting {} data...", self.format.extension());
        let mut written = Vec::with_capacity(resolved.len());
        for (name, query) in resolved {
            written.push(self.run_one(db, name, query, sites)?);
        }
        info!("Finished extracting {} data", self.format.extension());
        Ok(written)
    }

    /// Resolve all names before anything runs, so a typo aborts the whole batch.
    fn resolve_all<'q>(&self, queries: &'q [String]) -> Result<Vec<(&'q str, QueryFn)>, ExtractError> {
        queries
            .iter()
            .map(|name| match self.registry.resolve(name) {
                Ok(query) => Ok((name.as_str(), query)),
                Err(e) => {
                    error!("No query named '{}' is registered", name);
                    Err(ExtractError::UnknownQuery(e))
                }
            })
            .collect()
    }

    fn run_one(
        &self,
        db: &mut dyn DatabaseBackend,
        name: &str,
        query: QueryFn,
        sites: &SiteIds,
    ) -> Result<PathBuf, ExtractError> {
        info!("Running query '{}' for {} sites", name, sites.len());
        let table = query(db, sites).map_err(|source| {
            log_query_failure(name, &source);
            ExtractError::Query {
                name: name.to_string(),
                source,
            }
        })?;

        let path = self.output_path(name);
        write_table_file(&table, &path, self.format).map_err(|source| {
            error!("Could not write {}: {}", path.display(), source);
            ExtractError::Write {
                name: name.to_string(),
                source,
            }
        })?;
        info!("Wrote {} rows to {}", table.len(), path.display());
        Ok(path)
    }
}

fn log_query_failure(name: &str, err: &QueryError) {
    match err {
        QueryError::MissingTable { table } => error!(
            "Query '{}' could not find table '{}'. Check EPD has been restored",
            name, table
        ),
        QueryError::Integrity(e) => error!(
            "Query '{}' produced ambiguous rows (data integrity violation): {}",
            name, e
        ),
        QueryError::Connectivity { .. } => error!("Query '{}' lost the database: {}", name, err),
        other => error!("Query '{}' failed: {}", name, other),
    }
}
