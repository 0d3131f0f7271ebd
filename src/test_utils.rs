//! Shared test utilities for query and extraction tests.
//!
//! [`StubBackend`] stands in for a live database: it knows which tables exist,
//! replays scripted results in order and records every query it was asked to
//! run.

use std::collections::{BTreeSet, VecDeque};

use crate::db::{DatabaseBackend, DbError, Params, QueryResult, Value};
use crate::queries::{site_loc_info_select, site_pollen_abundance_select, SiteIds};

/// Tables of a restored EPD read by the catalog.
pub const EPD_TABLES: &[&str] = &["entity", "p_counts", "p_vars", "p_agedpt", "chron", "siteloc"];

#[derive(Debug, Default)]
pub struct StubBackend {
    tables: BTreeSet<String>,
    responses: VecDeque<Result<QueryResult, DbError>>,
    /// Every query executed, with its parameters
    pub executed: Vec<(String, Params)>,
}

impl StubBackend {
    pub fn with_tables(tables: &[&str]) -> Self {
        Self {
            tables: tables.iter().map(|t| t.to_string()).collect(),
            ..Self::default()
        }
    }

    /// A backend that looks like a fully restored EPD.
    pub fn with_epd_tables() -> Self {
        Self::with_tables(EPD_TABLES)
    }

    /// Queue a result for the next query.
    pub fn respond(mut self, result: QueryResult) -> Self {
        self.responses.push_back(Ok(result));
        self
    }

    /// Queue a failure for the next query.
    pub fn respond_err(mut self, err: DbError) -> Self {
        self.responses.push_back(Err(err));
        self
    }

    pub fn respond_site_loc(self, rows: Vec<Vec<Value>>) -> Self {
        let headers = site_loc_info_select(&SiteIds::default()).output_columns();
        self.respond(result_with(&headers, rows))
    }

    pub fn respond_abundance(self, rows: Vec<Vec<Value>>) -> Self {
        let headers = site_pollen_abundance_select(&SiteIds::default()).output_columns();
        self.respond(result_with(&headers, rows))
    }
}

impl DatabaseBackend for StubBackend {
    fn execute_query(&mut self, sql: &str, params: &Params) -> Result<QueryResult, DbError> {
        self.executed.push((sql.to_string(), params.clone()));
        self.responses
            .pop_front()
            .unwrap_or_else(|| Ok(QueryResult::default()))
    }

    fn relation_exists(&mut self, name: &str) -> Result<bool, DbError> {
        Ok(self.tables.contains(name))
    }

    fn backend_name(&self) -> &'static str {
        "Stub"
    }
}

fn result_with(headers: &[&str], rows: Vec<Vec<Value>>) -> QueryResult {
    QueryResult {
        headers: headers.iter().map(|h| h.to_string()).collect(),
        rows,
    }
}

/// A `site_loc_info` row: sitename, latdd, londd, elevation, site_.
pub fn site_loc_row(name: &str, site: i64) -> Vec<Value> {
    vec![
        Value::from(name),
        Value::Float(42.0 + site as f64 / 10.0),
        Value::Float(-6.5),
        Value::Float(1050.0),
        Value::Int(site),
    ]
}

/// A `site_pollen_abundance` row in projection order.
///
/// Site number is 1 for "Alpha" and 2 otherwise; entity, chronology and
/// variable numbers are derived from the other arguments.
pub fn abundance_row(
    site: &str,
    sigle: &str,
    sample: i64,
    varcode: &str,
    count: Option<f64>,
) -> Vec<Value> {
    let site_no = if site == "Alpha" { 1 } else { 2 };
    vec![
        Value::Float(1250.0 * sample as f64),
        Value::from(count),
        Value::from(varcode),
        Value::from(format!("{} pollen", varcode)),
        Value::from(site),
        Value::Int(site_no),
        Value::Int(site_no * 10),
        Value::from(sigle),
        Value::Int(sample),
        Value::Int(1),
        Value::Int(varcode.bytes().map(i64::from).sum()),
    ]
}
