//! Database access for the EPD.
//!
//! This module provides the database layer of the extractor:
//! - Connection parameters ([`DatabaseCreds`])
//! - The [`DatabaseBackend`] seam used by catalog queries
//! - A PostgreSQL implementation over the synchronous `postgres` client
//! - Cell values with an explicit missing sentinel
//!
//! # Type Decisions
//!
//! **Why decode into a closed `Value` enum instead of per-query structs?**
//! Results are written straight to delimited files with their column names
//! intact, so a uniform row representation keeps catalog queries small and
//! lets the writer stay generic.
//!
//! **Why `i32` site identifiers?**
//! EPD site numbers are `integer` columns; binding them as `int4[]` matches the
//! column type without relying on implicit casts.

mod backend;
mod creds;
mod escape;
mod postgres;
mod value;

pub use backend::{DatabaseBackend, Params, QueryResult, SqlParam};
pub use creds::DatabaseCreds;
pub use escape::{escape_literal, quote_ident, quote_literal};
pub use self::postgres::PostgresBackend;
pub use value::{ColumnType, Value};

use thiserror::Error;

/// Database error types
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Failed to connect to database at '{target}': {message}")]
    ConnectFailed { target: String, message: String },

    #[error("Database connection closed: {message}")]
    ConnectionClosed { message: String },

    #[error("Query failed: {message}")]
    QueryFailed { message: String },

    #[error("Query referenced an undefined table: {message}")]
    UndefinedTable { message: String },

    #[error("Missing column '{name}' in query result")]
    MissingColumn { name: String },

    #[error("Could not decode column '{column}': {message}")]
    Conversion { column: String, message: String },
}
