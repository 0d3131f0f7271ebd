//! epd_extract library - European Pollen Database extraction
//!
//! Restores the EPD from its SQL dump, runs named catalog queries for a set
//! of study sites and writes each result as a delimited file.

pub mod cli;
pub mod config;
pub mod db;
pub mod extract;
pub mod logging;
pub mod output;
pub mod queries;
pub mod restore;
pub mod types;

#[macro_use]
pub mod test_macros;

#[cfg(test)]
pub mod test_utils;
