//! Shared result types.

mod table;

pub use table::{Table, TableError};
