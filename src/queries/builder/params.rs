//! Positional parameter collection.
//!
//! PostgreSQL binds parameters by position, so the builder hands out the
//! placeholder for each value as it is added.

use crate::db::{Params, SqlParam};

#[derive(Debug, Clone, Default)]
pub struct ParamBuilder {
    params: Params,
}

impl ParamBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter and return its placeholder (`$1`, `$2`, ...).
    pub fn add(&mut self, value: SqlParam) -> String {
        self.params.push(value);
        format!("${}", self.params.len())
    }

    pub fn build(self) -> Params {
        self.params
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}
