//! SELECT query description and rendering.
//!
//! Compiles to:
//!
//! ```text
//! SELECT t.c::type AS "alias", ...
//! FROM base
//! JOIN other ON base.a = other.a AND ...
//! WHERE t.c = ANY($1::int4[]) AND t.d = 'literal'
//! ORDER BY "alias", ...
//! ```
//!
//! All joins are inner joins.

use super::{ParamBuilder, QueryBuilder};
use crate::db::{quote_ident, quote_literal, ColumnType, Params, SqlParam};

/// A table-qualified column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Col {
    pub table: &'static str,
    pub name: &'static str,
}

pub const fn col(table: &'static str, name: &'static str) -> Col {
    Col { table, name }
}

impl Col {
    fn render(&self) -> String {
        format!("{}.{}", self.table, self.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub column: Col,
    pub alias: &'static str,
    pub ty: ColumnType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub table: &'static str,
    pub on: Vec<(Col, Col)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `column = ANY($n::int4[])`
    InIntSet { column: Col, values: Vec<i32> },
    /// `column = 'literal'`
    EqText { column: Col, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub from: &'static str,
    pub joins: Vec<Join>,
    pub projections: Vec<Projection>,
    pub filters: Vec<Filter>,
    pub order_by: Vec<&'static str>,
}

impl Select {
    pub fn from(table: &'static str) -> Self {
        Self {
            from: table,
            joins: Vec::new(),
            projections: Vec::new(),
            filters: Vec::new(),
            order_by: Vec::new(),
        }
    }

    /// Project a column under its own name.
    pub fn column(self, column: Col, ty: ColumnType) -> Self {
        self.column_as(column, column.name, ty)
    }

    pub fn column_as(mut self, column: Col, alias: &'static str, ty: ColumnType) -> Self {
        self.projections.push(Projection { column, alias, ty });
        self
    }

    /// Inner join on one or more column equalities.
    pub fn join(mut self, table: &'static str, on: &[(Col, Col)]) -> Self {
        self.joins.push(Join {
            table,
            on: on.to_vec(),
        });
        self
    }

    pub fn filter_in(mut self, column: Col, values: impl IntoIterator<Item = i32>) -> Self {
        self.filters.push(Filter::InIntSet {
            column,
            values: values.into_iter().collect(),
        });
        self
    }

    pub fn filter_eq(mut self, column: Col, value: &str) -> Self {
        self.filters.push(Filter::EqText {
            column,
            value: value.to_string(),
        });
        self
    }

    /// Order by projected aliases.
    pub fn order_by(mut self, aliases: &[&'static str]) -> Self {
        self.order_by.extend_from_slice(aliases);
        self
    }

    /// Every table the query reads, base table first.
    pub fn tables(&self) -> Vec<&'static str> {
        std::iter::once(self.from)
            .chain(self.joins.iter().map(|j| j.table))
            .collect()
    }

    pub fn output_columns(&self) -> Vec<&'static str> {
        self.projections.iter().map(|p| p.alias).collect()
    }

    /// Output column names with their cast types, for typed reading.
    pub fn column_types(&self) -> Vec<(&'static str, ColumnType)> {
        self.projections.iter().map(|p| (p.alias, p.ty)).collect()
    }

    fn render(&self) -> (String, ParamBuilder) {
        let mut params = ParamBuilder::new();

        let select_list = self
            .projections
            .iter()
            .map(|p| {
                format!(
                    "{}::{} AS {}",
                    p.column.render(),
                    p.ty.sql_cast(),
                    quote_ident(p.alias)
                )
            })
            .collect::<Vec<_>>()
            .join(",\n       ");

        let mut sql = format!("SELECT {}\nFROM {}", select_list, self.from);

        for join in &self.joins {
            let on = join
                .on
                .iter()
                .map(|(l, r)| format!("{} = {}", l.render(), r.render()))
                .collect::<Vec<_>>()
                .join(" AND ");
            sql.push_str(&format!("\nJOIN {} ON {}", join.table, on));
        }

        if !self.filters.is_empty() {
            let conditions = self
                .filters
                .iter()
                .map(|f| match f {
                    Filter::InIntSet { column, values } => {
                        let placeholder = params.add(SqlParam::IntArray(values.clone()));
                        format!("{} = ANY({}::int4[])", column.render(), placeholder)
                    }
                    Filter::EqText { column, value } => {
                        format!("{} = {}", column.render(), quote_literal(value))
                    }
                })
                .collect::<Vec<_>>()
                .join("\n  AND ");
            sql.push_str(&format!("\nWHERE {}", conditions));
        }

        if !self.order_by.is_empty() {
            let order = self
                .order_by
                .iter()
                .map(|a| quote_ident(a))
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(&format!("\nORDER BY {}", order));
        }

        (sql, params)
    }
}

impl QueryBuilder for Select {
    fn compile(&self) -> String {
        self.render().0
    }

    fn parameters(&self) -> Params {
        self.render().1.build()
    }
}
