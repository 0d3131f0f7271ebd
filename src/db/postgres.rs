//! PostgreSQL backend.
//!
//! Wraps a synchronous `postgres::Client`. Cells are decoded by the wire type
//! of each result column; catalog queries cast their projections so only the
//! types handled in [`decode_cell`] reach this layer.

use log::debug;
use postgres::error::SqlState;
use postgres::types::{ToSql, Type};
use postgres::{Client, NoTls, Row};

use super::backend::{DatabaseBackend, Params, QueryResult, SqlParam};
use super::{DatabaseCreds, DbError, Value};

pub struct PostgresBackend {
    client: Client,
}

impl PostgresBackend {
    /// Connect using the given credentials.
    pub fn connect(creds: &DatabaseCreds) -> Result<Self, DbError> {
        let target = format!("{}:{}/{}", creds.host, creds.port, creds.database);
        Self::connect_str(&creds.conn_str(), &target)
    }

    /// Connect with an arbitrary libpq-style connection string.
    ///
    /// `target` names the server in logs and connection errors.
    pub fn connect_str(conn_str: &str, target: &str) -> Result<Self, DbError> {
        debug!("Connecting to PostgreSQL at {}", target);
        let client = Client::connect(conn_str, NoTls).map_err(|e| DbError::ConnectFailed {
            target: target.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { client })
    }

    /// Run one or more statements without results (setup scripts, `SET`).
    pub fn execute_batch(&mut self, sql: &str) -> Result<(), DbError> {
        self.client.batch_execute(sql).map_err(map_pg_error)
    }
}

impl DatabaseBackend for PostgresBackend {
    fn execute_query(&mut self, sql: &str, params: &Params) -> Result<QueryResult, DbError> {
        debug!("Executing query:\n{}", sql);
        let bound: Vec<&(dyn ToSql + Sync)> = params
            .iter()
            .map(|p| match p {
                SqlParam::IntArray(v) => v as &(dyn ToSql + Sync),
                SqlParam::Text(s) => s as &(dyn ToSql + Sync),
            })
            .collect();

        let statement = self.client.prepare(sql).map_err(map_pg_error)?;
        let headers = statement
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        let rows = self
            .client
            .query(&statement, &bound)
            .map_err(map_pg_error)?;

        let rows = rows.iter().map(decode_row).collect::<Result<Vec<_>, _>>()?;
        Ok(QueryResult { headers, rows })
    }

    fn relation_exists(&mut self, name: &str) -> Result<bool, DbError> {
        let row = self
            .client
            .query_one("SELECT to_regclass($1) IS NOT NULL", &[&name])
            .map_err(map_pg_error)?;
        row.try_get::<_, bool>(0).map_err(|e| DbError::Conversion {
            column: "to_regclass".to_string(),
            message: e.to_string(),
        })
    }

    fn backend_name(&self) -> &'static str {
        "Postgres"
    }
}

fn map_pg_error(e: postgres::Error) -> DbError {
    if e.code() == Some(&SqlState::UNDEFINED_TABLE) {
        return DbError::UndefinedTable {
            message: e.to_string(),
        };
    }
    if e.is_closed() {
        return DbError::ConnectionClosed {
            message: e.to_string(),
        };
    }
    DbError::QueryFailed {
        message: e.as_db_error().map_or_else(|| e.to_string(), |db| db.to_string()),
    }
}

fn decode_row(row: &Row) -> Result<Vec<Value>, DbError> {
    (0..row.len()).map(|idx| decode_cell(row, idx)).collect()
}

fn decode_cell(row: &Row, idx: usize) -> Result<Value, DbError> {
    let column = &row.columns()[idx];
    let conversion = |e: postgres::Error| DbError::Conversion {
        column: column.name().to_string(),
        message: e.to_string(),
    };

    let ty = column.type_();
    let value: Value = if *ty == Type::INT2 {
        row.try_get::<_, Option<i16>>(idx)
            .map_err(conversion)?
            .map(i64::from)
            .into()
    } else if *ty == Type::INT4 {
        row.try_get::<_, Option<i32>>(idx)
            .map_err(conversion)?
            .map(i64::from)
            .into()
    } else if *ty == Type::INT8 {
        row.try_get::<_, Option<i64>>(idx).map_err(conversion)?.into()
    } else if *ty == Type::FLOAT4 {
        row.try_get::<_, Option<f32>>(idx)
            .map_err(conversion)?
            .map(f64::from)
            .into()
    } else if *ty == Type::FLOAT8 {
        row.try_get::<_, Option<f64>>(idx).map_err(conversion)?.into()
    } else if *ty == Type::TEXT || *ty == Type::VARCHAR || *ty == Type::BPCHAR || *ty == Type::NAME {
        row.try_get::<_, Option<String>>(idx)
            .map_err(conversion)?
            .into()
    } else {
        return Err(DbError::Conversion {
            column: column.name().to_string(),
            message: format!("unsupported column type '{}'", ty),
        });
    };
    Ok(value)
}
