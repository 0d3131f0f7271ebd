//! Delimited output for query results.
//!
//! Supports comma- and tab-separated files. Key columns come first, then the
//! remaining columns in projection order; missing values are empty fields.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use clap::ValueEnum;
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::db::{ColumnType, Value};
use crate::types::{Table, TableError};

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Delimited format error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Malformed table: {0}")]
    Malformed(#[from] TableError),
}

/// Output format for query results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Comma-separated values
    #[default]
    Csv,
    /// Tab-separated values
    Tsv,
}

impl OutputFormat {
    pub fn delimiter(self) -> u8 {
        match self {
            OutputFormat::Csv => b',',
            OutputFormat::Tsv => b'\t',
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Tsv => "tsv",
        }
    }
}

/// Write a table to any writer.
pub fn write_table<W: Write>(table: &Table, writer: W, format: OutputFormat) -> Result<(), OutputError> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(format.delimiter())
        .from_writer(writer);

    let order = table.output_order();
    wtr.write_record(order.iter().map(|&i| table.columns()[i].as_str()))?;
    for row in table.rows() {
        wtr.write_record(order.iter().map(|&i| row[i].to_string()))?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Write a table to `path`, replacing it only once the whole file is written.
///
/// The data goes to a temporary file in the same directory which is renamed
/// into place on success; on failure no partial file is left behind.
pub fn write_table_file(table: &Table, path: &Path, format: OutputFormat) -> Result<(), OutputError> {
    let io_err = |source: io::Error| OutputError::Io {
        path: path.display().to_string(),
        source,
    };
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    write_table(table, tmp.as_file_mut(), format)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}

/// Read a table written by [`write_table`].
///
/// Columns named in `types` are parsed as that type, so text columns keep
/// numeric-looking values such as `"0123"` intact. Other columns have their
/// cell types inferred from the text. The first `key_len` columns are taken
/// as the identifying key.
pub fn read_table<R: Read>(
    reader: R,
    format: OutputFormat,
    key_len: usize,
    types: &[(&str, ColumnType)],
) -> Result<Table, OutputError> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(format.delimiter())
        .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    let column_types: Vec<Option<ColumnType>> = headers
        .iter()
        .map(|h| types.iter().find(|(name, _)| name == h).map(|&(_, ty)| ty))
        .collect();
    let parse = |(field, ty): (&str, &Option<ColumnType>)| match ty {
        Some(ty) => Value::parse_typed(field, *ty),
        None => Value::parse_field(field),
    };
    let rows = rdr
        .records()
        .map(|record| record.map(|r| r.iter().zip(&column_types).map(parse).collect()))
        .collect::<Result<Vec<Vec<Value>>, _>>()?;

    let key: Vec<String> = headers.iter().take(key_len).cloned().collect();
    let key: Vec<&str> = key.iter().map(String::as_str).collect();
    Ok(Table::new(headers, rows)?.with_key(&key)?)
}

/// Read a table from a file written by [`write_table_file`].
pub fn read_table_file(
    path: &Path,
    format: OutputFormat,
    key_len: usize,
    types: &[(&str, ColumnType)],
) -> Result<Table, OutputError> {
    let file = File::open(path).map_err(|source| OutputError::Io {
        path: path.display().to_string(),
        source,
    })?;
    read_table(file, format, key_len, types)
}
