//! CLI argument definitions.

use std::path::PathBuf;
use std::str::FromStr;

use clap::Parser;
use log::LevelFilter;

use crate::output::OutputFormat;

fn validate_file_exists(s: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(s);
    if path.exists() {
        Ok(path)
    } else {
        Err(format!("File not found: {}", path.display()))
    }
}

fn parse_log_level(s: &str) -> Result<LevelFilter, String> {
    LevelFilter::from_str(s).map_err(|_| {
        format!(
            "Unknown log level '{}' (expected off, error, warn, info, debug or trace)",
            s
        )
    })
}

/// Extract site data from the European Pollen Database
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(after_help = "\
Examples:
  epd_extract                          # Extract from an already restored EPD
  epd_extract --restore-epd            # Restore the EPD dump first, then extract
  epd_extract --format tsv -o results  # Tab-separated files under results/")]
pub struct Args {
    /// Restore the EPD from its SQL dump before extracting
    #[arg(long, default_value_t = false)]
    pub restore_epd: bool,

    /// Configuration file listing queries and sites
    #[arg(short, long, default_value = "config/config.yml", value_parser = validate_file_exists)]
    pub config: PathBuf,

    /// Output directory (overrides the configuration file)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Output file format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Csv)]
    pub format: OutputFormat,

    /// SQL script creating roles and databases, run before the dump
    #[arg(long, default_value = "data/db_setup.sql")]
    pub setup_sql: PathBuf,

    /// EPD SQL dump, plain or gzip-compressed
    #[arg(long, default_value = "data/dumpall_epd_db.sql.gz")]
    pub dump: PathBuf,

    /// Program used to load SQL files
    #[arg(long, default_value = "psql")]
    pub psql: String,

    /// Log file
    #[arg(long, default_value = "logs/epd_extract.log")]
    pub log_file: PathBuf,

    /// Log level for the log file
    #[arg(long, default_value = "info", value_parser = parse_log_level)]
    pub log_level: LevelFilter,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::NamedTempFile;

    crate::cli_defaults_test! {
        required_args: [],
        defaults: {
            restore_epd: false,
            config: PathBuf::from("config/config.yml"),
            output_dir: None,
            format: OutputFormat::Csv,
            setup_sql: PathBuf::from("data/db_setup.sql"),
            dump: PathBuf::from("data/dumpall_epd_db.sql.gz"),
            psql: "psql",
            log_file: PathBuf::from("logs/epd_extract.log"),
            log_level: LevelFilter::Info,
        },
    }

    crate::cli_option_test! {
        test_name: test_restore_flag,
        args: ["--restore-epd"],
        field: restore_epd,
        expected: true,
    }

    crate::cli_option_test! {
        test_name: test_tsv_format,
        args: ["--format", "tsv"],
        field: format,
        expected: OutputFormat::Tsv,
    }

    crate::cli_option_test! {
        test_name: test_output_dir_override,
        args: ["-o", "results"],
        field: output_dir,
        expected: Some(PathBuf::from("results")),
    }

    crate::cli_option_test! {
        test_name: test_psql_program,
        args: ["--psql", "/usr/lib/postgresql/16/bin/psql"],
        field: psql,
        expected: "/usr/lib/postgresql/16/bin/psql",
    }

    crate::cli_option_test! {
        test_name: test_log_level,
        args: ["--log-level", "debug"],
        field: log_level,
        expected: LevelFilter::Debug,
    }

    crate::cli_error_test! {
        test_name: test_unknown_format_rejected,
        args: ["--format", "xlsx"],
    }

    crate::cli_error_test! {
        test_name: test_unknown_log_level_rejected,
        args: ["--log-level", "loud"],
    }

    #[rstest]
    fn test_config_must_exist() {
        let result = Args::try_parse_from(["epd_extract", "--config", "no/such/config.yml"]);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("File not found"));
    }

    #[rstest]
    fn test_explicit_config() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_str().unwrap();
        let args = Args::try_parse_from(["epd_extract", "--config", path]).unwrap();
        assert_eq!(args.config, file.path());
    }
}
