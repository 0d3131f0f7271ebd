use std::error::Error;

use clap::Parser;
use log::{error, info};

use epd_extract::cli::Args;
use epd_extract::config::Config;
use epd_extract::db::{DatabaseCreds, PostgresBackend};
use epd_extract::extract::Extractor;
use epd_extract::logging;
use epd_extract::queries::{check_connection, QueryError, QueryRegistry};
use epd_extract::restore::{RestoreError, Restorer};

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    logging::init(&args.log_file, args.log_level)?;

    run(&args).inspect_err(|e| error!("{}", e))
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let config = Config::load(&args.config)?;
    info!(
        "Loaded {} queries and {} sites from {}",
        config.queries.len(),
        config.sites.len(),
        args.config.display()
    );

    if args.restore_epd {
        restore(args, &config.database)?;
    }

    let mut db = PostgresBackend::connect(&config.database)
        .map_err(|source| QueryError::Connectivity { source })?;
    check_connection(&mut db)?;

    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| config.output_dir.clone());
    let registry = QueryRegistry::default();
    let extractor = Extractor::new(&registry, output_dir, args.format);
    let written = extractor.run(&mut db, &config.queries, &config.site_ids())?;

    info!("Extraction complete: {} files written", written.len());
    Ok(())
}

fn restore(args: &Args, creds: &DatabaseCreds) -> Result<(), RestoreError> {
    let restorer = Restorer::new(creds.clone()).with_program(&args.psql);
    info!("Setting up database roles and schema...");
    restorer.restore_sql_dump(&args.setup_sql)?;
    info!("Restoring EPD...");
    restorer.restore_epd(&args.dump)?;
    Ok(())
}
