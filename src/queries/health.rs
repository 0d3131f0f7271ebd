//! Connection health check.

use log::{error, info};

use super::QueryError;
use crate::db::{DatabaseBackend, DbError};

/// Query that any instance of the EPD should answer.
const HEALTH_QUERY: &str = "SELECT 1 FROM entity LIMIT 1";

/// Table probed by [`HEALTH_QUERY`].
const HEALTH_TABLE: &str = "entity";

/// Check the connection works by running a trivial query against `entity`.
///
/// A server without the `entity` table is reachable but unrestored and is
/// reported as [`QueryError::MissingTable`]. Any other failure is a
/// [`QueryError::Connectivity`].
pub fn check_connection(db: &mut dyn DatabaseBackend) -> Result<(), QueryError> {
    match db.execute_query_no_params(HEALTH_QUERY) {
        Ok(_) => {
            info!("Test query successfully run against EPD ({})", db.backend_name());
            Ok(())
        }
        Err(DbError::UndefinedTable { .. }) => {
            error!(
                "Table '{}' could not be found. Check EPD has been restored",
                HEALTH_TABLE
            );
            Err(QueryError::MissingTable {
                table: HEALTH_TABLE.to_string(),
            })
        }
        Err(source) => {
            error!("Could not connect to the EPD with the supplied connection: {}", source);
            Err(QueryError::Connectivity { source })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::StubBackend;
    use rstest::rstest;

    #[rstest]
    fn test_healthy_connection() {
        let mut db = StubBackend::with_epd_tables();
        assert!(check_connection(&mut db).is_ok());
        assert_eq!(db.executed[0].0, HEALTH_QUERY);
    }

    #[rstest]
    fn test_failure_is_connectivity_error() {
        let mut db = StubBackend::with_epd_tables().respond_err(DbError::ConnectionClosed {
            message: "connection reset".to_string(),
        });
        let err = check_connection(&mut db).unwrap_err();
        assert!(matches!(err, QueryError::Connectivity { .. }));
        assert!(err.to_string().contains("connection reset"));
    }

    #[rstest]
    fn test_unrestored_database_is_missing_table() {
        let mut db = StubBackend::with_tables(&[]).respond_err(DbError::UndefinedTable {
            message: "relation \"entity\" does not exist".to_string(),
        });
        let err = check_connection(&mut db).unwrap_err();
        assert!(matches!(err, QueryError::MissingTable { ref table } if table == "entity"));
        assert!(err.to_string().contains("Check the EPD has been restored"));
    }
}
