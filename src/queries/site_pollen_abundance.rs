//! Pollen abundance time series for study sites.
//!
//! One row per (site, core, sample, variable), dated by the default
//! chronology of each core.

use log::info;

use super::builder::{col, Select};
use super::{run_select, QueryError, SiteIds};
use crate::db::{ColumnType, DatabaseBackend};
use crate::types::Table;

/// Identifying key of the abundance table.
pub const ABUNDANCE_KEY: &[&str] = &["sitename", "sigle", "sample_", "varcode"];

/// Flag value marking the default chronology of an entity.
const DEFAULT_CHRON: &str = "Y";

/// Select for [`site_pollen_abundance`].
///
/// Samples are anchored to their age-depth estimate and only rows from the
/// chronology flagged default survive. The chronology join is inner, so
/// entities without a default chronology contribute nothing.
pub fn site_pollen_abundance_select(sites: &SiteIds) -> Select {
    Select::from("p_counts")
        .column(col("p_agedpt", "agebp"), ColumnType::Float)
        .column(col("p_counts", "count"), ColumnType::Float)
        .column(col("p_vars", "varcode"), ColumnType::Text)
        .column(col("p_vars", "varname"), ColumnType::Text)
        .column(col("siteloc", "sitename"), ColumnType::Text)
        .column(col("entity", "site_"), ColumnType::Int)
        .column(col("entity", "e_"), ColumnType::Int)
        .column(col("entity", "sigle"), ColumnType::Text)
        .column(col("p_counts", "sample_"), ColumnType::Int)
        .column(col("chron", "chron_"), ColumnType::Int)
        .column(col("p_counts", "var_"), ColumnType::Int)
        .join("entity", &[(col("p_counts", "e_"), col("entity", "e_"))])
        .join(
            "p_agedpt",
            &[
                (col("p_counts", "e_"), col("p_agedpt", "e_")),
                (col("p_counts", "sample_"), col("p_agedpt", "sample_")),
            ],
        )
        .join(
            "chron",
            &[
                (col("p_agedpt", "e_"), col("chron", "e_")),
                (col("p_agedpt", "chron_"), col("chron", "chron_")),
            ],
        )
        .join("p_vars", &[(col("p_counts", "var_"), col("p_vars", "var_"))])
        .join("siteloc", &[(col("entity", "site_"), col("siteloc", "site_"))])
        .filter_in(col("entity", "site_"), sites.iter())
        .filter_eq(col("chron", "defaultchron"), DEFAULT_CHRON)
        .order_by(ABUNDANCE_KEY)
}

/// Pollen counts for every sample of every core at the given sites.
///
/// Key columns:
/// - `sitename`: name of site where the core was collected
/// - `sigle`: code identifying the sediment core within its site
/// - `sample_`: sample extracted from the core
/// - `varcode`: pollen taxon code
///
/// Value columns:
/// - `agebp`: age BP of the sample according to the default chronology
/// - `count`: number of `varcode` grains in the sample; missing stays missing
/// - `varname`: taxon name for `varcode`
/// - `site_`, `e_`, `chron_`, `var_`: site, entity, chronology and variable
///   numbers (primary keys of their EPD tables)
///
/// Fails with [`QueryError::Integrity`] if any key repeats, which happens when
/// an entity has more than one default chronology or a join fans out.
pub fn site_pollen_abundance(
    db: &mut dyn DatabaseBackend,
    sites: &SiteIds,
) -> Result<Table, QueryError> {
    let table = run_select(db, &site_pollen_abundance_select(sites), ABUNDANCE_KEY)?;
    info!(
        "site_pollen_abundance: {} rows for {} requested sites",
        table.len(),
        sites.len()
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{DbError, SqlParam, Value};
    use crate::queries::builder::QueryBuilder;
    use crate::test_utils::{abundance_row, StubBackend};
    use crate::types::TableError;
    use rstest::rstest;

    #[rstest]
    fn test_projection_order() {
        let select = site_pollen_abundance_select(&SiteIds::new([1]));
        assert_eq!(
            select.output_columns(),
            vec![
                "agebp", "count", "varcode", "varname", "sitename", "site_", "e_", "sigle",
                "sample_", "chron_", "var_"
            ]
        );
    }

    #[rstest]
    fn test_reads_all_abundance_tables() {
        let select = site_pollen_abundance_select(&SiteIds::new([1]));
        assert_eq!(
            select.tables(),
            vec!["p_counts", "entity", "p_agedpt", "chron", "p_vars", "siteloc"]
        );
    }

    #[rstest]
    fn test_default_chronology_filter_and_joins() {
        let sql = site_pollen_abundance_select(&SiteIds::new([2, 1])).compile();

        assert!(sql.contains("\nFROM p_counts\n"));
        assert!(sql.contains("JOIN entity ON p_counts.e_ = entity.e_"));
        assert!(sql.contains(
            "JOIN p_agedpt ON p_counts.e_ = p_agedpt.e_ AND p_counts.sample_ = p_agedpt.sample_"
        ));
        assert!(sql.contains(
            "JOIN chron ON p_agedpt.e_ = chron.e_ AND p_agedpt.chron_ = chron.chron_"
        ));
        assert!(sql.contains("JOIN p_vars ON p_counts.var_ = p_vars.var_"));
        assert!(sql.contains("JOIN siteloc ON entity.site_ = siteloc.site_"));
        assert!(sql.contains("entity.site_ = ANY($1::int4[])"));
        assert!(sql.contains("chron.defaultchron = 'Y'"));
        assert!(sql.ends_with("ORDER BY \"sitename\", \"sigle\", \"sample_\", \"varcode\""));
    }

    #[rstest]
    fn test_site_set_bound_once() {
        let select = site_pollen_abundance_select(&SiteIds::new([761, 44, 761]));
        assert_eq!(select.parameters(), vec![SqlParam::IntArray(vec![44, 761])]);
    }

    #[rstest]
    fn test_one_row_per_variable() {
        let mut db = StubBackend::with_epd_tables().respond_abundance(vec![
            abundance_row("Alpha", "ALP1", 1, "QUE", Some(12.0)),
            abundance_row("Alpha", "ALP1", 1, "PIN", Some(3.0)),
        ]);

        let table = site_pollen_abundance(&mut db, &SiteIds::new([1])).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.key_columns(), ABUNDANCE_KEY.to_vec());
        for sitename in table.column("sitename").unwrap() {
            assert_eq!(sitename, &Value::from("Alpha"));
        }
    }

    #[rstest]
    fn test_missing_count_is_not_zero() {
        let mut db = StubBackend::with_epd_tables().respond_abundance(vec![
            abundance_row("Alpha", "ALP1", 1, "QUE", None),
            abundance_row("Alpha", "ALP1", 1, "PIN", Some(0.0)),
        ]);

        let table = site_pollen_abundance(&mut db, &SiteIds::new([1])).unwrap();
        assert_eq!(table.get(0, "count"), Some(&Value::Missing));
        assert_eq!(table.get(1, "count"), Some(&Value::Float(0.0)));
    }

    #[rstest]
    fn test_two_default_chronologies_fail_loudly() {
        // Same sample joined to two chronologies both flagged default
        let mut first = abundance_row("Alpha", "ALP1", 1, "QUE", Some(12.0));
        let mut second = first.clone();
        first[9] = Value::Int(1);
        second[9] = Value::Int(2);
        let mut db = StubBackend::with_epd_tables().respond_abundance(vec![first, second]);

        let err = site_pollen_abundance(&mut db, &SiteIds::new([1])).unwrap_err();
        match err {
            QueryError::Integrity(TableError::DuplicateKey { key, occurrences, .. }) => {
                assert_eq!(key, "Alpha, ALP1, 1, QUE");
                assert_eq!(occurrences, 2);
            }
            other => panic!("Expected duplicate key, got {:?}", other),
        }
    }

    #[rstest]
    fn test_unrestored_database_reports_missing_table() {
        let mut db = StubBackend::with_tables(&["p_counts", "entity"]);
        let err = site_pollen_abundance(&mut db, &SiteIds::new([1])).unwrap_err();
        assert!(matches!(err, QueryError::MissingTable { table } if table == "p_agedpt"));
    }

    #[rstest]
    fn test_undefined_table_during_execution() {
        let mut db = StubBackend::with_epd_tables().respond_err(DbError::UndefinedTable {
            message: "db error: ERROR: relation \"p_vars\" does not exist".to_string(),
        });
        let err = site_pollen_abundance(&mut db, &SiteIds::new([1])).unwrap_err();
        assert!(matches!(err, QueryError::MissingTable { table } if table == "p_vars"));
    }
}
