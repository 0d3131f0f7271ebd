//! Location information for study sites.

use log::info;

use super::builder::{col, Select};
use super::{run_select, QueryError, SiteIds};
use crate::db::{ColumnType, DatabaseBackend};
use crate::types::Table;

/// Identifying key of the site location table.
pub const SITE_LOC_KEY: &[&str] = &["sitename"];

/// Select for [`site_loc_info`].
pub fn site_loc_info_select(sites: &SiteIds) -> Select {
    Select::from("siteloc")
        .column(col("siteloc", "sitename"), ColumnType::Text)
        .column(col("siteloc", "latdd"), ColumnType::Float)
        .column(col("siteloc", "londd"), ColumnType::Float)
        .column(col("siteloc", "elevation"), ColumnType::Float)
        .column(col("siteloc", "site_"), ColumnType::Int)
        .filter_in(col("siteloc", "site_"), sites.iter())
        .order_by(SITE_LOC_KEY)
}

/// Location information for the given sites, keyed by site name.
///
/// Columns:
/// - `sitename` (key): name of the site where cores were collected
/// - `latdd`, `londd`: decimal latitude and longitude
/// - `elevation`: elevation above sea level, may be missing
/// - `site_`: site number, primary key of `siteloc`
///
/// Site numbers absent from the database are silently omitted.
pub fn site_loc_info(db: &mut dyn DatabaseBackend, sites: &SiteIds) -> Result<Table, QueryError> {
    let table = run_select(db, &site_loc_info_select(sites), SITE_LOC_KEY)?;
    info!(
        "site_loc_info: {} of {} requested sites found",
        table.len(),
        sites.len()
    );
    Ok(table)
}
