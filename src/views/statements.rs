//! pg_stat_statements fetcher.
//!
//! Requires the pg_stat_statements extension in the connected database;
//! without it the query fails with a `Query` error.

use crate::error::Result;
use crate::handle::QueryHandle;
use crate::nullable::{NullInt64, NullString};
use crate::version::{ServerVersion, resolve_version};

use super::fetch_rows;
use super::queries::build_stat_statements_query;

pub const VIEW: &str = "pg_stat_statements";

stat_row! {
    /// Execution statistics of one normalized statement.
    ///
    /// Times are milliseconds. From 13 on the `*_time` fields carry the
    /// `*_exec_time` columns, from 17 on the block times carry
    /// `shared_blk_*_time`.
    pub struct StatementsRow {
        pub userid: i64,
        pub dbid: i64,
        /// NULL for other users' statements without pg_read_all_stats.
        pub queryid: NullInt64,
        pub query: NullString,
        pub calls: i64,
        pub total_time: f64,
        pub min_time: f64,
        pub max_time: f64,
        pub mean_time: f64,
        pub stddev_time: f64,
        pub rows: i64,
        pub shared_blks_hit: i64,
        pub shared_blks_read: i64,
        pub shared_blks_dirtied: i64,
        pub shared_blks_written: i64,
        pub local_blks_hit: i64,
        pub local_blks_read: i64,
        pub local_blks_dirtied: i64,
        pub local_blks_written: i64,
        pub temp_blks_read: i64,
        pub temp_blks_written: i64,
        pub blk_read_time: f64,
        pub blk_write_time: f64,
    }
}

pub fn fetch<H: QueryHandle + ?Sized>(handle: &mut H) -> Result<Vec<StatementsRow>> {
    let version = resolve_version(handle)?;
    fetch_for(handle, version)
}

pub fn fetch_for<H: QueryHandle + ?Sized>(
    handle: &mut H,
    version: ServerVersion,
) -> Result<Vec<StatementsRow>> {
    fetch_rows(handle, VIEW, &build_stat_statements_query(version))
}
