//! pg_stat_database fetcher.

use crate::error::Result;
use crate::handle::QueryHandle;
use crate::nullable::{NullFloat64, NullInt64, NullString, NullTime};
use crate::version::{ServerVersion, resolve_version};

use super::fetch_rows;
use super::queries::build_stat_database_query;

pub const VIEW: &str = "pg_stat_database";

stat_row! {
    /// Per-database statistics.
    ///
    /// From 12 on the view also has a row for shared objects with datid 0
    /// and a NULL datname.
    pub struct DatabaseRow {
        pub datid: i64,
        pub datname: NullString,
        pub numbackends: i64,
        pub xact_commit: NullInt64,
        pub xact_rollback: NullInt64,
        pub blks_read: NullInt64,
        pub blks_hit: NullInt64,
        pub tup_returned: NullInt64,
        pub tup_fetched: NullInt64,
        pub tup_inserted: NullInt64,
        pub tup_updated: NullInt64,
        pub tup_deleted: NullInt64,
        pub conflicts: NullInt64,
        pub temp_files: NullInt64,
        pub temp_bytes: NullInt64,
        pub deadlocks: NullInt64,
        /// Since 12; NULL when data checksums are disabled.
        pub checksum_failures: NullInt64,
        pub checksum_last_failure: NullTime,
        pub blk_read_time: NullFloat64,
        pub blk_write_time: NullFloat64,
        // session accounting, since 14
        pub session_time: NullFloat64,
        pub active_time: NullFloat64,
        pub idle_in_transaction_time: NullFloat64,
        pub sessions: NullInt64,
        pub sessions_abandoned: NullInt64,
        pub sessions_fatal: NullInt64,
        pub sessions_killed: NullInt64,
        pub stats_reset: NullTime,
    }
}

pub fn fetch<H: QueryHandle + ?Sized>(handle: &mut H) -> Result<Vec<DatabaseRow>> {
    let version = resolve_version(handle)?;
    fetch_for(handle, version)
}

pub fn fetch_for<H: QueryHandle + ?Sized>(
    handle: &mut H,
    version: ServerVersion,
) -> Result<Vec<DatabaseRow>> {
    fetch_rows(handle, VIEW, &build_stat_database_query(version))
}
