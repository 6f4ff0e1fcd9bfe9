//! pg_stat_progress_vacuum fetcher (PG 9.6+).

use crate::error::Result;
use crate::handle::QueryHandle;
use crate::nullable::NullInt64;
use crate::version::{ServerVersion, resolve_version};

use super::fetch_rows;
use super::queries::build_stat_progress_vacuum_query;

pub const VIEW: &str = "pg_stat_progress_vacuum";

stat_row! {
    /// One running VACUUM.
    ///
    /// From 17 on `max_dead_tuples` and `num_dead_tuples` carry
    /// `max_dead_tuple_bytes` and `num_dead_item_ids`.
    pub struct ProgressVacuumRow {
        pub pid: i64,
        pub datid: i64,
        pub datname: String,
        pub relid: i64,
        pub phase: String,
        pub heap_blks_total: NullInt64,
        pub heap_blks_scanned: NullInt64,
        pub heap_blks_vacuumed: NullInt64,
        pub index_vacuum_count: NullInt64,
        pub max_dead_tuples: NullInt64,
        pub num_dead_tuples: NullInt64,
        pub dead_tuple_bytes: NullInt64,
        pub indexes_total: NullInt64,
        pub indexes_processed: NullInt64,
    }
}

pub fn fetch<H: QueryHandle + ?Sized>(handle: &mut H) -> Result<Vec<ProgressVacuumRow>> {
    let version = resolve_version(handle)?;
    fetch_for(handle, version)
}

pub fn fetch_for<H: QueryHandle + ?Sized>(
    handle: &mut H,
    version: ServerVersion,
) -> Result<Vec<ProgressVacuumRow>> {
    version.require(VIEW, ServerVersion::V9_6)?;
    fetch_rows(handle, VIEW, &build_stat_progress_vacuum_query(version))
}
