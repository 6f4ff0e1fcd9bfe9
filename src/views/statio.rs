//! pg_statio_* fetchers: block I/O for tables, indexes and sequences.

use crate::error::Result;
use crate::handle::QueryHandle;
use crate::nullable::NullInt64;

use super::queries::{
    build_statio_indexes_query, build_statio_sequences_query, build_statio_tables_query,
};
use super::{Scope, fetch_rows};

stat_row! {
    /// Block I/O of one table, its TOAST table and their indexes.
    pub struct IoTablesRow {
        pub relid: i64,
        pub schemaname: String,
        pub relname: String,
        pub heap_blks_read: NullInt64,
        pub heap_blks_hit: NullInt64,
        pub idx_blks_read: NullInt64,
        pub idx_blks_hit: NullInt64,
        pub toast_blks_read: NullInt64,
        pub toast_blks_hit: NullInt64,
        pub tidx_blks_read: NullInt64,
        pub tidx_blks_hit: NullInt64,
    }
}

stat_row! {
    pub struct IoIndexesRow {
        pub relid: i64,
        pub indexrelid: i64,
        pub schemaname: String,
        pub relname: String,
        pub indexrelname: String,
        pub idx_blks_read: NullInt64,
        pub idx_blks_hit: NullInt64,
    }
}

stat_row! {
    pub struct IoSequencesRow {
        pub relid: i64,
        pub schemaname: String,
        pub relname: String,
        pub blks_read: NullInt64,
        pub blks_hit: NullInt64,
    }
}

pub fn fetch_tables<H: QueryHandle + ?Sized>(
    handle: &mut H,
    scope: Scope,
) -> Result<Vec<IoTablesRow>> {
    fetch_rows(handle, scope.io_tables_relation(), &build_statio_tables_query(scope))
}

pub fn fetch_indexes<H: QueryHandle + ?Sized>(
    handle: &mut H,
    scope: Scope,
) -> Result<Vec<IoIndexesRow>> {
    fetch_rows(handle, scope.io_indexes_relation(), &build_statio_indexes_query(scope))
}

pub fn fetch_sequences<H: QueryHandle + ?Sized>(
    handle: &mut H,
    scope: Scope,
) -> Result<Vec<IoSequencesRow>> {
    fetch_rows(
        handle,
        scope.io_sequences_relation(),
        &build_statio_sequences_query(scope),
    )
}
