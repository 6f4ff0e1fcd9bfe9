//! pg_stat_{all,sys,user}_indexes fetcher.

use crate::error::Result;
use crate::handle::QueryHandle;
use crate::nullable::NullInt64;

use super::queries::build_stat_indexes_query;
use super::{Scope, fetch_rows};

stat_row! {
    /// Access statistics for one index.
    pub struct IndexesRow {
        pub relid: i64,
        pub indexrelid: i64,
        pub schemaname: String,
        pub relname: String,
        pub indexrelname: String,
        pub idx_scan: NullInt64,
        pub idx_tup_read: NullInt64,
        pub idx_tup_fetch: NullInt64,
    }
}

pub fn fetch<H: QueryHandle + ?Sized>(handle: &mut H, scope: Scope) -> Result<Vec<IndexesRow>> {
    fetch_rows(handle, scope.indexes_relation(), &build_stat_indexes_query(scope))
}
