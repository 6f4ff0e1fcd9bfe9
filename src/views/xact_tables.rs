//! pg_stat_xact_{all,sys,user}_tables fetcher.

use crate::error::Result;
use crate::handle::QueryHandle;
use crate::nullable::NullInt64;

use super::queries::build_stat_xact_tables_query;
use super::{Scope, fetch_rows};

stat_row! {
    /// Table access counters for the current transaction only.
    pub struct XactTablesRow {
        pub relid: i64,
        pub schemaname: String,
        pub relname: String,
        pub seq_scan: NullInt64,
        pub seq_tup_read: NullInt64,
        pub idx_scan: NullInt64,
        pub idx_tup_fetch: NullInt64,
        pub n_tup_ins: NullInt64,
        pub n_tup_upd: NullInt64,
        pub n_tup_del: NullInt64,
        pub n_tup_hot_upd: NullInt64,
    }
}

pub fn fetch<H: QueryHandle + ?Sized>(
    handle: &mut H,
    scope: Scope,
) -> Result<Vec<XactTablesRow>> {
    fetch_rows(
        handle,
        scope.xact_tables_relation(),
        &build_stat_xact_tables_query(scope),
    )
}
