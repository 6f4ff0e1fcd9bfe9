//! pg_stat_{all,sys,user}_tables fetcher.

use crate::error::Result;
use crate::handle::QueryHandle;
use crate::nullable::{NullInt64, NullTime};

use super::queries::build_stat_tables_query;
use super::{Scope, fetch_rows};

stat_row! {
    /// Access statistics for one table.
    pub struct TablesRow {
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
        pub n_live_tup: NullInt64,
        pub n_dead_tup: NullInt64,
        pub n_mod_since_analyze: NullInt64,
        pub last_vacuum: NullTime,
        pub last_autovacuum: NullTime,
        pub last_analyze: NullTime,
        pub last_autoanalyze: NullTime,
        pub vacuum_count: NullInt64,
        pub autovacuum_count: NullInt64,
        pub analyze_count: NullInt64,
        pub autoanalyze_count: NullInt64,
    }
}

pub fn fetch<H: QueryHandle + ?Sized>(handle: &mut H, scope: Scope) -> Result<Vec<TablesRow>> {
    fetch_rows(handle, scope.tables_relation(), &build_stat_tables_query(scope))
}
