//! pg_stat_database_conflicts fetcher.

use crate::error::Result;
use crate::handle::QueryHandle;
use crate::nullable::NullInt64;
use crate::version::{ServerVersion, resolve_version};

use super::fetch_rows;
use super::queries::build_stat_database_conflicts_query;

pub const VIEW: &str = "pg_stat_database_conflicts";

stat_row! {
    /// Queries canceled on a standby due to recovery conflicts, per database.
    pub struct DatabaseConflictsRow {
        pub datid: i64,
        pub datname: String,
        pub confl_tablespace: NullInt64,
        pub confl_lock: NullInt64,
        pub confl_snapshot: NullInt64,
        pub confl_bufferpin: NullInt64,
        pub confl_deadlock: NullInt64,
        /// Since 16.
        pub confl_active_logicalslot: NullInt64,
    }
}

pub fn fetch<H: QueryHandle + ?Sized>(handle: &mut H) -> Result<Vec<DatabaseConflictsRow>> {
    let version = resolve_version(handle)?;
    fetch_for(handle, version)
}

pub fn fetch_for<H: QueryHandle + ?Sized>(
    handle: &mut H,
    version: ServerVersion,
) -> Result<Vec<DatabaseConflictsRow>> {
    fetch_rows(handle, VIEW, &build_stat_database_conflicts_query(version))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockHandle, MockRow};

    #[test]
    fn reads_counters() {
        let row = MockRow::nulls(8)
            .set(0, 16384i64)
            .set(1, "app")
            .set(3, 4i64)
            .set(7, 1i64);
        let mut handle = MockHandle::new("16.0").with_rows(VIEW, vec![row]);
        let rows = fetch(&mut handle).unwrap();
        assert_eq!(rows[0].confl_lock, NullInt64::new(4));
        assert_eq!(rows[0].confl_active_logicalslot, NullInt64::new(1));
        assert!(!handle.executed()[1].contains("NULL::bigint"));
    }

    #[test]
    fn logical_slot_column_null_before_16() {
        let row = MockRow::nulls(8).set(0, 1i64).set(1, "postgres");
        let mut handle = MockHandle::new("15.4").with_rows(VIEW, vec![row]);
        let rows = fetch(&mut handle).unwrap();
        assert!(!rows[0].confl_active_logicalslot.is_valid());
    }
}
