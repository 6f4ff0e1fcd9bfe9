//! pg_stat_replication fetcher.

use crate::error::Result;
use crate::handle::QueryHandle;
use crate::nullable::{NullFloat64, NullInt64, NullString, NullTime};
use crate::version::{ServerVersion, resolve_version};

use super::fetch_rows;
use super::queries::build_stat_replication_query;

pub const VIEW: &str = "pg_stat_replication";

stat_row! {
    /// One WAL sender process.
    ///
    /// LSNs are byte positions. Lags are seconds and only reported from 10 on.
    pub struct ReplicationRow {
        pub pid: i64,
        pub usesysid: NullInt64,
        pub usename: NullString,
        pub application_name: NullString,
        pub client_addr: NullString,
        pub client_hostname: NullString,
        pub client_port: NullInt64,
        pub backend_start: NullTime,
        pub backend_xmin: NullInt64,
        pub state: NullString,
        pub sent_lsn: NullInt64,
        pub write_lsn: NullInt64,
        pub flush_lsn: NullInt64,
        pub replay_lsn: NullInt64,
        pub write_lag: NullFloat64,
        pub flush_lag: NullFloat64,
        pub replay_lag: NullFloat64,
        pub sync_priority: NullInt64,
        pub sync_state: NullString,
    }
}

pub fn fetch<H: QueryHandle + ?Sized>(handle: &mut H) -> Result<Vec<ReplicationRow>> {
    let version = resolve_version(handle)?;
    fetch_for(handle, version)
}

pub fn fetch_for<H: QueryHandle + ?Sized>(
    handle: &mut H,
    version: ServerVersion,
) -> Result<Vec<ReplicationRow>> {
    fetch_rows(handle, VIEW, &build_stat_replication_query(version))
}
