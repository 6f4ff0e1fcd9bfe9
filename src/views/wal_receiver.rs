//! pg_stat_wal_receiver fetcher (PG 9.6+).

use crate::error::Result;
use crate::handle::QueryHandle;
use crate::nullable::{NullInt64, NullString, NullTime};
use crate::version::{ServerVersion, resolve_version};

use super::fetch_optional;
use super::queries::build_stat_wal_receiver_query;

pub const VIEW: &str = "pg_stat_wal_receiver";

stat_row! {
    /// State of the WAL receiver on a standby.
    pub struct WalReceiverRow {
        pub pid: i64,
        pub status: String,
        pub receive_start_lsn: NullInt64,
        pub receive_start_tli: NullInt64,
        /// Last position flushed to disk (`flushed_lsn` from 13 on).
        pub received_lsn: NullInt64,
        pub received_tli: NullInt64,
        pub last_msg_send_time: NullTime,
        pub last_msg_receipt_time: NullTime,
        pub latest_end_lsn: NullInt64,
        pub latest_end_time: NullTime,
        pub slot_name: NullString,
        /// Since 11.
        pub sender_host: NullString,
        /// Since 11.
        pub sender_port: NullInt64,
        pub conninfo: NullString,
    }
}

/// Fetches the WAL receiver state.
///
/// Returns `Ok(None)` when no receiver is running, which is the normal
/// state of a primary.
pub fn fetch<H: QueryHandle + ?Sized>(handle: &mut H) -> Result<Option<WalReceiverRow>> {
    let version = resolve_version(handle)?;
    fetch_for(handle, version)
}

pub fn fetch_for<H: QueryHandle + ?Sized>(
    handle: &mut H,
    version: ServerVersion,
) -> Result<Option<WalReceiverRow>> {
    version.require(VIEW, ServerVersion::V9_6)?;
    fetch_optional(handle, VIEW, &build_stat_wal_receiver_query(version))
}
