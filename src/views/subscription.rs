//! pg_stat_subscription fetcher (PG 10+).

use crate::error::Result;
use crate::handle::QueryHandle;
use crate::nullable::{NullInt64, NullString, NullTime};
use crate::version::{ServerVersion, resolve_version};

use super::fetch_rows;
use super::queries::build_stat_subscription_query;

pub const VIEW: &str = "pg_stat_subscription";

stat_row! {
    /// A subscription worker. The main worker has a NULL `relid`, a stopped
    /// worker a NULL `pid`.
    pub struct SubscriptionRow {
        pub subid: NullInt64,
        pub subname: NullString,
        pub pid: NullInt64,
        pub relid: NullInt64,
        pub received_lsn: NullInt64,
        pub last_msg_send_time: NullTime,
        pub last_msg_receipt_time: NullTime,
        pub latest_end_lsn: NullInt64,
        pub latest_end_time: NullTime,
    }
}

pub fn fetch<H: QueryHandle + ?Sized>(handle: &mut H) -> Result<Vec<SubscriptionRow>> {
    let version = resolve_version(handle)?;
    fetch_for(handle, version)
}

pub fn fetch_for<H: QueryHandle + ?Sized>(
    handle: &mut H,
    version: ServerVersion,
) -> Result<Vec<SubscriptionRow>> {
    version.require(VIEW, ServerVersion::V10)?;
    fetch_rows(handle, VIEW, build_stat_subscription_query())
}
