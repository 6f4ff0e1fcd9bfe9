//! pg_stat_archiver fetcher.

use crate::error::Result;
use crate::handle::QueryHandle;
use crate::nullable::{NullInt64, NullString, NullTime};

use super::fetch_one;
use super::queries::build_stat_archiver_query;

pub const VIEW: &str = "pg_stat_archiver";

stat_row! {
    /// WAL archiver statistics. The view always has exactly one row.
    pub struct ArchiverRow {
        pub archived_count: NullInt64,
        pub last_archived_wal: NullString,
        pub last_archived_time: NullTime,
        pub failed_count: NullInt64,
        pub last_failed_wal: NullString,
        pub last_failed_time: NullTime,
        pub stats_reset: NullTime,
    }
}

pub fn fetch<H: QueryHandle + ?Sized>(handle: &mut H) -> Result<ArchiverRow> {
    fetch_one(handle, VIEW, build_stat_archiver_query())
}
