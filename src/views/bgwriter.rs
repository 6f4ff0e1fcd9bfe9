//! pg_stat_bgwriter fetcher.
//!
//! From 17 on the checkpoint counters live in pg_stat_checkpointer and the
//! backend buffer counters moved to pg_stat_io; the record keeps the old
//! shape with those two fields NULL.

use crate::error::Result;
use crate::handle::QueryHandle;
use crate::nullable::{NullFloat64, NullInt64, NullTime};
use crate::version::{ServerVersion, resolve_version};

use super::fetch_one;
use super::queries::build_stat_bgwriter_query;

pub const VIEW: &str = "pg_stat_bgwriter";

stat_row! {
    /// Background writer and checkpointer statistics.
    pub struct BgwriterRow {
        pub checkpoints_timed: NullInt64,
        pub checkpoints_req: NullInt64,
        /// Milliseconds.
        pub checkpoint_write_time: NullFloat64,
        /// Milliseconds.
        pub checkpoint_sync_time: NullFloat64,
        pub buffers_checkpoint: NullInt64,
        pub buffers_clean: NullInt64,
        pub maxwritten_clean: NullInt64,
        pub buffers_backend: NullInt64,
        pub buffers_backend_fsync: NullInt64,
        pub buffers_alloc: NullInt64,
        pub stats_reset: NullTime,
    }
}

pub fn fetch<H: QueryHandle + ?Sized>(handle: &mut H) -> Result<BgwriterRow> {
    let version = resolve_version(handle)?;
    fetch_for(handle, version)
}

pub fn fetch_for<H: QueryHandle + ?Sized>(
    handle: &mut H,
    version: ServerVersion,
) -> Result<BgwriterRow> {
    fetch_one(handle, VIEW, &build_stat_bgwriter_query(version))
}
