//! Process-wide convenience connection.
//!
//! [`define_connection`] connects once and stores the [`PgStats`] in a
//! mutex-guarded slot; every free function here forwards to it and fails
//! with `NotInitialized` until it has been defined. Concurrent definitions
//! connect once and share the instance. A failed definition leaves the slot
//! empty, so a later call may retry.

use std::sync::{Arc, Mutex, PoisonError};

use postgres::Client;
use tracing::debug;

use crate::config::ConnectionConfig;
use crate::error::{PgStatsError, Result};
use crate::stats::PgStats;
use crate::views::{
    ActivityRow, ArchiverRow, BgwriterRow, DatabaseConflictsRow, DatabaseRow, FunctionsRow,
    IndexesRow, IoIndexesRow, IoSequencesRow, IoTablesRow, ProgressVacuumRow, ReplicationRow,
    SslRow, StatementsRow, SubscriptionRow, TablesRow, WalReceiverRow, XactTablesRow,
};

/// One lazily filled instance slot.
pub(crate) struct Slot<H> {
    inner: Mutex<Option<Arc<PgStats<H>>>>,
}

impl<H> Slot<H> {
    pub(crate) const fn new() -> Self {
        Self {
            inner: Mutex::new(None),
        }
    }

    /// Returns the stored instance, running `connect` first if the slot is
    /// empty. `connect` runs under the slot lock.
    pub(crate) fn initialize_with(
        &self,
        connect: impl FnOnce() -> Result<PgStats<H>>,
    ) -> Result<Arc<PgStats<H>>> {
        let mut slot = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(stats) = slot.as_ref() {
            debug!("connection already defined");
            return Ok(Arc::clone(stats));
        }
        let stats = Arc::new(connect()?);
        *slot = Some(Arc::clone(&stats));
        Ok(stats)
    }

    pub(crate) fn get(&self) -> Result<Arc<PgStats<H>>> {
        let slot = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        slot.as_ref()
            .map(Arc::clone)
            .ok_or(PgStatsError::NotInitialized)
    }
}

static GLOBAL: Slot<Client> = Slot::new();

/// Defines the process-wide connection.
///
/// Once defined, later calls return the existing instance and ignore
/// `config`.
pub fn define_connection(config: &ConnectionConfig) -> Result<Arc<PgStats>> {
    GLOBAL.initialize_with(|| PgStats::connect(config))
}

/// The process-wide instance, or `NotInitialized`.
pub fn get() -> Result<Arc<PgStats>> {
    GLOBAL.get()
}

macro_rules! forward {
    ($( $(#[$meta:meta])* $name:ident -> $ret:ty; )*) => {
        $(
            $(#[$meta])*
            pub fn $name() -> Result<$ret> {
                get()?.$name()
            }
        )*
    };
}

forward! {
    /// See [`PgStats::pg_stat_activity`].
    pg_stat_activity -> Vec<ActivityRow>;
    pg_stat_replication -> Vec<ReplicationRow>;
    pg_stat_wal_receiver -> Option<WalReceiverRow>;
    pg_stat_subscription -> Vec<SubscriptionRow>;
    pg_stat_ssl -> Vec<SslRow>;
    pg_stat_progress_vacuum -> Vec<ProgressVacuumRow>;
    pg_stat_archiver -> ArchiverRow;
    pg_stat_bgwriter -> BgwriterRow;
    pg_stat_database -> Vec<DatabaseRow>;
    pg_stat_database_conflicts -> Vec<DatabaseConflictsRow>;
    pg_stat_all_tables -> Vec<TablesRow>;
    pg_stat_sys_tables -> Vec<TablesRow>;
    pg_stat_user_tables -> Vec<TablesRow>;
    pg_stat_xact_all_tables -> Vec<XactTablesRow>;
    pg_stat_xact_sys_tables -> Vec<XactTablesRow>;
    pg_stat_xact_user_tables -> Vec<XactTablesRow>;
    pg_stat_all_indexes -> Vec<IndexesRow>;
    pg_stat_sys_indexes -> Vec<IndexesRow>;
    pg_stat_user_indexes -> Vec<IndexesRow>;
    pg_statio_all_tables -> Vec<IoTablesRow>;
    pg_statio_sys_tables -> Vec<IoTablesRow>;
    pg_statio_user_tables -> Vec<IoTablesRow>;
    pg_statio_all_indexes -> Vec<IoIndexesRow>;
    pg_statio_sys_indexes -> Vec<IoIndexesRow>;
    pg_statio_user_indexes -> Vec<IoIndexesRow>;
    pg_statio_all_sequences -> Vec<IoSequencesRow>;
    pg_statio_sys_sequences -> Vec<IoSequencesRow>;
    pg_statio_user_sequences -> Vec<IoSequencesRow>;
    pg_stat_user_functions -> Vec<FunctionsRow>;
    pg_stat_xact_user_functions -> Vec<FunctionsRow>;
    /// See [`PgStats::pg_stat_statements`].
    pg_stat_statements -> Vec<StatementsRow>;
}
