//! Caller-owned statistics context.
//!
//! [`PgStats`] owns one query handle behind a mutex, so a single instance
//! can be shared between threads (`Arc<PgStats>`). Each accessor locks the
//! handle for the duration of its fetch, including the version query of
//! version-sensitive views.

use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use postgres::{Client, NoTls};
use tracing::{debug, info};

use crate::config::ConnectionConfig;
use crate::error::{PgStatsError, Result, format_postgres_error};
use crate::handle::QueryHandle;
use crate::version::{ServerVersion, resolve_version};
use crate::views::{
    self, ActivityRow, ArchiverRow, BgwriterRow, DatabaseConflictsRow, DatabaseRow,
    FunctionsRow, FunctionsView, IndexesRow, IoIndexesRow, IoSequencesRow, IoTablesRow,
    ProgressVacuumRow, ReplicationRow, Scope, SslRow, StatementsRow, SubscriptionRow, TablesRow,
    WalReceiverRow, XactTablesRow,
};

/// Access to every pg_stat_* view over one connection.
pub struct PgStats<H = Client> {
    handle: Mutex<H>,
    /// Present when version caching is enabled.
    version_cache: Option<OnceLock<ServerVersion>>,
}

impl PgStats<Client> {
    /// Opens a connection and pings it once before returning.
    pub fn connect(config: &ConnectionConfig) -> Result<Self> {
        info!(
            host = %config.get_host(),
            port = config.get_port(),
            dbname = %config.get_dbname(),
            ssl_mode = %config.get_ssl_mode(),
            "connecting to PostgreSQL"
        );

        let pg_config = config.to_pg_config();
        let connected = match config.tls_connector()? {
            Some(tls) => pg_config.connect(tls),
            None => pg_config.connect(NoTls),
        };
        let mut client =
            connected.map_err(|e| PgStatsError::Connection(format_postgres_error(&e)))?;
        client
            .simple_query("")
            .map_err(|e| PgStatsError::Connection(format_postgres_error(&e)))?;

        info!(
            host = %config.get_host(),
            dbname = %config.get_dbname(),
            "PostgreSQL connection established"
        );

        let stats = Self::from_handle(client);
        Ok(if config.caches_server_version() {
            stats.with_version_cache()
        } else {
            stats
        })
    }
}

impl<H: QueryHandle> PgStats<H> {
    /// Wraps an already connected handle.
    pub fn from_handle(handle: H) -> Self {
        Self {
            handle: Mutex::new(handle),
            version_cache: None,
        }
    }

    /// Resolves the server version at most once for the lifetime of this
    /// instance.
    pub fn with_version_cache(mut self) -> Self {
        self.version_cache = Some(OnceLock::new());
        self
    }

    /// Gives the handle back, e.g. to close the connection.
    pub fn into_handle(self) -> H {
        self.handle.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock(&self) -> MutexGuard<'_, H> {
        // A panic inside a fetch leaves no partial state in the handle.
        self.handle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn resolve(&self, handle: &mut H) -> Result<ServerVersion> {
        let Some(cache) = &self.version_cache else {
            return resolve_version(handle);
        };
        if let Some(version) = cache.get() {
            debug!(major = %version, "using cached server version");
            return Ok(*version);
        }
        let version = resolve_version(handle)?;
        Ok(*cache.get_or_init(|| version))
    }

    /// The connected server's release line.
    pub fn server_version(&self) -> Result<ServerVersion> {
        let mut handle = self.lock();
        self.resolve(&mut handle)
    }

    /// Runs a version-sensitive fetch with the version resolved under the
    /// same lock.
    fn versioned<T>(
        &self,
        fetch: impl FnOnce(&mut H, ServerVersion) -> Result<T>,
    ) -> Result<T> {
        let mut handle = self.lock();
        let version = self.resolve(&mut handle)?;
        fetch(&mut *handle, version)
    }

    /// One row per server process.
    pub fn pg_stat_activity(&self) -> Result<Vec<ActivityRow>> {
        self.versioned(views::activity::fetch_for)
    }

    /// One row per WAL sender.
    pub fn pg_stat_replication(&self) -> Result<Vec<ReplicationRow>> {
        self.versioned(views::replication::fetch_for)
    }

    /// The WAL receiver, if one is running. Supported since 9.6.
    pub fn pg_stat_wal_receiver(&self) -> Result<Option<WalReceiverRow>> {
        self.versioned(views::wal_receiver::fetch_for)
    }

    /// Logical replication subscription workers. Supported since 10.
    pub fn pg_stat_subscription(&self) -> Result<Vec<SubscriptionRow>> {
        self.versioned(views::subscription::fetch_for)
    }

    /// SSL usage per connection. Supported since 9.5.
    pub fn pg_stat_ssl(&self) -> Result<Vec<SslRow>> {
        self.versioned(views::ssl::fetch_for)
    }

    /// Running VACUUMs. Supported since 9.6.
    pub fn pg_stat_progress_vacuum(&self) -> Result<Vec<ProgressVacuumRow>> {
        self.versioned(views::progress_vacuum::fetch_for)
    }

    pub fn pg_stat_archiver(&self) -> Result<ArchiverRow> {
        views::archiver::fetch(&mut *self.lock())
    }

    pub fn pg_stat_bgwriter(&self) -> Result<BgwriterRow> {
        self.versioned(views::bgwriter::fetch_for)
    }

    pub fn pg_stat_database(&self) -> Result<Vec<DatabaseRow>> {
        self.versioned(views::database::fetch_for)
    }

    pub fn pg_stat_database_conflicts(&self) -> Result<Vec<DatabaseConflictsRow>> {
        self.versioned(views::database_conflicts::fetch_for)
    }

    /// pg_stat_{all,sys,user}_tables.
    pub fn tables(&self, scope: Scope) -> Result<Vec<TablesRow>> {
        views::tables::fetch(&mut *self.lock(), scope)
    }

    /// pg_stat_xact_{all,sys,user}_tables.
    pub fn xact_tables(&self, scope: Scope) -> Result<Vec<XactTablesRow>> {
        views::xact_tables::fetch(&mut *self.lock(), scope)
    }

    /// pg_stat_{all,sys,user}_indexes.
    pub fn indexes(&self, scope: Scope) -> Result<Vec<IndexesRow>> {
        views::indexes::fetch(&mut *self.lock(), scope)
    }

    /// pg_statio_{all,sys,user}_tables.
    pub fn io_tables(&self, scope: Scope) -> Result<Vec<IoTablesRow>> {
        views::statio::fetch_tables(&mut *self.lock(), scope)
    }

    /// pg_statio_{all,sys,user}_indexes.
    pub fn io_indexes(&self, scope: Scope) -> Result<Vec<IoIndexesRow>> {
        views::statio::fetch_indexes(&mut *self.lock(), scope)
    }

    /// pg_statio_{all,sys,user}_sequences.
    pub fn io_sequences(&self, scope: Scope) -> Result<Vec<IoSequencesRow>> {
        views::statio::fetch_sequences(&mut *self.lock(), scope)
    }

    pub fn functions(&self, view: FunctionsView) -> Result<Vec<FunctionsRow>> {
        views::functions::fetch(&mut *self.lock(), view)
    }

    pub fn pg_stat_all_tables(&self) -> Result<Vec<TablesRow>> {
        self.tables(Scope::All)
    }

    pub fn pg_stat_sys_tables(&self) -> Result<Vec<TablesRow>> {
        self.tables(Scope::System)
    }

    pub fn pg_stat_user_tables(&self) -> Result<Vec<TablesRow>> {
        self.tables(Scope::User)
    }

    pub fn pg_stat_xact_all_tables(&self) -> Result<Vec<XactTablesRow>> {
        self.xact_tables(Scope::All)
    }

    pub fn pg_stat_xact_sys_tables(&self) -> Result<Vec<XactTablesRow>> {
        self.xact_tables(Scope::System)
    }

    pub fn pg_stat_xact_user_tables(&self) -> Result<Vec<XactTablesRow>> {
        self.xact_tables(Scope::User)
    }

    pub fn pg_stat_all_indexes(&self) -> Result<Vec<IndexesRow>> {
        self.indexes(Scope::All)
    }

    pub fn pg_stat_sys_indexes(&self) -> Result<Vec<IndexesRow>> {
        self.indexes(Scope::System)
    }

    pub fn pg_stat_user_indexes(&self) -> Result<Vec<IndexesRow>> {
        self.indexes(Scope::User)
    }

    pub fn pg_statio_all_tables(&self) -> Result<Vec<IoTablesRow>> {
        self.io_tables(Scope::All)
    }

    pub fn pg_statio_sys_tables(&self) -> Result<Vec<IoTablesRow>> {
        self.io_tables(Scope::System)
    }

    pub fn pg_statio_user_tables(&self) -> Result<Vec<IoTablesRow>> {
        self.io_tables(Scope::User)
    }

    pub fn pg_statio_all_indexes(&self) -> Result<Vec<IoIndexesRow>> {
        self.io_indexes(Scope::All)
    }

    pub fn pg_statio_sys_indexes(&self) -> Result<Vec<IoIndexesRow>> {
        self.io_indexes(Scope::System)
    }

    pub fn pg_statio_user_indexes(&self) -> Result<Vec<IoIndexesRow>> {
        self.io_indexes(Scope::User)
    }

    pub fn pg_statio_all_sequences(&self) -> Result<Vec<IoSequencesRow>> {
        self.io_sequences(Scope::All)
    }

    pub fn pg_statio_sys_sequences(&self) -> Result<Vec<IoSequencesRow>> {
        self.io_sequences(Scope::System)
    }

    pub fn pg_statio_user_sequences(&self) -> Result<Vec<IoSequencesRow>> {
        self.io_sequences(Scope::User)
    }

    /// Requires `track_functions` to be enabled on the server.
    pub fn pg_stat_user_functions(&self) -> Result<Vec<FunctionsRow>> {
        self.functions(FunctionsView::User)
    }

    pub fn pg_stat_xact_user_functions(&self) -> Result<Vec<FunctionsRow>> {
        self.functions(FunctionsView::XactUser)
    }

    /// Requires the pg_stat_statements extension.
    pub fn pg_stat_statements(&self) -> Result<Vec<StatementsRow>> {
        self.versioned(views::statements::fetch_for)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockHandle, MockRow};
    use std::sync::Arc;

    fn ssl_row(pid: i64) -> MockRow {
        MockRow::nulls(7).set(0, pid).set(1, true)
    }

    #[test]
    fn resolves_version_per_call_by_default() {
        let handle = MockHandle::new("12.4").with_rows("pg_stat_ssl", vec![ssl_row(1)]);
        let stats = PgStats::from_handle(handle);
        stats.pg_stat_ssl().unwrap();
        stats.pg_stat_ssl().unwrap();
        let executed = stats.into_handle().executed().to_vec();
        assert_eq!(executed.iter().filter(|q| q.starts_with("SHOW")).count(), 2);
    }

    #[test]
    fn cached_version_is_resolved_once() {
        let handle = MockHandle::new("12.4").with_rows("pg_stat_ssl", vec![ssl_row(1)]);
        let stats = PgStats::from_handle(handle).with_version_cache();
        assert_eq!(stats.server_version().unwrap(), ServerVersion::V12);
        stats.pg_stat_ssl().unwrap();
        stats.pg_stat_ssl().unwrap();
        let executed = stats.into_handle().executed().to_vec();
        assert_eq!(executed.len(), 3);
        assert_eq!(executed.iter().filter(|q| q.starts_with("SHOW")).count(), 1);
    }

    #[test]
    fn failed_resolution_is_not_cached() {
        let stats = PgStats::from_handle(MockHandle::new("garbage")).with_version_cache();
        assert!(matches!(stats.server_version(), Err(PgStatsError::Parse { .. })));
        assert!(matches!(stats.server_version(), Err(PgStatsError::Parse { .. })));
    }

    #[test]
    fn unsupported_view_is_distinguishable() {
        let stats = PgStats::from_handle(MockHandle::new("9.4.22"));
        let err = stats.pg_stat_ssl().unwrap_err();
        assert!(err.is_unsupported_version());
        let err = stats.pg_stat_archiver().unwrap_err();
        assert!(matches!(err, PgStatsError::Query(_)));
    }

    #[test]
    fn scoped_accessors_read_matching_views() {
        let table = MockRow::nulls(22).set(0, 1i64).set(1, "public").set(2, "t");
        let handle = MockHandle::new("11.3")
            .with_rows("pg_stat_user_tables", vec![table.clone(), table])
            .with_rows("pg_stat_sys_tables", vec![])
            .with_rows("pg_stat_xact_user_functions", vec![]);
        let stats = PgStats::from_handle(handle);
        assert_eq!(stats.pg_stat_user_tables().unwrap().len(), 2);
        assert!(stats.pg_stat_sys_tables().unwrap().is_empty());
        assert!(stats.pg_stat_xact_user_functions().unwrap().is_empty());
        assert!(stats.pg_stat_all_tables().is_err());
    }

    #[test]
    fn shared_between_threads() {
        let handle = MockHandle::new("14.2").with_rows("pg_stat_ssl", vec![ssl_row(5)]);
        let stats = Arc::new(PgStats::from_handle(handle));
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let stats = Arc::clone(&stats);
                std::thread::spawn(move || stats.pg_stat_ssl().unwrap().len())
            })
            .collect();
        for worker in workers {
            assert_eq!(worker.join().unwrap(), 1);
        }
    }
}
