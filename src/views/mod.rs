//! Monitoring view fetchers.
//!
//! One module per view family. Each exposes a record type and a fetch
//! function generic over [`QueryHandle`]; version-sensitive views also
//! expose `fetch_for`, which takes an already resolved [`ServerVersion`].
//!
//! [`ServerVersion`]: crate::version::ServerVersion

/// Declares a view record and its positional row scan.
///
/// Fields are scanned in declaration order, which must match the column
/// order of the view's query.
macro_rules! stat_row {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $( $(#[$field_meta:meta])* pub $field:ident: $ty:ty, )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
        pub struct $name {
            $( $(#[$field_meta])* pub $field: $ty, )*
        }

        impl $crate::handle::FromStatRow for $name {
            fn from_row<R: $crate::handle::StatRow + ?Sized>(
                row: &R,
            ) -> $crate::error::Result<Self> {
                let mut scan = $crate::handle::RowScanner::new(row);
                let record = Self {
                    $( $field: scan.column()?, )*
                };
                scan.finish()?;
                Ok(record)
            }
        }
    };
}

pub mod activity;
pub mod archiver;
pub mod bgwriter;
pub mod database;
pub mod database_conflicts;
pub mod functions;
pub mod indexes;
pub mod progress_vacuum;
mod queries;
pub mod replication;
pub mod ssl;
pub mod statements;
pub mod statio;
pub mod subscription;
pub mod tables;
pub mod wal_receiver;
pub mod xact_tables;

use tracing::debug;

use crate::error::{PgStatsError, Result};
use crate::handle::{FromStatRow, QueryHandle};

pub use activity::ActivityRow;
pub use archiver::ArchiverRow;
pub use bgwriter::BgwriterRow;
pub use database::DatabaseRow;
pub use database_conflicts::DatabaseConflictsRow;
pub use functions::FunctionsRow;
pub use indexes::IndexesRow;
pub use progress_vacuum::ProgressVacuumRow;
pub use replication::ReplicationRow;
pub use ssl::SslRow;
pub use statements::StatementsRow;
pub use statio::{IoIndexesRow, IoSequencesRow, IoTablesRow};
pub use subscription::SubscriptionRow;
pub use tables::TablesRow;
pub use wal_receiver::WalReceiverRow;
pub use xact_tables::XactTablesRow;

/// Which half of a `pg_stat_{all,sys,user}_*` view family to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Scope {
    #[default]
    All,
    /// System catalogs and TOAST tables only.
    System,
    /// Everything not in `System`.
    User,
}

impl Scope {
    pub(crate) fn tables_relation(self) -> &'static str {
        match self {
            Scope::All => "pg_stat_all_tables",
            Scope::System => "pg_stat_sys_tables",
            Scope::User => "pg_stat_user_tables",
        }
    }

    pub(crate) fn xact_tables_relation(self) -> &'static str {
        match self {
            Scope::All => "pg_stat_xact_all_tables",
            Scope::System => "pg_stat_xact_sys_tables",
            Scope::User => "pg_stat_xact_user_tables",
        }
    }

    pub(crate) fn indexes_relation(self) -> &'static str {
        match self {
            Scope::All => "pg_stat_all_indexes",
            Scope::System => "pg_stat_sys_indexes",
            Scope::User => "pg_stat_user_indexes",
        }
    }

    pub(crate) fn io_tables_relation(self) -> &'static str {
        match self {
            Scope::All => "pg_statio_all_tables",
            Scope::System => "pg_statio_sys_tables",
            Scope::User => "pg_statio_user_tables",
        }
    }

    pub(crate) fn io_indexes_relation(self) -> &'static str {
        match self {
            Scope::All => "pg_statio_all_indexes",
            Scope::System => "pg_statio_sys_indexes",
            Scope::User => "pg_statio_user_indexes",
        }
    }

    pub(crate) fn io_sequences_relation(self) -> &'static str {
        match self {
            Scope::All => "pg_statio_all_sequences",
            Scope::System => "pg_statio_sys_sequences",
            Scope::User => "pg_statio_user_sequences",
        }
    }
}

/// Function statistics views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FunctionsView {
    /// `pg_stat_user_functions`: cumulative counters.
    #[default]
    User,
    /// `pg_stat_xact_user_functions`: current transaction only.
    XactUser,
}

impl FunctionsView {
    pub(crate) fn relation(self) -> &'static str {
        match self {
            FunctionsView::User => "pg_stat_user_functions",
            FunctionsView::XactUser => "pg_stat_xact_user_functions",
        }
    }
}

/// Runs `sql` and scans every row into `T`.
///
/// All or nothing: the first row that fails to scan discards the rows read
/// so far and its error is returned.
pub(crate) fn fetch_rows<H, T>(handle: &mut H, view: &'static str, sql: &str) -> Result<Vec<T>>
where
    H: QueryHandle + ?Sized,
    T: FromStatRow,
{
    let rows = handle.query(sql)?;
    let records = rows
        .iter()
        .map(T::from_row)
        .collect::<Result<Vec<T>>>()?;
    debug!(view, rows = records.len(), "fetched view");
    Ok(records)
}

/// Like [`fetch_rows`] for views that hold at most one row.
pub(crate) fn fetch_optional<H, T>(
    handle: &mut H,
    view: &'static str,
    sql: &str,
) -> Result<Option<T>>
where
    H: QueryHandle + ?Sized,
    T: FromStatRow,
{
    let mut records = fetch_rows(handle, view, sql)?;
    if records.len() > 1 {
        return Err(PgStatsError::Query(format!(
            "{view} returned {} rows, expected at most one",
            records.len()
        )));
    }
    Ok(records.pop())
}

/// Like [`fetch_rows`] for views that always hold exactly one row.
pub(crate) fn fetch_one<H, T>(handle: &mut H, view: &'static str, sql: &str) -> Result<T>
where
    H: QueryHandle + ?Sized,
    T: FromStatRow,
{
    fetch_optional(handle, view, sql)?
        .ok_or_else(|| PgStatsError::Query(format!("{view} returned no rows")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::{RowScanner, StatRow};
    use crate::mock::{MockHandle, MockRow, MockValue};

    #[derive(Debug, PartialEq)]
    struct Pair {
        id: i64,
        name: String,
    }

    impl FromStatRow for Pair {
        fn from_row<R: StatRow + ?Sized>(row: &R) -> Result<Self> {
            let mut scan = RowScanner::new(row);
            let record = Pair {
                id: scan.column()?,
                name: scan.column()?,
            };
            scan.finish()?;
            Ok(record)
        }
    }

    fn pair(id: i64, name: &str) -> MockRow {
        MockRow::new(vec![id.into(), name.into()])
    }

    #[test]
    fn empty_result_is_an_empty_collection() {
        let mut handle = MockHandle::new("11.3").with_rows("pairs", vec![]);
        let got: Vec<Pair> = fetch_rows(&mut handle, "pairs", "SELECT id, name FROM pairs").unwrap();
        assert!(got.is_empty());
    }

    #[test]
    fn scan_failure_discards_earlier_rows() {
        let rows = vec![
            pair(1, "a"),
            MockRow::new(vec![MockValue::Null, "b".into()]),
            pair(3, "c"),
        ];
        let mut handle = MockHandle::new("11.3").with_rows("pairs", rows);
        let got = fetch_rows::<_, Pair>(&mut handle, "pairs", "SELECT id, name FROM pairs");
        assert!(matches!(got, Err(PgStatsError::Scan { column: 0, .. })));
    }

    #[test]
    fn rows_keep_result_order() {
        let mut handle =
            MockHandle::new("11.3").with_rows("pairs", vec![pair(2, "b"), pair(1, "a")]);
        let got: Vec<Pair> = fetch_rows(&mut handle, "pairs", "SELECT id, name FROM pairs").unwrap();
        assert_eq!(
            got,
            vec![
                Pair { id: 2, name: "b".into() },
                Pair { id: 1, name: "a".into() }
            ]
        );
    }

    #[test]
    fn single_row_helpers() {
        let mut empty = MockHandle::new("11.3").with_rows("pairs", vec![]);
        assert_eq!(
            fetch_optional::<_, Pair>(&mut empty, "pairs", "SELECT 1 FROM pairs").unwrap(),
            None
        );
        assert!(matches!(
            fetch_one::<_, Pair>(&mut empty, "pairs", "SELECT 1 FROM pairs"),
            Err(PgStatsError::Query(_))
        ));

        let mut two = MockHandle::new("11.3").with_rows("pairs", vec![pair(1, "a"), pair(2, "b")]);
        assert!(fetch_optional::<_, Pair>(&mut two, "pairs", "SELECT 1 FROM pairs").is_err());
    }

    #[test]
    fn scoped_relations_are_distinct() {
        let scopes = [Scope::All, Scope::System, Scope::User];
        let names: std::collections::HashSet<_> = scopes
            .iter()
            .flat_map(|s| {
                [
                    s.tables_relation(),
                    s.xact_tables_relation(),
                    s.indexes_relation(),
                    s.io_tables_relation(),
                    s.io_indexes_relation(),
                    s.io_sequences_relation(),
                ]
            })
            .collect();
        assert_eq!(names.len(), 18);
        assert_ne!(FunctionsView::User.relation(), FunctionsView::XactUser.relation());
    }
}
