//! pg_stat_activity fetcher.

use crate::error::Result;
use crate::handle::QueryHandle;
use crate::nullable::{NullBool, NullInt64, NullString, NullTime};
use crate::version::{ServerVersion, resolve_version};

use super::fetch_rows;
use super::queries::build_stat_activity_query;

pub const VIEW: &str = "pg_stat_activity";

stat_row! {
    /// One server process.
    ///
    /// `waiting` is only reported before 9.6, `wait_event_type`/`wait_event`
    /// from 9.6 on and `backend_type` from 10 on. Columns the server does
    /// not have are NULL.
    pub struct ActivityRow {
        /// NULL for background processes not attached to a database.
        pub datid: NullInt64,
        pub datname: NullString,
        pub pid: i64,
        pub usesysid: NullInt64,
        pub usename: NullString,
        pub application_name: NullString,
        /// Client address as text; NULL for unix sockets and internal processes.
        pub client_addr: NullString,
        pub client_hostname: NullString,
        /// -1 for unix socket connections.
        pub client_port: NullInt64,
        pub backend_start: NullTime,
        pub xact_start: NullTime,
        pub query_start: NullTime,
        pub state_change: NullTime,
        pub wait_event_type: NullString,
        pub wait_event: NullString,
        pub waiting: NullBool,
        pub state: NullString,
        pub backend_xid: NullInt64,
        pub backend_xmin: NullInt64,
        pub query: NullString,
        pub backend_type: NullString,
    }
}

/// Resolves the server version, then fetches every row of pg_stat_activity.
pub fn fetch<H: QueryHandle + ?Sized>(handle: &mut H) -> Result<Vec<ActivityRow>> {
    let version = resolve_version(handle)?;
    fetch_for(handle, version)
}

/// Fetches pg_stat_activity using the column set of `version`.
pub fn fetch_for<H: QueryHandle + ?Sized>(
    handle: &mut H,
    version: ServerVersion,
) -> Result<Vec<ActivityRow>> {
    fetch_rows(handle, VIEW, &build_stat_activity_query(version))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PgStatsError;
    use crate::mock::{MockHandle, MockRow};
    use chrono::{TimeZone, Utc};

    const WIDTH: usize = 21;

    fn backend(pid: i64) -> MockRow {
        MockRow::nulls(WIDTH)
            .set(2, pid)
            .set(9, Utc.with_ymd_and_hms(2019, 5, 1, 10, 0, 0).unwrap())
            .set(16, "active")
    }

    #[test]
    fn fetch_scans_rows_in_order() {
        let mut handle = MockHandle::new("11.3").with_rows(
            VIEW,
            vec![
                backend(101).set(20, "client backend"),
                backend(102).set(20, "walsender"),
            ],
        );
        let rows = fetch(&mut handle).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].pid, 101);
        assert_eq!(rows[1].backend_type.value().map(String::as_str), Some("walsender"));
        assert_eq!(rows[0].state, NullString::new("active".into()));
        assert!(!rows[0].waiting.is_valid());
        // version query, then data query
        assert_eq!(handle.executed().len(), 2);
    }

    #[test]
    fn empty_view_is_empty_collection() {
        let mut handle = MockHandle::new("9.6.13").with_rows(VIEW, vec![]);
        assert!(fetch(&mut handle).unwrap().is_empty());
    }

    #[test]
    fn exact_9_6_uses_transitional_column_set() {
        let mut handle = MockHandle::new("9.6.13").with_rows(VIEW, vec![backend(7)]);
        fetch(&mut handle).unwrap();
        let sql = &handle.executed()[1];
        assert!(sql.contains("NULL::text AS backend_type"));
        assert!(!sql.contains("NULL::text AS wait_event_type"));
    }

    #[test]
    fn pre_9_6_reads_waiting_flag() {
        let mut handle =
            MockHandle::new("9.5.17").with_rows(VIEW, vec![backend(7).set(15, true)]);
        let rows = fetch(&mut handle).unwrap();
        assert_eq!(rows[0].waiting, NullBool::new(true));
        assert!(!rows[0].wait_event.is_valid());
        assert!(handle.executed()[1].contains("NULL::text AS wait_event_type"));
    }

    #[test]
    fn scan_failure_returns_no_rows() {
        let broken = MockRow::nulls(WIDTH);
        let mut handle =
            MockHandle::new("11.3").with_rows(VIEW, vec![backend(1), broken, backend(3)]);
        assert!(matches!(
            fetch(&mut handle),
            Err(PgStatsError::Scan { column: 2, .. })
        ));
    }

    #[test]
    fn version_failure_skips_data_query() {
        let mut handle = MockHandle::new("devel").with_rows(VIEW, vec![backend(1)]);
        assert!(matches!(fetch(&mut handle), Err(PgStatsError::Parse { .. })));
        assert_eq!(handle.executed().len(), 1);
    }

    #[test]
    fn record_serializes_nulls_explicitly() {
        let mut handle = MockHandle::new("10.12").with_rows(VIEW, vec![backend(42)]);
        let rows = fetch(&mut handle).unwrap();
        let json = serde_json::to_value(&rows[0]).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), WIDTH);
        assert_eq!(obj["pid"], 42);
        assert!(obj["datname"].is_null());
        assert_eq!(obj["backend_start"], "2019-05-01T10:00:00Z");
    }
}
