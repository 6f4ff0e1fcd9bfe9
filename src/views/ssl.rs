//! pg_stat_ssl fetcher (PG 9.5+).

use crate::error::Result;
use crate::handle::QueryHandle;
use crate::nullable::{NullBool, NullInt64, NullString};
use crate::version::{ServerVersion, resolve_version};

use super::fetch_rows;
use super::queries::build_stat_ssl_query;

pub const VIEW: &str = "pg_stat_ssl";

stat_row! {
    /// SSL state of one backend or WAL sender.
    pub struct SslRow {
        pub pid: i64,
        pub ssl: bool,
        pub version: NullString,
        pub cipher: NullString,
        pub bits: NullInt64,
        /// Always NULL from 14 on.
        pub compression: NullBool,
        /// Client certificate subject (`client_dn` from 12 on).
        pub clientdn: NullString,
    }
}

pub fn fetch<H: QueryHandle + ?Sized>(handle: &mut H) -> Result<Vec<SslRow>> {
    let version = resolve_version(handle)?;
    fetch_for(handle, version)
}

pub fn fetch_for<H: QueryHandle + ?Sized>(
    handle: &mut H,
    version: ServerVersion,
) -> Result<Vec<SslRow>> {
    version.require(VIEW, ServerVersion::V9_5)?;
    fetch_rows(handle, VIEW, &build_stat_ssl_query(version))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PgStatsError;
    use crate::mock::{MockHandle, MockRow};

    fn plain(pid: i64) -> MockRow {
        MockRow::nulls(7).set(0, pid).set(1, false)
    }

    fn encrypted(pid: i64) -> MockRow {
        MockRow::nulls(7)
            .set(0, pid)
            .set(1, true)
            .set(2, "TLSv1.3")
            .set(3, "TLS_AES_256_GCM_SHA384")
            .set(4, 256i64)
    }

    #[test]
    fn rejects_9_4_naming_9_5() {
        let mut handle = MockHandle::new("9.4.22").with_rows(VIEW, vec![plain(1)]);
        match fetch(&mut handle) {
            Err(PgStatsError::UnsupportedVersion {
                view,
                required,
                actual,
            }) => {
                assert_eq!(view, VIEW);
                assert_eq!(required, ServerVersion::V9_5);
                assert_eq!(actual, ServerVersion::new(9, 4));
            }
            other => panic!("unexpected {other:?}"),
        }
        // no data query after the version check fails
        assert_eq!(handle.executed().len(), 1);
    }

    #[test]
    fn exact_9_5_succeeds_with_original_columns() {
        let mut handle =
            MockHandle::new("9.5.17").with_rows(VIEW, vec![plain(1), encrypted(2)]);
        let rows = fetch(&mut handle).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(!rows[0].ssl);
        assert_eq!(rows[1].bits, NullInt64::new(256));
        assert!(handle.executed()[1].contains("\n                clientdn\n"));
    }

    #[test]
    fn null_compression_serializes_as_null() {
        let mut handle = MockHandle::new("14.2").with_rows(VIEW, vec![encrypted(9)]);
        let rows = fetch(&mut handle).unwrap();
        let json = serde_json::to_string(&rows[0]).unwrap();
        assert!(json.contains(r#""compression":null"#));
        assert!(json.contains(r#""clientdn":null"#));
        assert!(json.contains(r#""version":"TLSv1.3""#));
    }
}
