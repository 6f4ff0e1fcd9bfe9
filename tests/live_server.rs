//! Tests against a running PostgreSQL server.
//!
//! Ignored by default. Configure the server with the libpq environment
//! variables and run:
//!
//! ```text
//! PGHOST=localhost PGUSER=postgres PGSSLMODE=disable cargo test -- --ignored
//! ```

use std::sync::Once;

use pgstats::handle::{QueryHandle, StatRow};
use pgstats::{ConnectionConfig, PgStats, PgStatsError, Scope, ServerVersion};

static LOGGING: Once = Once::new();

fn init_logging() {
    LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_target(false)
            .with_test_writer()
            .try_init();
    });
}

fn connect() -> PgStats {
    init_logging();
    let config = ConnectionConfig::from_env().expect("libpq environment");
    PgStats::connect(&config).expect("connect to test server")
}

/// Accepts success or a version error for views that need a newer server.
fn supported<T>(result: Result<T, PgStatsError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) if err.is_unsupported_version() => None,
        Err(err) => panic!("{err}"),
    }
}

#[test]
#[ignore]
fn reports_server_version() {
    let stats = connect();
    assert!(stats.server_version().unwrap() >= ServerVersion::new(9, 4));
}

#[test]
#[ignore]
fn narrow_column_types_widen_to_record_types() {
    let mut client = connect().into_handle();
    let rows = QueryHandle::query(
        &mut client,
        "SELECT 1::int2, 2::int4, 3::oid, 1.5::float4, now()::timestamp, NULL::int4, NULL::timestamp",
    )
    .unwrap();
    let row = &rows[0];
    assert_eq!(row.column_count(), 7);
    assert_eq!(row.get_i64(0).unwrap(), Some(1));
    assert_eq!(row.get_i64(1).unwrap(), Some(2));
    assert_eq!(row.get_i64(2).unwrap(), Some(3));
    assert_eq!(row.get_f64(3).unwrap(), Some(1.5));
    assert!(row.get_timestamp(4).unwrap().is_some());
    assert_eq!(row.get_i64(5).unwrap(), None);
    assert_eq!(row.get_timestamp(6).unwrap(), None);
    assert!(matches!(row.get_i64(3), Err(PgStatsError::Scan { .. })));
    assert!(matches!(row.get_f64(0), Err(PgStatsError::Scan { .. })));
}

#[test]
#[ignore]
fn activity_includes_own_backend() {
    let stats = connect();
    let rows = stats.pg_stat_activity().unwrap();
    assert!(!rows.is_empty());
    assert!(rows.iter().any(|r| r.state.is_valid()));
    let json = serde_json::to_value(&rows[0]).unwrap();
    assert!(json.get("backend_type").is_some());
}

#[test]
#[ignore]
fn instance_level_views() {
    let stats = connect();
    stats.pg_stat_replication().unwrap();
    stats.pg_stat_archiver().unwrap();
    stats.pg_stat_bgwriter().unwrap();
    assert!(!stats.pg_stat_database().unwrap().is_empty());
    stats.pg_stat_database_conflicts().unwrap();
    supported(stats.pg_stat_wal_receiver());
    supported(stats.pg_stat_subscription());
    supported(stats.pg_stat_ssl());
    supported(stats.pg_stat_progress_vacuum());
}

#[test]
#[ignore]
fn relation_level_views() {
    let stats = connect();
    for scope in [Scope::All, Scope::System, Scope::User] {
        stats.tables(scope).unwrap();
        stats.xact_tables(scope).unwrap();
        stats.indexes(scope).unwrap();
        stats.io_tables(scope).unwrap();
        stats.io_indexes(scope).unwrap();
        stats.io_sequences(scope).unwrap();
    }
    assert!(!stats.pg_stat_sys_tables().unwrap().is_empty());
    stats.pg_stat_user_functions().unwrap();
    stats.pg_stat_xact_user_functions().unwrap();
}

#[test]
#[ignore]
fn statements_without_extension_is_a_query_error() {
    let stats = connect();
    match stats.pg_stat_statements() {
        Ok(_) | Err(PgStatsError::Query(_)) => {}
        Err(other) => panic!("unexpected {other}"),
    }
}

#[test]
#[ignore]
fn global_connection_is_shared() {
    init_logging();
    let config = ConnectionConfig::from_env().unwrap();
    let handles: Vec<_> = (0..2)
        .map(|_| {
            let config = config.clone();
            std::thread::spawn(move || pgstats::global::define_connection(&config))
        })
        .collect();
    let defined: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().unwrap().unwrap())
        .collect();
    assert!(std::sync::Arc::ptr_eq(&defined[0], &defined[1]));
    assert!(!pgstats::global::pg_stat_activity().unwrap().is_empty());
}
