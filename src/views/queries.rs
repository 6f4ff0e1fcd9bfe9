//! SQL query builders for PostgreSQL statistics views.
//!
//! Every query names its columns explicitly, in record field order. When a
//! column does not exist on the connected server it is selected as a typed
//! NULL under its current name, so each record type keeps one shape across
//! versions. Branches test exact versions before open-ended bounds.

use super::{FunctionsView, Scope};
use crate::version::ServerVersion;

/// Builds version-aware query for pg_stat_activity.
///
/// < 9.6: `waiting` flag, no wait events.
/// = 9.6: `wait_event_type`/`wait_event` replace `waiting`.
/// > 9.6: additionally `backend_type`.
pub(super) fn build_stat_activity_query(version: ServerVersion) -> String {
    let (wait_event_type, wait_event, waiting, backend_type) = if version == ServerVersion::V9_6 {
        (
            "wait_event_type",
            "wait_event",
            "NULL::boolean AS waiting",
            "NULL::text AS backend_type",
        )
    } else if version > ServerVersion::V9_6 {
        (
            "wait_event_type",
            "wait_event",
            "NULL::boolean AS waiting",
            "backend_type",
        )
    } else {
        (
            "NULL::text AS wait_event_type",
            "NULL::text AS wait_event",
            "waiting",
            "NULL::text AS backend_type",
        )
    };

    format!(
        r#"
            SELECT
                datid,
                datname,
                pid,
                usesysid,
                usename,
                application_name,
                host(client_addr) AS client_addr,
                client_hostname,
                client_port,
                backend_start,
                xact_start,
                query_start,
                state_change,
                {wait_event_type},
                {wait_event},
                {waiting},
                state,
                backend_xid::text::bigint AS backend_xid,
                backend_xmin::text::bigint AS backend_xmin,
                query,
                {backend_type}
            FROM pg_stat_activity
        "#
    )
}

/// Builds version-aware query for pg_stat_replication.
///
/// PG < 10: `*_location` columns, no lag columns.
/// PG 10+:  `*_lsn` columns and write/flush/replay lag.
pub(super) fn build_stat_replication_query(version: ServerVersion) -> String {
    let (sent, write, flush, replay, write_lag, flush_lag, replay_lag) =
        if version >= ServerVersion::V10 {
            (
                "sent_lsn",
                "write_lsn",
                "flush_lsn",
                "replay_lsn",
                "EXTRACT(EPOCH FROM write_lag)::double precision",
                "EXTRACT(EPOCH FROM flush_lag)::double precision",
                "EXTRACT(EPOCH FROM replay_lag)::double precision",
            )
        } else {
            (
                "sent_location",
                "write_location",
                "flush_location",
                "replay_location",
                "NULL::double precision",
                "NULL::double precision",
                "NULL::double precision",
            )
        };

    format!(
        r#"
            SELECT
                pid,
                usesysid,
                usename,
                application_name,
                host(client_addr) AS client_addr,
                client_hostname,
                client_port,
                backend_start,
                backend_xmin::text::bigint AS backend_xmin,
                state,
                ({sent} - '0/0'::pg_lsn)::bigint AS sent_lsn,
                ({write} - '0/0'::pg_lsn)::bigint AS write_lsn,
                ({flush} - '0/0'::pg_lsn)::bigint AS flush_lsn,
                ({replay} - '0/0'::pg_lsn)::bigint AS replay_lsn,
                {write_lag} AS write_lag,
                {flush_lag} AS flush_lag,
                {replay_lag} AS replay_lag,
                sync_priority,
                sync_state
            FROM pg_stat_replication
        "#
    )
}

/// Builds version-aware query for pg_stat_wal_receiver (PG 9.6+).
///
/// PG 11+: `sender_host`/`sender_port` available.
/// PG 13+: `received_lsn` renamed to `flushed_lsn`.
pub(super) fn build_stat_wal_receiver_query(version: ServerVersion) -> String {
    let received_lsn = if version >= ServerVersion::V13 {
        "flushed_lsn"
    } else {
        "received_lsn"
    };
    let (sender_host, sender_port) = if version >= ServerVersion::V11 {
        ("sender_host", "sender_port")
    } else {
        ("NULL::text AS sender_host", "NULL::integer AS sender_port")
    };

    format!(
        r#"
            SELECT
                pid,
                status,
                (receive_start_lsn - '0/0'::pg_lsn)::bigint AS receive_start_lsn,
                receive_start_tli,
                ({received_lsn} - '0/0'::pg_lsn)::bigint AS received_lsn,
                received_tli,
                last_msg_send_time,
                last_msg_receipt_time,
                (latest_end_lsn - '0/0'::pg_lsn)::bigint AS latest_end_lsn,
                latest_end_time,
                slot_name,
                {sender_host},
                {sender_port},
                conninfo
            FROM pg_stat_wal_receiver
        "#
    )
}

/// Builds query for pg_stat_subscription (PG 10+).
pub(super) fn build_stat_subscription_query() -> &'static str {
    r#"
        SELECT
            subid,
            subname,
            pid,
            relid,
            (received_lsn - '0/0'::pg_lsn)::bigint AS received_lsn,
            last_msg_send_time,
            last_msg_receipt_time,
            (latest_end_lsn - '0/0'::pg_lsn)::bigint AS latest_end_lsn,
            latest_end_time
        FROM pg_stat_subscription
    "#
}

/// Builds version-aware query for pg_stat_ssl (PG 9.5+).
///
/// PG 12+: `clientdn` renamed to `client_dn`.
/// PG 14+: `compression` removed.
pub(super) fn build_stat_ssl_query(version: ServerVersion) -> String {
    let (compression, clientdn) = if version >= ServerVersion::V14 {
        ("NULL::boolean AS compression", "client_dn AS clientdn")
    } else if version >= ServerVersion::V12 {
        ("compression", "client_dn AS clientdn")
    } else {
        ("compression", "clientdn")
    };

    format!(
        r#"
            SELECT
                pid,
                ssl,
                version,
                cipher,
                bits,
                {compression},
                {clientdn}
            FROM pg_stat_ssl
        "#
    )
}

/// Query for pg_stat_progress_vacuum (exists since 9.6).
///
/// 17 renamed the dead tuple counters to `max_dead_tuple_bytes` and
/// `num_dead_item_ids` and added the index progress columns, which are
/// NULL on older servers.
pub(super) fn build_stat_progress_vacuum_query(version: ServerVersion) -> String {
    if version >= ServerVersion::V17 {
        r#"
            SELECT
                pid,
                datid,
                datname,
                relid,
                phase,
                heap_blks_total,
                heap_blks_scanned,
                heap_blks_vacuumed,
                index_vacuum_count,
                max_dead_tuple_bytes AS max_dead_tuples,
                num_dead_item_ids AS num_dead_tuples,
                dead_tuple_bytes,
                indexes_total,
                indexes_processed
            FROM pg_stat_progress_vacuum
        "#
        .to_string()
    } else {
        r#"
            SELECT
                pid,
                datid,
                datname,
                relid,
                phase,
                heap_blks_total,
                heap_blks_scanned,
                heap_blks_vacuumed,
                index_vacuum_count,
                max_dead_tuples,
                num_dead_tuples,
                NULL::bigint AS dead_tuple_bytes,
                NULL::bigint AS indexes_total,
                NULL::bigint AS indexes_processed
            FROM pg_stat_progress_vacuum
        "#
        .to_string()
    }
}

/// Builds query for pg_stat_archiver.
pub(super) fn build_stat_archiver_query() -> &'static str {
    r#"
        SELECT
            archived_count,
            last_archived_wal,
            last_archived_time,
            failed_count,
            last_failed_wal,
            last_failed_time,
            stats_reset
        FROM pg_stat_archiver
    "#
}

/// Query for pg_stat_bgwriter.
///
/// Before 17 one view holds everything. From 17 on checkpoint counters are
/// read from pg_stat_checkpointer under their old names, and the backend
/// buffer counters are NULL.
pub(super) fn build_stat_bgwriter_query(version: ServerVersion) -> String {
    if version >= ServerVersion::V17 {
        r#"
            SELECT
                c.num_timed AS checkpoints_timed,
                c.num_requested AS checkpoints_req,
                c.write_time AS checkpoint_write_time,
                c.sync_time AS checkpoint_sync_time,
                c.buffers_written AS buffers_checkpoint,
                b.buffers_clean,
                b.maxwritten_clean,
                NULL::bigint AS buffers_backend,
                NULL::bigint AS buffers_backend_fsync,
                b.buffers_alloc,
                b.stats_reset
            FROM pg_stat_bgwriter b
            CROSS JOIN pg_stat_checkpointer c
        "#
        .to_string()
    } else {
        r#"
            SELECT
                checkpoints_timed,
                checkpoints_req,
                checkpoint_write_time,
                checkpoint_sync_time,
                buffers_checkpoint,
                buffers_clean,
                maxwritten_clean,
                buffers_backend,
                buffers_backend_fsync,
                buffers_alloc,
                stats_reset
            FROM pg_stat_bgwriter
        "#
        .to_string()
    }
}

/// Builds version-aware query for pg_stat_database.
///
/// PG 12+: checksum failure columns.
/// PG 14+: session accounting columns.
pub(super) fn build_stat_database_query(version: ServerVersion) -> String {
    let (checksum_failures, checksum_last_failure) = if version >= ServerVersion::V12 {
        ("checksum_failures", "checksum_last_failure")
    } else {
        (
            "NULL::bigint AS checksum_failures",
            "NULL::timestamptz AS checksum_last_failure",
        )
    };
    let session_columns = if version >= ServerVersion::V14 {
        "session_time,
                active_time,
                idle_in_transaction_time,
                sessions,
                sessions_abandoned,
                sessions_fatal,
                sessions_killed"
    } else {
        "NULL::double precision AS session_time,
                NULL::double precision AS active_time,
                NULL::double precision AS idle_in_transaction_time,
                NULL::bigint AS sessions,
                NULL::bigint AS sessions_abandoned,
                NULL::bigint AS sessions_fatal,
                NULL::bigint AS sessions_killed"
    };

    format!(
        r#"
            SELECT
                datid,
                datname,
                numbackends,
                xact_commit,
                xact_rollback,
                blks_read,
                blks_hit,
                tup_returned,
                tup_fetched,
                tup_inserted,
                tup_updated,
                tup_deleted,
                conflicts,
                temp_files,
                temp_bytes,
                deadlocks,
                {checksum_failures},
                {checksum_last_failure},
                blk_read_time,
                blk_write_time,
                {session_columns},
                stats_reset
            FROM pg_stat_database
        "#
    )
}

/// Builds version-aware query for pg_stat_database_conflicts.
///
/// PG 16+: `confl_active_logicalslot`.
pub(super) fn build_stat_database_conflicts_query(version: ServerVersion) -> String {
    let logical_slot = if version >= ServerVersion::new(16, 0) {
        "confl_active_logicalslot"
    } else {
        "NULL::bigint AS confl_active_logicalslot"
    };

    format!(
        r#"
            SELECT
                datid,
                datname,
                confl_tablespace,
                confl_lock,
                confl_snapshot,
                confl_bufferpin,
                confl_deadlock,
                {logical_slot}
            FROM pg_stat_database_conflicts
        "#
    )
}

/// Builds query for pg_stat_{all,sys,user}_tables.
pub(super) fn build_stat_tables_query(scope: Scope) -> String {
    format!(
        r#"
            SELECT
                relid,
                schemaname,
                relname,
                seq_scan,
                seq_tup_read,
                idx_scan,
                idx_tup_fetch,
                n_tup_ins,
                n_tup_upd,
                n_tup_del,
                n_tup_hot_upd,
                n_live_tup,
                n_dead_tup,
                n_mod_since_analyze,
                last_vacuum,
                last_autovacuum,
                last_analyze,
                last_autoanalyze,
                vacuum_count,
                autovacuum_count,
                analyze_count,
                autoanalyze_count
            FROM {}
        "#,
        scope.tables_relation()
    )
}

/// Builds query for pg_stat_xact_{all,sys,user}_tables.
pub(super) fn build_stat_xact_tables_query(scope: Scope) -> String {
    format!(
        r#"
            SELECT
                relid,
                schemaname,
                relname,
                seq_scan,
                seq_tup_read,
                idx_scan,
                idx_tup_fetch,
                n_tup_ins,
                n_tup_upd,
                n_tup_del,
                n_tup_hot_upd
            FROM {}
        "#,
        scope.xact_tables_relation()
    )
}

/// Builds query for pg_stat_{all,sys,user}_indexes.
pub(super) fn build_stat_indexes_query(scope: Scope) -> String {
    format!(
        r#"
            SELECT
                relid,
                indexrelid,
                schemaname,
                relname,
                indexrelname,
                idx_scan,
                idx_tup_read,
                idx_tup_fetch
            FROM {}
        "#,
        scope.indexes_relation()
    )
}

/// Builds query for pg_statio_{all,sys,user}_tables.
pub(super) fn build_statio_tables_query(scope: Scope) -> String {
    format!(
        r#"
            SELECT
                relid,
                schemaname,
                relname,
                heap_blks_read,
                heap_blks_hit,
                idx_blks_read,
                idx_blks_hit,
                toast_blks_read,
                toast_blks_hit,
                tidx_blks_read,
                tidx_blks_hit
            FROM {}
        "#,
        scope.io_tables_relation()
    )
}

/// Builds query for pg_statio_{all,sys,user}_indexes.
pub(super) fn build_statio_indexes_query(scope: Scope) -> String {
    format!(
        r#"
            SELECT
                relid,
                indexrelid,
                schemaname,
                relname,
                indexrelname,
                idx_blks_read,
                idx_blks_hit
            FROM {}
        "#,
        scope.io_indexes_relation()
    )
}

/// Builds query for pg_statio_{all,sys,user}_sequences.
pub(super) fn build_statio_sequences_query(scope: Scope) -> String {
    format!(
        r#"
            SELECT
                relid,
                schemaname,
                relname,
                blks_read,
                blks_hit
            FROM {}
        "#,
        scope.io_sequences_relation()
    )
}

/// Builds query for pg_stat_user_functions / pg_stat_xact_user_functions.
pub(super) fn build_stat_functions_query(view: FunctionsView) -> String {
    format!(
        r#"
            SELECT
                funcid,
                schemaname,
                funcname,
                calls,
                total_time,
                self_time
            FROM {}
        "#,
        view.relation()
    )
}

/// Builds version-aware query for pg_stat_statements.
///
/// PG 13+: `*_exec_time` columns, read under their pre-13 names.
/// PG 17+: block I/O timings renamed to `shared_blk_*_time`.
pub(super) fn build_stat_statements_query(version: ServerVersion) -> String {
    let (total, min, max, mean, stddev) = if version >= ServerVersion::V13 {
        (
            "total_exec_time",
            "min_exec_time",
            "max_exec_time",
            "mean_exec_time",
            "stddev_exec_time",
        )
    } else {
        ("total_time", "min_time", "max_time", "mean_time", "stddev_time")
    };
    let (blk_read_time, blk_write_time) = if version >= ServerVersion::V17 {
        ("shared_blk_read_time", "shared_blk_write_time")
    } else {
        ("blk_read_time", "blk_write_time")
    };

    format!(
        r#"
            SELECT
                userid,
                dbid,
                queryid,
                query,
                calls,
                {total} AS total_time,
                {min} AS min_time,
                {max} AS max_time,
                {mean} AS mean_time,
                {stddev} AS stddev_time,
                rows,
                shared_blks_hit,
                shared_blks_read,
                shared_blks_dirtied,
                shared_blks_written,
                local_blks_hit,
                local_blks_read,
                local_blks_dirtied,
                local_blks_written,
                temp_blks_read,
                temp_blks_written,
                {blk_read_time} AS blk_read_time,
                {blk_write_time} AS blk_write_time
            FROM pg_stat_statements
        "#
    )
}
