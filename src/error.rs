//! Error type shared by every fetch, the version resolver and the codec.

use crate::nullable::CodecError;
use crate::version::ServerVersion;

/// Errors returned by pgstats operations.
///
/// Callers can tell "feature unsupported on this server" from "query or
/// network failure" from "malformed data" by matching on the variant.
#[derive(Debug, thiserror::Error)]
pub enum PgStatsError {
    /// Connection options were rejected before connecting.
    #[error("PostgreSQL: invalid configuration: {0}")]
    Config(String),

    /// Connection could not be established or did not answer the ping.
    #[error("PostgreSQL: {0}")]
    Connection(String),

    /// The server rejected or failed to execute a query.
    #[error("PostgreSQL query error: {0}")]
    Query(String),

    /// A result column could not be converted into the record field.
    #[error("cannot scan column {column}: {message}")]
    Scan { column: usize, message: String },

    /// `server_version` did not start with a recognisable major version.
    #[error("cannot parse server version from {input:?}")]
    Parse { input: String },

    /// The connected server is older than the view requires.
    #[error("{view} requires PostgreSQL {required} or newer, server is {actual}")]
    UnsupportedVersion {
        view: &'static str,
        required: ServerVersion,
        actual: ServerVersion,
    },

    /// JSON encoding or decoding of a nullable value failed.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The global facade was used before `define_connection` succeeded.
    #[error("connection has not been defined")]
    NotInitialized,
}

pub type Result<T> = std::result::Result<T, PgStatsError>;

impl PgStatsError {
    pub(crate) fn scan(column: usize, message: impl Into<String>) -> Self {
        PgStatsError::Scan {
            column,
            message: message.into(),
        }
    }

    /// True when the error only means the view is unavailable on this server.
    pub fn is_unsupported_version(&self) -> bool {
        matches!(self, PgStatsError::UnsupportedVersion { .. })
    }
}

/// Formats a driver error for display.
///
/// Server-side errors are reduced to `SEVERITY: message`; client-side
/// failures keep the driver's wording except for a few common cases.
pub(crate) fn format_postgres_error(e: &postgres::Error) -> String {
    if let Some(db_error) = e.as_db_error() {
        format!("{}: {}", db_error.severity(), db_error.message())
    } else {
        let msg = e.to_string();
        if msg.contains("Connection refused") {
            "connection refused".to_string()
        } else if msg.contains("password authentication failed") {
            "password authentication failed".to_string()
        } else if msg.contains("does not exist") {
            msg.split("FATAL:")
                .last()
                .unwrap_or(&msg)
                .trim()
                .to_string()
        } else {
            msg
        }
    }
}
