//! pgstats - typed access to PostgreSQL pg_stat_* monitoring views.
//!
//! Every view is fetched with an explicit, version-aware column list and
//! scanned into a record whose nullable columns are [`Nullable`] values,
//! serialized as JSON `null` when SQL NULL.
//!
//! - [`PgStats`] - caller-owned context over one connection
//! - [`global`] - process-wide convenience connection
//! - [`views`] - record types and handle-generic fetch functions
//! - [`nullable`] - nullable primitives and their JSON codec
//!
//! ```no_run
//! use pgstats::{ConnectionConfig, PgStats, SslMode};
//!
//! let config = ConnectionConfig::new("postgres", "monitor", "secret").ssl_mode(SslMode::Disable);
//! let stats = PgStats::connect(&config)?;
//! for backend in stats.pg_stat_activity()? {
//!     println!("{}", serde_json::to_string(&backend).unwrap_or_default());
//! }
//! # Ok::<(), pgstats::PgStatsError>(())
//! ```

pub mod config;
pub mod error;
pub mod global;
pub mod handle;
pub mod mock;
pub mod nullable;
pub mod stats;
pub mod version;
pub mod views;

pub use config::{ConnectionConfig, SslMode};
pub use error::{PgStatsError, Result};
pub use nullable::{NullBool, NullFloat64, NullInt64, NullString, NullTime, Nullable};
pub use stats::PgStats;
pub use version::{ServerVersion, resolve_version};
pub use views::{FunctionsView, Scope};
