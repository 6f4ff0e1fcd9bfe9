//! Server major version detection.
//!
//! `SHOW server_version` reports `9.6.13` on pre-10 servers and `11.3`
//! (optionally followed by a distribution suffix) on 10+. Only the release
//! line matters for choosing column sets: `9.x` below 10, the bare major
//! number from 10 on.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::{PgStatsError, Result};
use crate::handle::QueryHandle;

const SERVER_VERSION_QUERY: &str = "SHOW server_version";

static MAJOR_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:9\.(\d)|(\d\d))").expect("static regex is valid"));

/// Comparable server release line: `9.4`, `9.5`, `9.6`, `10`, `11`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServerVersion {
    major: u32,
    minor: u32,
}

impl ServerVersion {
    pub const V9_5: ServerVersion = ServerVersion::new(9, 5);
    pub const V9_6: ServerVersion = ServerVersion::new(9, 6);
    pub const V10: ServerVersion = ServerVersion::new(10, 0);
    pub const V11: ServerVersion = ServerVersion::new(11, 0);
    pub const V12: ServerVersion = ServerVersion::new(12, 0);
    pub const V13: ServerVersion = ServerVersion::new(13, 0);
    pub const V14: ServerVersion = ServerVersion::new(14, 0);
    pub const V17: ServerVersion = ServerVersion::new(17, 0);

    /// `minor` is only meaningful for the 9.x line; pass 0 for 10+.
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    pub fn major(&self) -> u32 {
        self.major
    }

    pub fn minor(&self) -> u32 {
        self.minor
    }

    /// The version as a number, e.g. `9.6` or `11.0`.
    pub fn as_f64(&self) -> f64 {
        self.major as f64 + self.minor as f64 / 10.0
    }

    /// Fails with `UnsupportedVersion` when `self` is older than `minimum`.
    pub fn require(self, view: &'static str, minimum: ServerVersion) -> Result<()> {
        if self < minimum {
            return Err(PgStatsError::UnsupportedVersion {
                view,
                required: minimum,
                actual: self,
            });
        }
        Ok(())
    }

    /// Extracts the release line from a full `server_version` string.
    pub fn parse(full: &str) -> Result<Self> {
        let parse_error = || PgStatsError::Parse {
            input: full.to_string(),
        };
        let caps = MAJOR_VERSION.captures(full).ok_or_else(parse_error)?;

        if let Some(minor) = caps.get(1) {
            let minor = minor.as_str().parse().map_err(|_| parse_error())?;
            return Ok(Self::new(9, minor));
        }
        let major = caps
            .get(2)
            .ok_or_else(parse_error)?
            .as_str()
            .parse()
            .map_err(|_| parse_error())?;
        Ok(Self::new(major, 0))
    }
}

impl FromStr for ServerVersion {
    type Err = PgStatsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.major < 10 {
            write!(f, "{}.{}", self.major, self.minor)
        } else {
            write!(f, "{}", self.major)
        }
    }
}

/// Asks the server for its version and reduces it to the release line.
///
/// Issues exactly one query. Query failures surface as `Query`, an
/// unrecognisable answer as `Parse`.
pub fn resolve_version<H: QueryHandle + ?Sized>(handle: &mut H) -> Result<ServerVersion> {
    let full = handle.query_scalar(SERVER_VERSION_QUERY)?;
    let version = ServerVersion::parse(&full)?;
    debug!(server_version = %full, major = %version, "resolved server version");
    Ok(version)
}
