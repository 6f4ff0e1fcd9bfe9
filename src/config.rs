//! Connection configuration.
//!
//! [`ConnectionConfig`] holds the required credentials plus the optional
//! libpq-style parameters, and turns them into a `postgres::Config` and a
//! TLS connector. It can also be read from the standard libpq environment
//! variables:
//! - PGHOST (default: localhost)
//! - PGPORT (default: 5432)
//! - PGUSER (default: $USER)
//! - PGPASSWORD (default: empty)
//! - PGDATABASE (default: same as PGUSER)
//! - PGSSLMODE (default: require)

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use native_tls::{Certificate, Identity, TlsConnector};
use postgres_native_tls::MakeTlsConnector;
use tracing::debug;

use crate::error::{PgStatsError, Result};

pub const DEFAULT_PORT: u16 = 5432;

/// Whether and how to use SSL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SslMode {
    /// No SSL.
    Disable,
    /// Always SSL, no certificate verification.
    #[default]
    Require,
    /// Always SSL, the server certificate must be signed by a trusted CA.
    VerifyCa,
    /// Like `VerifyCa`, and the host name must match the certificate.
    VerifyFull,
}

impl SslMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SslMode::Disable => "disable",
            SslMode::Require => "require",
            SslMode::VerifyCa => "verify-ca",
            SslMode::VerifyFull => "verify-full",
        }
    }
}

impl FromStr for SslMode {
    type Err = PgStatsError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "disable" => Ok(SslMode::Disable),
            "require" => Ok(SslMode::Require),
            "verify-ca" => Ok(SslMode::VerifyCa),
            "verify-full" => Ok(SslMode::VerifyFull),
            other => Err(PgStatsError::Config(format!(
                "invalid SSL mode {other:?}, allowed values: disable, require, verify-ca, verify-full"
            ))),
        }
    }
}

impl fmt::Display for SslMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters for opening a monitoring connection.
#[derive(Clone)]
pub struct ConnectionConfig {
    dbname: String,
    user: String,
    password: String,
    host: Option<String>,
    port: Option<u16>,
    ssl_mode: SslMode,
    fallback_application_name: Option<String>,
    connect_timeout: Option<Duration>,
    ssl_cert: Option<PathBuf>,
    ssl_key: Option<PathBuf>,
    ssl_root_cert: Option<PathBuf>,
    cache_server_version: bool,
}

impl ConnectionConfig {
    pub fn new(
        dbname: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            dbname: dbname.into(),
            user: user.into(),
            password: password.into(),
            host: None,
            port: None,
            ssl_mode: SslMode::default(),
            fallback_application_name: None,
            connect_timeout: None,
            ssl_cert: None,
            ssl_key: None,
            ssl_root_cert: None,
            cache_server_version: false,
        }
    }

    /// Reads the libpq environment variables.
    ///
    /// Uses $USER if PGUSER is not set.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let user = lookup("PGUSER")
            .or_else(|| lookup("USER"))
            .ok_or_else(|| PgStatsError::Config("PGUSER or USER not set".to_string()))?;
        let database = lookup("PGDATABASE").unwrap_or_else(|| user.clone());
        let password = lookup("PGPASSWORD").unwrap_or_default();

        let mut config = Self::new(database, user, password);
        if let Some(host) = lookup("PGHOST") {
            config = config.host(host);
        }
        if let Some(port) = lookup("PGPORT") {
            let port = port
                .parse()
                .map_err(|_| PgStatsError::Config(format!("invalid PGPORT {port:?}")))?;
            config = config.port(port);
        }
        if let Some(mode) = lookup("PGSSLMODE") {
            config = config.ssl_mode(mode.parse()?);
        }
        Ok(config)
    }

    /// Host name or address. Values starting with `/` are unix socket
    /// directories.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn ssl_mode(mut self, mode: SslMode) -> Self {
        self.ssl_mode = mode;
        self
    }

    /// `application_name` to report when none is set otherwise.
    pub fn fallback_application_name(mut self, name: impl Into<String>) -> Self {
        self.fallback_application_name = Some(name.into());
        self
    }

    /// Maximum wait for the connection, in seconds. Zero waits indefinitely.
    pub fn connect_timeout(mut self, seconds: u64) -> Self {
        self.connect_timeout = (seconds > 0).then(|| Duration::from_secs(seconds));
        self
    }

    /// PEM client certificate.
    pub fn ssl_cert(mut self, path: impl Into<PathBuf>) -> Self {
        self.ssl_cert = Some(path.into());
        self
    }

    /// PEM client key.
    pub fn ssl_key(mut self, path: impl Into<PathBuf>) -> Self {
        self.ssl_key = Some(path.into());
        self
    }

    /// PEM root certificate to trust in addition to the system store.
    pub fn ssl_root_cert(mut self, path: impl Into<PathBuf>) -> Self {
        self.ssl_root_cert = Some(path.into());
        self
    }

    /// Resolve the server version once per connection instead of once per
    /// version-sensitive fetch. Off by default.
    pub fn cache_server_version(mut self, enabled: bool) -> Self {
        self.cache_server_version = enabled;
        self
    }

    pub fn get_dbname(&self) -> &str {
        &self.dbname
    }

    pub fn get_user(&self) -> &str {
        &self.user
    }

    pub fn get_host(&self) -> &str {
        self.host.as_deref().unwrap_or("localhost")
    }

    pub fn get_port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn get_ssl_mode(&self) -> SslMode {
        self.ssl_mode
    }

    pub fn get_connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout
    }

    pub fn caches_server_version(&self) -> bool {
        self.cache_server_version
    }

    /// Builds the driver configuration.
    pub fn to_pg_config(&self) -> postgres::Config {
        let mut pg = postgres::Config::new();
        pg.host(self.get_host())
            .port(self.get_port())
            .user(&self.user)
            .dbname(&self.dbname);
        if !self.password.is_empty() {
            pg.password(&self.password);
        }
        if let Some(name) = &self.fallback_application_name {
            pg.application_name(name);
        }
        if let Some(timeout) = self.connect_timeout {
            pg.connect_timeout(timeout);
        }
        pg.ssl_mode(match self.ssl_mode {
            SslMode::Disable => postgres::config::SslMode::Disable,
            _ => postgres::config::SslMode::Require,
        });
        pg
    }

    /// Builds the TLS connector for this configuration, `None` when SSL is
    /// disabled.
    pub fn tls_connector(&self) -> Result<Option<MakeTlsConnector>> {
        if self.ssl_mode == SslMode::Disable {
            return Ok(None);
        }

        let mut builder = TlsConnector::builder();
        match self.ssl_mode {
            SslMode::Require => {
                builder.danger_accept_invalid_certs(true);
                builder.danger_accept_invalid_hostnames(true);
            }
            SslMode::VerifyCa => {
                builder.danger_accept_invalid_hostnames(true);
            }
            SslMode::VerifyFull | SslMode::Disable => {}
        }

        if let Some(path) = &self.ssl_root_cert {
            let cert = Certificate::from_pem(&read_pem(path)?)
                .map_err(|e| tls_error("root certificate", path, e))?;
            builder.add_root_certificate(cert);
        }

        match (&self.ssl_cert, &self.ssl_key) {
            (Some(cert_path), Some(key_path)) => {
                let identity = Identity::from_pkcs8(&read_pem(cert_path)?, &read_pem(key_path)?)
                    .map_err(|e| tls_error("client certificate", cert_path, e))?;
                builder.identity(identity);
            }
            (None, None) => {}
            _ => {
                return Err(PgStatsError::Config(
                    "ssl_cert and ssl_key must be set together".to_string(),
                ));
            }
        }

        let connector = builder
            .build()
            .map_err(|e| PgStatsError::Config(format!("cannot build TLS connector: {e}")))?;
        debug!(ssl_mode = %self.ssl_mode, "TLS connector built");
        Ok(Some(MakeTlsConnector::new(connector)))
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("dbname", &self.dbname)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("host", &self.get_host())
            .field("port", &self.get_port())
            .field("ssl_mode", &self.ssl_mode)
            .field("fallback_application_name", &self.fallback_application_name)
            .field("connect_timeout", &self.connect_timeout)
            .field("ssl_cert", &self.ssl_cert)
            .field("ssl_key", &self.ssl_key)
            .field("ssl_root_cert", &self.ssl_root_cert)
            .field("cache_server_version", &self.cache_server_version)
            .finish()
    }
}

fn read_pem(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| PgStatsError::Config(format!("cannot read {}: {e}", path.display())))
}

fn tls_error(what: &str, path: &Path, e: native_tls::Error) -> PgStatsError {
    PgStatsError::Config(format!("invalid {what} {}: {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn required_params_only() {
        let config = ConnectionConfig::new("testDb", "testUser", "12345");
        let pg = config.to_pg_config();
        assert_eq!(pg.get_dbname(), Some("testDb"));
        assert_eq!(pg.get_user(), Some("testUser"));
        assert_eq!(pg.get_password(), Some("12345".as_bytes()));
        assert_eq!(pg.get_ports(), &[DEFAULT_PORT]);
        assert_eq!(config.get_ssl_mode(), SslMode::Require);
        assert!(!config.caches_server_version());
    }

    #[test]
    fn all_optional_params() {
        let config = ConnectionConfig::new("testDb", "testUser", "12345")
            .host("testHostname")
            .port(1234)
            .ssl_mode(SslMode::Disable)
            .fallback_application_name("testApp")
            .connect_timeout(42)
            .ssl_cert("/test/loc")
            .ssl_key("/another")
            .ssl_root_cert("/root.pem");
        let pg = config.to_pg_config();
        assert_eq!(
            pg.get_hosts(),
            &[postgres::config::Host::Tcp("testHostname".to_string())]
        );
        assert_eq!(pg.get_ports(), &[1234]);
        assert_eq!(pg.get_application_name(), Some("testApp"));
        assert_eq!(pg.get_connect_timeout(), Some(&Duration::from_secs(42)));
        assert_eq!(pg.get_ssl_mode(), postgres::config::SslMode::Disable);
        // disabled SSL never touches the certificate files
        assert!(config.tls_connector().unwrap().is_none());
    }

    #[test]
    fn zero_timeout_waits_indefinitely() {
        let config = ConnectionConfig::new("db", "u", "").connect_timeout(0);
        assert_eq!(config.get_connect_timeout(), None);
        assert_eq!(config.to_pg_config().get_password(), None);
    }

    #[test]
    fn ssl_modes_parse_strictly() {
        for mode in ["disable", "require", "verify-ca", "verify-full"] {
            assert_eq!(mode.parse::<SslMode>().unwrap().as_str(), mode);
        }
        for bad in ["INVALID", "prefer", "Require", ""] {
            assert!(matches!(bad.parse::<SslMode>(), Err(PgStatsError::Config(_))));
        }
    }

    #[test]
    fn unreadable_root_cert_is_a_config_error() {
        let config = ConnectionConfig::new("db", "u", "p")
            .ssl_mode(SslMode::VerifyFull)
            .ssl_root_cert("/nonexistent/pgstats-root.pem");
        assert!(matches!(config.tls_connector(), Err(PgStatsError::Config(_))));
    }

    #[test]
    fn malformed_root_cert_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("root.pem");
        fs::write(&path, "not a certificate").unwrap();

        let config = ConnectionConfig::new("db", "u", "p")
            .ssl_mode(SslMode::VerifyCa)
            .ssl_root_cert(&path);
        match config.tls_connector() {
            Err(PgStatsError::Config(msg)) => assert!(msg.contains("root certificate")),
            other => panic!("unexpected {:?}", other.map(|c| c.is_some())),
        }
    }

    #[test]
    fn client_cert_requires_key() {
        let config = ConnectionConfig::new("db", "u", "p").ssl_cert("/client.pem");
        match config.tls_connector() {
            Err(PgStatsError::Config(msg)) => assert!(msg.contains("together")),
            other => panic!("unexpected {:?}", other.map(|c| c.is_some())),
        }
    }

    #[test]
    fn env_defaults_follow_libpq() {
        let config = ConnectionConfig::from_lookup(env(&[("USER", "postgres")])).unwrap();
        assert_eq!(config.get_user(), "postgres");
        assert_eq!(config.get_dbname(), "postgres");
        assert_eq!(config.get_host(), "localhost");
        assert_eq!(config.get_port(), 5432);

        let config = ConnectionConfig::from_lookup(env(&[
            ("USER", "ignored"),
            ("PGUSER", "monitor"),
            ("PGDATABASE", "app"),
            ("PGHOST", "/var/run/postgresql"),
            ("PGPORT", "6432"),
            ("PGSSLMODE", "verify-ca"),
        ]))
        .unwrap();
        assert_eq!(config.get_user(), "monitor");
        assert_eq!(config.get_dbname(), "app");
        assert_eq!(config.get_port(), 6432);
        assert_eq!(config.get_ssl_mode(), SslMode::VerifyCa);
    }

    #[test]
    fn env_errors() {
        assert!(matches!(
            ConnectionConfig::from_lookup(env(&[])),
            Err(PgStatsError::Config(_))
        ));
        assert!(ConnectionConfig::from_lookup(env(&[("USER", "u"), ("PGPORT", "x")])).is_err());
        assert!(
            ConnectionConfig::from_lookup(env(&[("USER", "u"), ("PGSSLMODE", "allow")])).is_err()
        );
    }

    #[test]
    fn debug_redacts_password() {
        let config = ConnectionConfig::new("db", "u", "s3cret");
        let shown = format!("{config:?}");
        assert!(!shown.contains("s3cret"));
        assert!(shown.contains("<redacted>"));
    }
}
