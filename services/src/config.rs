use panel_utils::version_info::RuntimeEnv;
use serde::Deserialize;
use std::env::vars;
use std::fmt::Display;
use std::time::Duration;
use tracing::info;

const DEFAULT_DATABASE_URL: &str = "sqlite://admin.db?mode=rwc";
const DEFAULT_PORT: u16 = 9033;
const DEFAULT_URL_PREFIX: &str = "admin";
const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 5;
const DEFAULT_DATA_SOURCE_TIMEOUT_MS: u64 = 3000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Env {
    #[serde(rename = "local")]
    Local,
    #[serde(rename = "prod")]
    Prod,
    #[serde(rename = "test")]
    Test,
}

impl From<&Env> for RuntimeEnv {
    fn from(env: &Env) -> Self {
        match env {
            Env::Local => RuntimeEnv::Local,
            Env::Prod => RuntimeEnv::Prod,
            Env::Test => RuntimeEnv::Test,
        }
    }
}

impl Display for Env {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Env::Local => write!(f, "local"),
            Env::Prod => write!(f, "prod"),
            Env::Test => write!(f, "test"),
        }
    }
}

// The final, validated configuration struct.
#[derive(Debug, Clone)]
pub struct Config {
    env: Env,
    database_url: String,
    server_addr: String,
    port: u16,
    url_prefix: String,
    shutdown_timeout_secs: u64,
    data_source_timeout_ms: u64,
}

// Environment variables as read, before defaults are applied.
#[derive(Deserialize)]
struct RawConfig {
    env: Env,
    database_url: Option<String>,
    server_addr: Option<String>,
    port: Option<u16>,
    url_prefix: Option<String>,
    shutdown_timeout_secs: Option<u64>,
    data_source_timeout_ms: Option<u64>,
}

impl Config {
    /// Create a test configuration with default values.
    ///
    /// Available to unit and integration tests; not meant for production code.
    pub fn new_for_test() -> Self {
        Self {
            env: Env::Local,
            database_url: "sqlite::memory:".to_owned(),
            server_addr: "127.0.0.1".to_owned(),
            port: DEFAULT_PORT,
            url_prefix: DEFAULT_URL_PREFIX.to_owned(),
            shutdown_timeout_secs: 1,
            data_source_timeout_ms: 500,
        }
    }

    #[cfg(test)]
    pub fn new_for_test_with_env(env: Env) -> Self {
        Self {
            env,
            ..Self::new_for_test()
        }
    }

    /// Overrides the data source timeout, for tests exercising slow sources.
    pub fn with_data_source_timeout(mut self, timeout: Duration) -> Self {
        self.data_source_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn environment(&self) -> &Env {
        &self.env
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn server_addr(&self) -> &str {
        &self.server_addr
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Path segment the admin routes are nested under, without slashes.
    pub fn url_prefix(&self) -> &str {
        &self.url_prefix
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    pub fn data_source_timeout(&self) -> Duration {
        Duration::from_millis(self.data_source_timeout_ms)
    }

    /// Local and test environments log human readable output.
    pub fn is_local(&self) -> bool {
        matches!(self.env, Env::Local | Env::Test)
    }

    pub fn is_prod(&self) -> bool {
        matches!(self.env, Env::Prod)
    }

    /// Initializes configuration by reading from environment variables
    /// and applying environment-aware defaults.
    pub fn init() -> anyhow::Result<Self> {
        info!("Loading configuration from environment variables");

        let raw_config: RawConfig = serde_env::from_iter(vars())?;
        Self::from_raw(raw_config)
    }

    fn from_raw(raw_config: RawConfig) -> anyhow::Result<Self> {
        let RawConfig {
            env,
            database_url,
            server_addr,
            port,
            url_prefix,
            shutdown_timeout_secs,
            data_source_timeout_ms,
        } = raw_config;

        let database_url = match database_url {
            Some(url) => url,
            None if !matches!(env, Env::Prod) => {
                info!(
                    "DATABASE_URL not set, defaulting to {} for {} environment",
                    DEFAULT_DATABASE_URL, env
                );
                DEFAULT_DATABASE_URL.to_owned()
            }
            None => anyhow::bail!("DATABASE_URL must be set for {} environment", env),
        };
        if !database_url.starts_with("sqlite:") {
            anyhow::bail!("DATABASE_URL must be a sqlite URL, got {}", database_url);
        }

        let server_addr = match server_addr {
            Some(addr) => {
                info!("Using provided SERVER_ADDR: {}", addr);
                addr
            }
            None => {
                let default_addr = match env {
                    Env::Local => "127.0.0.1",
                    _ => "0.0.0.0",
                };
                info!(
                    "SERVER_ADDR not set, defaulting to {} for {} environment",
                    default_addr, env
                );
                default_addr.to_owned()
            }
        };

        let url_prefix = url_prefix
            .map(|prefix| prefix.trim_matches('/').to_owned())
            .unwrap_or_else(|| DEFAULT_URL_PREFIX.to_owned());
        if url_prefix.is_empty()
            || !url_prefix
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            anyhow::bail!(
                "URL_PREFIX must be a single path segment of letters, digits, '-' or '_', got {:?}",
                url_prefix
            );
        }

        let data_source_timeout_ms =
            data_source_timeout_ms.unwrap_or(DEFAULT_DATA_SOURCE_TIMEOUT_MS);
        if data_source_timeout_ms == 0 {
            anyhow::bail!("DATA_SOURCE_TIMEOUT_MS must be greater than zero");
        }

        Ok(Config {
            env,
            database_url,
            server_addr,
            port: port.unwrap_or(DEFAULT_PORT),
            url_prefix,
            shutdown_timeout_secs: shutdown_timeout_secs.unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT_SECS),
            data_source_timeout_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_env::from_iter;

    #[test]
    fn local_defaults() {
        let raw: RawConfig =
            from_iter(vec![("ENV", "local")]).expect("RawConfig should deserialize");

        let config = Config::from_raw(raw).expect("local config should build");
        assert_eq!(config.database_url(), DEFAULT_DATABASE_URL);
        assert_eq!(config.server_addr(), "127.0.0.1");
        assert_eq!(config.port(), 9033);
        assert_eq!(config.url_prefix(), "admin");
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(5));
        assert_eq!(config.data_source_timeout(), Duration::from_millis(3000));
    }

    #[test]
    fn default_server_addr_for_test_is_public() {
        let raw: RawConfig = from_iter(vec![("ENV", "test"), ("PORT", "8080")])
            .expect("RawConfig should deserialize");

        let config = Config::from_raw(raw).expect("test config should build");
        assert_eq!(config.server_addr(), "0.0.0.0");
        assert_eq!(config.port(), 8080);
        assert!(config.is_local());
    }

    #[test]
    fn database_url_required_for_prod() {
        let raw: RawConfig =
            from_iter(vec![("ENV", "prod")]).expect("RawConfig should deserialize");

        let err = Config::from_raw(raw).unwrap_err().to_string();
        assert!(err.contains("DATABASE_URL"));
    }

    #[test]
    fn non_sqlite_database_is_rejected() {
        let raw: RawConfig = from_iter(vec![
            ("ENV", "prod"),
            ("DATABASE_URL", "postgres://example"),
        ])
        .expect("RawConfig should deserialize");

        assert!(Config::from_raw(raw).is_err());
    }

    #[test]
    fn url_prefix_is_trimmed_and_validated() {
        let raw: RawConfig = from_iter(vec![("ENV", "local"), ("URL_PREFIX", "/panel/")])
            .expect("RawConfig should deserialize");
        assert_eq!(Config::from_raw(raw).unwrap().url_prefix(), "panel");

        let raw: RawConfig = from_iter(vec![("ENV", "local"), ("URL_PREFIX", "a/b")])
            .expect("RawConfig should deserialize");
        assert!(Config::from_raw(raw).is_err());
    }

    #[test]
    fn timeouts_are_configurable() {
        let raw: RawConfig = from_iter(vec![
            ("ENV", "local"),
            ("SHUTDOWN_TIMEOUT_SECS", "12"),
            ("DATA_SOURCE_TIMEOUT_MS", "250"),
        ])
        .expect("RawConfig should deserialize");

        let config = Config::from_raw(raw).unwrap();
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(12));
        assert_eq!(config.data_source_timeout(), Duration::from_millis(250));

        let raw: RawConfig = from_iter(vec![("ENV", "local"), ("DATA_SOURCE_TIMEOUT_MS", "0")])
            .expect("RawConfig should deserialize");
        assert!(Config::from_raw(raw).is_err());
    }

    #[test]
    fn env_converts_to_runtime_env() {
        assert_eq!(RuntimeEnv::from(&Env::Local), RuntimeEnv::Local);
        assert_eq!(RuntimeEnv::from(&Env::Prod), RuntimeEnv::Prod);
        assert_eq!(RuntimeEnv::from(&Env::Test), RuntimeEnv::Test);
        assert!(Config::new_for_test_with_env(Env::Prod).is_prod());
    }
}
