use std::time::Duration;

use opsportal_core::directory::{DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL_SECS};
use opsportal_core::engine::{EngineConfig, DEFAULT_WRITE_RETRIES};

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development. In production,
/// override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Lifecycle engine tunables.
    pub engine: EngineConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                 |
    /// |----------------------------|-------------------------|
    /// | `HOST`                     | `0.0.0.0`               |
    /// | `PORT`                     | `3000`                  |
    /// | `CORS_ORIGINS`             | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`     | `30`                    |
    /// | `DIRECTORY_CACHE_TTL_SECS` | `60`                    |
    /// | `DIRECTORY_CACHE_CAPACITY` | `10000`                 |
    /// | `WRITE_RETRIES`            | `3`                     |
    ///
    /// `DATABASE_URL` is read separately by the binary.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = env_parse("PORT", 3000);

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = env_parse("REQUEST_TIMEOUT_SECS", 30);

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            engine: engine_config_from_env(),
        }
    }
}

/// Engine tunables from `DIRECTORY_CACHE_TTL_SECS`, `DIRECTORY_CACHE_CAPACITY`
/// and `WRITE_RETRIES`.
pub fn engine_config_from_env() -> EngineConfig {
    let write_retries: u32 = env_parse("WRITE_RETRIES", DEFAULT_WRITE_RETRIES);
    assert!(write_retries > 0, "WRITE_RETRIES must be at least 1");

    EngineConfig {
        write_retries,
        directory_cache_ttl: Duration::from_secs(env_parse(
            "DIRECTORY_CACHE_TTL_SECS",
            DEFAULT_CACHE_TTL_SECS,
        )),
        directory_cache_capacity: env_parse("DIRECTORY_CACHE_CAPACITY", DEFAULT_CACHE_CAPACITY),
    }
}

/// Read `name` and parse it, falling back to `default` when unset.
///
/// Panics on a value that does not parse; misconfiguration fails at startup.
fn env_parse<T>(name: &str, default: T) -> T
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{name} must be a valid {}: {e}", std::any::type_name::<T>())),
        Err(_) => default,
    }
}
