//! Service configuration.
//!
//! Read from the environment with the `CYCLETRACK` prefix and `__` between
//! nested keys, e.g. `CYCLETRACK__SERVER__PORT=8080`. A plain `DATABASE_URL`
//! is accepted as the default database URL.

use std::env;
use std::net::{IpAddr, SocketAddr};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default)]
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3050
}

fn default_max_connections() -> u32 {
    5
}

fn default_session_ttl_hours() -> i64 {
    24 * 7
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            run_migrations: false,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_hours: default_session_ttl_hours(),
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("server.host '{}' is not an IP address", self.host)))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

impl AuthConfig {
    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.session_ttl_hours)
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .set_default("database.url", env::var("DATABASE_URL").unwrap_or_default())?
            .add_source(
                config::Environment::with_prefix("CYCLETRACK")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = &self.database.url;
        if url.is_empty() {
            return Err(ConfigError::Invalid("database.url is required".into()));
        }
        if !url.starts_with("postgres://") && !url.starts_with("postgresql://") {
            return Err(ConfigError::Invalid("database.url must be a Postgres URL".into()));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid("database.max_connections must be positive".into()));
        }
        if self.auth.session_ttl_hours <= 0 {
            return Err(ConfigError::Invalid("auth.session_ttl_hours must be positive".into()));
        }
        self.server.socket_addr()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Env vars are process-global.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn valid() -> AppConfig {
        AppConfig {
            server: ServerConfig::default(),
            database: DatabaseConfig {
                url: "postgres://localhost/cycletrack".into(),
                ..Default::default()
            },
            auth: AuthConfig::default(),
        }
    }

    #[test]
    fn defaults_match_service_defaults() {
        let config = valid();
        assert_eq!(config.server.port, 3050);
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.auth.session_ttl(), chrono::Duration::hours(168));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = valid();
        config.database.url = "mysql://localhost/db".into();
        assert!(config.validate().is_err());

        let mut config = valid();
        config.database.max_connections = 0;
        assert!(config.validate().is_err());

        let mut config = valid();
        config.auth.session_ttl_hours = 0;
        assert!(config.validate().is_err());

        let mut config = valid();
        config.server.host = "localhost:80".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_reads_prefixed_env() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("CYCLETRACK__DATABASE__URL", "postgres://env-host/cycletrack");
        env::set_var("CYCLETRACK__SERVER__PORT", "8088");

        let config = AppConfig::load().unwrap();
        assert_eq!(config.database.url, "postgres://env-host/cycletrack");
        assert_eq!(config.server.port, 8088);

        env::remove_var("CYCLETRACK__DATABASE__URL");
        env::remove_var("CYCLETRACK__SERVER__PORT");
    }
}
