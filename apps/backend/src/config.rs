//! Configuration module for the music API.
//!
//! Loads configuration from `config.toml` with environment variable overrides.

use config::{Config as ConfigLoader, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

use crate::error::AppError;

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub moments: MomentsConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            pool_size: default_pool_size(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./music.db")
}

fn default_pool_size() -> u32 {
    8
}

/// Hard ceiling for `moments.max_limit`.
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Pagination bounds for moment listings
#[derive(Debug, Clone, Deserialize)]
pub struct MomentsConfig {
    #[serde(default = "default_page_limit")]
    pub default_limit: u32,
    #[serde(default = "default_max_limit")]
    pub max_limit: u32,
}

impl Default for MomentsConfig {
    fn default() -> Self {
        Self {
            default_limit: default_page_limit(),
            max_limit: default_max_limit(),
        }
    }
}

fn default_page_limit() -> u32 {
    20
}

fn default_max_limit() -> u32 {
    MAX_PAGE_LIMIT
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Configuration is loaded in the following order (later sources override earlier):
    /// 1. Default values
    /// 2. `config.toml` in current directory (optional)
    /// 3. Environment variables with `MUSIC_API_` prefix
    ///
    /// Environment variables use double underscore for nesting:
    /// - `MUSIC_API_SERVER__PORT=9000` sets `server.port`
    /// - `MUSIC_API_DATABASE__PATH=/data/music.db` sets `database.path`
    pub fn load() -> Result<Self, AppError> {
        Self::load_from("config.toml")
    }

    /// Load configuration from a specific file path.
    pub fn load_from(config_path: &str) -> Result<Self, AppError> {
        let config = ConfigLoader::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            .set_default("database.path", "./music.db")?
            .set_default("database.pool_size", 8)?
            .set_default("moments.default_limit", 20)?
            .set_default("moments.max_limit", 100)?
            .add_source(File::with_name(config_path).required(false))
            // MUSIC_API_SERVER__PORT=9000 -> server.port = 9000
            .add_source(
                Environment::with_prefix("MUSIC_API")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.moments.max_limit == 0 || self.moments.max_limit > MAX_PAGE_LIMIT {
            return Err(invalid(format!(
                "moments.max_limit must be between 1 and {}",
                MAX_PAGE_LIMIT
            )));
        }
        if self.moments.default_limit == 0 || self.moments.default_limit > self.moments.max_limit
        {
            return Err(invalid(format!(
                "moments.default_limit must be between 1 and {}",
                self.moments.max_limit
            )));
        }
        if self.database.pool_size == 0 {
            tracing::warn!("database.pool_size is 0, using a single connection");
        }
        Ok(())
    }

    /// Get the server socket address
    pub fn server_addr(&self) -> std::net::SocketAddr {
        use std::net::{IpAddr, Ipv4Addr, SocketAddr};
        let ip: IpAddr = self.server.host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid host '{}', using 0.0.0.0", self.server.host);
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        });
        SocketAddr::new(ip, self.server.port)
    }
}

fn invalid(message: String) -> AppError {
    AppError::Config(config::ConfigError::Message(message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::load_from("nonexistent.toml").unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.database.path, PathBuf::from("./music.db"));
        assert_eq!(config.database.pool_size, 8);
    }

    #[test]
    fn test_moment_limits_defaults() {
        let config = Config::load_from("nonexistent.toml").unwrap();
        assert_eq!(config.moments.default_limit, 20);
        assert_eq!(config.moments.max_limit, 100);
    }

    #[test]
    fn test_server_addr() {
        let config = Config::load_from("nonexistent.toml").unwrap();
        let addr = config.server_addr();
        assert_eq!(addr.port(), 8000);
    }

    #[test]
    fn test_invalid_host_falls_back() {
        let mut config = Config::default();
        config.server.host = "not-an-ip".to_string();
        assert!(config.server_addr().ip().is_unspecified());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("music.toml");
        std::fs::write(
            &path,
            "[server]\nport = 9100\n\n[moments]\ndefault_limit = 10\n",
        )
        .unwrap();

        let config = Config::load_from(path.to_str().unwrap()).unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.moments.default_limit, 10);
        assert_eq!(config.moments.max_limit, 100);
    }

    #[test]
    fn test_max_limit_above_ceiling_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("music.toml");
        std::fs::write(&path, "[moments]\nmax_limit = 101\n").unwrap();

        let err = Config::load_from(path.to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("max_limit"));

        std::fs::write(&path, "[moments]\nmax_limit = 100\n").unwrap();
        assert!(Config::load_from(path.to_str().unwrap()).is_ok());
    }

    #[test]
    fn test_default_limit_above_max_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("music.toml");
        std::fs::write(&path, "[moments]\ndefault_limit = 500\n").unwrap();

        assert!(Config::load_from(path.to_str().unwrap()).is_err());
    }
}
