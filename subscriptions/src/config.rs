use std::env;

use subtrack_database::DatabaseConfig;

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Redis connection settings. Loaded for deployment parity; nothing reads
/// from the cache yet.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    pub host: String,
    pub port: u16,
    pub db: u8,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6379,
            db: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
}

impl AppConfig {
    /// Read the process environment. Call `dotenv::dotenv()` first to pick up `.env`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let server_defaults = ServerConfig::default();
        let cache_defaults = CacheConfig::default();

        Self {
            server: ServerConfig {
                host: lookup("SERVER_HOST").unwrap_or(server_defaults.host),
                port: lookup("SERVER_PORT")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(server_defaults.port),
            },
            database: DatabaseConfig::from_lookup(&lookup),
            cache: CacheConfig {
                host: lookup("REDIS_HOST").unwrap_or(cache_defaults.host),
                port: lookup("REDIS_PORT")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(cache_defaults.port),
                db: lookup("REDIS_DB")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(cache_defaults.db),
            },
        }
    }
}
