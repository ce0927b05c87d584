use std::fmt;

/// Process configuration, read from the environment (and `.env`, if present).
#[derive(Clone)]
pub struct Config {
    /// Exact value expected in the webhook's `Authorization` header.
    pub webhook_secret: String,
    pub host: String,
    pub port: u16,
    /// SQLite database file, or `:memory:`.
    pub database_path: String,
    pub pool_size: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),
    #[error("{key} must be {expected}, got {value:?}")]
    Invalid {
        key: &'static str,
        expected: &'static str,
        value: String,
    },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let config = Self::from_lookup(|key| std::env::var(key).ok())?;
        config.log_keys();
        Ok(config)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let webhook_secret = lookup("PARTICLE_WEBHOOK_AUTH")
            .filter(|secret| !secret.is_empty())
            .ok_or(ConfigError::Missing("PARTICLE_WEBHOOK_AUTH"))?;

        let pool_size: u32 = parse_or(&lookup, "POOL_SIZE", "a positive integer", 8)?;
        if pool_size == 0 {
            return Err(ConfigError::Invalid {
                key: "POOL_SIZE",
                expected: "a positive integer",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            webhook_secret,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "PORT", "a port number", 8080)?,
            database_path: lookup("DATABASE_PATH").unwrap_or_else(|| "events.db".to_string()),
            pool_size,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn log_keys(&self) {
        tracing::info!("Config loaded:");
        tracing::info!("  PARTICLE_WEBHOOK_AUTH: <set>({} chars)", self.webhook_secret.len());
        tracing::info!("  DATABASE_PATH: {}", self.database_path);
        tracing::info!("  POOL_SIZE: {}", self.pool_size);
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    expected: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
            key,
            expected,
            value,
        }),
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("webhook_secret", &"<redacted>")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database_path", &self.database_path)
            .field("pool_size", &self.pool_size)
            .finish()
    }
}
