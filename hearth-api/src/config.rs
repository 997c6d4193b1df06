/// Configuration management for the API server
///
/// Configuration is read from environment variables, with a `.env` file
/// loaded first when present.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `CORS_ORIGINS`: Comma separated allowed origins (default: *)
/// - `PRODUCTION`: Production mode flag (default: false)
/// - `STORE_BACKEND`: `postgres` or `memory` (default: postgres)
/// - `DATABASE_URL`: PostgreSQL connection string (required for postgres)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `JWT_SECRET`: Token signing secret, at least 32 characters (required)
/// - `JWT_EXPIRATION_SECONDS`: Token lifetime (default: 86400)
///
/// # Example
///
/// ```no_run
/// use hearth_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Minimum accepted length of `JWT_SECRET`
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub store_backend: StoreBackend,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,

    pub production: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL (empty with the memory backend)
    pub url: String,

    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for token signing
    ///
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,

    /// Token lifetime in seconds
    pub expiration_seconds: i64,
}

/// Which membership store the server runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => anyhow::bail!("Unknown STORE_BACKEND '{}', expected postgres or memory", other),
        }
    }
}

impl Config {
    /// Loads configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `JWT_SECRET` is missing or shorter than 32 characters
    /// - `DATABASE_URL` is missing with the postgres backend
    /// - A numeric or boolean variable does not parse
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let store_backend: StoreBackend = var_or("STORE_BACKEND", "postgres").parse()?;

        let database_url = match (lookup("DATABASE_URL"), store_backend) {
            (Some(url), _) => url,
            (None, StoreBackend::Memory) => String::new(),
            (None, StoreBackend::Postgres) => {
                anyhow::bail!("DATABASE_URL environment variable is required")
            }
        };

        let jwt_secret = lookup("JWT_SECRET")
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;
        if jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
            anyhow::bail!("JWT_SECRET must be at least {} characters long", MIN_JWT_SECRET_LENGTH);
        }

        let expiration_seconds = var_or("JWT_EXPIRATION_SECONDS", "86400").parse::<i64>()?;
        if expiration_seconds <= 0 {
            anyhow::bail!("JWT_EXPIRATION_SECONDS must be positive");
        }

        let cors_origins = var_or("CORS_ORIGINS", "*")
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            api: ApiConfig {
                host: var_or("API_HOST", "0.0.0.0"),
                port: var_or("API_PORT", "8080").parse::<u16>()?,
                cors_origins,
                production: var_or("PRODUCTION", "false").parse::<bool>()?,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: var_or("DATABASE_MAX_CONNECTIONS", "10").parse::<u32>()?,
            },
            jwt: JwtConfig {
                secret: jwt_secret,
                expiration_seconds,
            },
            store_backend,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.jwt.expiration_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[
            ("DATABASE_URL", "postgresql://localhost/hearth"),
            ("JWT_SECRET", SECRET),
        ])
        .unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.api.cors_origins, vec!["*".to_string()]);
        assert!(!config.api.production);
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.jwt.expiration_seconds, 86400);
        assert_eq!(config.token_ttl(), chrono::Duration::hours(24));
        assert_eq!(config.store_backend, StoreBackend::Postgres);
    }

    #[test]
    fn test_memory_backend_needs_no_database() {
        let config = load(&[("STORE_BACKEND", "memory"), ("JWT_SECRET", SECRET)]).unwrap();

        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert!(config.database.url.is_empty());
    }

    #[test]
    fn test_postgres_backend_requires_database_url() {
        assert!(load(&[("JWT_SECRET", SECRET)]).is_err());
    }

    #[test]
    fn test_short_or_missing_secret_rejected() {
        assert!(load(&[("STORE_BACKEND", "memory")]).is_err());
        assert!(load(&[("STORE_BACKEND", "memory"), ("JWT_SECRET", "short")]).is_err());
    }

    #[test]
    fn test_cors_origins_and_overrides() {
        let config = load(&[
            ("STORE_BACKEND", "memory"),
            ("JWT_SECRET", SECRET),
            ("CORS_ORIGINS", "https://a.example, https://b.example ,"),
            ("API_PORT", "9000"),
            ("PRODUCTION", "true"),
            ("JWT_EXPIRATION_SECONDS", "60"),
        ])
        .unwrap();

        assert_eq!(
            config.api.cors_origins,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
        assert_eq!(config.api.port, 9000);
        assert!(config.api.production);
        assert_eq!(config.token_ttl(), chrono::Duration::seconds(60));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(load(&[("STORE_BACKEND", "redis"), ("JWT_SECRET", SECRET)]).is_err());
        assert!(load(&[
            ("STORE_BACKEND", "memory"),
            ("JWT_SECRET", SECRET),
            ("API_PORT", "not-a-port"),
        ])
        .is_err());
        assert!(load(&[
            ("STORE_BACKEND", "memory"),
            ("JWT_SECRET", SECRET),
            ("JWT_EXPIRATION_SECONDS", "0"),
        ])
        .is_err());
    }
}
