/// Configuration for the API server
///
/// Loaded from environment variables (and a `.env` file in development).
///
/// # Environment Variables
///
/// | Variable                   | Default         |
/// |----------------------------|-----------------|
/// | `DATABASE_URL`             | required        |
/// | `DATABASE_MAX_CONNECTIONS` | `10`            |
/// | `API_HOST`                 | `0.0.0.0`       |
/// | `API_PORT`                 | `8080`          |
/// | `JWT_SECRET`               | required, >= 32 chars |
/// | `CORS_ORIGINS`             | `*` (comma-separated list) |
/// | `PRODUCTION`               | `false` (enables HSTS) |
/// | `FILE_STORAGE_DIR`         | `./data/files`  |
/// | `MAX_UPLOAD_BYTES`         | `10485760`      |
///
/// # Example
///
/// ```no_run
/// use projecthub_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("listening on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use anyhow::Context;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const MIN_JWT_SECRET_LEN: usize = 32;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Allowed origins; `*` means permissive CORS
    pub cors_origins: Vec<String>,

    /// Production mode turns on HSTS
    pub production: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// HS256 signing key. Generate with `openssl rand -hex 32`.
    #[serde(skip_serializing)]
    pub secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory of the on-disk blob store
    pub dir: PathBuf,

    /// Largest accepted upload, in bytes
    pub max_upload_bytes: usize,
}

impl Config {
    /// Loads configuration from the process environment
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(env::vars().collect())
    }

    /// Builds configuration from an explicit variable map
    pub fn from_vars(vars: HashMap<String, String>) -> anyhow::Result<Self> {
        let get = |key: &str| vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

        let host = get("API_HOST").unwrap_or("0.0.0.0").to_string();
        let port = get("API_PORT")
            .unwrap_or("8080")
            .parse::<u16>()
            .context("API_PORT must be a valid port number")?;

        let url = get("DATABASE_URL")
            .context("DATABASE_URL environment variable is required")?
            .to_string();
        let max_connections = get("DATABASE_MAX_CONNECTIONS")
            .unwrap_or("10")
            .parse::<u32>()
            .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?;
        if max_connections == 0 {
            anyhow::bail!("DATABASE_MAX_CONNECTIONS must be at least 1");
        }

        let secret = get("JWT_SECRET")
            .context("JWT_SECRET environment variable is required")?
            .to_string();
        if secret.len() < MIN_JWT_SECRET_LEN {
            anyhow::bail!(
                "JWT_SECRET must be at least {} characters long",
                MIN_JWT_SECRET_LEN
            );
        }

        let cors_origins = get("CORS_ORIGINS")
            .unwrap_or("*")
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        let production = match get("PRODUCTION") {
            Some(v) => parse_bool(v).context("PRODUCTION must be true or false")?,
            None => false,
        };

        let dir = PathBuf::from(get("FILE_STORAGE_DIR").unwrap_or("./data/files"));
        let max_upload_bytes = match get("MAX_UPLOAD_BYTES") {
            Some(v) => v
                .parse::<usize>()
                .context("MAX_UPLOAD_BYTES must be a byte count")?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                cors_origins,
                production,
            },
            database: DatabaseConfig {
                url,
                max_connections,
            },
            jwt: JwtConfig { secret },
            storage: StorageConfig {
                dir,
                max_upload_bytes,
            },
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    pub fn allows_any_origin(&self) -> bool {
        self.api.cors_origins.iter().any(|o| o == "*")
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn minimal() -> HashMap<String, String> {
        vars(&[
            ("DATABASE_URL", "postgresql://localhost/projecthub"),
            ("JWT_SECRET", SECRET),
        ])
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_vars(minimal()).unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.database.max_connections, 10);
        assert!(config.allows_any_origin());
        assert!(!config.api.production);
        assert_eq!(config.storage.dir, PathBuf::from("./data/files"));
        assert_eq!(config.storage.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
    }

    #[test]
    fn test_overrides() {
        let mut env = minimal();
        env.extend(vars(&[
            ("API_HOST", "127.0.0.1"),
            ("API_PORT", "3000"),
            ("CORS_ORIGINS", "https://a.example, https://b.example"),
            ("PRODUCTION", "true"),
            ("FILE_STORAGE_DIR", "/srv/blobs"),
            ("MAX_UPLOAD_BYTES", "1024"),
        ]));

        let config = Config::from_vars(env).unwrap();
        assert_eq!(config.bind_address(), "127.0.0.1:3000");
        assert_eq!(
            config.api.cors_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert!(!config.allows_any_origin());
        assert!(config.api.production);
        assert_eq!(config.storage.dir, PathBuf::from("/srv/blobs"));
        assert_eq!(config.storage.max_upload_bytes, 1024);
    }

    #[test]
    fn test_missing_required() {
        let err = Config::from_vars(vars(&[("JWT_SECRET", SECRET)])).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));

        let err = Config::from_vars(vars(&[("DATABASE_URL", "postgresql://x")])).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn test_short_secret_rejected() {
        let mut env = minimal();
        env.insert("JWT_SECRET".into(), "too-short".into());
        assert!(Config::from_vars(env).is_err());
    }

    #[test]
    fn test_invalid_numbers_rejected() {
        let mut env = minimal();
        env.insert("API_PORT".into(), "http".into());
        assert!(Config::from_vars(env).is_err());

        let mut env = minimal();
        env.insert("DATABASE_MAX_CONNECTIONS".into(), "0".into());
        assert!(Config::from_vars(env).is_err());

        let mut env = minimal();
        env.insert("PRODUCTION".into(), "maybe".into());
        assert!(Config::from_vars(env).is_err());
    }

    #[test]
    fn test_secret_not_serialized() {
        let config = Config::from_vars(minimal()).unwrap();
        let json = serde_json::to_value(&config).unwrap();
        assert!(json["jwt"].get("secret").is_none());
    }
}
