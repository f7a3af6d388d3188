//! Configuration management for Keeper Service
//!
//! Loads settings from:
//! 1. Environment variables
//! 2. .env file (local development)
//!
//! # Example
//!
//! ```no_run
//! use keeper_service::config::Settings;
//!
//! fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     println!("HTTP port: {}", settings.server.http_port);
//!     Ok(())
//! }
//! ```

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub jwt: JwtSettings,
    pub server: ServerSettings,
    pub password_hash: PasswordHashSettings,
}

impl Settings {
    /// Load settings from environment variables (and `.env` in debug builds)
    pub fn load() -> Result<Self> {
        if cfg!(debug_assertions) {
            report_dotenv(dotenvy::dotenv());
        }

        Ok(Settings {
            database: DatabaseSettings::from_env()?,
            jwt: JwtSettings::from_env()?,
            server: ServerSettings::from_env()?,
            password_hash: PasswordHashSettings::from_env()?,
        })
    }
}

/// Log the outcome of reading `.env`; a missing file is silently skipped
fn report_dotenv(result: dotenvy::Result<PathBuf>) -> Option<PathBuf> {
    match result {
        Ok(path) => {
            info!(path = %path.display(), "Loaded .env file for development");
            Some(path)
        }
        Err(e) if e.not_found() => None,
        Err(e) => {
            warn!(error = %e, "Ignoring unreadable .env file");
            None
        }
    }
}

/// Database connection settings
///
/// `url` is optional: without it the service keeps its data in memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout: u64,
}

impl DatabaseSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            url: env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty()),
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("Invalid DATABASE_MAX_CONNECTIONS")?,
            acquire_timeout: env::var("DATABASE_ACQUIRE_TIMEOUT")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .context("Invalid DATABASE_ACQUIRE_TIMEOUT")?,
        })
    }
}

/// Session token signing settings
#[derive(Clone, Serialize, Deserialize)]
pub struct JwtSettings {
    pub secret: String,
}

impl std::fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSettings")
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl JwtSettings {
    fn from_env() -> Result<Self> {
        let secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        if secret.is_empty() {
            bail!("JWT_SECRET must not be empty");
        }
        Ok(Self { secret })
    }
}

/// Listener settings for the HTTP and gRPC transports
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub http_port: u16,
    pub grpc_port: u16,
    /// Mark the session cookie `Secure`
    pub cookie_secure: bool,
}

impl ServerSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            http_port: env::var("HTTP_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid HTTP_PORT")?,
            grpc_port: env::var("GRPC_PORT")
                .unwrap_or_else(|_| "50051".to_string())
                .parse()
                .context("Invalid GRPC_PORT")?,
            cookie_secure: env::var("COOKIE_SECURE")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .context("Invalid COOKIE_SECURE")?,
        })
    }
}

/// Argon2id cost parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PasswordHashSettings {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for PasswordHashSettings {
    fn default() -> Self {
        Self {
            memory_kib: 19_456,
            iterations: 2,
            parallelism: 1,
        }
    }
}

impl PasswordHashSettings {
    fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            memory_kib: env::var("PASSWORD_HASH_MEMORY_KIB")
                .unwrap_or_else(|_| defaults.memory_kib.to_string())
                .parse()
                .context("Invalid PASSWORD_HASH_MEMORY_KIB")?,
            iterations: env::var("PASSWORD_HASH_ITERATIONS")
                .unwrap_or_else(|_| defaults.iterations.to_string())
                .parse()
                .context("Invalid PASSWORD_HASH_ITERATIONS")?,
            parallelism: env::var("PASSWORD_HASH_PARALLELISM")
                .unwrap_or_else(|_| defaults.parallelism.to_string())
                .parse()
                .context("Invalid PASSWORD_HASH_PARALLELISM")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_missing_dotenv_is_not_reported_as_loaded() {
        let missing = dotenvy::Error::Io(std::io::Error::from(std::io::ErrorKind::NotFound));
        assert_eq!(report_dotenv(Err(missing)), None);

        let unreadable =
            dotenvy::Error::Io(std::io::Error::from(std::io::ErrorKind::PermissionDenied));
        assert_eq!(report_dotenv(Err(unreadable)), None);

        let found = PathBuf::from("/srv/keeper/.env");
        assert_eq!(report_dotenv(Ok(found.clone())), Some(found));
    }

    #[test]
    #[serial]
    fn test_jwt_settings_from_env() {
        env::set_var("JWT_SECRET", "test-secret-key");

        let settings = JwtSettings::from_env().unwrap();
        assert_eq!(settings.secret, "test-secret-key");
        assert!(!format!("{:?}", settings).contains("test-secret-key"));

        env::remove_var("JWT_SECRET");
    }

    #[test]
    #[serial]
    fn test_jwt_settings_require_secret() {
        env::remove_var("JWT_SECRET");
        assert!(JwtSettings::from_env().is_err());

        env::set_var("JWT_SECRET", "");
        assert!(JwtSettings::from_env().is_err());

        env::remove_var("JWT_SECRET");
    }

    #[test]
    #[serial]
    fn test_database_settings_from_env() {
        env::set_var("DATABASE_URL", "postgres://localhost/test");
        env::set_var("DATABASE_MAX_CONNECTIONS", "20");

        let settings = DatabaseSettings::from_env().unwrap();

        assert_eq!(settings.url.as_deref(), Some("postgres://localhost/test"));
        assert_eq!(settings.max_connections, 20);
        assert_eq!(settings.acquire_timeout, 5); // Default

        env::remove_var("DATABASE_URL");
        env::remove_var("DATABASE_MAX_CONNECTIONS");
    }

    #[test]
    #[serial]
    fn test_database_url_is_optional() {
        env::remove_var("DATABASE_URL");

        let settings = DatabaseSettings::from_env().unwrap();
        assert!(settings.url.is_none());
    }

    #[test]
    #[serial]
    fn test_server_settings_defaults() {
        env::remove_var("SERVER_HOST");
        env::remove_var("HTTP_PORT");
        env::remove_var("GRPC_PORT");
        env::remove_var("COOKIE_SECURE");

        let settings = ServerSettings::from_env().unwrap();

        assert_eq!(settings.host, "0.0.0.0");
        assert_eq!(settings.http_port, 8080);
        assert_eq!(settings.grpc_port, 50051);
        assert!(!settings.cookie_secure);
    }

    #[test]
    #[serial]
    fn test_invalid_port_is_rejected() {
        env::set_var("HTTP_PORT", "not-a-port");
        assert!(ServerSettings::from_env().is_err());
        env::remove_var("HTTP_PORT");
    }

    #[test]
    #[serial]
    fn test_password_hash_settings_override() {
        env::set_var("PASSWORD_HASH_ITERATIONS", "3");

        let settings = PasswordHashSettings::from_env().unwrap();
        assert_eq!(settings.iterations, 3);
        assert_eq!(settings.memory_kib, 19_456);

        env::remove_var("PASSWORD_HASH_ITERATIONS");
    }
}
