//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string
//! - `TELEGRAM_TOKEN` - Telegram Bot API token
//! - `WEB_APP_URL` - Public URL of the Mini App frontend
//!
//! ## Optional
//! - `HOST` - Bind address (default: 127.0.0.1)
//! - `PORT` - Listen port (default: 8000)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public URL of the Mini App frontend
    pub web_app_url: Url,
    /// Telegram Bot API token
    pub telegram_token: SecretString,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

fn required(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_owned()))
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first missing or malformed
    /// variable.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = SecretString::from(required("DATABASE_URL")?);
        let telegram_token = SecretString::from(required("TELEGRAM_TOKEN")?);

        let web_app_url = required("WEB_APP_URL")?;
        let web_app_url = Url::parse(&web_app_url)
            .map_err(|e| ConfigError::InvalidEnvVar("WEB_APP_URL".to_owned(), e.to_string()))?;

        let host = match std::env::var("HOST") {
            Ok(raw) => raw
                .parse::<IpAddr>()
                .map_err(|e| ConfigError::InvalidEnvVar("HOST".to_owned(), e.to_string()))?,
            Err(_) => IpAddr::V4(Ipv4Addr::LOCALHOST),
        };

        let port = match std::env::var("PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|e| ConfigError::InvalidEnvVar("PORT".to_owned(), e.to_string()))?,
            Err(_) => 8000,
        };

        let sentry_dsn = std::env::var("SENTRY_DSN").ok().filter(|s| !s.is_empty());

        Ok(Self {
            database_url,
            host,
            port,
            web_app_url,
            telegram_token,
            sentry_dsn,
        })
    }

    /// Socket address to bind the HTTP listener to.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn socket_addr_combines_host_and_port() {
        let config = ServerConfig {
            database_url: SecretString::from("postgres://localhost/samovar".to_owned()),
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8000,
            web_app_url: Url::parse("https://shop.example.com").expect("url"),
            telegram_token: SecretString::from("token".to_owned()),
            sentry_dsn: None,
        };
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:8000");
    }
}
