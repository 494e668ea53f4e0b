//! Telegram transport settings.

use thiserror::Error;
use url::Url;

/// Error loading bot settings from the environment.
#[derive(Debug, Error)]
pub enum BotConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Settings used by the Telegram transport layer.
///
/// The bot token itself is owned by the server configuration; this struct
/// carries what the handlers need to build keyboards and messages.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Public URL of the Mini App, used for `web_app` keyboard buttons.
    pub web_app_url: Url,
}

impl BotConfig {
    /// Create settings from an already-parsed Mini App URL.
    #[must_use]
    pub const fn new(web_app_url: Url) -> Self {
        Self { web_app_url }
    }

    /// Load settings from environment variables (`WEB_APP_URL`).
    ///
    /// # Errors
    ///
    /// Returns a [`BotConfigError`] if the variable is missing or not a
    /// valid URL.
    pub fn from_env() -> Result<Self, BotConfigError> {
        let raw = std::env::var("WEB_APP_URL")
            .map_err(|_| BotConfigError::MissingEnvVar("WEB_APP_URL".to_owned()))?;
        let web_app_url = Url::parse(&raw)
            .map_err(|e| BotConfigError::InvalidEnvVar("WEB_APP_URL".to_owned(), e.to_string()))?;
        Ok(Self { web_app_url })
    }

    /// Resolve a path relative to the Mini App base URL.
    ///
    /// Falls back to the base URL when the path cannot be joined.
    #[must_use]
    pub fn web_app_page(&self, path: &str) -> Url {
        self.web_app_url
            .join(path)
            .unwrap_or_else(|_| self.web_app_url.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_resolve_relative_to_base() {
        let config = BotConfig::new(Url::parse("https://shop.example.com/").expect("url"));
        assert_eq!(
            config.web_app_page("form").as_str(),
            "https://shop.example.com/form"
        );
    }
}
