use std::env;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Runtime settings, read from the environment (and `.env` via dotenvy).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Cookie signing key; `None` means a random key per process.
    pub session_key: Option<Vec<u8>>,
    pub session_cookie_secure: bool,
    pub login_url: String,
    pub landing_url: String,
    pub mail_from: String,
    /// Shared secret the fronting auth proxy sends with every login
    /// completion. `None` disables login completion.
    pub auth_proxy_secret: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let port = match lookup("PORT") {
            Some(raw) => raw.parse().map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
                var: "PORT",
                reason: e.to_string(),
            })?,
            None => 8080,
        };

        let session_key = match lookup("SESSION_KEY") {
            Some(key) if key.len() < 64 => {
                return Err(ConfigError::Invalid {
                    var: "SESSION_KEY",
                    reason: format!("needs at least 64 bytes, got {}", key.len()),
                })
            }
            Some(key) => Some(key.into_bytes()),
            None => None,
        };

        let session_cookie_secure = match lookup("SESSION_COOKIE_SECURE").as_deref() {
            None | Some("true") | Some("1") => true,
            Some("false") | Some("0") => false,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "SESSION_COOKIE_SECURE",
                    reason: format!("expected true or false, got '{other}'"),
                })
            }
        };

        Ok(Self {
            database_url,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            session_key,
            session_cookie_secure,
            login_url: lookup("LOGIN_URL").unwrap_or_else(|| "/accounts/login/".to_string()),
            landing_url: lookup("LANDING_URL").unwrap_or_else(|| "/".to_string()),
            mail_from: lookup("MAIL_FROM").unwrap_or_else(|| "noreply@storefront.local".to_string()),
            auth_proxy_secret: lookup("AUTH_PROXY_SECRET").filter(|s| !s.is_empty()),
        })
    }
}
