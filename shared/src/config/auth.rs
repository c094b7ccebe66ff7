//! Authentication configuration loaded from the environment
//!
//! This module only carries the raw, environment-facing values. Validation of
//! the secret and parsing of lifetime strings happens in the core layer when
//! the session configuration is constructed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default access token lifetime (15 minutes)
pub const DEFAULT_ACCESS_TOKEN_TTL: &str = "15m";

/// Default refresh token lifetime (30 days)
pub const DEFAULT_REFRESH_TOKEN_TTL: &str = "30d";

/// Errors raised while reading configuration from the environment
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {name}")]
    MissingVariable { name: String },
}

/// JWT authentication configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Secret key for signing tokens
    pub jwt_secret: String,

    /// Access token lifetime as a compact string ("15m", "4h", "30d")
    pub access_token_ttl: String,

    /// Refresh token lifetime as a compact string
    pub refresh_token_ttl: String,

    /// JWT issuer claim
    pub issuer: String,

    /// JWT audience claim
    #[serde(default)]
    pub audience: Option<String>,

    /// Algorithm for JWT signing (default: HS256)
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
}

impl AuthConfig {
    /// Load authentication configuration from environment variables.
    ///
    /// `AUTH_JWT_SECRET` is required; everything else falls back to defaults.
    /// The secret is intentionally not validated here - the core layer rejects
    /// short or placeholder secrets at service construction time.
    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret = std::env::var("AUTH_JWT_SECRET").map_err(|_| {
            ConfigError::MissingVariable {
                name: "AUTH_JWT_SECRET".to_string(),
            }
        })?;

        Ok(Self {
            jwt_secret,
            access_token_ttl: std::env::var("AUTH_ACCESS_TOKEN_TTL")
                .unwrap_or_else(|_| DEFAULT_ACCESS_TOKEN_TTL.to_string()),
            refresh_token_ttl: std::env::var("AUTH_REFRESH_TOKEN_TTL")
                .unwrap_or_else(|_| DEFAULT_REFRESH_TOKEN_TTL.to_string()),
            issuer: std::env::var("AUTH_ISSUER").unwrap_or_else(|_| "tripsync".to_string()),
            audience: std::env::var("AUTH_AUDIENCE").ok(),
            algorithm: std::env::var("AUTH_ALGORITHM").unwrap_or_else(|_| default_algorithm()),
        })
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            access_token_ttl: DEFAULT_ACCESS_TOKEN_TTL.to_string(),
            refresh_token_ttl: DEFAULT_REFRESH_TOKEN_TTL.to_string(),
            issuer: String::from("tripsync"),
            audience: Some(String::from("tripsync-api")),
            algorithm: default_algorithm(),
        }
    }
}

fn default_algorithm() -> String {
    String::from("HS256")
}
