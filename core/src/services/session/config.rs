//! Configuration for the session services
//!
//! The configuration is an explicitly constructed, immutable value injected
//! into the codec and session service at construction time. Secret validation
//! is a fatal, fail-fast check: a process with a short or placeholder secret
//! must never start.

use chrono::Duration;
use jsonwebtoken::Algorithm;

use crate::errors::{DomainError, DomainResult};

/// Minimum accepted signing secret length
pub const MIN_SECRET_LEN: usize = 32;

/// Placeholder secrets that must never reach production
const INSECURE_SECRETS: &[&str] = &[
    "secret",
    "changeme",
    "password",
    "your-secret-key-change-in-production",
    "development-secret-please-change-in-production",
    "00000000000000000000000000000000",
];

/// A token lifetime, either as an explicit duration or as a compact string
/// such as `"15m"`, `"4h"`, or `"30d"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lifetime {
    Duration(Duration),
    Compact(String),
}

impl Lifetime {
    /// Resolve to a concrete duration
    ///
    /// A malformed compact string is a hard configuration error, never a
    /// silent default.
    pub fn resolve(&self) -> DomainResult<Duration> {
        match self {
            Self::Duration(d) => Ok(*d),
            Self::Compact(s) => parse_lifetime(s),
        }
    }
}

impl From<Duration> for Lifetime {
    fn from(d: Duration) -> Self {
        Self::Duration(d)
    }
}

impl From<&str> for Lifetime {
    fn from(s: &str) -> Self {
        Self::Compact(s.to_string())
    }
}

/// Parse a compact lifetime string: a positive integer followed by a unit,
/// where the unit is one of `m` (minutes), `h` (hours), `d` (days).
pub fn parse_lifetime(input: &str) -> DomainResult<Duration> {
    let s = input.trim();
    let err = || DomainError::Configuration {
        message: format!("Invalid lifetime '{input}': expected <number><m|h|d>"),
    };

    if s.len() < 2 {
        return Err(err());
    }

    let (value, unit) = s.split_at(s.len() - 1);
    let amount: i64 = value.parse().map_err(|_| err())?;
    if amount <= 0 {
        return Err(err());
    }

    match unit {
        "m" => Ok(Duration::minutes(amount)),
        "h" => Ok(Duration::hours(amount)),
        "d" => Ok(Duration::days(amount)),
        _ => Err(err()),
    }
}

/// Immutable configuration for the codec and session service
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Signing secret
    pub jwt_secret: String,
    /// Signing algorithm
    pub algorithm: Algorithm,
    /// Issuer claim stamped on and required of every token
    pub issuer: String,
    /// Audience claim, validated when present
    pub audience: Option<String>,
    /// Default access token lifetime
    pub access_token_ttl: Duration,
    /// Default refresh token lifetime
    pub refresh_token_ttl: Duration,
}

impl SessionConfig {
    /// Build a configuration with default lifetimes (15 minutes / 30 days)
    pub fn new(jwt_secret: impl Into<String>, issuer: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            algorithm: Algorithm::HS256,
            issuer: issuer.into(),
            audience: None,
            access_token_ttl: Duration::minutes(15),
            refresh_token_ttl: Duration::days(30),
        }
    }

    /// Build from the environment-facing shared configuration
    pub fn from_auth_config(config: &ts_shared::config::AuthConfig) -> DomainResult<Self> {
        let algorithm = match config.algorithm.as_str() {
            "HS256" => Algorithm::HS256,
            "HS384" => Algorithm::HS384,
            "HS512" => Algorithm::HS512,
            other => {
                return Err(DomainError::Configuration {
                    message: format!("Unsupported signing algorithm: {other}"),
                })
            }
        };

        let built = Self {
            jwt_secret: config.jwt_secret.clone(),
            algorithm,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            access_token_ttl: parse_lifetime(&config.access_token_ttl)?,
            refresh_token_ttl: parse_lifetime(&config.refresh_token_ttl)?,
        };
        built.validate()?;
        Ok(built)
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_token_ttl = ttl;
        self
    }

    pub fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_token_ttl = ttl;
        self
    }

    /// Fail-fast startup contract for the signing secret
    ///
    /// The secret must be present, at least [`MIN_SECRET_LEN`] characters,
    /// and must not equal a known placeholder.
    pub fn validate(&self) -> DomainResult<()> {
        if self.jwt_secret.len() < MIN_SECRET_LEN {
            return Err(DomainError::Configuration {
                message: format!(
                    "Signing secret must be at least {MIN_SECRET_LEN} characters"
                ),
            });
        }

        let lowered = self.jwt_secret.to_lowercase();
        if INSECURE_SECRETS.iter().any(|s| *s == lowered) {
            return Err(DomainError::Configuration {
                message: "Signing secret is a known placeholder value".to_string(),
            });
        }

        if self.access_token_ttl <= Duration::zero() || self.refresh_token_ttl <= Duration::zero()
        {
            return Err(DomainError::Configuration {
                message: "Token lifetimes must be positive".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strong_secret() -> String {
        "a-sufficiently-long-signing-secret-0123456789".to_string()
    }

    #[test]
    fn test_parse_lifetime_units() {
        assert_eq!(parse_lifetime("15m").unwrap(), Duration::minutes(15));
        assert_eq!(parse_lifetime("4h").unwrap(), Duration::hours(4));
        assert_eq!(parse_lifetime("30d").unwrap(), Duration::days(30));
    }

    #[test]
    fn test_parse_lifetime_rejects_bad_input() {
        for bad in ["", "m", "15", "15s", "15 m", "-5d", "0h", "1.5h", "fifteenm"] {
            assert!(parse_lifetime(bad).is_err(), "expected rejection of {bad:?}");
        }
    }

    #[test]
    fn test_validate_rejects_short_secret() {
        let config = SessionConfig::new("short", "tripsync");
        assert!(matches!(
            config.validate(),
            Err(DomainError::Configuration { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_placeholder_secret() {
        let config = SessionConfig::new(
            "development-secret-please-change-in-production",
            "tripsync",
        );
        assert!(matches!(
            config.validate(),
            Err(DomainError::Configuration { .. })
        ));
    }

    #[test]
    fn test_validate_accepts_strong_secret() {
        let config = SessionConfig::new(strong_secret(), "tripsync");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_auth_config() {
        let mut auth = ts_shared::config::AuthConfig::default();
        auth.jwt_secret = strong_secret();
        auth.access_token_ttl = "20m".to_string();
        auth.refresh_token_ttl = "14d".to_string();

        let config = SessionConfig::from_auth_config(&auth).unwrap();
        assert_eq!(config.access_token_ttl, Duration::minutes(20));
        assert_eq!(config.refresh_token_ttl, Duration::days(14));
        assert_eq!(config.algorithm, Algorithm::HS256);
    }

    #[test]
    fn test_from_auth_config_rejects_unknown_algorithm() {
        let mut auth = ts_shared::config::AuthConfig::default();
        auth.jwt_secret = strong_secret();
        auth.algorithm = "RS256".to_string();

        assert!(SessionConfig::from_auth_config(&auth).is_err());
    }

    #[test]
    fn test_lifetime_resolution() {
        assert_eq!(
            Lifetime::from("45m").resolve().unwrap(),
            Duration::minutes(45)
        );
        assert_eq!(
            Lifetime::from(Duration::hours(2)).resolve().unwrap(),
            Duration::hours(2)
        );
        assert!(Lifetime::from("45w").resolve().is_err());
    }
}
