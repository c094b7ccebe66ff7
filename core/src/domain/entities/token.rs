//! Token entities for the JWT-based session lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The two token kinds carried in the `typ` claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Short-lived, stateless credential verified on every request
    Access,
    /// Longer-lived credential tracked server-side and exchanged via rotation
    Refresh,
}

impl TokenType {
    /// String representation matching the serialized claim value
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Claims structure for the JWT payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,

    /// Token type (access or refresh)
    pub typ: TokenType,

    /// Issued at timestamp
    pub iat: i64,

    /// Expiration timestamp
    pub exp: i64,

    /// Not before timestamp
    pub nbf: i64,

    /// Issuer
    pub iss: String,

    /// Audience
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,

    /// JWT ID (unique identifier for the token)
    pub jti: String,

    /// Email carried as a claim for the presentation layer
    pub email: String,

    /// Optional username claim
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Token family, present on refresh tokens only; groups every token
    /// descended from one original login
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
}

impl Claims {
    /// Parses the subject as a user UUID
    pub fn user_id(&self) -> Result<Uuid, uuid::Error> {
        Uuid::parse_str(&self.sub)
    }

    /// Checks whether the claims have expired at the given instant
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }

    /// Checks whether the claims are within their validity window
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        let ts = now.timestamp();
        ts >= self.nbf && ts < self.exp
    }
}

/// Client metadata captured alongside a refresh token
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientMetadata {
    /// User agent of the client that authenticated
    pub user_agent: Option<String>,
    /// Source IP address of the client
    pub ip_address: Option<String>,
}

impl ClientMetadata {
    pub fn new(user_agent: Option<String>, ip_address: Option<String>) -> Self {
        Self {
            user_agent,
            ip_address,
        }
    }
}

/// Refresh token record persisted by the token store
///
/// The raw signed token is never stored; only its SHA-256 digest. The `jti`
/// is the primary lookup key and is unique per record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshTokenRecord {
    /// Unique token identifier, mirrored in the signed token's `jti` claim
    pub jti: Uuid,

    /// User this token belongs to
    pub user_id: Uuid,

    /// SHA-256 hex digest of the signed token string
    pub token_digest: String,

    /// Family identifier grouping all tokens descended from one login
    pub family: String,

    /// Timestamp when the token expires
    pub expires_at: DateTime<Utc>,

    /// Whether the token has been revoked; terminal once set
    pub revoked: bool,

    /// When the token was revoked
    pub revoked_at: Option<DateTime<Utc>>,

    /// Why the token was revoked ("rotation", "logout", "failed rotation", ...)
    pub revoked_reason: Option<String>,

    /// User agent of the client that obtained the token
    pub user_agent: Option<String>,

    /// Source IP address of the client that obtained the token
    pub ip_address: Option<String>,

    /// Timestamp when the record was created
    pub created_at: DateTime<Utc>,

    /// Timestamp when the record was last updated
    pub updated_at: DateTime<Utc>,
}

impl RefreshTokenRecord {
    /// Creates a new active refresh token record
    pub fn new(
        jti: Uuid,
        user_id: Uuid,
        token_digest: String,
        family: String,
        expires_at: DateTime<Utc>,
        client: ClientMetadata,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            jti,
            user_id,
            token_digest,
            family,
            expires_at,
            revoked: false,
            revoked_at: None,
            revoked_reason: None,
            user_agent: client.user_agent,
            ip_address: client.ip_address,
            created_at: now,
            updated_at: now,
        }
    }

    /// Checks whether the record has expired at the given instant
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// A record is active when it is neither revoked nor expired
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        !self.revoked && !self.is_expired_at(now)
    }

    /// Marks the record revoked. Idempotent: re-revoking keeps the original
    /// timestamp and reason.
    pub fn revoke(&mut self, reason: &str, now: DateTime<Utc>) {
        if self.revoked {
            return;
        }
        self.revoked = true;
        self.revoked_at = Some(now);
        self.revoked_reason = Some(reason.to_string());
        self.updated_at = now;
    }
}

/// Token pair returned to the client after issuance or rotation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Signed JWT access token
    pub access_token: String,

    /// Signed JWT refresh token
    pub refresh_token: String,

    /// Absolute expiry of the access token
    pub access_expires_at: DateTime<Utc>,

    /// Absolute expiry of the refresh token
    pub refresh_expires_at: DateTime<Utc>,
}

impl TokenPair {
    pub fn new(
        access_token: String,
        refresh_token: String,
        access_expires_at: DateTime<Utc>,
        refresh_expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            access_expires_at,
            refresh_expires_at,
        }
    }
}
