//! Error types for token and authorization operations
//!
//! Token verification failures are a closed enum so call sites branch
//! exhaustively. The specific kind is retained for audit logging only; the
//! presentation layer collapses everything into unauthorized/forbidden.

use thiserror::Error;
use ts_shared::types::response::ErrorResponse;

/// Token-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token expired")]
    TokenExpired,

    #[error("Token malformed")]
    TokenMalformed,

    #[error("Token not yet valid")]
    TokenNotYetValid,

    #[error("Missing required claim: {claim}")]
    MissingClaim { claim: String },

    #[error("Invalid token type: expected {expected}, got {actual}")]
    InvalidTokenType { expected: String, actual: String },

    #[error("Token not found")]
    TokenNotFound,

    #[error("Token revoked")]
    TokenRevoked,

    #[error("Token signature verification failed")]
    InvalidSignature,

    #[error("Token signing failed")]
    SignatureFailed,

    #[error("Duplicate token id")]
    DuplicateTokenId,

    #[error("Invalid token")]
    InvalidToken,
}

impl TokenError {
    /// Stable machine-readable code for logging and API mapping
    pub fn code(&self) -> &'static str {
        match self {
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::TokenMalformed => "TOKEN_MALFORMED",
            Self::TokenNotYetValid => "TOKEN_NOT_ACTIVE",
            Self::MissingClaim { .. } => "MISSING_CLAIMS",
            Self::InvalidTokenType { .. } => "INVALID_TOKEN_TYPE",
            Self::TokenNotFound => "TOKEN_NOT_FOUND",
            Self::TokenRevoked => "TOKEN_REVOKED",
            Self::InvalidSignature => "SIGNATURE_INVALID",
            Self::SignatureFailed => "SIGNATURE_FAILED",
            Self::DuplicateTokenId => "CONFLICT",
            Self::InvalidToken => "INVALID_TOKEN",
        }
    }
}

/// Authorization-level errors surfaced to callers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Identity not found")]
    IdentityNotFound,
}

impl AuthError {
    /// Stable machine-readable code for logging and API mapping
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::IdentityNotFound => "IDENTITY_NOT_FOUND",
        }
    }
}

impl From<TokenError> for ErrorResponse {
    fn from(err: TokenError) -> Self {
        ErrorResponse::new(err.code(), err.to_string())
    }
}

impl From<AuthError> for ErrorResponse {
    fn from(err: AuthError) -> Self {
        ErrorResponse::new(err.code(), err.to_string())
    }
}
