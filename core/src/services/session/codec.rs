//! Stateless JWT codec
//!
//! Signing and verification of compact, signed tokens carrying a typed
//! payload. The codec performs no I/O and holds no mutable state; everything
//! it needs is the immutable configuration and the injected clock.
//!
//! Expiry and not-before are validated against the injected clock rather
//! than jsonwebtoken's internal wall clock, so boundary behavior is
//! deterministic under test.

use std::sync::Arc;

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::domain::entities::token::{Claims, TokenType};
use crate::errors::{DomainResult, TokenError};

use super::clock::Clock;
use super::config::{Lifetime, SessionConfig};

/// Request to sign a single token
#[derive(Debug, Clone)]
pub struct SignRequest {
    /// Subject (user id)
    pub subject: Uuid,
    /// Access or refresh
    pub token_type: TokenType,
    /// Email claim
    pub email: String,
    /// Optional username claim
    pub username: Option<String>,
    /// Token family; set on refresh tokens
    pub family: Option<String>,
    /// Lifetime override; falls back to the per-type default
    pub lifetime: Option<Lifetime>,
}

/// A signed token together with the claims that went into it
#[derive(Debug, Clone)]
pub struct SignedToken {
    pub token: String,
    pub claims: Claims,
}

/// Stateless signer/verifier for access and refresh tokens
pub struct TokenCodec {
    config: SessionConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl TokenCodec {
    /// Creates a codec, failing fast on an invalid signing secret
    pub fn new(config: SessionConfig, clock: Arc<dyn Clock>) -> DomainResult<Self> {
        config.validate()?;

        let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

        let mut validation = Validation::new(config.algorithm);
        validation.set_issuer(&[config.issuer.as_str()]);
        match &config.audience {
            Some(aud) => validation.set_audience(&[aud.as_str()]),
            None => validation.validate_aud = false,
        }
        // exp and nbf are checked against the injected clock in verify()
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.required_spec_claims.clear();

        Ok(Self {
            config,
            encoding_key,
            decoding_key,
            validation,
            clock,
        })
    }

    /// The configuration this codec was built with
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Signs a token
    ///
    /// Computes `iat`/`nbf` from the clock, `exp` from the resolved lifetime,
    /// and generates a fresh `jti`. A malformed lifetime override is a hard
    /// configuration error.
    pub fn sign(&self, request: SignRequest) -> DomainResult<SignedToken> {
        let lifetime = match request.lifetime {
            Some(lifetime) => lifetime.resolve()?,
            None => match request.token_type {
                TokenType::Access => self.config.access_token_ttl,
                TokenType::Refresh => self.config.refresh_token_ttl,
            },
        };

        let now = self.clock.now();
        let claims = Claims {
            sub: request.subject.to_string(),
            typ: request.token_type,
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
            nbf: now.timestamp(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
            jti: Uuid::new_v4().to_string(),
            email: request.email,
            username: request.username,
            family: request.family,
        };

        let header = Header::new(self.config.algorithm);
        let token = encode(&header, &claims, &self.encoding_key)
            .map_err(|_| TokenError::SignatureFailed)?;

        Ok(SignedToken { token, claims })
    }

    /// Verifies signature, issuer, audience, claim presence, and validity
    /// window; rejects a type mismatch when `expected_type` is given.
    ///
    /// Never panics on untrusted input - every failure is a [`TokenError`].
    pub fn verify(
        &self,
        token: &str,
        expected_type: Option<TokenType>,
    ) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(map_decode_error)?;
        let claims = data.claims;

        if claims.sub.trim().is_empty() {
            return Err(TokenError::MissingClaim {
                claim: "sub".to_string(),
            });
        }
        if claims.jti.trim().is_empty() {
            return Err(TokenError::MissingClaim {
                claim: "jti".to_string(),
            });
        }

        let now = self.clock.now().timestamp();
        if now >= claims.exp {
            return Err(TokenError::TokenExpired);
        }
        if now < claims.nbf {
            return Err(TokenError::TokenNotYetValid);
        }

        if let Some(expected) = expected_type {
            if claims.typ != expected {
                return Err(TokenError::InvalidTokenType {
                    expected: expected.to_string(),
                    actual: claims.typ.to_string(),
                });
            }
        }

        Ok(claims)
    }

    /// Parses claims without verifying the signature
    ///
    /// Diagnostics only; never use the result to authorize anything.
    pub fn decode_unverified(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(self.config.algorithm);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(map_decode_error)?;
        Ok(data.claims)
    }

    /// Parses a `Bearer <token>` authorization header value
    pub fn extract_bearer(header: &str) -> Option<&str> {
        header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// Maps jsonwebtoken failures onto the closed error taxonomy
fn map_decode_error(err: jsonwebtoken::errors::Error) -> TokenError {
    use jsonwebtoken::errors::ErrorKind;

    match err.kind() {
        ErrorKind::InvalidSignature => TokenError::InvalidSignature,
        ErrorKind::ExpiredSignature => TokenError::TokenExpired,
        ErrorKind::ImmatureSignature => TokenError::TokenNotYetValid,
        ErrorKind::MissingRequiredClaim(claim) => TokenError::MissingClaim {
            claim: claim.clone(),
        },
        ErrorKind::Json(serde_err) => {
            // serde reports absent required fields as "missing field `name`"
            let message = serde_err.to_string();
            match message
                .strip_prefix("missing field `")
                .and_then(|rest| rest.split('`').next())
            {
                Some(claim) => TokenError::MissingClaim {
                    claim: claim.to_string(),
                },
                None => TokenError::TokenMalformed,
            }
        }
        ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Utf8(_) => {
            TokenError::TokenMalformed
        }
        _ => TokenError::InvalidToken,
    }
}
