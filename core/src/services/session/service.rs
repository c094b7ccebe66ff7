//! Session service orchestrating issuance, verification, rotation, and
//! revocation of token pairs.
//!
//! The service holds no in-process mutable state beyond configuration; all
//! mutable state lives in the token store, so it is safe under concurrent use
//! from many simultaneous requests.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::entities::audit::{SecurityEvent, SecurityEventKind};
use crate::domain::entities::identity::Identity;
use crate::domain::entities::token::{
    Claims, ClientMetadata, RefreshTokenRecord, TokenPair, TokenType,
};
use crate::errors::{AuthError, DomainError, DomainResult, TokenError};
use crate::repositories::{AuditLogRepository, IdentityRepository, TokenStore};

use super::clock::{Clock, SystemClock};
use super::codec::{SignRequest, TokenCodec};
use super::config::SessionConfig;

/// Revocation reason stamped on a token consumed by a successful rotation
pub const REASON_ROTATION: &str = "rotation";

/// Revocation reason stamped on a family burned by a failed rotation
pub const REASON_FAILED_ROTATION: &str = "failed rotation";

/// Result of a successful rotation: the new pair plus minimal identity info
#[derive(Debug, Clone)]
pub struct TokenRefreshResult {
    pub tokens: TokenPair,
    pub identity: Identity,
}

/// Service for managing the authentication session lifecycle
pub struct SessionService<S, I, A>
where
    S: TokenStore,
    I: IdentityRepository,
    A: AuditLogRepository,
{
    store: Arc<S>,
    identities: Arc<I>,
    audit: Arc<A>,
    codec: TokenCodec,
    clock: Arc<dyn Clock>,
}

impl<S, I, A> SessionService<S, I, A>
where
    S: TokenStore,
    I: IdentityRepository,
    A: AuditLogRepository,
{
    /// Creates a session service with the system clock
    ///
    /// Fails fast when the configuration violates the startup contract.
    pub fn new(
        store: Arc<S>,
        identities: Arc<I>,
        audit: Arc<A>,
        config: SessionConfig,
    ) -> DomainResult<Self> {
        Self::with_clock(store, identities, audit, config, Arc::new(SystemClock))
    }

    /// Creates a session service with an explicit clock
    pub fn with_clock(
        store: Arc<S>,
        identities: Arc<I>,
        audit: Arc<A>,
        config: SessionConfig,
        clock: Arc<dyn Clock>,
    ) -> DomainResult<Self> {
        let codec = TokenCodec::new(config, clock.clone())?;
        Ok(Self {
            store,
            identities,
            audit,
            codec,
            clock,
        })
    }

    /// The codec backing this service
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// SHA-256 hex digest of a signed token string, as stored server-side
    pub fn token_digest(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Issues a fresh token pair for an authenticated identity
    ///
    /// Starts a new token family. The refresh token's digest, family, and
    /// client metadata are persisted in a single store write.
    pub async fn issue(
        &self,
        identity: &Identity,
        client: ClientMetadata,
    ) -> DomainResult<TokenPair> {
        let pair = self.issue_in_family(identity, None, client.clone()).await?;

        info!(user_id = %identity.id, "issued token pair");
        self.record(
            SecurityEvent::new(SecurityEventKind::TokenIssued)
                .with_subject(identity.id)
                .with_source(client.ip_address, client.user_agent),
        )
        .await;

        Ok(pair)
    }

    /// Verifies an access token
    ///
    /// Purely stateless - no store access. Access tokens are verified on every
    /// request, so this path must not pay a database round-trip.
    pub fn verify_access(&self, token: &str) -> Result<Claims, TokenError> {
        self.codec.verify(token, Some(TokenType::Access))
    }

    /// Verifies a refresh token, optionally against the store
    ///
    /// With `check_revocation`, the persisted record is checked in order:
    /// exists, not revoked, not expired per the *stored* expiry (independent
    /// of the signed expiry claim), digest match.
    pub async fn verify_refresh(
        &self,
        token: &str,
        check_revocation: bool,
    ) -> DomainResult<(Claims, Option<RefreshTokenRecord>)> {
        let claims = self
            .codec
            .verify(token, Some(TokenType::Refresh))
            .map_err(DomainError::Token)?;

        if !check_revocation {
            return Ok((claims, None));
        }

        let record = self.check_record(token, &claims).await?;
        Ok((claims, Some(record)))
    }

    /// Store-side checks for a codec-verified refresh token
    async fn check_record(
        &self,
        token: &str,
        claims: &Claims,
    ) -> DomainResult<RefreshTokenRecord> {
        let jti = Uuid::parse_str(&claims.jti).map_err(|_| TokenError::TokenMalformed)?;

        let record = self
            .store
            .find_by_token_id(jti)
            .await?
            .ok_or(TokenError::TokenNotFound)?;

        if record.revoked {
            return Err(TokenError::TokenRevoked.into());
        }
        if record.is_expired_at(self.clock.now()) {
            return Err(TokenError::TokenExpired.into());
        }
        if record.token_digest != Self::token_digest(token) {
            return Err(TokenError::InvalidSignature.into());
        }

        Ok(record)
    }

    /// Rotates a refresh token: verifies it, consumes it, and issues a new
    /// pair in the same family.
    ///
    /// The presented row is consumed by a conditional revocation before the
    /// new pair is issued; losing that update to a concurrent rotation is
    /// treated as token reuse. Any failure after successful verification
    /// burns the entire family before the error surfaces - a rotation that
    /// cannot complete leaves a suspect chain, and the service fails closed.
    pub async fn rotate(
        &self,
        refresh_token: &str,
        client: ClientMetadata,
    ) -> DomainResult<TokenRefreshResult> {
        let claims = self
            .codec
            .verify(refresh_token, Some(TokenType::Refresh))
            .map_err(DomainError::Token)?;
        let user_id = claims.user_id().map_err(|_| TokenError::TokenMalformed)?;
        let family = claims.family.clone().unwrap_or_default();

        let record = match self.check_record(refresh_token, &claims).await {
            Ok(record) => record,
            Err(err) => {
                if matches!(&err, DomainError::Token(TokenError::TokenRevoked)) {
                    // A revoked token being presented again is the replay
                    // signature this subsystem exists to catch.
                    self.burn_family(user_id, &family, &client, "revoked token presented")
                        .await;
                    self.record(
                        SecurityEvent::new(SecurityEventKind::TokenReuseDetected)
                            .with_subject(user_id)
                            .with_source(client.ip_address.clone(), client.user_agent.clone())
                            .with_context(serde_json::json!({ "family": family })),
                    )
                    .await;
                }
                self.record(
                    SecurityEvent::new(SecurityEventKind::RotationFailed)
                        .with_subject(user_id)
                        .with_source(client.ip_address.clone(), client.user_agent.clone())
                        .with_context(serde_json::json!({ "reason": err.code() })),
                )
                .await;
                return Err(err);
            }
        };

        // Consume the presented row. Zero rows affected means a concurrent
        // rotation already won the race.
        let consumed = self.store.revoke_one(record.jti, REASON_ROTATION).await?;
        if !consumed {
            self.burn_family(user_id, &family, &client, "concurrent rotation")
                .await;
            self.record(
                SecurityEvent::new(SecurityEventKind::TokenReuseDetected)
                    .with_subject(user_id)
                    .with_source(client.ip_address.clone(), client.user_agent.clone())
                    .with_context(serde_json::json!({ "family": family })),
            )
            .await;
            return Err(TokenError::TokenRevoked.into());
        }

        // Everything past this point fails closed.
        let identity = match self.identities.load_identity(user_id).await {
            Ok(Some(identity)) => identity,
            Ok(None) => {
                self.burn_family(user_id, &family, &client, "identity missing")
                    .await;
                return Err(AuthError::IdentityNotFound.into());
            }
            Err(err) => {
                self.burn_family(user_id, &family, &client, "identity lookup failed")
                    .await;
                return Err(err);
            }
        };

        let pair = match self
            .issue_in_family(&identity, Some(family.clone()), client.clone())
            .await
        {
            Ok(pair) => pair,
            Err(err) => {
                self.burn_family(user_id, &family, &client, "issuance failed")
                    .await;
                return Err(err);
            }
        };

        info!(user_id = %user_id, family = %family, "rotated refresh token");
        self.record(
            SecurityEvent::new(SecurityEventKind::TokenRefreshed)
                .with_subject(user_id)
                .with_source(client.ip_address, client.user_agent),
        )
        .await;

        Ok(TokenRefreshResult {
            tokens: pair,
            identity,
        })
    }

    /// Revokes a single refresh token row
    ///
    /// Idempotent: revoking an already-revoked or unknown row reports `false`
    /// without erroring.
    pub async fn revoke_token(&self, jti: Uuid, reason: &str) -> DomainResult<bool> {
        let revoked = self.store.revoke_one(jti, reason).await?;

        if revoked {
            info!(jti = %jti, reason = %reason, "revoked refresh token");
            self.record(
                SecurityEvent::new(SecurityEventKind::TokenRevoked)
                    .with_context(serde_json::json!({ "jti": jti, "reason": reason })),
            )
            .await;
        }

        Ok(revoked)
    }

    /// Revokes every active refresh token a user holds
    pub async fn revoke_all_for_user(&self, user_id: Uuid, reason: &str) -> DomainResult<usize> {
        let count = self.store.revoke_all_for_user(user_id, reason).await?;

        info!(user_id = %user_id, reason = %reason, count, "revoked all user sessions");
        self.record(
            SecurityEvent::new(SecurityEventKind::SessionsRevoked)
                .with_subject(user_id)
                .with_context(serde_json::json!({ "reason": reason, "count": count })),
        )
        .await;

        Ok(count)
    }

    /// Revokes an entire token family
    pub async fn revoke_family(
        &self,
        user_id: Uuid,
        family: &str,
        reason: &str,
    ) -> DomainResult<usize> {
        let count = self.store.revoke_family(user_id, family, reason).await?;

        info!(user_id = %user_id, family = %family, reason = %reason, count, "revoked token family");
        self.record(
            SecurityEvent::new(SecurityEventKind::FamilyRevoked)
                .with_subject(user_id)
                .with_context(serde_json::json!({ "family": family, "reason": reason, "count": count })),
        )
        .await;

        Ok(count)
    }

    /// Lists a user's active sessions, newest first
    pub async fn list_active_sessions(
        &self,
        user_id: Uuid,
    ) -> DomainResult<Vec<RefreshTokenRecord>> {
        self.store.list_active_for_user(user_id).await
    }

    /// Whether the user still holds at least one active refresh session
    pub async fn has_active_session(&self, user_id: Uuid) -> DomainResult<bool> {
        Ok(!self.store.list_active_for_user(user_id).await?.is_empty())
    }

    /// Loads the identity for a verified subject
    pub async fn load_identity(&self, subject: Uuid) -> DomainResult<Option<Identity>> {
        self.identities.load_identity(subject).await
    }

    /// Removes refresh token rows past their expiry
    ///
    /// Intended to run on a recurring schedule; returns the count removed.
    pub async fn cleanup_expired(&self) -> DomainResult<usize> {
        let count = self.store.delete_expired().await?;
        if count > 0 {
            info!(count, "deleted expired refresh tokens");
        }
        self.record(
            SecurityEvent::new(SecurityEventKind::CleanupCompleted)
                .with_context(serde_json::json!({ "deleted": count })),
        )
        .await;
        Ok(count)
    }

    /// Records a security event from a collaborator (e.g. the request
    /// authenticator); sink failures are logged, never propagated.
    pub async fn record_security_event(&self, event: SecurityEvent) {
        self.record(event).await;
    }

    /// Signs both tokens and persists the refresh record; one store write
    async fn issue_in_family(
        &self,
        identity: &Identity,
        family: Option<String>,
        client: ClientMetadata,
    ) -> DomainResult<TokenPair> {
        let family = family.unwrap_or_else(|| Uuid::new_v4().to_string());

        let access = self.codec.sign(SignRequest {
            subject: identity.id,
            token_type: TokenType::Access,
            email: identity.email.clone(),
            username: identity.username.clone(),
            family: None,
            lifetime: None,
        })?;

        let refresh = self.codec.sign(SignRequest {
            subject: identity.id,
            token_type: TokenType::Refresh,
            email: identity.email.clone(),
            username: identity.username.clone(),
            family: Some(family.clone()),
            lifetime: None,
        })?;

        let jti = Uuid::parse_str(&refresh.claims.jti)
            .map_err(|_| TokenError::SignatureFailed)?;
        let expires_at = chrono::DateTime::from_timestamp(refresh.claims.exp, 0).ok_or(
            DomainError::Internal {
                message: "Invalid refresh expiry timestamp".to_string(),
            },
        )?;
        let access_expires_at = chrono::DateTime::from_timestamp(access.claims.exp, 0).ok_or(
            DomainError::Internal {
                message: "Invalid access expiry timestamp".to_string(),
            },
        )?;

        let record = RefreshTokenRecord::new(
            jti,
            identity.id,
            Self::token_digest(&refresh.token),
            family,
            expires_at,
            client,
            self.clock.now(),
        );
        self.store.create(record).await?;

        Ok(TokenPair::new(
            access.token,
            refresh.token,
            access_expires_at,
            expires_at,
        ))
    }

    /// Fail-closed family revocation plus the reuse audit trail
    async fn burn_family(
        &self,
        user_id: Uuid,
        family: &str,
        client: &ClientMetadata,
        cause: &str,
    ) {
        if family.is_empty() {
            return;
        }

        match self
            .store
            .revoke_family(user_id, family, REASON_FAILED_ROTATION)
            .await
        {
            Ok(count) => {
                warn!(user_id = %user_id, family = %family, cause, count, "revoked token family after failed rotation");
                self.record(
                    SecurityEvent::new(SecurityEventKind::FamilyRevoked)
                        .with_subject(user_id)
                        .with_source(client.ip_address.clone(), client.user_agent.clone())
                        .with_context(serde_json::json!({ "family": family, "cause": cause, "count": count })),
                )
                .await;
            }
            Err(err) => {
                // The error that triggered the burn still surfaces; this one
                // can only be logged.
                warn!(user_id = %user_id, family = %family, cause, error = %err, "failed to revoke token family");
            }
        }
    }

    async fn record(&self, event: SecurityEvent) {
        if let Err(err) = self.audit.record(event).await {
            warn!(error = %err, "failed to record security event");
        }
    }
}
