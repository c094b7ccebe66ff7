//! Unit tests for the session service
//!
//! Rotation, reuse detection, fail-closed family revocation, and revocation
//! surfaces are exercised against the in-memory repositories with a fixed
//! clock, so every expiry assertion is deterministic.

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::domain::entities::audit::SecurityEventKind;
use crate::domain::entities::identity::Identity;
use crate::domain::entities::token::{ClientMetadata, RefreshTokenRecord, TokenType};
use crate::errors::{AuthError, DomainError, TokenError};
use crate::repositories::{
    InMemoryAuditLogRepository, InMemoryIdentityRepository, InMemoryTokenStore, TokenStore,
};
use crate::services::session::{
    Clock, FixedClock, SessionConfig, SessionService, SignRequest, REASON_ROTATION,
};

const TEST_SECRET: &str = "unit-test-signing-secret-0123456789abcdef";

type TestService =
    SessionService<InMemoryTokenStore, InMemoryIdentityRepository, InMemoryAuditLogRepository>;

struct Harness {
    service: TestService,
    store: Arc<InMemoryTokenStore>,
    identities: Arc<InMemoryIdentityRepository>,
    audit: Arc<InMemoryAuditLogRepository>,
    clock: Arc<FixedClock>,
    identity: Identity,
}

fn test_config() -> SessionConfig {
    SessionConfig::new(TEST_SECRET, "tripsync").with_audience("tripsync-api")
}

fn client() -> ClientMetadata {
    ClientMetadata {
        user_agent: Some("test-agent/1.0".to_string()),
        ip_address: Some("203.0.113.7".to_string()),
    }
}

async fn harness_with_config(config: SessionConfig) -> Harness {
    let store = Arc::new(InMemoryTokenStore::new());
    let identities = Arc::new(InMemoryIdentityRepository::new());
    let audit = Arc::new(InMemoryAuditLogRepository::new());
    let clock = Arc::new(FixedClock::new(Utc::now()));

    let identity = Identity::new(Uuid::new_v4(), "ada@example.com", Some("ada".to_string()));
    identities.insert(identity.clone()).await;

    let service = SessionService::with_clock(
        store.clone(),
        identities.clone(),
        audit.clone(),
        config,
        clock.clone(),
    )
    .expect("service construction");

    Harness {
        service,
        store,
        identities,
        audit,
        clock,
        identity,
    }
}

async fn harness() -> Harness {
    harness_with_config(test_config()).await
}

fn token_error(err: DomainError) -> TokenError {
    match err {
        DomainError::Token(inner) => inner,
        other => panic!("expected token error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_issue_persists_digest_and_family() {
    let h = harness().await;

    let pair = h.service.issue(&h.identity, client()).await.unwrap();

    assert!(h.service.verify_access(&pair.access_token).is_ok());

    let (claims, record) = h
        .service
        .verify_refresh(&pair.refresh_token, true)
        .await
        .unwrap();
    let record = record.unwrap();

    // The raw token is never stored, only its digest
    assert_eq!(record.token_digest, TestService::token_digest(&pair.refresh_token));
    assert_ne!(record.token_digest, pair.refresh_token);
    assert_eq!(record.family, claims.family.unwrap());
    assert_eq!(record.user_agent.as_deref(), Some("test-agent/1.0"));
    assert_eq!(record.ip_address.as_deref(), Some("203.0.113.7"));

    assert_eq!(h.store.len().await, 1);
    assert_eq!(h.audit.count_of(SecurityEventKind::TokenIssued).await, 1);
}

#[tokio::test]
async fn test_issue_starts_distinct_families() {
    let h = harness().await;

    let first = h.service.issue(&h.identity, client()).await.unwrap();
    let second = h.service.issue(&h.identity, client()).await.unwrap();

    let (first_claims, _) = h.service.verify_refresh(&first.refresh_token, false).await.unwrap();
    let (second_claims, _) = h.service.verify_refresh(&second.refresh_token, false).await.unwrap();

    assert_ne!(first_claims.family, second_claims.family);
    assert_eq!(h.service.list_active_sessions(h.identity.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_access_token_rejected_as_refresh() {
    let h = harness().await;
    let pair = h.service.issue(&h.identity, client()).await.unwrap();

    let err = h
        .service
        .verify_refresh(&pair.access_token, false)
        .await
        .unwrap_err();
    assert!(matches!(
        token_error(err),
        TokenError::InvalidTokenType { .. }
    ));

    assert!(matches!(
        h.service.verify_access(&pair.refresh_token),
        Err(TokenError::InvalidTokenType { .. })
    ));
}

#[tokio::test]
async fn test_rotate_issues_new_pair_in_same_family() {
    let h = harness().await;
    let pair = h.service.issue(&h.identity, client()).await.unwrap();
    let (old_claims, _) = h.service.verify_refresh(&pair.refresh_token, false).await.unwrap();

    let rotated = h.service.rotate(&pair.refresh_token, client()).await.unwrap();
    assert_eq!(rotated.identity.id, h.identity.id);

    let (new_claims, record) = h
        .service
        .verify_refresh(&rotated.tokens.refresh_token, true)
        .await
        .unwrap();
    assert_eq!(new_claims.family, old_claims.family);
    assert_ne!(new_claims.jti, old_claims.jti);
    assert!(record.is_some());

    // The consumed row stays for audit, marked revoked with the rotation reason
    let old_jti = Uuid::parse_str(&old_claims.jti).unwrap();
    let consumed = h.store.find_by_token_id(old_jti).await.unwrap().unwrap();
    assert!(consumed.revoked);
    assert_eq!(consumed.revoked_reason.as_deref(), Some(REASON_ROTATION));

    assert_eq!(h.audit.count_of(SecurityEventKind::TokenRefreshed).await, 1);
}

#[tokio::test]
async fn test_reused_refresh_token_burns_whole_family() {
    let h = harness().await;
    let pair = h.service.issue(&h.identity, client()).await.unwrap();

    let rotated = h.service.rotate(&pair.refresh_token, client()).await.unwrap();

    // Presenting the consumed token again is reuse
    let err = h.service.rotate(&pair.refresh_token, client()).await.unwrap_err();
    assert_eq!(token_error(err), TokenError::TokenRevoked);

    // The replacement issued by the legitimate rotation dies with the family
    let err = h
        .service
        .verify_refresh(&rotated.tokens.refresh_token, true)
        .await
        .unwrap_err();
    assert_eq!(token_error(err), TokenError::TokenRevoked);

    assert!(!h.service.has_active_session(h.identity.id).await.unwrap());
    assert_eq!(
        h.audit.count_of(SecurityEventKind::TokenReuseDetected).await,
        1
    );
    assert_eq!(h.audit.count_of(SecurityEventKind::FamilyRevoked).await, 1);
}

#[tokio::test]
async fn test_forged_token_is_not_found_and_burns_nothing() {
    let h = harness().await;
    let pair = h.service.issue(&h.identity, client()).await.unwrap();

    // Correctly signed but never persisted
    let forged = h
        .service
        .codec()
        .sign(SignRequest {
            subject: h.identity.id,
            token_type: TokenType::Refresh,
            email: h.identity.email.clone(),
            username: h.identity.username.clone(),
            family: Some(Uuid::new_v4().to_string()),
            lifetime: None,
        })
        .unwrap();

    let err = h.service.rotate(&forged.token, client()).await.unwrap_err();
    assert_eq!(token_error(err), TokenError::TokenNotFound);

    // The legitimate session is untouched
    assert!(h
        .service
        .verify_refresh(&pair.refresh_token, true)
        .await
        .is_ok());
    assert_eq!(h.audit.count_of(SecurityEventKind::FamilyRevoked).await, 0);
    assert_eq!(h.audit.count_of(SecurityEventKind::RotationFailed).await, 1);
}

#[tokio::test]
async fn test_concurrent_rotations_yield_exactly_one_success() {
    let h = harness().await;
    let pair = h.service.issue(&h.identity, client()).await.unwrap();

    let (first, second) = tokio::join!(
        h.service.rotate(&pair.refresh_token, client()),
        h.service.rotate(&pair.refresh_token, client()),
    );

    let successes = [&first, &second].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);

    let loser = if first.is_err() { first } else { second };
    assert_eq!(token_error(loser.unwrap_err()), TokenError::TokenRevoked);

    // The race burned the family, so even the winner's pair is dead
    assert!(!h.service.has_active_session(h.identity.id).await.unwrap());
}

#[tokio::test]
async fn test_rotate_rejects_expired_token() {
    let h = harness_with_config(test_config().with_refresh_ttl(Duration::seconds(1))).await;
    let pair = h.service.issue(&h.identity, client()).await.unwrap();

    h.clock.advance(Duration::seconds(2));

    let err = h.service.rotate(&pair.refresh_token, client()).await.unwrap_err();
    assert_eq!(token_error(err), TokenError::TokenExpired);
}

#[tokio::test]
async fn test_stored_expiry_checked_independently_of_claim() {
    let h = harness().await;

    // A record whose stored expiry has passed even though the signed claim
    // is still far in the future
    let signed = h
        .service
        .codec()
        .sign(SignRequest {
            subject: h.identity.id,
            token_type: TokenType::Refresh,
            email: h.identity.email.clone(),
            username: h.identity.username.clone(),
            family: Some("family-a".to_string()),
            lifetime: None,
        })
        .unwrap();
    h.store
        .create(RefreshTokenRecord::new(
            Uuid::parse_str(&signed.claims.jti).unwrap(),
            h.identity.id,
            TestService::token_digest(&signed.token),
            "family-a".to_string(),
            h.clock.now() - Duration::seconds(1),
            client(),
            h.clock.now(),
        ))
        .await
        .unwrap();

    let err = h
        .service
        .verify_refresh(&signed.token, true)
        .await
        .unwrap_err();
    assert_eq!(token_error(err), TokenError::TokenExpired);
}

#[tokio::test]
async fn test_digest_mismatch_is_rejected() {
    let h = harness().await;

    let signed = h
        .service
        .codec()
        .sign(SignRequest {
            subject: h.identity.id,
            token_type: TokenType::Refresh,
            email: h.identity.email.clone(),
            username: h.identity.username.clone(),
            family: Some("family-b".to_string()),
            lifetime: None,
        })
        .unwrap();
    h.store
        .create(RefreshTokenRecord::new(
            Uuid::parse_str(&signed.claims.jti).unwrap(),
            h.identity.id,
            "0000000000000000".to_string(),
            "family-b".to_string(),
            h.clock.now() + Duration::days(30),
            client(),
            h.clock.now(),
        ))
        .await
        .unwrap();

    let err = h
        .service
        .verify_refresh(&signed.token, true)
        .await
        .unwrap_err();
    assert_eq!(token_error(err), TokenError::InvalidSignature);
}

#[tokio::test]
async fn test_missing_identity_fails_rotation_closed() {
    let h = harness().await;
    let pair = h.service.issue(&h.identity, client()).await.unwrap();

    h.identities.remove(h.identity.id).await;

    let err = h.service.rotate(&pair.refresh_token, client()).await.unwrap_err();
    assert!(matches!(
        err,
        DomainError::Auth(AuthError::IdentityNotFound)
    ));

    // Verification succeeded before the failure, so the family is burned
    assert!(!h.service.has_active_session(h.identity.id).await.unwrap());
    assert_eq!(h.audit.count_of(SecurityEventKind::FamilyRevoked).await, 1);
}

#[tokio::test]
async fn test_revoke_all_for_user_spares_other_users() {
    let h = harness().await;
    let other = Identity::new(Uuid::new_v4(), "grace@example.com", None);
    h.identities.insert(other.clone()).await;

    let mine = h.service.issue(&h.identity, client()).await.unwrap();
    let theirs = h.service.issue(&other, client()).await.unwrap();

    let count = h
        .service
        .revoke_all_for_user(h.identity.id, "logout all")
        .await
        .unwrap();
    assert_eq!(count, 1);

    let err = h
        .service
        .verify_refresh(&mine.refresh_token, true)
        .await
        .unwrap_err();
    assert_eq!(token_error(err), TokenError::TokenRevoked);

    assert!(h
        .service
        .verify_refresh(&theirs.refresh_token, true)
        .await
        .is_ok());
    assert_eq!(h.audit.count_of(SecurityEventKind::SessionsRevoked).await, 1);
}

#[tokio::test]
async fn test_revoke_token_is_idempotent() {
    let h = harness().await;
    let pair = h.service.issue(&h.identity, client()).await.unwrap();
    let (claims, _) = h.service.verify_refresh(&pair.refresh_token, false).await.unwrap();
    let jti = Uuid::parse_str(&claims.jti).unwrap();

    assert!(h.service.revoke_token(jti, "logout").await.unwrap());
    assert!(!h.service.revoke_token(jti, "logout").await.unwrap());
    assert!(!h.service.revoke_token(Uuid::new_v4(), "logout").await.unwrap());

    assert_eq!(h.audit.count_of(SecurityEventKind::TokenRevoked).await, 1);
}

#[tokio::test]
async fn test_cleanup_removes_only_expired_rows() {
    let h = harness().await;
    let pair = h.service.issue(&h.identity, client()).await.unwrap();

    h.store
        .create(RefreshTokenRecord::new(
            Uuid::new_v4(),
            h.identity.id,
            "digest".to_string(),
            "old-family".to_string(),
            Utc::now() - Duration::days(1),
            ClientMetadata::default(),
            Utc::now() - Duration::days(31),
        ))
        .await
        .unwrap();

    assert_eq!(h.service.cleanup_expired().await.unwrap(), 1);
    assert_eq!(h.audit.count_of(SecurityEventKind::CleanupCompleted).await, 1);
    assert!(h
        .service
        .verify_refresh(&pair.refresh_token, true)
        .await
        .is_ok());
}

#[tokio::test]
async fn test_construction_rejects_placeholder_secret() {
    let store = Arc::new(InMemoryTokenStore::new());
    let identities = Arc::new(InMemoryIdentityRepository::new());
    let audit = Arc::new(InMemoryAuditLogRepository::new());

    let result = SessionService::new(
        store,
        identities,
        audit,
        SessionConfig::new("your-secret-key-change-in-production", "tripsync"),
    );
    assert!(matches!(result, Err(DomainError::Configuration { .. })));
}
