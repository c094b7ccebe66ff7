//! Unit tests for the token codec

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::domain::entities::token::TokenType;
use crate::errors::{DomainError, TokenError};
use crate::services::session::{FixedClock, Lifetime, SessionConfig, SignRequest, TokenCodec};

const TEST_SECRET: &str = "unit-test-signing-secret-0123456789abcdef";

fn test_config() -> SessionConfig {
    SessionConfig::new(TEST_SECRET, "tripsync").with_audience("tripsync-api")
}

fn codec_with_clock(clock: Arc<FixedClock>) -> TokenCodec {
    TokenCodec::new(test_config(), clock).expect("codec construction")
}

fn sign_request(token_type: TokenType) -> SignRequest {
    SignRequest {
        subject: Uuid::new_v4(),
        token_type,
        email: "ada@example.com".to_string(),
        username: Some("ada".to_string()),
        family: match token_type {
            TokenType::Refresh => Some(Uuid::new_v4().to_string()),
            TokenType::Access => None,
        },
        lifetime: None,
    }
}

#[test]
fn test_sign_then_verify_roundtrip() {
    let clock = Arc::new(FixedClock::new(Utc::now()));
    let codec = codec_with_clock(clock.clone());

    let request = sign_request(TokenType::Access);
    let subject = request.subject;
    let signed = codec.sign(request).unwrap();

    let claims = codec.verify(&signed.token, Some(TokenType::Access)).unwrap();
    assert_eq!(claims.sub, subject.to_string());
    assert_eq!(claims.typ, TokenType::Access);
    assert_eq!(claims.email, "ada@example.com");
    assert_eq!(claims.iss, "tripsync");
    assert_eq!(claims.aud.as_deref(), Some("tripsync-api"));
    assert!(!claims.jti.is_empty());
    assert_eq!(
        claims.exp - claims.iat,
        Duration::minutes(15).num_seconds()
    );
}

#[test]
fn test_verify_after_expiry_returns_token_expired() {
    let clock = Arc::new(FixedClock::new(Utc::now()));
    let codec = codec_with_clock(clock.clone());

    let mut request = sign_request(TokenType::Access);
    request.lifetime = Some(Lifetime::Duration(Duration::seconds(1)));
    let signed = codec.sign(request).unwrap();

    assert!(codec.verify(&signed.token, None).is_ok());

    clock.advance(Duration::seconds(2));
    assert_eq!(
        codec.verify(&signed.token, None),
        Err(TokenError::TokenExpired)
    );
}

#[test]
fn test_verify_before_nbf_returns_not_yet_valid() {
    let start = Utc::now();
    let clock = Arc::new(FixedClock::new(start));
    let codec = codec_with_clock(clock.clone());

    let signed = codec.sign(sign_request(TokenType::Access)).unwrap();

    clock.set(start - Duration::minutes(5));
    assert_eq!(
        codec.verify(&signed.token, None),
        Err(TokenError::TokenNotYetValid)
    );
}

#[test]
fn test_verify_rejects_type_mismatch() {
    let clock = Arc::new(FixedClock::new(Utc::now()));
    let codec = codec_with_clock(clock);

    let signed = codec.sign(sign_request(TokenType::Refresh)).unwrap();

    let err = codec
        .verify(&signed.token, Some(TokenType::Access))
        .unwrap_err();
    assert!(matches!(err, TokenError::InvalidTokenType { .. }));

    // Without an expected type the same token verifies
    assert!(codec.verify(&signed.token, None).is_ok());
}

#[test]
fn test_verify_rejects_tampered_signature() {
    let clock = Arc::new(FixedClock::new(Utc::now()));
    let codec = codec_with_clock(clock);

    let signed = codec.sign(sign_request(TokenType::Access)).unwrap();
    let mut tampered = signed.token.clone();
    tampered.truncate(tampered.len() - 4);
    tampered.push_str("AAAA");

    assert_eq!(
        codec.verify(&tampered, None),
        Err(TokenError::InvalidSignature)
    );
}

#[test]
fn test_verify_rejects_garbage_as_malformed() {
    let clock = Arc::new(FixedClock::new(Utc::now()));
    let codec = codec_with_clock(clock);

    assert_eq!(
        codec.verify("not-a-jwt", None),
        Err(TokenError::TokenMalformed)
    );
    assert_eq!(codec.verify("", None), Err(TokenError::TokenMalformed));
}

#[test]
fn test_verify_rejects_token_from_other_issuer() {
    let clock = Arc::new(FixedClock::new(Utc::now()));
    let codec = codec_with_clock(clock.clone());

    let foreign = TokenCodec::new(
        SessionConfig::new(TEST_SECRET, "someone-else").with_audience("tripsync-api"),
        clock,
    )
    .unwrap();
    let signed = foreign.sign(sign_request(TokenType::Access)).unwrap();

    assert!(codec.verify(&signed.token, None).is_err());
}

#[test]
fn test_verify_reports_missing_claims() {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    let clock = Arc::new(FixedClock::new(Utc::now()));
    let codec = codec_with_clock(clock);

    // Signed with the right key but missing the email claim
    let now = Utc::now().timestamp();
    let payload = json!({
        "sub": Uuid::new_v4().to_string(),
        "typ": "access",
        "iat": now,
        "exp": now + 900,
        "nbf": now,
        "iss": "tripsync",
        "aud": "tripsync-api",
        "jti": Uuid::new_v4().to_string(),
    });
    let token = encode(
        &Header::default(),
        &payload,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap();

    assert_eq!(
        codec.verify(&token, None),
        Err(TokenError::MissingClaim {
            claim: "email".to_string()
        })
    );
}

#[test]
fn test_sign_rejects_malformed_lifetime_override() {
    let clock = Arc::new(FixedClock::new(Utc::now()));
    let codec = codec_with_clock(clock);

    let mut request = sign_request(TokenType::Access);
    request.lifetime = Some(Lifetime::from("15s"));

    assert!(matches!(
        codec.sign(request),
        Err(DomainError::Configuration { .. })
    ));
}

#[test]
fn test_sign_honors_compact_lifetime_override() {
    let clock = Arc::new(FixedClock::new(Utc::now()));
    let codec = codec_with_clock(clock);

    let mut request = sign_request(TokenType::Access);
    request.lifetime = Some(Lifetime::from("2h"));
    let signed = codec.sign(request).unwrap();

    assert_eq!(
        signed.claims.exp - signed.claims.iat,
        Duration::hours(2).num_seconds()
    );
}

#[test]
fn test_decode_unverified_ignores_signature() {
    let clock = Arc::new(FixedClock::new(Utc::now()));
    let codec = codec_with_clock(clock.clone());

    let foreign = TokenCodec::new(
        SessionConfig::new(
            "a-completely-different-signing-secret-42",
            "tripsync",
        )
        .with_audience("tripsync-api"),
        clock,
    )
    .unwrap();
    let signed = foreign.sign(sign_request(TokenType::Access)).unwrap();

    // verify rejects, decode still yields the payload for diagnostics
    assert_eq!(
        codec.verify(&signed.token, None),
        Err(TokenError::InvalidSignature)
    );
    let claims = codec.decode_unverified(&signed.token).unwrap();
    assert_eq!(claims.iss, "tripsync");
}

#[test]
fn test_extract_bearer() {
    assert_eq!(
        TokenCodec::extract_bearer("Bearer abc.def.ghi"),
        Some("abc.def.ghi")
    );
    assert_eq!(TokenCodec::extract_bearer("bearer abc"), None);
    assert_eq!(TokenCodec::extract_bearer("Basic abc"), None);
    assert_eq!(TokenCodec::extract_bearer("Bearer "), None);
    assert_eq!(TokenCodec::extract_bearer(""), None);
}

#[test]
fn test_codec_rejects_placeholder_secret() {
    let clock = Arc::new(FixedClock::new(Utc::now()));
    let result = TokenCodec::new(
        SessionConfig::new("your-secret-key-change-in-production", "tripsync"),
        clock,
    );

    assert!(matches!(result, Err(DomainError::Configuration { .. })));
}
