//! Request authentication middleware for protecting API endpoints.
//!
//! The middleware extracts an access token from the `Authorization: Bearer`
//! header (with an optional cookie fallback), verifies it through the session
//! service, resolves the subject's identity, and injects an [`AuthContext`]
//! into the request extensions for handlers to extract.
//!
//! Verification failures carry a specific kind internally for logging and
//! audit; callers only ever see the configured unauthorized/forbidden
//! messages.

use actix_web::{
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    error::{ErrorForbidden, ErrorInternalServerError, ErrorUnauthorized},
    http::header::{AUTHORIZATION, USER_AGENT},
    web, Error, FromRequest, HttpMessage, HttpRequest,
};
use futures_util::future::LocalBoxFuture;
use std::{
    future::{ready, Ready},
    rc::Rc,
    sync::Arc,
    task::{Context, Poll},
};
use uuid::Uuid;

use ts_core::domain::entities::audit::{SecurityEvent, SecurityEventKind};
use ts_core::domain::entities::identity::Identity;
use ts_core::domain::entities::token::Claims;
use ts_core::errors::{DomainResult, TokenError};
use ts_core::repositories::{AuditLogRepository, IdentityRepository, TokenStore};
use ts_core::services::session::{SessionService, TokenCodec};

/// Default cookie consulted when the Authorization header is absent
pub const DEFAULT_ACCESS_COOKIE: &str = "access_token";

/// Hook deciding whether a resolved identity may pass a guarded route
pub type PermissionCheck = Arc<dyn Fn(&Identity) -> bool + Send + Sync>;

/// Authenticated request context injected into request extensions
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Identity resolved for the verified subject
    pub identity: Identity,
    /// Verified access token claims
    pub claims: Claims,
}

impl AuthContext {
    /// User ID of the authenticated subject
    pub fn user_id(&self) -> Uuid {
        self.identity.id
    }
}

/// Session-service surface the middleware depends on, object-safe so it can
/// live in actix app data without the service's generic parameters.
#[async_trait::async_trait(?Send)]
pub trait AuthGateway: Send + Sync {
    /// Stateless access token verification
    fn verify_access(&self, token: &str) -> Result<Claims, TokenError>;

    /// Whether the subject still holds at least one live refresh session
    async fn has_active_session(&self, user_id: Uuid) -> DomainResult<bool>;

    /// Resolve the identity behind a verified subject
    async fn load_identity(&self, subject: Uuid) -> DomainResult<Option<Identity>>;

    /// Record a security audit event; must never fail the request
    async fn record_event(&self, event: SecurityEvent);
}

#[async_trait::async_trait(?Send)]
impl<S, I, A> AuthGateway for SessionService<S, I, A>
where
    S: TokenStore,
    I: IdentityRepository,
    A: AuditLogRepository,
{
    fn verify_access(&self, token: &str) -> Result<Claims, TokenError> {
        SessionService::verify_access(self, token)
    }

    async fn has_active_session(&self, user_id: Uuid) -> DomainResult<bool> {
        SessionService::has_active_session(self, user_id).await
    }

    async fn load_identity(&self, subject: Uuid) -> DomainResult<Option<Identity>> {
        SessionService::load_identity(self, subject).await
    }

    async fn record_event(&self, event: SecurityEvent) {
        self.record_security_event(event).await;
    }
}

/// Configuration shared between the factory and the middleware instances
struct AuthSettings {
    required: bool,
    skip_paths: Vec<String>,
    check_revocation: bool,
    cookie_name: String,
    permission_check: Option<PermissionCheck>,
    unauthorized_message: String,
    forbidden_message: String,
}

/// Request authentication middleware factory
///
/// Defaults: authentication required, no skip paths, no store round-trip for
/// access tokens (they are intentionally stateless), cookie fallback
/// [`DEFAULT_ACCESS_COOKIE`].
pub struct SessionAuth {
    settings: AuthSettings,
}

impl SessionAuth {
    pub fn new() -> Self {
        Self {
            settings: AuthSettings {
                required: true,
                skip_paths: Vec::new(),
                check_revocation: false,
                cookie_name: DEFAULT_ACCESS_COOKIE.to_string(),
                permission_check: None,
                unauthorized_message: "Authentication required".to_string(),
                forbidden_message: "Insufficient permissions".to_string(),
            },
        }
    }

    /// Attach an unauthenticated context instead of rejecting when no valid
    /// credential is presented
    pub fn optional(mut self) -> Self {
        self.settings.required = false;
        self
    }

    /// Path prefixes that bypass authentication entirely
    pub fn skip_paths<T: Into<String>>(mut self, paths: impl IntoIterator<Item = T>) -> Self {
        self.settings.skip_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Require a live refresh session in the store on every request
    ///
    /// Costs a store round-trip per request; reserved for sensitive routes.
    pub fn check_revocation(mut self) -> Self {
        self.settings.check_revocation = true;
        self
    }

    /// Cookie consulted when the Authorization header is absent
    pub fn cookie_name(mut self, name: impl Into<String>) -> Self {
        self.settings.cookie_name = name.into();
        self
    }

    /// Custom permission hook; a `false` verdict yields forbidden
    pub fn permission_check(mut self, check: PermissionCheck) -> Self {
        self.settings.permission_check = Some(check);
        self
    }

    /// Override the message returned on unauthorized outcomes
    pub fn unauthorized_message(mut self, message: impl Into<String>) -> Self {
        self.settings.unauthorized_message = message.into();
        self
    }

    /// Override the message returned on forbidden outcomes
    pub fn forbidden_message(mut self, message: impl Into<String>) -> Self {
        self.settings.forbidden_message = message.into();
        self
    }
}

impl Default for SessionAuth {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, B> Transform<S, ServiceRequest> for SessionAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = SessionAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionAuthMiddleware {
            service: Rc::new(service),
            settings: Rc::new(AuthSettings {
                required: self.settings.required,
                skip_paths: self.settings.skip_paths.clone(),
                check_revocation: self.settings.check_revocation,
                cookie_name: self.settings.cookie_name.clone(),
                permission_check: self.settings.permission_check.clone(),
                unauthorized_message: self.settings.unauthorized_message.clone(),
                forbidden_message: self.settings.forbidden_message.clone(),
            }),
        }))
    }
}

/// Request authentication middleware service
pub struct SessionAuthMiddleware<S> {
    service: Rc<S>,
    settings: Rc<AuthSettings>,
}

impl<S, B> Service<ServiceRequest> for SessionAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let settings = Rc::clone(&self.settings);

        Box::pin(async move {
            let path = req.path().to_string();

            if settings.skip_paths.iter().any(|p| path.starts_with(p)) {
                return service.call(req).await;
            }

            let gateway = match req.app_data::<web::Data<Arc<dyn AuthGateway>>>() {
                Some(gateway) => gateway.get_ref().clone(),
                None => {
                    tracing::error!("authentication gateway missing from app data");
                    return Err(ErrorInternalServerError("Authentication not configured"));
                }
            };

            let source = RequestSource::from(&req);

            let token = match extract_access_token(&req, &settings.cookie_name) {
                Some(token) => token,
                None => {
                    if settings.required {
                        deny(&gateway, &source, &path, None, "MISSING_CREDENTIAL").await;
                        return Err(ErrorUnauthorized(settings.unauthorized_message.clone()));
                    }
                    return service.call(req).await;
                }
            };

            let claims = match gateway.verify_access(&token) {
                Ok(claims) => claims,
                Err(err) => {
                    tracing::debug!(path = %path, reason = err.code(), "access token rejected");
                    if settings.required {
                        deny(&gateway, &source, &path, None, err.code()).await;
                        return Err(ErrorUnauthorized(settings.unauthorized_message.clone()));
                    }
                    return service.call(req).await;
                }
            };

            let subject = match claims.user_id() {
                Ok(subject) => subject,
                Err(_) => {
                    deny(&gateway, &source, &path, None, "TOKEN_MALFORMED").await;
                    return Err(ErrorUnauthorized(settings.unauthorized_message.clone()));
                }
            };

            // Optional store round-trip: the access token is only honored
            // while the subject still holds a live refresh session.
            if settings.check_revocation {
                match gateway.has_active_session(subject).await {
                    Ok(true) => {}
                    Ok(false) => {
                        deny(&gateway, &source, &path, Some(subject), "TOKEN_REVOKED").await;
                        return Err(ErrorUnauthorized(settings.unauthorized_message.clone()));
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "revocation check failed");
                        deny(&gateway, &source, &path, Some(subject), err.code()).await;
                        return Err(ErrorUnauthorized(settings.unauthorized_message.clone()));
                    }
                }
            }

            // A structurally valid token can reference a since-deleted user
            let identity = match gateway.load_identity(subject).await {
                Ok(Some(identity)) => identity,
                Ok(None) => {
                    deny(&gateway, &source, &path, Some(subject), "IDENTITY_NOT_FOUND").await;
                    return Err(ErrorUnauthorized(settings.unauthorized_message.clone()));
                }
                Err(err) => {
                    tracing::warn!(error = %err, "identity lookup failed");
                    deny(&gateway, &source, &path, Some(subject), err.code()).await;
                    return Err(ErrorUnauthorized(settings.unauthorized_message.clone()));
                }
            };

            if let Some(check) = &settings.permission_check {
                if !check(&identity) {
                    gateway
                        .record_event(
                            SecurityEvent::new(SecurityEventKind::PermissionDenied)
                                .with_subject(subject)
                                .with_source(source.address.clone(), source.user_agent.clone())
                                .with_path(path.clone()),
                        )
                        .await;
                    return Err(ErrorForbidden(settings.forbidden_message.clone()));
                }
            }

            req.extensions_mut().insert(AuthContext { identity, claims });

            service.call(req).await
        })
    }
}

/// Source fields captured before the request is handed downstream
struct RequestSource {
    address: Option<String>,
    user_agent: Option<String>,
}

impl From<&ServiceRequest> for RequestSource {
    fn from(req: &ServiceRequest) -> Self {
        Self {
            address: req
                .connection_info()
                .realip_remote_addr()
                .map(|a| a.to_string()),
            user_agent: req
                .headers()
                .get(USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.to_string()),
        }
    }
}

async fn deny(
    gateway: &Arc<dyn AuthGateway>,
    source: &RequestSource,
    path: &str,
    subject: Option<Uuid>,
    reason: &str,
) {
    let mut event = SecurityEvent::new(SecurityEventKind::AccessDenied)
        .with_source(source.address.clone(), source.user_agent.clone())
        .with_path(path)
        .with_context(serde_json::json!({ "reason": reason }));
    if let Some(subject) = subject {
        event = event.with_subject(subject);
    }
    gateway.record_event(event).await;
}

/// Extracts the access token from the Authorization header, falling back to
/// the configured cookie
fn extract_access_token(req: &ServiceRequest, cookie_name: &str) -> Option<String> {
    let bearer = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(TokenCodec::extract_bearer)
        .map(|t| t.to_string());

    bearer.or_else(|| req.cookie(cookie_name).map(|c| c.value().to_string()))
}

/// Extractor for required authentication
impl FromRequest for AuthContext {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let result = req
            .extensions()
            .get::<AuthContext>()
            .cloned()
            .ok_or_else(|| ErrorUnauthorized("Authentication required"));

        ready(result)
    }
}

/// Extractor for optional authentication
pub struct OptionalAuth(pub Option<AuthContext>);

impl FromRequest for OptionalAuth {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let auth = req.extensions().get::<AuthContext>().cloned();
        ready(Ok(OptionalAuth(auth)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_extract_access_token_from_header() {
        let req = TestRequest::default()
            .insert_header((AUTHORIZATION, "Bearer test_token_123"))
            .to_srv_request();
        assert_eq!(
            extract_access_token(&req, DEFAULT_ACCESS_COOKIE),
            Some("test_token_123".to_string())
        );

        let req_no_bearer = TestRequest::default()
            .insert_header((AUTHORIZATION, "test_token_123"))
            .to_srv_request();
        assert_eq!(extract_access_token(&req_no_bearer, DEFAULT_ACCESS_COOKIE), None);

        let req_no_header = TestRequest::default().to_srv_request();
        assert_eq!(extract_access_token(&req_no_header, DEFAULT_ACCESS_COOKIE), None);
    }

    #[test]
    fn test_extract_access_token_cookie_fallback() {
        let req = TestRequest::default()
            .cookie(actix_web::cookie::Cookie::new("access_token", "from_cookie"))
            .to_srv_request();
        assert_eq!(
            extract_access_token(&req, "access_token"),
            Some("from_cookie".to_string())
        );

        // Header wins over cookie
        let req_both = TestRequest::default()
            .insert_header((AUTHORIZATION, "Bearer from_header"))
            .cookie(actix_web::cookie::Cookie::new("access_token", "from_cookie"))
            .to_srv_request();
        assert_eq!(
            extract_access_token(&req_both, "access_token"),
            Some("from_header".to_string())
        );
    }
}
