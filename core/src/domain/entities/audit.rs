//! Security audit event entity for authentication decisions and session
//! mutations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Event kinds emitted by the session service and request authenticator
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SecurityEventKind {
    // Session service mutations
    TokenIssued,
    TokenRefreshed,
    TokenRevoked,
    SessionsRevoked,
    FamilyRevoked,

    // Rotation failure paths
    TokenReuseDetected,
    RotationFailed,

    // Request authenticator outcomes
    AccessDenied,
    PermissionDenied,

    // Maintenance
    CleanupCompleted,
}

impl SecurityEventKind {
    /// String representation for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TokenIssued => "TOKEN_ISSUED",
            Self::TokenRefreshed => "TOKEN_REFRESHED",
            Self::TokenRevoked => "TOKEN_REVOKED",
            Self::SessionsRevoked => "SESSIONS_REVOKED",
            Self::FamilyRevoked => "FAMILY_REVOKED",
            Self::TokenReuseDetected => "TOKEN_REUSE_DETECTED",
            Self::RotationFailed => "ROTATION_FAILED",
            Self::AccessDenied => "ACCESS_DENIED",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::CleanupCompleted => "CLEANUP_COMPLETED",
        }
    }

    /// Default severity for the event kind
    pub fn severity(&self) -> Severity {
        match self {
            Self::TokenIssued | Self::TokenRefreshed | Self::CleanupCompleted => Severity::Info,
            Self::TokenRevoked | Self::SessionsRevoked | Self::AccessDenied
            | Self::PermissionDenied => Severity::Warning,
            Self::FamilyRevoked | Self::TokenReuseDetected | Self::RotationFailed => {
                Severity::Critical
            }
        }
    }
}

/// Severity attached to a security event
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Critical => "CRITICAL",
        }
    }
}

/// Structured security event consumed by the observability collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityEvent {
    /// What happened
    pub event: SecurityEventKind,

    /// Subject (user id) if known at the time of the event
    pub subject: Option<Uuid>,

    /// Source address of the request that triggered the event
    pub source_address: Option<String>,

    /// User agent of the request that triggered the event
    pub user_agent: Option<String>,

    /// Request path, for authenticator events
    pub path: Option<String>,

    /// Event severity
    pub severity: Severity,

    /// Free-form context (reason, affected count, error kind, ...)
    pub context: Option<JsonValue>,

    /// When the event occurred
    pub occurred_at: DateTime<Utc>,
}

impl SecurityEvent {
    /// Creates a new event with the kind's default severity
    pub fn new(event: SecurityEventKind) -> Self {
        Self {
            event,
            subject: None,
            source_address: None,
            user_agent: None,
            path: None,
            severity: event.severity(),
            context: None,
            occurred_at: Utc::now(),
        }
    }

    pub fn with_subject(mut self, subject: Uuid) -> Self {
        self.subject = Some(subject);
        self
    }

    pub fn with_source(
        mut self,
        source_address: Option<String>,
        user_agent: Option<String>,
    ) -> Self {
        self.source_address = source_address;
        self.user_agent = user_agent;
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_context(mut self, context: JsonValue) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}
