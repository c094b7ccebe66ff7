//! Audit log repository trait for the observability collaborator.

use async_trait::async_trait;

use crate::domain::entities::audit::SecurityEvent;
use crate::errors::DomainResult;

/// Sink for structured security events
///
/// Every authentication decision and every session mutation is recorded here.
/// A failing sink must never fail the operation that produced the event;
/// callers log and continue.
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    /// Record a single security event
    async fn record(&self, event: SecurityEvent) -> DomainResult<()>;
}
