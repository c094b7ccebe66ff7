//! No-op audit sink for deployments without an observability collaborator

use async_trait::async_trait;

use crate::domain::entities::audit::SecurityEvent;
use crate::errors::DomainResult;

use super::r#trait::AuditLogRepository;

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAuditLogRepository;

#[async_trait]
impl AuditLogRepository for NoopAuditLogRepository {
    async fn record(&self, _event: SecurityEvent) -> DomainResult<()> {
        Ok(())
    }
}
