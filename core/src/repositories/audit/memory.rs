//! In-memory audit sink collecting events for assertions in tests

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::entities::audit::{SecurityEvent, SecurityEventKind};
use crate::errors::DomainResult;

use super::r#trait::AuditLogRepository;

/// Collects every recorded event
#[derive(Clone, Default)]
pub struct InMemoryAuditLogRepository {
    events: Arc<RwLock<Vec<SecurityEvent>>>,
}

impl InMemoryAuditLogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded events
    pub async fn events(&self) -> Vec<SecurityEvent> {
        self.events.read().await.clone()
    }

    /// Count events of a given kind
    pub async fn count_of(&self, kind: SecurityEventKind) -> usize {
        self.events
            .read()
            .await
            .iter()
            .filter(|e| e.event == kind)
            .count()
    }
}

#[async_trait]
impl AuditLogRepository for InMemoryAuditLogRepository {
    async fn record(&self, event: SecurityEvent) -> DomainResult<()> {
        self.events.write().await.push(event);
        Ok(())
    }
}
