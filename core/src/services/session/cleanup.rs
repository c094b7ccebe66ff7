//! Periodic cleanup of expired refresh token records
//!
//! Garbage collection only: a missed sweep delays deletion but never
//! violates a correctness invariant, so failures are logged and the loop
//! continues.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::domain::entities::audit::{SecurityEvent, SecurityEventKind};
use crate::errors::DomainResult;
use crate::repositories::{AuditLogRepository, TokenStore};

/// Configuration for the cleanup task
#[derive(Debug, Clone)]
pub struct SessionCleanupConfig {
    /// How often to run cleanup (in seconds)
    pub interval_seconds: u64,
    /// Whether to run the background task at all
    pub enabled: bool,
}

impl Default for SessionCleanupConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 3600, // hourly
            enabled: true,
        }
    }
}

/// Background sweeper deleting refresh token rows past their expiry
pub struct SessionCleanupService<S: TokenStore + 'static, A: AuditLogRepository + 'static> {
    store: Arc<S>,
    audit: Arc<A>,
    config: SessionCleanupConfig,
}

impl<S: TokenStore, A: AuditLogRepository> SessionCleanupService<S, A> {
    pub fn new(store: Arc<S>, audit: Arc<A>, config: SessionCleanupConfig) -> Self {
        Self {
            store,
            audit,
            config,
        }
    }

    /// Run a single cleanup cycle; returns the number of rows deleted
    pub async fn run_cleanup(&self) -> DomainResult<usize> {
        let deleted = self.store.delete_expired().await?;
        if deleted > 0 {
            info!(deleted, "deleted expired refresh tokens");
        }
        let event = SecurityEvent::new(SecurityEventKind::CleanupCompleted)
            .with_context(serde_json::json!({ "deleted": deleted }));
        if let Err(err) = self.audit.record(event).await {
            warn!(error = %err, "failed to record cleanup event");
        }
        Ok(deleted)
    }

    /// Spawn the recurring cleanup task
    ///
    /// A failing cycle is logged and the next tick runs normally; the task
    /// never takes the host process down.
    pub fn start_background_task(self: Arc<Self>) {
        if !self.config.enabled {
            warn!("session cleanup task is disabled");
            return;
        }

        let interval = std::time::Duration::from_secs(self.config.interval_seconds);

        tokio::spawn(async move {
            info!(
                interval_seconds = self.config.interval_seconds,
                "session cleanup task started"
            );

            let mut ticker = tokio::time::interval(interval);

            loop {
                ticker.tick().await;

                if let Err(err) = self.run_cleanup().await {
                    error!(error = %err, "session cleanup cycle failed");
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::token::{ClientMetadata, RefreshTokenRecord};
    use crate::repositories::{InMemoryAuditLogRepository, InMemoryTokenStore};
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    #[tokio::test]
    async fn test_run_cleanup_reports_deleted_count() {
        let store = Arc::new(InMemoryTokenStore::new());
        let audit = Arc::new(InMemoryAuditLogRepository::new());
        let now = Utc::now();

        for expires_in in [Duration::seconds(-5), Duration::days(1)] {
            store
                .create(RefreshTokenRecord::new(
                    Uuid::new_v4(),
                    Uuid::new_v4(),
                    "digest".to_string(),
                    "family".to_string(),
                    now + expires_in,
                    ClientMetadata::default(),
                    now,
                ))
                .await
                .unwrap();
        }

        let cleanup = SessionCleanupService::new(
            store.clone(),
            audit.clone(),
            SessionCleanupConfig::default(),
        );
        assert_eq!(cleanup.run_cleanup().await.unwrap(), 1);
        assert_eq!(store.len().await, 1);
        assert_eq!(
            audit.count_of(SecurityEventKind::CleanupCompleted).await,
            1
        );
    }
}
