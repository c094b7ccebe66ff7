//! MySQL implementation of the AuditLogRepository trait.
//!
//! Security events land in the append-only `security_events` table:
//!
//! ```sql
//! CREATE TABLE security_events (
//!     id             CHAR(36)     PRIMARY KEY,
//!     event          VARCHAR(48)  NOT NULL,
//!     subject        CHAR(36)     NULL,
//!     source_address VARCHAR(45)  NULL,
//!     user_agent     VARCHAR(512) NULL,
//!     path           VARCHAR(255) NULL,
//!     severity       VARCHAR(16)  NOT NULL,
//!     context        JSON         NULL,
//!     occurred_at    DATETIME(6)  NOT NULL,
//!     INDEX idx_security_events_subject (subject),
//!     INDEX idx_security_events_event (event, occurred_at)
//! );
//! ```

use async_trait::async_trait;
use sqlx::MySqlPool;
use uuid::Uuid;

use ts_core::domain::entities::audit::SecurityEvent;
use ts_core::errors::{DomainError, DomainResult};
use ts_core::repositories::AuditLogRepository;

/// MySQL implementation of AuditLogRepository
pub struct MySqlAuditLogRepository {
    /// Database connection pool
    pool: MySqlPool,
}

impl MySqlAuditLogRepository {
    /// Create a new MySQL audit log repository
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditLogRepository for MySqlAuditLogRepository {
    async fn record(&self, event: SecurityEvent) -> DomainResult<()> {
        let query = r#"
            INSERT INTO security_events (
                id, event, subject, source_address, user_agent,
                path, severity, context, occurred_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#;

        sqlx::query(query)
            .bind(Uuid::new_v4().to_string())
            .bind(event.event.as_str())
            .bind(event.subject.map(|s| s.to_string()))
            .bind(&event.source_address)
            .bind(&event.user_agent)
            .bind(&event.path)
            .bind(event.severity.as_str())
            .bind(&event.context)
            .bind(event.occurred_at)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::Internal {
                message: format!("Failed to record security event: {}", e),
            })?;

        Ok(())
    }
}
