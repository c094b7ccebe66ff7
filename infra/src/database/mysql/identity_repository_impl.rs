//! MySQL implementation of the IdentityRepository trait.
//!
//! Reads the claims-level view of a user from the `users` table owned by the
//! user-management collaborator; this repository never writes.

use async_trait::async_trait;
use sqlx::{MySqlPool, Row};
use uuid::Uuid;

use ts_core::domain::entities::identity::Identity;
use ts_core::errors::{DomainError, DomainResult};
use ts_core::repositories::IdentityRepository;

/// MySQL implementation of IdentityRepository
pub struct MySqlIdentityRepository {
    /// Database connection pool
    pool: MySqlPool,
}

impl MySqlIdentityRepository {
    /// Create a new MySQL identity repository
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityRepository for MySqlIdentityRepository {
    async fn load_identity(&self, subject: Uuid) -> DomainResult<Option<Identity>> {
        let query = "SELECT id, email, username FROM users WHERE id = ? LIMIT 1";

        let result = sqlx::query(query)
            .bind(subject.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::Internal {
                message: format!("Failed to load identity: {}", e),
            })?;

        let Some(row) = result else {
            return Ok(None);
        };

        let id: String = row.try_get("id").map_err(|e| DomainError::Internal {
            message: format!("Failed to get id: {}", e),
        })?;

        Ok(Some(Identity {
            id: Uuid::parse_str(&id).map_err(|e| DomainError::Internal {
                message: format!("Invalid user UUID: {}", e),
            })?,
            email: row.try_get("email").map_err(|e| DomainError::Internal {
                message: format!("Failed to get email: {}", e),
            })?,
            username: row.try_get("username").map_err(|e| DomainError::Internal {
                message: format!("Failed to get username: {}", e),
            })?,
        }))
    }
}
