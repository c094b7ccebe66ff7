//! MySQL implementation of the TokenStore trait.
//!
//! Refresh token records live in the `refresh_tokens` table, keyed by `jti`:
//!
//! ```sql
//! CREATE TABLE refresh_tokens (
//!     jti            CHAR(36)     PRIMARY KEY,
//!     user_id        CHAR(36)     NOT NULL,
//!     token_digest   CHAR(64)     NOT NULL,
//!     family         CHAR(36)     NOT NULL,
//!     expires_at     DATETIME(6)  NOT NULL,
//!     revoked        BOOLEAN      NOT NULL DEFAULT FALSE,
//!     revoked_at     DATETIME(6)  NULL,
//!     revoked_reason VARCHAR(64)  NULL,
//!     user_agent     VARCHAR(512) NULL,
//!     ip_address     VARCHAR(45)  NULL,
//!     created_at     DATETIME(6)  NOT NULL,
//!     updated_at     DATETIME(6)  NOT NULL,
//!     INDEX idx_refresh_tokens_user (user_id),
//!     INDEX idx_refresh_tokens_family (user_id, family)
//! );
//! ```
//!
//! Single-row revocation uses a conditional UPDATE (`... AND revoked = FALSE`)
//! so the affected-row count tells the session service whether this call won
//! the rotation race.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row};
use uuid::Uuid;

use ts_core::domain::entities::token::RefreshTokenRecord;
use ts_core::errors::{DomainError, DomainResult, TokenError};
use ts_core::repositories::TokenStore;

/// MySQL implementation of TokenStore
pub struct MySqlTokenStore {
    /// Database connection pool
    pool: MySqlPool,
}

impl MySqlTokenStore {
    /// Create a new MySQL token store
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Convert a database row to a RefreshTokenRecord entity
    fn row_to_record(row: &sqlx::mysql::MySqlRow) -> DomainResult<RefreshTokenRecord> {
        let jti: String = row.try_get("jti").map_err(|e| DomainError::Internal {
            message: format!("Failed to get jti: {}", e),
        })?;
        let user_id: String = row.try_get("user_id").map_err(|e| DomainError::Internal {
            message: format!("Failed to get user_id: {}", e),
        })?;

        Ok(RefreshTokenRecord {
            jti: Uuid::parse_str(&jti).map_err(|e| DomainError::Internal {
                message: format!("Invalid token UUID: {}", e),
            })?,
            user_id: Uuid::parse_str(&user_id).map_err(|e| DomainError::Internal {
                message: format!("Invalid user UUID: {}", e),
            })?,
            token_digest: row
                .try_get("token_digest")
                .map_err(|e| DomainError::Internal {
                    message: format!("Failed to get token_digest: {}", e),
                })?,
            family: row.try_get("family").map_err(|e| DomainError::Internal {
                message: format!("Failed to get family: {}", e),
            })?,
            expires_at: row
                .try_get::<DateTime<Utc>, _>("expires_at")
                .map_err(|e| DomainError::Internal {
                    message: format!("Failed to get expires_at: {}", e),
                })?,
            revoked: row.try_get("revoked").map_err(|e| DomainError::Internal {
                message: format!("Failed to get revoked: {}", e),
            })?,
            revoked_at: row
                .try_get::<Option<DateTime<Utc>>, _>("revoked_at")
                .map_err(|e| DomainError::Internal {
                    message: format!("Failed to get revoked_at: {}", e),
                })?,
            revoked_reason: row
                .try_get("revoked_reason")
                .map_err(|e| DomainError::Internal {
                    message: format!("Failed to get revoked_reason: {}", e),
                })?,
            user_agent: row.try_get("user_agent").map_err(|e| DomainError::Internal {
                message: format!("Failed to get user_agent: {}", e),
            })?,
            ip_address: row.try_get("ip_address").map_err(|e| DomainError::Internal {
                message: format!("Failed to get ip_address: {}", e),
            })?,
            created_at: row
                .try_get::<DateTime<Utc>, _>("created_at")
                .map_err(|e| DomainError::Internal {
                    message: format!("Failed to get created_at: {}", e),
                })?,
            updated_at: row
                .try_get::<DateTime<Utc>, _>("updated_at")
                .map_err(|e| DomainError::Internal {
                    message: format!("Failed to get updated_at: {}", e),
                })?,
        })
    }
}

const SELECT_COLUMNS: &str = "jti, user_id, token_digest, family, expires_at, \
    revoked, revoked_at, revoked_reason, user_agent, ip_address, created_at, updated_at";

#[async_trait]
impl TokenStore for MySqlTokenStore {
    async fn create(&self, record: RefreshTokenRecord) -> DomainResult<RefreshTokenRecord> {
        let query = r#"
            INSERT INTO refresh_tokens (
                jti, user_id, token_digest, family, expires_at,
                revoked, revoked_at, revoked_reason, user_agent, ip_address,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#;

        sqlx::query(query)
            .bind(record.jti.to_string())
            .bind(record.user_id.to_string())
            .bind(&record.token_digest)
            .bind(&record.family)
            .bind(record.expires_at)
            .bind(record.revoked)
            .bind(record.revoked_at)
            .bind(&record.revoked_reason)
            .bind(&record.user_agent)
            .bind(&record.ip_address)
            .bind(record.created_at)
            .bind(record.updated_at)
            .execute(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    DomainError::Token(TokenError::DuplicateTokenId)
                }
                _ => DomainError::Internal {
                    message: format!("Failed to save refresh token: {}", e),
                },
            })?;

        Ok(record)
    }

    async fn find_by_token_id(&self, jti: Uuid) -> DomainResult<Option<RefreshTokenRecord>> {
        let query = format!(
            "SELECT {SELECT_COLUMNS} FROM refresh_tokens WHERE jti = ? LIMIT 1"
        );

        let result = sqlx::query(&query)
            .bind(jti.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::Internal {
                message: format!("Failed to find refresh token: {}", e),
            })?;

        match result {
            Some(row) => Ok(Some(Self::row_to_record(&row)?)),
            None => Ok(None),
        }
    }

    async fn revoke_one(&self, jti: Uuid, reason: &str) -> DomainResult<bool> {
        let query = r#"
            UPDATE refresh_tokens
            SET revoked = TRUE, revoked_at = ?, revoked_reason = ?, updated_at = ?
            WHERE jti = ? AND revoked = FALSE
        "#;

        let now = Utc::now();
        let result = sqlx::query(query)
            .bind(now)
            .bind(reason)
            .bind(now)
            .bind(jti.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::Internal {
                message: format!("Failed to revoke token: {}", e),
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn revoke_all_for_user(&self, user_id: Uuid, reason: &str) -> DomainResult<usize> {
        let query = r#"
            UPDATE refresh_tokens
            SET revoked = TRUE, revoked_at = ?, revoked_reason = ?, updated_at = ?
            WHERE user_id = ? AND revoked = FALSE
        "#;

        let now = Utc::now();
        let result = sqlx::query(query)
            .bind(now)
            .bind(reason)
            .bind(now)
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::Internal {
                message: format!("Failed to revoke user tokens: {}", e),
            })?;

        Ok(result.rows_affected() as usize)
    }

    async fn revoke_family(
        &self,
        user_id: Uuid,
        family: &str,
        reason: &str,
    ) -> DomainResult<usize> {
        if family.is_empty() {
            return Ok(0);
        }

        let query = r#"
            UPDATE refresh_tokens
            SET revoked = TRUE, revoked_at = ?, revoked_reason = ?, updated_at = ?
            WHERE user_id = ? AND family = ? AND revoked = FALSE
        "#;

        let now = Utc::now();
        let result = sqlx::query(query)
            .bind(now)
            .bind(reason)
            .bind(now)
            .bind(user_id.to_string())
            .bind(family)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::Internal {
                message: format!("Failed to revoke token family: {}", e),
            })?;

        Ok(result.rows_affected() as usize)
    }

    async fn list_active_for_user(&self, user_id: Uuid) -> DomainResult<Vec<RefreshTokenRecord>> {
        let query = format!(
            "SELECT {SELECT_COLUMNS} FROM refresh_tokens \
             WHERE user_id = ? AND revoked = FALSE AND expires_at > ? \
             ORDER BY created_at DESC"
        );

        let rows = sqlx::query(&query)
            .bind(user_id.to_string())
            .bind(Utc::now())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::Internal {
                message: format!("Failed to list user tokens: {}", e),
            })?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(Self::row_to_record(&row)?);
        }

        Ok(records)
    }

    async fn delete_expired(&self) -> DomainResult<usize> {
        let query = "DELETE FROM refresh_tokens WHERE expires_at < ?";

        let result = sqlx::query(query)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::Internal {
                message: format!("Failed to delete expired tokens: {}", e),
            })?;

        Ok(result.rows_affected() as usize)
    }
}
