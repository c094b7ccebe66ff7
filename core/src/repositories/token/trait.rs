//! Token store trait defining the interface for refresh token persistence.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::token::RefreshTokenRecord;
use crate::errors::DomainResult;

/// Repository trait for refresh token record persistence
///
/// Implementations must guarantee at most one record per `jti` and must make
/// single-row revocation conditional: revoking a row that is already revoked
/// (or missing) reports `false`, which the session service relies on to
/// detect concurrent rotations of the same token.
///
/// All mutations are idempotent at the row level.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Persist a new refresh token record
    ///
    /// # Returns
    /// * `Ok(RefreshTokenRecord)` - The saved record
    /// * `Err(DomainError::Token(TokenError::DuplicateTokenId))` - A record
    ///   with the same `jti` already exists
    async fn create(&self, record: RefreshTokenRecord) -> DomainResult<RefreshTokenRecord>;

    /// Find a refresh token record by its token id
    async fn find_by_token_id(&self, jti: Uuid) -> DomainResult<Option<RefreshTokenRecord>>;

    /// Conditionally revoke a single record
    ///
    /// # Returns
    /// * `Ok(true)` - This call transitioned the row to revoked
    /// * `Ok(false)` - The row was missing or already revoked (no-op)
    async fn revoke_one(&self, jti: Uuid, reason: &str) -> DomainResult<bool>;

    /// Revoke every non-revoked record belonging to a user
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of records affected
    async fn revoke_all_for_user(&self, user_id: Uuid, reason: &str) -> DomainResult<usize>;

    /// Revoke every non-revoked record in a token family
    ///
    /// A no-op when `family` is empty.
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of records affected
    async fn revoke_family(&self, user_id: Uuid, family: &str, reason: &str)
        -> DomainResult<usize>;

    /// List active (non-revoked, non-expired) records for a user, newest first
    async fn list_active_for_user(&self, user_id: Uuid) -> DomainResult<Vec<RefreshTokenRecord>>;

    /// Hard-delete every record past its expiry, regardless of revoked flag
    ///
    /// Garbage collection only; active queries already ignore expired rows.
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of records deleted
    async fn delete_expired(&self) -> DomainResult<usize>;
}
