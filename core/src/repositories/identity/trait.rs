//! Identity repository trait bridging to the user-management collaborator.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::identity::Identity;
use crate::errors::DomainResult;

/// Read-only access to identities referenced by token subjects
///
/// User management is owned elsewhere; the session core only resolves a
/// verified subject into the claims-level identity view. A token can be
/// structurally valid yet reference a since-deleted identity, so callers
/// must branch on `None`.
#[async_trait]
pub trait IdentityRepository: Send + Sync {
    /// Load the identity for a verified subject
    ///
    /// # Returns
    /// * `Ok(Some(Identity))` - Identity found
    /// * `Ok(None)` - No identity exists for the subject
    /// * `Err(DomainError)` - Lookup failed
    async fn load_identity(&self, subject: Uuid) -> DomainResult<Option<Identity>>;
}
