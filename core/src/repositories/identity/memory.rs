//! In-memory identity repository for tests and local development

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::identity::Identity;
use crate::errors::DomainResult;

use super::r#trait::IdentityRepository;

/// In-memory identity repository keyed by user id
#[derive(Clone, Default)]
pub struct InMemoryIdentityRepository {
    identities: Arc<RwLock<HashMap<Uuid, Identity>>>,
}

impl InMemoryIdentityRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an identity
    pub async fn insert(&self, identity: Identity) {
        self.identities.write().await.insert(identity.id, identity);
    }

    /// Remove an identity, simulating account deletion
    pub async fn remove(&self, subject: Uuid) {
        self.identities.write().await.remove(&subject);
    }
}

#[async_trait]
impl IdentityRepository for InMemoryIdentityRepository {
    async fn load_identity(&self, subject: Uuid) -> DomainResult<Option<Identity>> {
        let identities = self.identities.read().await;
        Ok(identities.get(&subject).cloned())
    }
}
