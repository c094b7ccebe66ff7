//! In-memory implementation of TokenStore for tests and local development

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::token::RefreshTokenRecord;
use crate::errors::{DomainResult, TokenError};

use super::r#trait::TokenStore;

/// In-memory token store keyed by `jti`
#[derive(Clone)]
pub struct InMemoryTokenStore {
    records: Arc<RwLock<HashMap<Uuid, RefreshTokenRecord>>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of records currently held, regardless of state
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl Default for InMemoryTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn create(&self, record: RefreshTokenRecord) -> DomainResult<RefreshTokenRecord> {
        let mut records = self.records.write().await;

        if records.contains_key(&record.jti) {
            return Err(TokenError::DuplicateTokenId.into());
        }

        records.insert(record.jti, record.clone());
        Ok(record)
    }

    async fn find_by_token_id(&self, jti: Uuid) -> DomainResult<Option<RefreshTokenRecord>> {
        let records = self.records.read().await;
        Ok(records.get(&jti).cloned())
    }

    async fn revoke_one(&self, jti: Uuid, reason: &str) -> DomainResult<bool> {
        let mut records = self.records.write().await;

        match records.get_mut(&jti) {
            Some(record) if !record.revoked => {
                record.revoke(reason, Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke_all_for_user(&self, user_id: Uuid, reason: &str) -> DomainResult<usize> {
        let mut records = self.records.write().await;
        let now = Utc::now();
        let mut count = 0;

        for record in records.values_mut() {
            if record.user_id == user_id && !record.revoked {
                record.revoke(reason, now);
                count += 1;
            }
        }

        Ok(count)
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

        let mut records = self.records.write().await;
        let now = Utc::now();
        let mut count = 0;

        for record in records.values_mut() {
            if record.user_id == user_id && record.family == family && !record.revoked {
                record.revoke(reason, now);
                count += 1;
            }
        }

        Ok(count)
    }

    async fn list_active_for_user(&self, user_id: Uuid) -> DomainResult<Vec<RefreshTokenRecord>> {
        let records = self.records.read().await;
        let now = Utc::now();

        let mut active: Vec<RefreshTokenRecord> = records
            .values()
            .filter(|r| r.user_id == user_id && r.is_active_at(now))
            .cloned()
            .collect();
        active.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(active)
    }

    async fn delete_expired(&self) -> DomainResult<usize> {
        let mut records = self.records.write().await;
        let now = Utc::now();
        let initial_count = records.len();

        records.retain(|_, record| !record.is_expired_at(now));

        Ok(initial_count - records.len())
    }
}
