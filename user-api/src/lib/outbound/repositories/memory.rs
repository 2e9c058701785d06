use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::user::models::CredentialRecord;
use crate::domain::user::models::Identity;
use crate::domain::user::ports::CredentialStore;
use crate::user::errors::UserError;

/// Process-local credential store.
///
/// The duplicate check and the insert happen under one write lock, which
/// gives the same uniqueness guarantee as a unique index.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    records: RwLock<HashMap<Identity, CredentialRecord>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn create(&self, record: CredentialRecord) -> Result<CredentialRecord, UserError> {
        let mut records = self.records.write().await;

        if records.contains_key(&record.identity) {
            return Err(UserError::DuplicateIdentity(
                record.identity.as_str().to_string(),
            ));
        }
        records.insert(record.identity.clone(), record.clone());

        Ok(record)
    }

    async fn find_by_identity(
        &self,
        identity: &Identity,
    ) -> Result<Option<CredentialRecord>, UserError> {
        Ok(self.records.read().await.get(identity).cloned())
    }

    async fn list_all(&self) -> Result<Vec<CredentialRecord>, UserError> {
        let mut records: Vec<CredentialRecord> =
            self.records.read().await.values().cloned().collect();
        records.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.identity.as_str().cmp(b.identity.as_str()))
        });

        Ok(records)
    }
}
