use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::user::models::CreateUserCommand;
use crate::domain::user::models::CredentialRecord;
use crate::domain::user::models::Identity;
use crate::domain::user::models::UserId;
use crate::domain::user::models::UserProfile;
use crate::user::errors::UserError;
use crate::user::ports::CredentialStore;
use crate::user::ports::UserDirectory;

/// Domain service implementation for the local user directory.
///
/// Concrete implementation of UserDirectory over a credential store.
pub struct UserService<CS>
where
    CS: CredentialStore,
{
    store: Arc<CS>,
    password_hasher: auth::PasswordHasher,
}

impl<CS> UserService<CS>
where
    CS: CredentialStore,
{
    /// Create a new user service with injected dependencies.
    ///
    /// # Arguments
    /// * `store` - Credential persistence implementation
    /// * `password_hasher` - Hasher applied to new passwords
    pub fn new(store: Arc<CS>, password_hasher: auth::PasswordHasher) -> Self {
        Self {
            store,
            password_hasher,
        }
    }

    /// Look up the credential record for `identity`.
    pub async fn find_by_identity(
        &self,
        identity: &Identity,
    ) -> Result<Option<CredentialRecord>, UserError> {
        self.store.find_by_identity(identity).await
    }

    async fn hash_password(&self, password: String) -> Result<String, UserError> {
        let hasher = self.password_hasher.clone();

        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| UserError::Unknown(format!("Hashing task failed: {}", e)))?
            .map_err(|e| UserError::Password(e.to_string()))
    }
}

#[async_trait]
impl<CS> UserDirectory for UserService<CS>
where
    CS: CredentialStore,
{
    async fn create_user(&self, command: CreateUserCommand) -> Result<UserProfile, UserError> {
        // Fast path only: the store's uniqueness guarantee decides races.
        if self
            .store
            .find_by_identity(&command.identity)
            .await?
            .is_some()
        {
            return Err(UserError::DuplicateIdentity(
                command.identity.as_str().to_string(),
            ));
        }

        let password_hash = self.hash_password(command.password).await?;

        let record = CredentialRecord {
            id: UserId::new(),
            identity: command.identity,
            password_hash,
            role: command.role,
            created_at: Utc::now(),
        };

        let created = self.store.create(record).await?;
        tracing::info!(user_id = %created.id, role = %created.role, "User created");

        Ok(UserProfile::from(&created))
    }

    async fn list_users(&self) -> Result<Vec<UserProfile>, UserError> {
        let records = self.store.list_all().await?;
        Ok(records.iter().map(UserProfile::from).collect())
    }
}
