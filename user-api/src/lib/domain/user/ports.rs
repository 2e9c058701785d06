use async_trait::async_trait;

use crate::domain::user::models::CreateUserCommand;
use crate::domain::user::models::CredentialRecord;
use crate::domain::user::models::Identity;
use crate::domain::user::models::UserProfile;
use crate::user::errors::UserError;

/// Port for user directory operations.
///
/// Implemented over the local credential store or over the remote identity
/// provider; handlers only see this trait.
#[async_trait]
pub trait UserDirectory: Send + Sync + 'static {
    /// Register a new user.
    ///
    /// # Arguments
    /// * `command` - Validated command containing identity, password and role
    ///
    /// # Returns
    /// Profile of the created user (never carries a password field)
    ///
    /// # Errors
    /// * `DuplicateIdentity` - Identity is already registered
    /// * `Storage` / `IdentityProvider` - Backing system failed
    async fn create_user(&self, command: CreateUserCommand) -> Result<UserProfile, UserError>;

    /// List every registered user.
    ///
    /// # Errors
    /// * `Storage` / `IdentityProvider` - Backing system failed
    async fn list_users(&self) -> Result<Vec<UserProfile>, UserError>;
}

/// Persistence port for credential records.
#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    /// Persist a new credential record.
    ///
    /// # Arguments
    /// * `record` - Record with an already hashed password
    ///
    /// # Returns
    /// Persisted record
    ///
    /// # Errors
    /// * `DuplicateIdentity` - Identity already exists; enforced atomically by storage
    /// * `Storage` - Backend failure
    async fn create(&self, record: CredentialRecord) -> Result<CredentialRecord, UserError>;

    /// Look up a record by normalised identity.
    ///
    /// # Returns
    /// Optional record (None if absent)
    ///
    /// # Errors
    /// * `Storage` - Backend failure
    async fn find_by_identity(
        &self,
        identity: &Identity,
    ) -> Result<Option<CredentialRecord>, UserError>;

    /// All records, ordered by creation time then identity.
    ///
    /// # Errors
    /// * `Storage` - Backend failure
    async fn list_all(&self) -> Result<Vec<CredentialRecord>, UserError>;
}
