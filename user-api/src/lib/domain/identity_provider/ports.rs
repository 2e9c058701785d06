use async_trait::async_trait;

use crate::domain::identity_provider::errors::IdentityProviderError;
use crate::domain::identity_provider::models::NewProviderUser;
use crate::domain::identity_provider::models::ProviderTokens;
use crate::domain::identity_provider::models::ProviderUser;

/// Admin operations of the hosted user pool.
#[async_trait]
pub trait IdentityProvider: Send + Sync + 'static {
    /// Password authentication on behalf of a user.
    ///
    /// # Errors
    /// * `UserNotFound` / `NotAuthorized` / `UserNotConfirmed` - Credentials refused
    /// * `Timeout` / `Transport` - Provider unreachable
    async fn admin_initiate_auth(
        &self,
        username: &str,
        password: &str,
    ) -> Result<ProviderTokens, IdentityProviderError>;

    /// Fetch one account with its attributes.
    async fn admin_get_user(&self, username: &str) -> Result<ProviderUser, IdentityProviderError>;

    /// Create an account without sending an invitation.
    ///
    /// # Errors
    /// * `UsernameExists` - Account already present
    /// * `InvalidPassword` - Password refused by the pool policy
    async fn admin_create_user(
        &self,
        user: NewProviderUser,
    ) -> Result<ProviderUser, IdentityProviderError>;

    /// Set a password, optionally marking it permanent.
    async fn admin_set_user_password(
        &self,
        username: &str,
        password: &str,
        permanent: bool,
    ) -> Result<(), IdentityProviderError>;

    /// Every account in the pool.
    async fn list_users(&self) -> Result<Vec<ProviderUser>, IdentityProviderError>;
}
