use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::identity_provider::errors::IdentityProviderError;
use crate::domain::identity_provider::models::NewProviderUser;
use crate::domain::identity_provider::models::ProviderUser;
use crate::domain::identity_provider::models::EMAIL_ATTRIBUTE;
use crate::domain::identity_provider::models::EMAIL_VERIFIED_ATTRIBUTE;
use crate::domain::identity_provider::models::ROLE_ATTRIBUTE;
use crate::domain::identity_provider::ports::IdentityProvider;
use crate::domain::user::models::CreateUserCommand;
use crate::domain::user::models::UserProfile;
use crate::user::errors::UserError;
use crate::user::ports::UserDirectory;

/// User directory backed by the identity provider's user pool.
pub struct RemoteUserDirectory<IP>
where
    IP: IdentityProvider,
{
    provider: Arc<IP>,
}

impl<IP> RemoteUserDirectory<IP>
where
    IP: IdentityProvider,
{
    pub fn new(provider: Arc<IP>) -> Self {
        Self { provider }
    }

    /// Existing account left behind by a registration that never set its
    /// permanent password; any other existing account is a duplicate.
    async fn unfinished_account(&self, username: &str) -> Result<ProviderUser, UserError> {
        let existing = self.provider.admin_get_user(username).await?;
        if existing.awaits_permanent_password() {
            Ok(existing)
        } else {
            Err(IdentityProviderError::UsernameExists.into())
        }
    }
}

impl From<IdentityProviderError> for UserError {
    fn from(error: IdentityProviderError) -> Self {
        match error {
            IdentityProviderError::UsernameExists => {
                UserError::DuplicateIdentity("Username already exists".to_string())
            }
            IdentityProviderError::InvalidPassword(reason) => UserError::InvalidPassword(reason),
            other => UserError::IdentityProvider(other.to_string()),
        }
    }
}

fn profile(user: &ProviderUser) -> UserProfile {
    UserProfile {
        id: user.subject().to_string(),
        username: user.username.clone(),
        email: user.attribute(EMAIL_ATTRIBUTE).map(str::to_string),
        role: user
            .attribute(ROLE_ATTRIBUTE)
            .and_then(|role| role.parse().ok())
            .unwrap_or_default(),
        created_at: user.created_at,
    }
}

#[async_trait]
impl<IP> UserDirectory for RemoteUserDirectory<IP>
where
    IP: IdentityProvider,
{
    async fn create_user(&self, command: CreateUserCommand) -> Result<UserProfile, UserError> {
        let username = command.identity.as_str().to_string();

        let mut attributes = vec![(ROLE_ATTRIBUTE.to_string(), command.role.to_string())];
        if let Some(email) = command.identity.email() {
            attributes.push((EMAIL_ATTRIBUTE.to_string(), email.to_string()));
            attributes.push((EMAIL_VERIFIED_ATTRIBUTE.to_string(), "true".to_string()));
        }

        let created = self
            .provider
            .admin_create_user(NewProviderUser {
                username: username.clone(),
                temporary_password: command.password.clone(),
                attributes,
            })
            .await;

        let (account, resumed) = match created {
            Ok(account) => (account, false),
            Err(IdentityProviderError::UsernameExists) => {
                (self.unfinished_account(&username).await?, true)
            }
            Err(e) => return Err(e.into()),
        };

        // Without a permanent password the account would be stuck in a forced reset.
        if let Err(e) = self
            .provider
            .admin_set_user_password(&username, &command.password, true)
            .await
        {
            tracing::warn!(
                user_id = %account.subject(),
                error = %e,
                "Registration incomplete; account still awaits a permanent password"
            );
            return Err(e.into());
        }

        if resumed {
            tracing::info!(user_id = %account.subject(), "Resumed incomplete registration");
            return Ok(profile(&account));
        }

        tracing::info!(user_id = %account.subject(), "User created in identity provider");

        let mut profile = profile(&account);
        profile.role = command.role;
        Ok(profile)
    }

    async fn list_users(&self) -> Result<Vec<UserProfile>, UserError> {
        let users = self.provider.list_users().await?;
        Ok(users.iter().map(profile).collect())
    }
}
