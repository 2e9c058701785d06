use std::sync::Arc;

use async_trait::async_trait;
use auth::AuthenticationError;
use auth::Authenticator;
use auth::Claims;
use chrono::Duration;

use crate::domain::auth::errors::AuthError;
use crate::domain::auth::errors::CredentialFailure;
use crate::domain::auth::models::AuthFailure;
use crate::domain::auth::models::AuthResult;
use crate::domain::auth::models::AuthenticatedIdentity;
use crate::domain::auth::models::Issuance;
use crate::domain::auth::models::SessionUser;
use crate::domain::auth::models::TokenBundle;
use crate::domain::auth::ports::AuthStrategy;
use crate::domain::user::models::Identity;
use crate::domain::user::ports::CredentialStore;

/// Issues and verifies HS256 tokens signed with the configured secret.
pub struct LocalAuthStrategy<CS>
where
    CS: CredentialStore,
{
    store: Arc<CS>,
    authenticator: Arc<Authenticator>,
    token_lifetime: Duration,
}

impl<CS> LocalAuthStrategy<CS>
where
    CS: CredentialStore,
{
    /// # Arguments
    /// * `store` - Credential records looked up on login
    /// * `authenticator` - Password verifier and token signer
    /// * `token_lifetime` - Validity of issued tokens
    pub fn new(store: Arc<CS>, authenticator: Arc<Authenticator>, token_lifetime: Duration) -> Self {
        Self {
            store,
            authenticator,
            token_lifetime,
        }
    }
}

#[async_trait]
impl<CS> AuthStrategy for LocalAuthStrategy<CS>
where
    CS: CredentialStore,
{
    async fn issue(&self, username: &str, password: &str) -> Result<Issuance, AuthError> {
        // An identity that cannot be normalised cannot have been registered.
        let identity = Identity::new(username)
            .map_err(|_| AuthError::InvalidCredentials(CredentialFailure::UserNotFound))?;

        let record = self
            .store
            .find_by_identity(&identity)
            .await
            .map_err(|e| AuthError::Upstream(e.to_string()))?
            .ok_or(AuthError::InvalidCredentials(CredentialFailure::UserNotFound))?;

        let claims = Claims::for_user(
            record.id,
            record.identity.as_str().to_string(),
            self.token_lifetime,
        )
        .with_extra("role", record.role.as_str());

        let authenticator = Arc::clone(&self.authenticator);
        let password = password.to_string();
        let stored_hash = record.password_hash.clone();

        let result = tokio::task::spawn_blocking(move || {
            authenticator.authenticate(&password, &stored_hash, &claims)
        })
        .await
        .map_err(|e| AuthError::Internal(format!("Verification task failed: {}", e)))?
        .map_err(|e| match e {
            AuthenticationError::InvalidCredentials => {
                AuthError::InvalidCredentials(CredentialFailure::IncorrectPassword)
            }
            other => AuthError::Internal(other.to_string()),
        })?;

        tracing::info!(user_id = %record.id, "Issued local token");

        Ok(Issuance {
            tokens: TokenBundle::Signed {
                token: result.access_token,
            },
            expires_in: result.expires_in,
            user: SessionUser {
                id: record.id.to_string(),
                username: record.identity.as_str().to_string(),
                email: record.identity.email().map(str::to_string),
                role: Some(record.role),
            },
        })
    }

    async fn verify(&self, token: &str) -> Result<AuthResult, AuthError> {
        let claims = match self.authenticator.validate_token(token) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::debug!(error = %e, "Local token rejected");
                return Ok(AuthResult::Unauthenticated(AuthFailure::InvalidToken));
            }
        };

        let Some(subject_id) = claims.sub.clone() else {
            return Ok(AuthResult::Unauthenticated(AuthFailure::InvalidToken));
        };

        let claims_map = match serde_json::to_value(&claims) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        };

        Ok(AuthResult::Authenticated(AuthenticatedIdentity {
            subject_id,
            username: claims.username(),
            claims: claims_map,
        }))
    }
}
