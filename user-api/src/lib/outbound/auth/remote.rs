use std::sync::Arc;

use async_trait::async_trait;
use auth::RemoteTokenError;
use auth::RemoteTokenVerifier;

use crate::domain::auth::errors::AuthError;
use crate::domain::auth::errors::CredentialFailure;
use crate::domain::auth::models::AuthFailure;
use crate::domain::auth::models::AuthResult;
use crate::domain::auth::models::AuthenticatedIdentity;
use crate::domain::auth::models::Issuance;
use crate::domain::auth::models::SessionUser;
use crate::domain::auth::models::TokenBundle;
use crate::domain::auth::ports::AuthStrategy;
use crate::domain::identity_provider::errors::IdentityProviderError;
use crate::domain::identity_provider::models::EMAIL_ATTRIBUTE;
use crate::domain::identity_provider::models::ROLE_ATTRIBUTE;
use crate::domain::identity_provider::ports::IdentityProvider;
use crate::domain::user::models::Identity;

/// Delegates login to the identity provider and verifies the tokens it
/// issues against its published signing keys.
pub struct RemoteAuthStrategy<IP>
where
    IP: IdentityProvider,
{
    provider: Arc<IP>,
    verifier: Arc<RemoteTokenVerifier>,
}

impl<IP> RemoteAuthStrategy<IP>
where
    IP: IdentityProvider,
{
    pub fn new(provider: Arc<IP>, verifier: Arc<RemoteTokenVerifier>) -> Self {
        Self { provider, verifier }
    }

    async fn session_user(&self, username: &str) -> SessionUser {
        match self.provider.admin_get_user(username).await {
            Ok(user) => SessionUser {
                id: user.subject().to_string(),
                username: user.username.clone(),
                email: user.attribute(EMAIL_ATTRIBUTE).map(str::to_string),
                role: user.attribute(ROLE_ATTRIBUTE).and_then(|r| r.parse().ok()),
            },
            Err(e) => {
                tracing::warn!(error = %e, "Could not load user attributes after login");
                SessionUser {
                    id: username.to_string(),
                    username: username.to_string(),
                    email: None,
                    role: None,
                }
            }
        }
    }
}

fn credential_error(error: IdentityProviderError) -> AuthError {
    match error {
        IdentityProviderError::UserNotFound => {
            AuthError::InvalidCredentials(CredentialFailure::UserNotFound)
        }
        IdentityProviderError::NotAuthorized(_) => {
            AuthError::InvalidCredentials(CredentialFailure::IncorrectPassword)
        }
        IdentityProviderError::UserNotConfirmed => {
            AuthError::InvalidCredentials(CredentialFailure::UserNotConfirmed)
        }
        other => AuthError::Upstream(other.to_string()),
    }
}

#[async_trait]
impl<IP> AuthStrategy for RemoteAuthStrategy<IP>
where
    IP: IdentityProvider,
{
    async fn issue(&self, username: &str, password: &str) -> Result<Issuance, AuthError> {
        // Accounts are registered under the normalised identity.
        let identity = Identity::new(username)
            .map_err(|_| AuthError::InvalidCredentials(CredentialFailure::UserNotFound))?;

        let tokens = self
            .provider
            .admin_initiate_auth(identity.as_str(), password)
            .await
            .map_err(credential_error)?;

        let user = self.session_user(identity.as_str()).await;
        tracing::info!(user_id = %user.id, "Issued provider tokens");

        Ok(Issuance {
            expires_in: tokens.expires_in,
            tokens: TokenBundle::Provider {
                access_token: tokens.access_token,
                id_token: tokens.id_token,
                refresh_token: tokens.refresh_token,
                token_type: tokens.token_type,
            },
            user,
        })
    }

    async fn verify(&self, token: &str) -> Result<AuthResult, AuthError> {
        match self.verifier.verify(token).await {
            Ok(claims) => {
                let username = claims.username.clone().or_else(|| claims.email.clone());
                Ok(AuthResult::Authenticated(AuthenticatedIdentity {
                    subject_id: claims.sub.clone(),
                    username,
                    claims: claims.to_map(),
                }))
            }
            Err(RemoteTokenError::KeyUnavailable(e)) if e.is_upstream() => {
                tracing::error!(error = %e, "Signing keys unavailable");
                Err(AuthError::Upstream(e.to_string()))
            }
            Err(e) => {
                tracing::debug!(error = %e, "Provider token rejected");
                Ok(AuthResult::Unauthenticated(AuthFailure::InvalidToken))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use auth::testutil::access_token_claims;
    use auth::testutil::key_set;
    use auth::testutil::primary_jwk;
    use auth::testutil::sign_rs256;
    use auth::testutil::test_issuer;
    use auth::testutil::StaticKeySetFetcher;
    use auth::testutil::PRIMARY_KID;
    use auth::testutil::PRIMARY_PRIVATE_KEY_PEM;
    use auth::testutil::TEST_CLIENT_ID;
    use auth::SigningKeyCache;
    use mockall::mock;

    use super::*;
    use crate::domain::identity_provider::models::NewProviderUser;
    use crate::domain::identity_provider::models::ProviderTokens;
    use crate::domain::identity_provider::models::ProviderUser;
    use crate::domain::user::models::Role;

    mock! {
        pub TestProvider {}

        #[async_trait]
        impl IdentityProvider for TestProvider {
            async fn admin_initiate_auth(&self, username: &str, password: &str) -> Result<ProviderTokens, IdentityProviderError>;
            async fn admin_get_user(&self, username: &str) -> Result<ProviderUser, IdentityProviderError>;
            async fn admin_create_user(&self, user: NewProviderUser) -> Result<ProviderUser, IdentityProviderError>;
            async fn admin_set_user_password(&self, username: &str, password: &str, permanent: bool) -> Result<(), IdentityProviderError>;
            async fn list_users(&self) -> Result<Vec<ProviderUser>, IdentityProviderError>;
        }
    }

    fn verifier(fetcher: Arc<StaticKeySetFetcher>) -> Arc<RemoteTokenVerifier> {
        Arc::new(RemoteTokenVerifier::new(
            SigningKeyCache::new(fetcher),
            test_issuer(),
            TEST_CLIENT_ID,
        ))
    }

    fn strategy(provider: MockTestProvider) -> RemoteAuthStrategy<MockTestProvider> {
        let fetcher = Arc::new(StaticKeySetFetcher::new(key_set(vec![primary_jwk()])));
        RemoteAuthStrategy::new(Arc::new(provider), verifier(fetcher))
    }

    fn provider_tokens() -> ProviderTokens {
        ProviderTokens {
            access_token: "access".to_string(),
            id_token: Some("id".to_string()),
            refresh_token: Some("refresh".to_string()),
            token_type: "Bearer".to_string(),
            expires_in: 3600,
        }
    }

    fn provider_user(username: &str) -> ProviderUser {
        let mut attributes = HashMap::new();
        attributes.insert("sub".to_string(), "sub-123".to_string());
        attributes.insert("email".to_string(), "alice@example.com".to_string());
        attributes.insert("custom:role".to_string(), "admin".to_string());
        ProviderUser {
            username: username.to_string(),
            attributes,
            created_at: None,
            enabled: true,
            status: Some("CONFIRMED".to_string()),
        }
    }

    #[tokio::test]
    async fn test_issue_passes_provider_tokens_through() {
        let mut provider = MockTestProvider::new();
        provider
            .expect_admin_initiate_auth()
            .times(1)
            .returning(|_, _| Ok(provider_tokens()));
        provider
            .expect_admin_get_user()
            .times(1)
            .returning(|username| Ok(provider_user(username)));

        let issuance = strategy(provider).issue("alice", "Secret123!").await.unwrap();

        assert_eq!(issuance.expires_in, 3600);
        assert_eq!(
            issuance.tokens,
            TokenBundle::Provider {
                access_token: "access".to_string(),
                id_token: Some("id".to_string()),
                refresh_token: Some("refresh".to_string()),
                token_type: "Bearer".to_string(),
            }
        );
        assert_eq!(issuance.user.id, "sub-123");
        assert_eq!(issuance.user.email.as_deref(), Some("alice@example.com"));
        assert_eq!(issuance.user.role, Some(Role::Admin));
    }

    #[tokio::test]
    async fn test_issue_normalises_username() {
        let mut provider = MockTestProvider::new();
        provider
            .expect_admin_initiate_auth()
            .withf(|username, _| username == "alice@example.com")
            .times(1)
            .returning(|_, _| Ok(provider_tokens()));
        provider
            .expect_admin_get_user()
            .withf(|username| username == "alice@example.com")
            .times(1)
            .returning(|username| Ok(provider_user(username)));

        let issuance = strategy(provider)
            .issue("  Alice@Example.com ", "Secret123!")
            .await
            .unwrap();

        assert_eq!(issuance.user.username, "alice@example.com");
    }

    #[tokio::test]
    async fn test_issue_rejects_unusable_username_without_provider_call() {
        let mut provider = MockTestProvider::new();
        provider.expect_admin_initiate_auth().times(0);

        let error = strategy(provider).issue("a b", "pw").await.unwrap_err();

        assert!(matches!(
            error,
            AuthError::InvalidCredentials(CredentialFailure::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn test_issue_survives_attribute_lookup_failure() {
        let mut provider = MockTestProvider::new();
        provider
            .expect_admin_initiate_auth()
            .times(1)
            .returning(|_, _| Ok(provider_tokens()));
        provider
            .expect_admin_get_user()
            .times(1)
            .returning(|_| Err(IdentityProviderError::Transport("reset".to_string())));

        let issuance = strategy(provider).issue("alice", "Secret123!").await.unwrap();

        assert_eq!(issuance.user.username, "alice");
        assert_eq!(issuance.user.email, None);
    }

    #[tokio::test]
    async fn test_issue_maps_provider_errors() {
        let cases = vec![
            (
                IdentityProviderError::UserNotFound,
                "User not found",
            ),
            (
                IdentityProviderError::NotAuthorized("Incorrect username or password.".to_string()),
                "Incorrect username or password",
            ),
            (
                IdentityProviderError::UserNotConfirmed,
                "User is not confirmed",
            ),
        ];

        for (provider_error, message) in cases {
            let mut provider = MockTestProvider::new();
            provider
                .expect_admin_initiate_auth()
                .times(1)
                .returning(move |_, _| Err(provider_error.clone()));
            provider.expect_admin_get_user().times(0);

            let error = strategy(provider).issue("alice", "pw").await.unwrap_err();
            assert!(matches!(error, AuthError::InvalidCredentials(_)));
            assert_eq!(error.to_string(), message);
        }
    }

    #[tokio::test]
    async fn test_issue_timeout_is_upstream() {
        let mut provider = MockTestProvider::new();
        provider
            .expect_admin_initiate_auth()
            .times(1)
            .returning(|_, _| Err(IdentityProviderError::Timeout(5000)));

        let error = strategy(provider).issue("alice", "pw").await.unwrap_err();
        assert!(matches!(error, AuthError::Upstream(_)));
    }

    #[tokio::test]
    async fn test_verify_valid_token() {
        let token = sign_rs256(
            &access_token_claims("sub-123", "alice@example.com"),
            PRIMARY_KID,
            PRIMARY_PRIVATE_KEY_PEM,
        );

        let result = strategy(MockTestProvider::new())
            .verify(&token)
            .await
            .unwrap();

        assert_eq!(result.subject_id(), Some("sub-123"));
        assert_eq!(result.claims().unwrap()["token_use"], "access");
    }

    #[tokio::test]
    async fn test_verify_username_falls_back_to_email() {
        let mut claims = access_token_claims("sub-123", "ignored");
        claims.as_object_mut().unwrap().remove("username");
        claims["email"] = serde_json::json!("alice@example.com");
        let token = sign_rs256(&claims, PRIMARY_KID, PRIMARY_PRIVATE_KEY_PEM);

        let result = strategy(MockTestProvider::new())
            .verify(&token)
            .await
            .unwrap();

        let AuthResult::Authenticated(identity) = result else {
            panic!("expected an authenticated result");
        };
        assert_eq!(identity.username.as_deref(), Some("alice@example.com"));
    }

    #[tokio::test]
    async fn test_verify_defects_are_generic() {
        let mut expired = access_token_claims("sub-123", "alice");
        expired["exp"] = serde_json::json!(chrono::Utc::now().timestamp() - 1);
        let mut foreign = access_token_claims("sub-123", "alice");
        foreign["client_id"] = serde_json::json!("someone-else");

        let strategy = strategy(MockTestProvider::new());
        for claims in [expired, foreign] {
            let token = sign_rs256(&claims, PRIMARY_KID, PRIMARY_PRIVATE_KEY_PEM);
            let result = strategy.verify(&token).await.unwrap();
            assert_eq!(result.failure_reason(), Some(AuthFailure::InvalidToken));
        }

        let result = strategy.verify("not-a-jwt").await.unwrap();
        assert_eq!(result.failure_reason(), Some(AuthFailure::InvalidToken));
    }

    #[tokio::test]
    async fn test_verify_unknown_kid_is_invalid_token() {
        let token = sign_rs256(
            &access_token_claims("sub-123", "alice"),
            "never-published",
            PRIMARY_PRIVATE_KEY_PEM,
        );

        let result = strategy(MockTestProvider::new())
            .verify(&token)
            .await
            .unwrap();
        assert_eq!(result.failure_reason(), Some(AuthFailure::InvalidToken));
    }

    #[tokio::test]
    async fn test_verify_key_fetch_failure_is_upstream() {
        let fetcher = Arc::new(StaticKeySetFetcher::new(key_set(vec![primary_jwk()])));
        fetcher.fail_next(true);
        let strategy = RemoteAuthStrategy::new(
            Arc::new(MockTestProvider::new()),
            verifier(fetcher),
        );

        let token = sign_rs256(
            &access_token_claims("sub-123", "alice"),
            PRIMARY_KID,
            PRIMARY_PRIVATE_KEY_PEM,
        );

        let result = strategy.verify(&token).await;
        assert!(matches!(result, Err(AuthError::Upstream(_))));
    }
}
