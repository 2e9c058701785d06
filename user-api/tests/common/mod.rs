#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use auth::testutil::access_token_claims;
use auth::testutil::key_set;
use auth::testutil::primary_jwk;
use auth::testutil::sign_rs256;
use auth::testutil::test_issuer;
use auth::testutil::PRIMARY_KID;
use auth::testutil::PRIMARY_PRIVATE_KEY_PEM;
use auth::testutil::TEST_CLIENT_ID;
use auth::testutil::TEST_REGION;
use auth::testutil::TEST_USER_POOL_ID;
use auth::Authenticator;
use auth::HttpKeySetFetcher;
use auth::JwtHandler;
use auth::PasswordHasher;
use auth::RemoteTokenVerifier;
use auth::SigningKeyCache;
use axum::routing::get;
use axum::Json;
use axum::Router;
use chrono::Duration as ChronoDuration;
use chrono::Utc;
use tokio::sync::Mutex;
use user_api::domain::auth::service::AuthService;
use user_api::domain::identity_provider::errors::IdentityProviderError;
use user_api::domain::identity_provider::models::NewProviderUser;
use user_api::domain::identity_provider::models::ProviderTokens;
use user_api::domain::identity_provider::models::ProviderUser;
use user_api::domain::identity_provider::ports::IdentityProvider;
use user_api::domain::user::errors::UserError;
use user_api::domain::user::models::CreateUserCommand;
use user_api::domain::user::models::UserProfile;
use user_api::domain::user::ports::UserDirectory;
use user_api::domain::user::service::UserService;
use user_api::inbound::http::handlers::auth_config::AuthSummary;
use user_api::inbound::http::router::create_router;
use user_api::inbound::http::router::AppState;
use user_api::outbound::auth::LocalAuthStrategy;
use user_api::outbound::auth::RemoteAuthStrategy;
use user_api::outbound::identity_provider::RemoteUserDirectory;
use user_api::repositories::InMemoryCredentialStore;

pub const JWT_SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";

/// Test application that spawns a real server
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub api_client: reqwest::Client,
    pub jwt_handler: JwtHandler,
    /// Requests served by the mock key set endpoint (remote mode only).
    pub jwks_hits: Arc<AtomicUsize>,
}

impl TestApp {
    /// Spawn the application in local mode over an in-memory store
    pub async fn spawn() -> Self {
        // Cheap work factor keeps the suite fast; the algorithm is unchanged.
        let hasher = PasswordHasher::with_cost(8192, 1, 1).expect("Invalid test hasher cost");
        let authenticator = Arc::new(Authenticator::with_hasher(JWT_SECRET, hasher.clone()));
        let store = Arc::new(InMemoryCredentialStore::new());

        let strategy = LocalAuthStrategy::new(
            Arc::clone(&store),
            authenticator,
            ChronoDuration::minutes(60),
        );
        let directory = UserService::new(store, hasher);

        Self::serve(
            AppState {
                auth_service: AuthService::new(Arc::new(strategy)),
                user_directory: Arc::new(directory),
                auth_summary: AuthSummary::local(),
                expose_error_details: true,
            },
            Arc::new(AtomicUsize::new(0)),
        )
        .await
    }

    /// Spawn the application in remote mode against a stub identity provider
    /// and a mock key set endpoint
    pub async fn spawn_remote() -> Self {
        let (jwks_url, jwks_hits) = spawn_jwks_server().await;

        let fetcher = Arc::new(
            HttpKeySetFetcher::new(jwks_url, Duration::from_secs(5))
                .expect("Failed to build key set fetcher"),
        );
        let verifier = Arc::new(RemoteTokenVerifier::new(
            SigningKeyCache::new(fetcher),
            test_issuer(),
            TEST_CLIENT_ID,
        ));
        let provider = Arc::new(StubIdentityProvider::default());

        let strategy = RemoteAuthStrategy::new(Arc::clone(&provider), verifier);
        let directory = RemoteUserDirectory::new(provider);

        Self::serve(
            AppState {
                auth_service: AuthService::new(Arc::new(strategy)),
                user_directory: Arc::new(directory),
                auth_summary: AuthSummary::remote(TEST_REGION, TEST_USER_POOL_ID, TEST_CLIENT_ID),
                expose_error_details: true,
            },
            jwks_hits,
        )
        .await
    }

    /// Spawn the application with a directory whose backend is down
    pub async fn spawn_with_failing_directory(expose_error_details: bool) -> Self {
        let hasher = PasswordHasher::with_cost(8192, 1, 1).expect("Invalid test hasher cost");
        let authenticator = Arc::new(Authenticator::with_hasher(JWT_SECRET, hasher));
        let strategy = LocalAuthStrategy::new(
            Arc::new(InMemoryCredentialStore::new()),
            authenticator,
            ChronoDuration::minutes(60),
        );

        Self::serve(
            AppState {
                auth_service: AuthService::new(Arc::new(strategy)),
                user_directory: Arc::new(FailingDirectory),
                auth_summary: AuthSummary::local(),
                expose_error_details,
            },
            Arc::new(AtomicUsize::new(0)),
        )
        .await
    }

    async fn serve(state: AppState, jwks_hits: Arc<AtomicUsize>) -> Self {
        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let router = create_router(state);

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            port,
            api_client: reqwest::Client::builder()
                .build()
                .expect("Failed to create reqwest client"),
            jwt_handler: JwtHandler::new(JWT_SECRET),
            jwks_hits,
        }
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(format!("{}{}", self.address, path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(format!("{}{}", self.address, path))
    }

    /// Helper to make GET request with Bearer token
    pub fn get_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.get(path).bearer_auth(token)
    }

    /// Register a user and return the response status
    pub async fn create_user(&self, username: &str, password: &str) -> reqwest::StatusCode {
        self.post("/users")
            .json(&serde_json::json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("Failed to execute request")
            .status()
    }

    /// Log in and return the parsed response body
    pub async fn login(&self, username: &str, password: &str) -> (reqwest::StatusCode, serde_json::Value) {
        let response = self
            .post("/auth/login")
            .json(&serde_json::json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("Failed to execute request");
        let status = response.status();
        let body = response.json().await.expect("Failed to parse response");
        (status, body)
    }
}

/// Serve the test key set; returns its URL and a hit counter
async fn spawn_jwks_server() -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);

    let app = Router::new().route(
        "/.well-known/jwks.json",
        get(move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Json(key_set(vec![primary_jwk()]))
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("JWKS server error");
    });

    (format!("http://{}/.well-known/jwks.json", address), hits)
}

struct StubAccount {
    sub: String,
    password: String,
    attributes: HashMap<String, String>,
    permanent_password: bool,
}

/// In-memory user pool that signs access tokens with the test key.
#[derive(Default)]
pub struct StubIdentityProvider {
    accounts: Mutex<HashMap<String, StubAccount>>,
}

impl StubIdentityProvider {
    fn provider_user(username: &str, account: &StubAccount) -> ProviderUser {
        let mut attributes = account.attributes.clone();
        attributes.insert("sub".to_string(), account.sub.clone());
        ProviderUser {
            username: username.to_string(),
            attributes,
            created_at: Some(Utc::now()),
            enabled: true,
            status: Some(
                if account.permanent_password {
                    "CONFIRMED"
                } else {
                    "FORCE_CHANGE_PASSWORD"
                }
                .to_string(),
            ),
        }
    }
}

#[async_trait]
impl IdentityProvider for StubIdentityProvider {
    async fn admin_initiate_auth(
        &self,
        username: &str,
        password: &str,
    ) -> Result<ProviderTokens, IdentityProviderError> {
        let accounts = self.accounts.lock().await;
        let account = accounts
            .get(username)
            .ok_or(IdentityProviderError::UserNotFound)?;
        if account.password != password {
            return Err(IdentityProviderError::NotAuthorized(
                "Incorrect username or password.".to_string(),
            ));
        }

        let access_token = sign_rs256(
            &access_token_claims(&account.sub, username),
            PRIMARY_KID,
            PRIMARY_PRIVATE_KEY_PEM,
        );

        Ok(ProviderTokens {
            access_token,
            id_token: Some("stub-id-token".to_string()),
            refresh_token: Some("stub-refresh-token".to_string()),
            token_type: "Bearer".to_string(),
            expires_in: 3600,
        })
    }

    async fn admin_get_user(&self, username: &str) -> Result<ProviderUser, IdentityProviderError> {
        let accounts = self.accounts.lock().await;
        accounts
            .get(username)
            .map(|account| Self::provider_user(username, account))
            .ok_or(IdentityProviderError::UserNotFound)
    }

    async fn admin_create_user(
        &self,
        user: NewProviderUser,
    ) -> Result<ProviderUser, IdentityProviderError> {
        let mut accounts = self.accounts.lock().await;
        if accounts.contains_key(&user.username) {
            return Err(IdentityProviderError::UsernameExists);
        }

        let account = StubAccount {
            sub: uuid::Uuid::new_v4().to_string(),
            password: user.temporary_password,
            attributes: user.attributes.into_iter().collect(),
            permanent_password: false,
        };
        let created = Self::provider_user(&user.username, &account);
        accounts.insert(user.username, account);

        Ok(created)
    }

    async fn admin_set_user_password(
        &self,
        username: &str,
        password: &str,
        permanent: bool,
    ) -> Result<(), IdentityProviderError> {
        let mut accounts = self.accounts.lock().await;
        let account = accounts
            .get_mut(username)
            .ok_or(IdentityProviderError::UserNotFound)?;
        account.password = password.to_string();
        account.permanent_password = permanent;
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<ProviderUser>, IdentityProviderError> {
        let accounts = self.accounts.lock().await;
        Ok(accounts
            .iter()
            .map(|(username, account)| Self::provider_user(username, account))
            .collect())
    }
}

/// Directory whose backing store is unreachable.
pub struct FailingDirectory;

#[async_trait]
impl UserDirectory for FailingDirectory {
    async fn create_user(&self, _command: CreateUserCommand) -> Result<UserProfile, UserError> {
        Err(UserError::Storage("connection refused".to_string()))
    }

    async fn list_users(&self) -> Result<Vec<UserProfile>, UserError> {
        Err(UserError::Storage("connection refused".to_string()))
    }
}
