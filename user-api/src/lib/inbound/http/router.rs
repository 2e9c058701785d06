use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::get;
use axum::routing::post;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::auth_config::auth_config;
use super::handlers::auth_config::AuthSummary;
use super::handlers::create_user::create_user;
use super::handlers::hello::hello;
use super::handlers::list_users::list_users;
use super::handlers::login::login;
use super::handlers::ApiError;
use super::middleware::authenticate as auth_middleware;
use super::middleware::expose_error_detail;
use crate::domain::auth::service::AuthService;
use crate::domain::user::ports::UserDirectory;

#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub user_directory: Arc<dyn UserDirectory>,
    pub auth_summary: AuthSummary,
    /// Attach the cause of 500 responses to their body (never in production).
    pub expose_error_details: bool,
}

pub fn create_router(state: AppState) -> Router {
    let require_auth = middleware::from_fn_with_state(state.clone(), auth_middleware);

    // Listing is protected, registration is public; the layer only wraps
    // the methods registered before it.
    let users = get(list_users)
        .route_layer(require_auth)
        .post(create_user);

    let routes = Router::new()
        .route("/", get(hello))
        .route("/v1", get(hello))
        .route("/auth/login", post(login))
        .route("/v1/auth/login", post(login))
        .route("/v2/auth/login", post(login))
        .route("/auth/config", get(auth_config))
        .route("/v1/auth/config", get(auth_config))
        .route("/users", users.clone())
        .route("/v1/users", users)
        .fallback(not_found);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            // Headers stay out of the span: they carry bearer tokens.
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    routes
        .layer(middleware::map_response_with_state(
            state.clone(),
            expose_error_detail,
        ))
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn not_found() -> ApiError {
    ApiError::NotFound("Not found".to_string())
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use mockall::mock;
    use serde_json::Map;
    use tower::ServiceExt;

    use super::*;
    use crate::domain::auth::errors::AuthError;
    use crate::domain::auth::models::AuthResult;
    use crate::domain::auth::models::AuthenticatedIdentity;
    use crate::domain::auth::models::Issuance;
    use crate::domain::auth::ports::AuthStrategy;
    use crate::domain::user::models::CreateUserCommand;
    use crate::domain::user::models::Role;
    use crate::domain::user::models::UserProfile;
    use crate::user::errors::UserError;

    mock! {
        pub TestStrategy {}

        #[async_trait]
        impl AuthStrategy for TestStrategy {
            async fn issue(&self, username: &str, password: &str) -> Result<Issuance, AuthError>;
            async fn verify(&self, token: &str) -> Result<AuthResult, AuthError>;
        }
    }

    mock! {
        pub TestDirectory {}

        #[async_trait]
        impl UserDirectory for TestDirectory {
            async fn create_user(&self, command: CreateUserCommand) -> Result<UserProfile, UserError>;
            async fn list_users(&self) -> Result<Vec<UserProfile>, UserError>;
        }
    }

    fn router(strategy: MockTestStrategy, directory: MockTestDirectory, expose: bool) -> Router {
        create_router(AppState {
            auth_service: AuthService::new(Arc::new(strategy)),
            user_directory: Arc::new(directory),
            auth_summary: AuthSummary::local(),
            expose_error_details: expose,
        })
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn profile(username: &str) -> UserProfile {
        UserProfile {
            id: "00000000-0000-0000-0000-000000000001".to_string(),
            username: username.to_string(),
            email: None,
            role: Role::User,
            created_at: None,
        }
    }

    #[tokio::test]
    async fn test_listing_requires_header_before_strategy() {
        let mut strategy = MockTestStrategy::new();
        strategy.expect_verify().never();
        let mut directory = MockTestDirectory::new();
        directory.expect_list_users().never();

        let request = Request::get("/users").body(Body::empty()).unwrap();
        let (status, body) = send(router(strategy, directory, true), request).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "No authorization header provided");
    }

    #[tokio::test]
    async fn test_listing_with_verified_token() {
        let mut strategy = MockTestStrategy::new();
        strategy
            .expect_verify()
            .withf(|token| token == "good-token")
            .times(1)
            .returning(|_| {
                Ok(AuthResult::Authenticated(AuthenticatedIdentity {
                    subject_id: "subject-1".to_string(),
                    username: Some("alice".to_string()),
                    claims: Map::new(),
                }))
            });
        let mut directory = MockTestDirectory::new();
        directory
            .expect_list_users()
            .times(1)
            .returning(|| Ok(vec![profile("alice")]));

        let request = Request::get("/v1/users")
            .header("authorization", "bearer good-token")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(router(strategy, directory, true), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["users"][0]["username"], "alice");
    }

    #[tokio::test]
    async fn test_registration_skips_authentication() {
        let mut strategy = MockTestStrategy::new();
        strategy.expect_verify().never();
        let mut directory = MockTestDirectory::new();
        directory
            .expect_create_user()
            .withf(|command| command.identity.as_str() == "alice")
            .times(1)
            .returning(|_| Ok(profile("alice")));

        let request = Request::post("/users")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"username":"Alice","password":"pw"}"#))
            .unwrap();
        let (status, body) = send(router(strategy, directory, true), request).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["user"]["username"], "alice");
    }

    #[tokio::test]
    async fn test_key_fetch_failure_is_server_error() {
        let mut strategy = MockTestStrategy::new();
        strategy
            .expect_verify()
            .returning(|_| Err(AuthError::Upstream("jwks unreachable".to_string())));

        let request = Request::get("/users")
            .header("authorization", "Bearer some-token")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(router(strategy, MockTestDirectory::new(), false), request).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, serde_json::json!({ "message": "Internal server error" }));
    }

    #[tokio::test]
    async fn test_unknown_method_on_users() {
        let request = Request::delete("/users").body(Body::empty()).unwrap();
        let response = router(MockTestStrategy::new(), MockTestDirectory::new(), true)
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
