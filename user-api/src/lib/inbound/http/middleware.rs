use axum::extract::Request;
use axum::extract::State;
use axum::http;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Json;
use axum::response::Response;
use serde_json::Map;
use serde_json::Value;

use crate::domain::auth::models::AuthFailure;
use crate::domain::auth::models::AuthResult;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::handlers::ApiErrorDataWithDetail;
use crate::inbound::http::handlers::ErrorDetail;
use crate::inbound::http::handlers::INTERNAL_ERROR_MESSAGE;
use crate::inbound::http::router::AppState;

/// Extension type to store the authenticated caller in request extensions
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub subject_id: String,
    pub username: Option<String>,
    pub claims: Map<String, Value>,
}

/// Middleware that authenticates the bearer token and adds the caller to request extensions
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = match req.headers().get(http::header::AUTHORIZATION) {
        // A value that is not visible ASCII cannot be a token.
        Some(value) => Some(value.to_str().unwrap_or_default()),
        None => None,
    };

    match state.auth_service.authenticate(header).await? {
        AuthResult::Authenticated(identity) => {
            req.extensions_mut().insert(AuthenticatedUser {
                subject_id: identity.subject_id,
                username: identity.username,
                claims: identity.claims,
            });
            Ok(next.run(req).await)
        }
        AuthResult::Unauthenticated(reason) => Err(unauthorized(reason)),
    }
}

fn unauthorized(reason: AuthFailure) -> ApiError {
    ApiError::Unauthorized(reason.message().to_string())
}

/// Rewrite 500 bodies to carry their cause when the deployment allows it.
pub async fn expose_error_detail(State(state): State<AppState>, response: Response) -> Response {
    if !state.expose_error_details {
        return response;
    }
    let Some(ErrorDetail(detail)) = response.extensions().get::<ErrorDetail>().cloned() else {
        return response;
    };

    let status = response.status();
    let (mut parts, _) = response.into_parts();
    parts.headers.remove(http::header::CONTENT_LENGTH);

    let body = Json(ApiErrorDataWithDetail {
        message: INTERNAL_ERROR_MESSAGE.to_string(),
        error: detail,
    });
    (status, parts.headers, body).into_response()
}
