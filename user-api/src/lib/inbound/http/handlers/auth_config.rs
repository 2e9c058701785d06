use axum::extract::State;
use axum::http::StatusCode;
use serde::Serialize;

use super::ApiSuccess;
use crate::inbound::http::router::AppState;

/// Public description of the active authentication mode. Never carries secrets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSummary {
    pub mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_pool_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

impl AuthSummary {
    pub fn local() -> Self {
        Self {
            mode: "local".to_string(),
            region: None,
            user_pool_id: None,
            client_id: None,
        }
    }

    pub fn remote(region: &str, user_pool_id: &str, client_id: &str) -> Self {
        Self {
            mode: "remote".to_string(),
            region: Some(region.to_string()),
            user_pool_id: Some(user_pool_id.to_string()),
            client_id: Some(client_id.to_string()),
        }
    }
}

pub async fn auth_config(State(state): State<AppState>) -> ApiSuccess<AuthConfigResponseData> {
    ApiSuccess::new(
        StatusCode::OK,
        AuthConfigResponseData {
            message: "Authentication configuration".to_string(),
            summary: state.auth_summary.clone(),
        },
    )
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthConfigResponseData {
    pub message: String,
    #[serde(flatten)]
    pub summary: AuthSummary,
}
