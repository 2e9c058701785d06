use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use super::required;
use super::ApiError;
use super::ApiSuccess;
use crate::domain::auth::models::Issuance;
use crate::domain::auth::models::SessionUser;
use crate::domain::auth::models::TokenBundle;
use crate::domain::user::models::Role;
use crate::inbound::http::router::AppState;

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<ApiSuccess<LoginResponseData>, ApiError> {
    let Json(body) = payload?;

    let (Some(username), Some(password)) = (required(body.username), required(body.password))
    else {
        return Err(ApiError::BadRequest(
            "Username and password are required".to_string(),
        ));
    };

    let issuance = state.auth_service.login(&username, &password).await?;

    Ok(ApiSuccess::new(StatusCode::OK, issuance.into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponseData {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    pub expires_in: i64,
    pub user: SessionUserData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionUserData {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl From<SessionUser> for SessionUserData {
    fn from(user: SessionUser) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
        }
    }
}

impl From<Issuance> for LoginResponseData {
    fn from(issuance: Issuance) -> Self {
        let mut data = Self {
            message: "Login successful".to_string(),
            token: None,
            access_token: None,
            id_token: None,
            refresh_token: None,
            token_type: None,
            expires_in: issuance.expires_in,
            user: issuance.user.into(),
        };

        match issuance.tokens {
            TokenBundle::Signed { token } => data.token = Some(token),
            TokenBundle::Provider {
                access_token,
                id_token,
                refresh_token,
                token_type,
            } => {
                data.access_token = Some(access_token);
                data.id_token = id_token;
                data.refresh_token = refresh_token;
                data.token_type = Some(token_type);
            }
        }

        data
    }
}
