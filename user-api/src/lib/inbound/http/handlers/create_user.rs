use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use super::required;
use super::ApiError;
use super::ApiSuccess;
use crate::domain::user::models::CreateUserCommand;
use crate::domain::user::models::Identity;
use crate::domain::user::models::Role;
use crate::domain::user::models::UserProfile;
use crate::inbound::http::router::AppState;
use crate::user::errors::IdentityError;
use crate::user::errors::RoleError;

pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<ApiSuccess<CreateUserResponseData>, ApiError> {
    let Json(body) = payload?;

    state
        .user_directory
        .create_user(body.try_into_command()?)
        .await
        .map_err(ApiError::from)
        .map(|ref profile| ApiSuccess::new(StatusCode::CREATED, profile.into()))
}

/// HTTP request body for creating a user (raw JSON)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    role: Option<String>,
}

#[derive(Debug, Clone, Error)]
enum ParseCreateUserRequestError {
    #[error("Username and password are required")]
    MissingFields,

    #[error("Invalid username: {0}")]
    Identity(#[from] IdentityError),

    #[error("Invalid role: {0}")]
    Role(#[from] RoleError),
}

impl CreateUserRequest {
    fn try_into_command(self) -> Result<CreateUserCommand, ParseCreateUserRequestError> {
        let (Some(username), Some(password)) = (required(self.username), required(self.password))
        else {
            return Err(ParseCreateUserRequestError::MissingFields);
        };

        let identity = Identity::new(username)?;
        let role = match required(self.role) {
            Some(role) => role.parse::<Role>()?,
            None => Role::default(),
        };

        Ok(CreateUserCommand::new(identity, password, role))
    }
}

impl From<ParseCreateUserRequestError> for ApiError {
    fn from(err: ParseCreateUserRequestError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateUserResponseData {
    pub message: String,
    pub user: CreatedUserData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedUserData {
    pub id: String,
    pub username: String,
    pub role: Role,
}

impl From<&UserProfile> for CreateUserResponseData {
    fn from(profile: &UserProfile) -> Self {
        Self {
            message: "User created successfully".to_string(),
            user: CreatedUserData {
                id: profile.id.clone(),
                username: profile.username.clone(),
                role: profile.role,
            },
        }
    }
}
