use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde::Serialize;
use serde_json::json;
use serde_json::Value;

use crate::domain::identity_provider::errors::IdentityProviderError;
use crate::domain::identity_provider::models::NewProviderUser;
use crate::domain::identity_provider::models::ProviderTokens;
use crate::domain::identity_provider::models::ProviderUser;
use crate::domain::identity_provider::ports::IdentityProvider;

const TARGET_PREFIX: &str = "AWSCognitoIdentityProviderService";
const CONTENT_TYPE: &str = "application/x-amz-json-1.1";
const LIST_PAGE_SIZE: u32 = 60;

/// Identity provider client speaking the user pool JSON 1.1 protocol.
///
/// Requests are sent unsigned to `endpoint`, which is either a local
/// emulator or a signing proxy in front of the hosted service.
pub struct HttpIdentityProvider {
    client: reqwest::Client,
    endpoint: String,
    user_pool_id: String,
    client_id: String,
    timeout: Duration,
}

impl HttpIdentityProvider {
    /// # Errors
    /// * `Transport` - HTTP client could not be built
    pub fn new(
        endpoint: impl Into<String>,
        user_pool_id: impl Into<String>,
        client_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, IdentityProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| IdentityProviderError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            user_pool_id: user_pool_id.into(),
            client_id: client_id.into(),
            timeout,
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        operation: &str,
        body: Value,
    ) -> Result<T, IdentityProviderError> {
        tracing::debug!(operation, "Calling identity provider");

        let response = self
            .client
            .post(&self.endpoint)
            .header("X-Amz-Target", format!("{}.{}", TARGET_PREFIX, operation))
            .header(reqwest::header::CONTENT_TYPE, CONTENT_TYPE)
            .body(body.to_string())
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            let error: ErrorBody = serde_json::from_slice(&bytes).map_err(|_| {
                IdentityProviderError::InvalidResponse(format!(
                    "{} returned {} without an error body",
                    operation, status
                ))
            })?;
            let code = error.code.unwrap_or_else(|| status.to_string());
            tracing::debug!(operation, code = %code, "Identity provider returned an error");
            return Err(IdentityProviderError::from_code(
                &code,
                error.message.unwrap_or_default(),
            ));
        }

        // Operations without output answer with an empty body.
        let bytes = if bytes.is_empty() { &b"{}"[..] } else { &bytes[..] };
        serde_json::from_slice(bytes)
            .map_err(|e| IdentityProviderError::InvalidResponse(e.to_string()))
    }

    fn transport_error(&self, error: reqwest::Error) -> IdentityProviderError {
        if error.is_timeout() {
            IdentityProviderError::Timeout(self.timeout.as_millis())
        } else {
            IdentityProviderError::Transport(error.to_string())
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(rename = "__type")]
    code: Option<String>,
    #[serde(alias = "Message")]
    message: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InitiateAuthResponse {
    authentication_result: Option<AuthenticationResultType>,
    challenge_name: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AuthenticationResultType {
    access_token: String,
    expires_in: i64,
    id_token: Option<String>,
    refresh_token: Option<String>,
    token_type: Option<String>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AttributeType {
    name: String,
    #[serde(default)]
    value: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UserType {
    username: String,
    // AdminGetUser names the list `UserAttributes`, the other operations `Attributes`.
    #[serde(default, alias = "UserAttributes")]
    attributes: Vec<AttributeType>,
    user_create_date: Option<f64>,
    #[serde(default = "enabled_by_default")]
    enabled: bool,
    user_status: Option<String>,
}

fn enabled_by_default() -> bool {
    true
}

impl From<UserType> for ProviderUser {
    fn from(user: UserType) -> Self {
        let attributes: HashMap<String, String> = user
            .attributes
            .into_iter()
            .filter_map(|a| a.value.map(|v| (a.name, v)))
            .collect();

        ProviderUser {
            username: user.username,
            attributes,
            created_at: user
                .user_create_date
                .and_then(|secs| DateTime::<Utc>::from_timestamp_millis((secs * 1000.0) as i64)),
            enabled: user.enabled,
            status: user.user_status,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CreateUserResponse {
    user: UserType,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListUsersResponse {
    #[serde(default)]
    users: Vec<UserType>,
    pagination_token: Option<String>,
}

#[derive(Deserialize)]
struct Empty {}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn admin_initiate_auth(
        &self,
        username: &str,
        password: &str,
    ) -> Result<ProviderTokens, IdentityProviderError> {
        let response: InitiateAuthResponse = self
            .call(
                "AdminInitiateAuth",
                json!({
                    "UserPoolId": self.user_pool_id,
                    "ClientId": self.client_id,
                    "AuthFlow": "ADMIN_USER_PASSWORD_AUTH",
                    "AuthParameters": {
                        "USERNAME": username,
                        "PASSWORD": password,
                    },
                }),
            )
            .await?;

        let Some(result) = response.authentication_result else {
            return Err(IdentityProviderError::Service {
                code: "ChallengeRequired".to_string(),
                message: response
                    .challenge_name
                    .unwrap_or_else(|| "no authentication result".to_string()),
            });
        };

        Ok(ProviderTokens {
            access_token: result.access_token,
            id_token: result.id_token,
            refresh_token: result.refresh_token,
            token_type: result.token_type.unwrap_or_else(|| "Bearer".to_string()),
            expires_in: result.expires_in,
        })
    }

    async fn admin_get_user(&self, username: &str) -> Result<ProviderUser, IdentityProviderError> {
        let user: UserType = self
            .call(
                "AdminGetUser",
                json!({
                    "UserPoolId": self.user_pool_id,
                    "Username": username,
                }),
            )
            .await?;

        Ok(user.into())
    }

    async fn admin_create_user(
        &self,
        user: NewProviderUser,
    ) -> Result<ProviderUser, IdentityProviderError> {
        let attributes: Vec<AttributeType> = user
            .attributes
            .into_iter()
            .map(|(name, value)| AttributeType {
                name,
                value: Some(value),
            })
            .collect();

        let response: CreateUserResponse = self
            .call(
                "AdminCreateUser",
                json!({
                    "UserPoolId": self.user_pool_id,
                    "Username": user.username,
                    "TemporaryPassword": user.temporary_password,
                    "MessageAction": "SUPPRESS",
                    "UserAttributes": attributes,
                }),
            )
            .await?;

        Ok(response.user.into())
    }

    async fn admin_set_user_password(
        &self,
        username: &str,
        password: &str,
        permanent: bool,
    ) -> Result<(), IdentityProviderError> {
        let _: Empty = self
            .call(
                "AdminSetUserPassword",
                json!({
                    "UserPoolId": self.user_pool_id,
                    "Username": username,
                    "Password": password,
                    "Permanent": permanent,
                }),
            )
            .await?;

        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<ProviderUser>, IdentityProviderError> {
        let mut users = Vec::new();
        let mut pagination_token: Option<String> = None;

        loop {
            let mut body = json!({
                "UserPoolId": self.user_pool_id,
                "Limit": LIST_PAGE_SIZE,
            });
            if let Some(token) = &pagination_token {
                body["PaginationToken"] = json!(token);
            }

            let page: ListUsersResponse = self.call("ListUsers", body).await?;
            users.extend(page.users.into_iter().map(ProviderUser::from));

            match page.pagination_token {
                Some(token) if !token.is_empty() => pagination_token = Some(token),
                _ => break,
            }
        }

        Ok(users)
    }
}
