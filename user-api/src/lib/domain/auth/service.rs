use std::sync::Arc;

use crate::domain::auth::errors::AuthError;
use crate::domain::auth::models::AuthFailure;
use crate::domain::auth::models::AuthResult;
use crate::domain::auth::models::Issuance;
use crate::domain::auth::ports::AuthStrategy;

const BEARER_PREFIX: &str = "bearer ";

/// Login orchestration and per-request authentication.
#[derive(Clone)]
pub struct AuthService {
    strategy: Arc<dyn AuthStrategy>,
}

impl AuthService {
    pub fn new(strategy: Arc<dyn AuthStrategy>) -> Self {
        Self { strategy }
    }

    /// Authenticate a request from its `Authorization` header value.
    ///
    /// A leading `Bearer ` is stripped case-insensitively; without it the
    /// whole value is taken as the token. The strategy is only consulted
    /// when a non-blank token is present.
    ///
    /// # Errors
    /// * `Upstream` - The strategy could not obtain verification material
    pub async fn authenticate(&self, authorization: Option<&str>) -> Result<AuthResult, AuthError> {
        let Some(header) = authorization else {
            return Ok(AuthResult::Unauthenticated(AuthFailure::MissingHeader));
        };

        let token = extract_token(header);
        if token.is_empty() {
            return Ok(AuthResult::Unauthenticated(AuthFailure::InvalidToken));
        }

        let result = self.strategy.verify(token).await?;
        if let AuthResult::Unauthenticated(reason) = &result {
            tracing::debug!(%reason, "Request not authenticated");
        }

        Ok(result)
    }

    /// Check credentials and issue tokens.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Credential pair refused
    /// * `Upstream` / `Internal` - Issuance could not complete
    pub async fn login(&self, username: &str, password: &str) -> Result<Issuance, AuthError> {
        self.strategy.issue(username, password).await
    }
}

fn extract_token(header: &str) -> &str {
    let trimmed = header.trim();
    let has_prefix = trimmed
        .get(..BEARER_PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(BEARER_PREFIX));

    if has_prefix {
        trimmed[BEARER_PREFIX.len()..].trim()
    } else {
        trimmed
    }
}
