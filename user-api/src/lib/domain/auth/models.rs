use serde_json::Map;
use serde_json::Value;

use crate::domain::user::models::Role;

/// Outcome of authenticating one request.
///
/// An authenticated result never carries a failure reason and an
/// unauthenticated one never carries claims.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthResult {
    Authenticated(AuthenticatedIdentity),
    Unauthenticated(AuthFailure),
}

impl AuthResult {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthResult::Authenticated(_))
    }

    pub fn subject_id(&self) -> Option<&str> {
        match self {
            AuthResult::Authenticated(identity) => Some(identity.subject_id.as_str()),
            AuthResult::Unauthenticated(_) => None,
        }
    }

    pub fn claims(&self) -> Option<&Map<String, Value>> {
        match self {
            AuthResult::Authenticated(identity) => Some(&identity.claims),
            AuthResult::Unauthenticated(_) => None,
        }
    }

    pub fn failure_reason(&self) -> Option<AuthFailure> {
        match self {
            AuthResult::Authenticated(_) => None,
            AuthResult::Unauthenticated(reason) => Some(*reason),
        }
    }
}

/// Identity proven by a verified token.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedIdentity {
    pub subject_id: String,
    pub username: Option<String>,
    /// Every claim carried by the token.
    pub claims: Map<String, Value>,
}

/// Why a request is not authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    MissingHeader,
    InvalidToken,
}

impl AuthFailure {
    pub fn message(&self) -> &'static str {
        match self {
            AuthFailure::MissingHeader => "No authorization header provided",
            AuthFailure::InvalidToken => "Invalid or expired token",
        }
    }
}

impl std::fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Tokens handed out by a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenBundle {
    /// Single token signed by this service.
    Signed { token: String },
    /// Token set issued by the identity provider, passed through untouched.
    Provider {
        access_token: String,
        id_token: Option<String>,
        refresh_token: Option<String>,
        token_type: String,
    },
}

/// User summary returned alongside issued tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub role: Option<Role>,
}

/// Result of a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issuance {
    pub tokens: TokenBundle,
    /// Seconds until the access token expires.
    pub expires_in: i64,
    pub user: SessionUser,
}
