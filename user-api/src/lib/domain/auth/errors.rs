use thiserror::Error;

/// Reason a credential pair was refused.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum CredentialFailure {
    #[error("User not found")]
    UserNotFound,

    #[error("Incorrect username or password")]
    IncorrectPassword,

    #[error("User is not confirmed")]
    UserNotConfirmed,
}

/// Errors raised by token issuance and verification.
///
/// Token defects are not errors: they surface as
/// [`AuthResult::Unauthenticated`](crate::domain::auth::models::AuthResult).
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("{0}")]
    InvalidCredentials(CredentialFailure),

    /// A collaborator (identity provider, key set, store) failed; retryable.
    #[error("Upstream failure: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
