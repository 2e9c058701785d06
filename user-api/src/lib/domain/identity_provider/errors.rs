use thiserror::Error;

/// Errors reported by the identity provider.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentityProviderError {
    #[error("User not found")]
    UserNotFound,

    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    #[error("User is not confirmed")]
    UserNotConfirmed,

    #[error("Username already exists")]
    UsernameExists,

    #[error("Password rejected by policy: {0}")]
    InvalidPassword(String),

    #[error("Identity provider timed out after {0}ms")]
    Timeout(u128),

    #[error("Identity provider unreachable: {0}")]
    Transport(String),

    #[error("Identity provider error {code}: {message}")]
    Service { code: String, message: String },

    #[error("Unexpected identity provider response: {0}")]
    InvalidResponse(String),
}

impl IdentityProviderError {
    /// Map a protocol error code (`__type`) to a variant.
    ///
    /// Codes may arrive namespaced (`prefix#Code`); only the last segment counts.
    pub fn from_code(code: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let short = code.rsplit('#').next().unwrap_or(code);

        match short {
            "UserNotFoundException" => Self::UserNotFound,
            "NotAuthorizedException" => Self::NotAuthorized(message),
            "UserNotConfirmedException" => Self::UserNotConfirmed,
            "UsernameExistsException" => Self::UsernameExists,
            "InvalidPasswordException" => Self::InvalidPassword(message),
            _ => Self::Service {
                code: short.to_string(),
                message,
            },
        }
    }
}
