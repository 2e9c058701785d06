use thiserror::Error;

/// Errors raised while obtaining signing keys from a published key set.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JwksError {
    #[error("Failed to fetch key set: {0}")]
    FetchFailed(String),

    #[error("Key set fetch timed out after {0} ms")]
    Timeout(u128),

    #[error("Key set is malformed: {0}")]
    InvalidKeySet(String),

    #[error("No signing key with id {0}")]
    KeyNotFound(String),

    #[error("Unsupported signing key: {0}")]
    UnsupportedKey(String),
}

impl JwksError {
    /// Whether the error came from reaching the key set endpoint rather than
    /// from the contents of the token.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            JwksError::FetchFailed(_) | JwksError::Timeout(_) | JwksError::InvalidKeySet(_)
        )
    }
}

/// Reasons a remotely issued token is rejected.
///
/// Callers are expected to collapse every variant except `KeyUnavailable`
/// into one generic answer for the client.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteTokenError {
    #[error("Token is malformed: {0}")]
    Malformed(String),

    #[error("Token algorithm is not accepted: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Token header has no key id")]
    MissingKeyId,

    #[error("Signing key unavailable: {0}")]
    KeyUnavailable(#[from] JwksError),

    #[error("Token signature is invalid")]
    InvalidSignature,

    #[error("Token is expired")]
    Expired,

    #[error("Token issuer does not match")]
    IssuerMismatch,

    #[error("Token was issued for another client")]
    ClientMismatch,

    #[error("Token use {0:?} is not accepted")]
    TokenUseMismatch(Option<String>),
}
