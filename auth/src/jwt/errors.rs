use thiserror::Error;

/// Error type for locally signed token operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JwtError {
    #[error("Failed to encode token: {0}")]
    EncodingFailed(String),

    #[error("Failed to decode token: {0}")]
    DecodingFailed(String),

    #[error("Token is expired")]
    TokenExpired,

    #[error("Token signature is invalid")]
    InvalidSignature,

    #[error("Token algorithm is not accepted: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Missing required claim: {0}")]
    MissingClaim(String),
}
