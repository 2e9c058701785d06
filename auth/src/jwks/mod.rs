//! Verification of tokens issued by a remote identity provider against its
//! published key set.

pub mod cache;
pub mod errors;
pub mod fetcher;
pub mod models;
pub mod verifier;

pub use cache::SigningKeyCache;
pub use errors::JwksError;
pub use errors::RemoteTokenError;
pub use fetcher::HttpKeySetFetcher;
pub use fetcher::KeySetFetcher;
pub use models::Jwk;
pub use models::JwkSet;
pub use verifier::ProviderClaims;
pub use verifier::RemoteTokenVerifier;
