use async_trait::async_trait;

use crate::domain::auth::errors::AuthError;
use crate::domain::auth::models::AuthResult;
use crate::domain::auth::models::Issuance;

/// Token issuance and verification strategy.
///
/// One implementation signs tokens locally; another delegates to the
/// identity provider and validates against its published keys. The service
/// picks one at startup and handlers never see which.
#[async_trait]
pub trait AuthStrategy: Send + Sync + 'static {
    /// Check a credential pair and issue tokens.
    ///
    /// # Arguments
    /// * `username` - Identity as supplied by the client
    /// * `password` - Plaintext password
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown user, wrong password or unconfirmed account
    /// * `Upstream` - Store or provider unreachable
    async fn issue(&self, username: &str, password: &str) -> Result<Issuance, AuthError>;

    /// Verify a bearer token.
    ///
    /// # Returns
    /// `Authenticated` with the token claims, or `Unauthenticated(InvalidToken)`
    /// for any defect in the token itself
    ///
    /// # Errors
    /// * `Upstream` - Verification material could not be obtained
    async fn verify(&self, token: &str) -> Result<AuthResult, AuthError>;
}
