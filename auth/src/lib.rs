//! Authentication building blocks for the user API.
//!
//! - Password hashing (Argon2id)
//! - Locally signed JWTs (HS256, shared secret)
//! - Verification of provider-issued JWTs (RS256, cached key set)
//!
//! The service crate defines its own authentication ports and adapts these
//! implementations behind them.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &hash));
//! ```
//!
//! ## Local Authentication Flow
//! ```
//! use auth::{Authenticator, Claims};
//! use chrono::Duration;
//!
//! let auth = Authenticator::new(b"secret_key_at_least_32_bytes_long!");
//!
//! // Register: hash password
//! let hash = auth.hash_password("password123").unwrap();
//!
//! // Login: verify and generate token
//! let claims = Claims::for_user("user123", "alice".to_string(), Duration::hours(1));
//! let result = auth.authenticate("password123", &hash, &claims).unwrap();
//!
//! // Validate token
//! let decoded = auth.validate_token(&result.access_token).unwrap();
//! assert_eq!(decoded.sub.as_deref(), Some("user123"));
//! ```
//!
//! ## Provider-Issued Tokens
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use auth::{HttpKeySetFetcher, RemoteTokenVerifier, SigningKeyCache};
//!
//! # async fn example(token: &str) -> Result<(), Box<dyn std::error::Error>> {
//! let url = HttpKeySetFetcher::user_pool_url("us-east-1", "us-east-1_AbCdEf");
//! let fetcher = Arc::new(HttpKeySetFetcher::new(url, Duration::from_secs(5))?);
//! let verifier = RemoteTokenVerifier::new(
//!     SigningKeyCache::new(fetcher),
//!     RemoteTokenVerifier::user_pool_issuer("us-east-1", "us-east-1_AbCdEf"),
//!     "app-client-id",
//! );
//! let claims = verifier.verify(token).await?;
//! println!("subject: {}", claims.sub);
//! # Ok(())
//! # }
//! ```

pub mod authenticator;
pub mod jwks;
pub mod jwt;
pub mod password;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

// Re-export commonly used items
pub use authenticator::AuthenticationError;
pub use authenticator::AuthenticationResult;
pub use authenticator::Authenticator;
pub use jwks::HttpKeySetFetcher;
pub use jwks::JwksError;
pub use jwks::KeySetFetcher;
pub use jwks::ProviderClaims;
pub use jwks::RemoteTokenError;
pub use jwks::RemoteTokenVerifier;
pub use jwks::SigningKeyCache;
pub use jwt::Claims;
pub use jwt::JwtError;
pub use jwt::JwtHandler;
pub use password::PasswordError;
pub use password::PasswordHasher;
