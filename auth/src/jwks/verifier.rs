use std::collections::HashMap;

use chrono::Utc;
use jsonwebtoken::decode;
use jsonwebtoken::decode_header;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::Validation;
use serde::Deserialize;
use serde::Serialize;

use super::cache::SigningKeyCache;
use super::errors::RemoteTokenError;

/// Claims of a token issued by a hosted user pool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderClaims {
    pub sub: String,
    pub iss: String,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_use: Option<String>,
    /// Present on access tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// Present on id tokens; a string or an array of strings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl ProviderClaims {
    /// Every claim of the token as a JSON object.
    pub fn to_map(&self) -> serde_json::Map<String, serde_json::Value> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        }
    }

    fn is_bound_to(&self, client_id: &str) -> bool {
        if self.client_id.as_deref() == Some(client_id) {
            return true;
        }
        match &self.aud {
            Some(serde_json::Value::String(aud)) => aud == client_id,
            Some(serde_json::Value::Array(auds)) => {
                auds.iter().any(|aud| aud.as_str() == Some(client_id))
            }
            _ => false,
        }
    }
}

/// Verifies RS256 tokens issued by a remote identity provider.
///
/// Checks, in order: header algorithm and key id, signature against the
/// cached key set, issuer, expiry (strictly in the future), token use and
/// client binding.
pub struct RemoteTokenVerifier {
    keys: SigningKeyCache,
    issuer: String,
    client_id: String,
    token_use: String,
}

impl RemoteTokenVerifier {
    pub fn new(keys: SigningKeyCache, issuer: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            keys,
            issuer: issuer.into(),
            client_id: client_id.into(),
            token_use: "access".to_string(),
        }
    }

    /// Accept a different `token_use` value (default `access`).
    pub fn with_token_use(mut self, token_use: impl Into<String>) -> Self {
        self.token_use = token_use.into();
        self
    }

    /// Issuer URL of a hosted user pool.
    pub fn user_pool_issuer(region: &str, user_pool_id: &str) -> String {
        format!("https://cognito-idp.{}.amazonaws.com/{}", region, user_pool_id)
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Verify `token` and return its claims.
    ///
    /// # Errors
    /// * `KeyUnavailable` - Key id unknown or the key set could not be fetched
    /// * any other variant - The token itself failed a check
    pub async fn verify(&self, token: &str) -> Result<ProviderClaims, RemoteTokenError> {
        let header = decode_header(token).map_err(|e| RemoteTokenError::Malformed(e.to_string()))?;

        if header.alg != Algorithm::RS256 {
            return Err(RemoteTokenError::UnsupportedAlgorithm(format!(
                "{:?}",
                header.alg
            )));
        }
        let kid = header.kid.ok_or(RemoteTokenError::MissingKeyId)?;

        let key = self.keys.get_decoding_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.validate_aud = false;
        validation.leeway = 0;

        let claims = decode::<ProviderClaims>(token, &key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => RemoteTokenError::Expired,
                ErrorKind::InvalidSignature => RemoteTokenError::InvalidSignature,
                ErrorKind::InvalidIssuer => RemoteTokenError::IssuerMismatch,
                _ => RemoteTokenError::Malformed(e.to_string()),
            })?;

        if claims.exp <= Utc::now().timestamp() {
            return Err(RemoteTokenError::Expired);
        }
        if claims.token_use.as_deref() != Some(self.token_use.as_str()) {
            return Err(RemoteTokenError::TokenUseMismatch(claims.token_use));
        }
        if !claims.is_bound_to(&self.client_id) {
            return Err(RemoteTokenError::ClientMismatch);
        }

        Ok(claims)
    }
}
