use jsonwebtoken::DecodingKey;
use serde::Deserialize;
use serde::Serialize;

use super::errors::JwksError;

/// A published JSON Web Key Set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JwkSet {
    pub keys: Vec<Jwk>,
}

/// One public signing key of a [`JwkSet`].
///
/// Only RSA keys are turned into decoding keys; other key types are skipped
/// when the set is loaded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Jwk {
    pub kid: String,
    pub kty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,
    #[serde(default)]
    pub n: String,
    #[serde(default)]
    pub e: String,
}

impl Jwk {
    /// Build an RS256 verification key from the modulus and exponent.
    ///
    /// # Errors
    /// * `UnsupportedKey` - Key is not an RSA signing key or its components are invalid
    pub fn to_decoding_key(&self) -> Result<DecodingKey, JwksError> {
        if self.kty != "RSA" {
            return Err(JwksError::UnsupportedKey(format!(
                "{}: key type {}",
                self.kid, self.kty
            )));
        }
        if self.key_use.as_deref().is_some_and(|u| u != "sig") {
            return Err(JwksError::UnsupportedKey(format!(
                "{}: not a signing key",
                self.kid
            )));
        }
        if self.alg.as_deref().is_some_and(|a| a != "RS256") {
            return Err(JwksError::UnsupportedKey(format!(
                "{}: algorithm {}",
                self.kid,
                self.alg.as_deref().unwrap_or_default()
            )));
        }

        DecodingKey::from_rsa_components(&self.n, &self.e)
            .map_err(|e| JwksError::UnsupportedKey(format!("{}: {}", self.kid, e)))
    }
}
