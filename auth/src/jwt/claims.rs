use std::collections::HashMap;

use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// Generic JWT claims structure.
///
/// Carries the registered claims locally issued tokens use (`sub`, `exp`,
/// `iat`, `jti`) plus custom fields via the `extra` map.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Claims {
    /// Subject (user/entity identifier)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Expiration time (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    /// Issued at (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// JWT ID (unique token identifier)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,

    /// Additional custom fields (flattened into token)
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Claims {
    /// Create new empty claims.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create claims for user authentication with automatic expiration.
    ///
    /// Every call gets a fresh `jti`, so two tokens issued within the same
    /// second for the same user are still distinct.
    ///
    /// # Arguments
    /// * `user_id` - Unique user identifier
    /// * `username` - Username (stored in `extra.username`)
    /// * `lifetime` - Time until the token expires
    ///
    /// # Returns
    /// Claims with sub, exp, iat, jti and username set
    pub fn for_user(user_id: impl ToString, username: String, lifetime: Duration) -> Self {
        let now = Utc::now();
        let expiration = now + lifetime;

        let mut extra = HashMap::new();
        extra.insert("username".to_string(), serde_json::json!(username));

        Self {
            sub: Some(user_id.to_string()),
            exp: Some(expiration.timestamp()),
            iat: Some(now.timestamp()),
            jti: Some(Uuid::new_v4().to_string()),
            extra,
        }
    }

    /// Set subject.
    pub fn with_subject(mut self, sub: impl ToString) -> Self {
        self.sub = Some(sub.to_string());
        self
    }

    /// Set expiration (Unix timestamp).
    pub fn with_expiration(mut self, exp: i64) -> Self {
        self.exp = Some(exp);
        self
    }

    /// Set issued at (Unix timestamp).
    pub fn with_issued_at(mut self, iat: i64) -> Self {
        self.iat = Some(iat);
        self
    }

    /// Add a custom field.
    pub fn with_extra(mut self, key: impl ToString, value: impl Serialize) -> Self {
        if let Ok(json_value) = serde_json::to_value(value) {
            self.extra.insert(key.to_string(), json_value);
        }
        self
    }

    /// Get username from extra fields (convenience method).
    pub fn username(&self) -> Option<String> {
        self.extra_str("username")
    }

    /// Get role from extra fields (convenience method).
    pub fn role(&self) -> Option<String> {
        self.extra_str("role")
    }

    /// Check if token is expired.
    ///
    /// A token is only valid while its expiration lies strictly in the future.
    pub fn is_expired(&self, current_timestamp: i64) -> bool {
        self.exp.map_or(false, |exp| exp <= current_timestamp)
    }

    /// Seconds left until expiration, if the claims carry one.
    pub fn expires_in(&self, current_timestamp: i64) -> Option<i64> {
        self.exp.map(|exp| (exp - current_timestamp).max(0))
    }

    fn extra_str(&self, key: &str) -> Option<String> {
        self.extra
            .get(key)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }
}
