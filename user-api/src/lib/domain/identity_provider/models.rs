use std::collections::HashMap;

use chrono::DateTime;
use chrono::Utc;

/// Attribute name holding the account role.
pub const ROLE_ATTRIBUTE: &str = "custom:role";
pub const EMAIL_ATTRIBUTE: &str = "email";
pub const EMAIL_VERIFIED_ATTRIBUTE: &str = "email_verified";
pub const SUBJECT_ATTRIBUTE: &str = "sub";

/// Status of an account created with a temporary password only.
pub const FORCE_CHANGE_PASSWORD_STATUS: &str = "FORCE_CHANGE_PASSWORD";

/// Token set returned by an admin-initiated password authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderTokens {
    pub access_token: String,
    pub id_token: Option<String>,
    pub refresh_token: Option<String>,
    pub token_type: String,
    pub expires_in: i64,
}

/// Account as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderUser {
    pub username: String,
    pub attributes: HashMap<String, String>,
    pub created_at: Option<DateTime<Utc>>,
    pub enabled: bool,
    pub status: Option<String>,
}

impl ProviderUser {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Created, but never given a permanent password.
    pub fn awaits_permanent_password(&self) -> bool {
        self.status.as_deref() == Some(FORCE_CHANGE_PASSWORD_STATUS)
    }

    /// Stable subject id, falling back to the username.
    pub fn subject(&self) -> &str {
        self.attribute(SUBJECT_ATTRIBUTE)
            .unwrap_or(self.username.as_str())
    }
}

/// Account creation request for the provider.
#[derive(Debug, Clone)]
pub struct NewProviderUser {
    pub username: String,
    pub temporary_password: String,
    pub attributes: Vec<(String, String)>,
}
