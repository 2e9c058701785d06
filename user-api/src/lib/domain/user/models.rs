use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::user::errors::IdentityError;
use crate::user::errors::RoleError;
use crate::user::errors::UserIdError;

/// Credential record aggregate.
///
/// Owned exclusively by the credential store. `password_hash` never leaves
/// the domain: every outward view goes through [`UserProfile`].
#[derive(Debug, Clone)]
pub struct CredentialRecord {
    pub id: UserId,
    pub identity: Identity,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// User unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Generate a new random user ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a user ID from string.
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, UserIdError> {
        Uuid::parse_str(s)
            .map(UserId)
            .map_err(|e| UserIdError::InvalidFormat(e.to_string()))
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Login identity value type.
///
/// Trimmed and lower-cased on construction so that `Alice@Example.com` and
/// `alice@example.com` name the same account. Usually an e-mail address,
/// but any 3-254 character string without whitespace or control characters
/// is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity(String);

impl Identity {
    const MIN_LENGTH: usize = 3;
    const MAX_LENGTH: usize = 254;

    /// Create a new normalised identity.
    ///
    /// # Errors
    /// * `TooShort` - Fewer than 3 characters after trimming
    /// * `TooLong` - More than 254 characters
    /// * `InvalidCharacters` - Contains whitespace or control characters
    pub fn new(identity: impl AsRef<str>) -> Result<Self, IdentityError> {
        let normalised = identity.as_ref().trim().to_lowercase();

        let length = normalised.chars().count();
        if length < Self::MIN_LENGTH {
            return Err(IdentityError::TooShort {
                min: Self::MIN_LENGTH,
                actual: length,
            });
        }
        if length > Self::MAX_LENGTH {
            return Err(IdentityError::TooLong {
                max: Self::MAX_LENGTH,
                actual: length,
            });
        }
        if normalised
            .chars()
            .any(|c| c.is_whitespace() || c.is_control())
        {
            return Err(IdentityError::InvalidCharacters);
        }

        Ok(Self(normalised))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The identity itself when it is a valid e-mail address.
    pub fn email(&self) -> Option<&str> {
        email_address::EmailAddress::is_valid(&self.0).then_some(self.0.as_str())
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Authorization role attached to a credential record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(RoleError::Unknown(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Directory view of a user, safe to hand to clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub role: Role,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<&CredentialRecord> for UserProfile {
    fn from(record: &CredentialRecord) -> Self {
        Self {
            id: record.id.to_string(),
            username: record.identity.as_str().to_string(),
            email: record.identity.email().map(str::to_string),
            role: record.role,
            created_at: Some(record.created_at),
        }
    }
}

/// Command to register a new user with validated fields.
#[derive(Debug)]
pub struct CreateUserCommand {
    pub identity: Identity,
    pub password: String,
    pub role: Role,
}

impl CreateUserCommand {
    /// Construct a new create user command.
    ///
    /// # Arguments
    /// * `identity` - Normalised identity
    /// * `password` - Plain text password (hashed by the directory)
    /// * `role` - Role of the new account
    pub fn new(identity: Identity, password: String, role: Role) -> Self {
        Self {
            identity,
            password,
            role,
        }
    }
}
