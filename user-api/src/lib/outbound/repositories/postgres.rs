use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::FromRow;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::user::models::CredentialRecord;
use crate::domain::user::models::Identity;
use crate::domain::user::models::UserId;
use crate::domain::user::ports::CredentialStore;
use crate::user::errors::UserError;

const IDENTITY_CONSTRAINT: &str = "credentials_identity_key";

pub struct PostgresCredentialStore {
    pool: PgPool,
}

impl PostgresCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct CredentialRow {
    id: Uuid,
    identity: String,
    password_hash: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<CredentialRow> for CredentialRecord {
    type Error = UserError;

    fn try_from(row: CredentialRow) -> Result<Self, Self::Error> {
        Ok(CredentialRecord {
            id: UserId(row.id),
            identity: Identity::new(row.identity)?,
            password_hash: row.password_hash,
            role: row.role.parse()?,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    async fn create(&self, record: CredentialRecord) -> Result<CredentialRecord, UserError> {
        sqlx::query(
            r#"
            INSERT INTO credentials (id, identity, password_hash, role, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(record.id.0)
        .bind(record.identity.as_str())
        .bind(&record.password_hash)
        .bind(record.role.as_str())
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation()
                    && db_err.constraint() == Some(IDENTITY_CONSTRAINT)
                {
                    return UserError::DuplicateIdentity(record.identity.as_str().to_string());
                }
            }
            UserError::Storage(e.to_string())
        })?;

        Ok(record)
    }

    async fn find_by_identity(
        &self,
        identity: &Identity,
    ) -> Result<Option<CredentialRecord>, UserError> {
        let row = sqlx::query_as::<_, CredentialRow>(
            r#"
            SELECT id, identity, password_hash, role, created_at
            FROM credentials
            WHERE identity = $1
            "#,
        )
        .bind(identity.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| UserError::Storage(e.to_string()))?;

        row.map(CredentialRecord::try_from).transpose()
    }

    async fn list_all(&self) -> Result<Vec<CredentialRecord>, UserError> {
        let rows = sqlx::query_as::<_, CredentialRow>(
            r#"
            SELECT id, identity, password_hash, role, created_at
            FROM credentials
            ORDER BY created_at ASC, identity ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| UserError::Storage(e.to_string()))?;

        rows.into_iter().map(CredentialRecord::try_from).collect()
    }
}
