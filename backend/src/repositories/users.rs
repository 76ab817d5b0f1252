//! User repository for database operations
//!
//! Default reads never select `password_hash`; the credentials query used
//! by the login path is the single exception.

use anyhow::Result;
use chrono::{DateTime, Utc};
use crm_platform_shared::UserRole;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// User record from database (without password hash)
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub is_active: bool,
    pub enterprise_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Credentials row retrieved for password verification only
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserCredentials {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub is_active: bool,
    pub enterprise_id: Option<Uuid>,
}

/// Account row joined with its enterprise's active flag, used by the
/// token-validating guard to reject stale tokens.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuthContextRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub is_active: bool,
    pub enterprise_id: Option<Uuid>,
    pub enterprise_active: Option<bool>,
}

/// Input for inserting a user. `password_hash` must already be hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub enterprise_id: Option<Uuid>,
}

/// User repository for database operations
pub struct UserRepository;

impl UserRepository {
    /// Insert a user. Takes any executor so onboarding can run it inside
    /// its transaction.
    pub async fn create<'e, E>(executor: E, user: &NewUser) -> Result<UserRecord>
    where
        E: PgExecutor<'e>,
    {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (name, email, password_hash, role, enterprise_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, role, is_active, enterprise_id, created_at, updated_at
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(user.enterprise_id)
        .fetch_one(executor)
        .await?;

        Ok(record)
    }

    /// Find a user by email, including the password hash.
    /// Login path only; every other read excludes the hash.
    pub async fn find_by_email_with_password(
        pool: &PgPool,
        email: &str,
    ) -> Result<Option<UserCredentials>> {
        let user = sqlx::query_as::<_, UserCredentials>(
            r#"
            SELECT id, name, email, password_hash, role, is_active, enterprise_id
            FROM users
            WHERE lower(email) = lower($1)
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Find user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, name, email, role, is_active, enterprise_id, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Resolve an account together with its enterprise's active flag.
    pub async fn find_auth_context(pool: &PgPool, id: Uuid) -> Result<Option<AuthContextRecord>> {
        let record = sqlx::query_as::<_, AuthContextRecord>(
            r#"
            SELECT u.id, u.name, u.email, u.role, u.is_active, u.enterprise_id,
                   e.is_active AS enterprise_active
            FROM users u
            LEFT JOIN enterprises e ON e.id = u.enterprise_id
            WHERE u.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(record)
    }

    /// Fetch only the password hash, for password-change verification.
    pub async fn get_password_hash(pool: &PgPool, id: Uuid) -> Result<Option<String>> {
        let hash = sqlx::query_scalar::<_, String>(
            r#"
            SELECT password_hash FROM users WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(hash)
    }

    /// Check if email exists
    pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool> {
        let result = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(SELECT 1 FROM users WHERE lower(email) = lower($1))
            "#,
        )
        .bind(email)
        .fetch_one(pool)
        .await?;

        Ok(result)
    }

    /// List the accounts of one enterprise, newest first.
    pub async fn list_by_enterprise(
        pool: &PgPool,
        enterprise_id: Uuid,
    ) -> Result<Vec<UserRecord>> {
        let users = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, name, email, role, is_active, enterprise_id, created_at, updated_at
            FROM users
            WHERE enterprise_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(enterprise_id)
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    /// Flip the active flag. Returns the updated record, or None when the
    /// user does not exist.
    pub async fn set_active(
        pool: &PgPool,
        id: Uuid,
        active: bool,
    ) -> Result<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            UPDATE users
            SET is_active = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, email, role, is_active, enterprise_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(active)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Replace the stored password hash.
    pub async fn update_password(pool: &PgPool, id: Uuid, password_hash: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    // Integration tests require a database and live under backend/tests/.
}
