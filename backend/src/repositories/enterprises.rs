//! Enterprise repository for database operations
//!
//! CNPJ values are stored normalized (digits only); callers normalize
//! before binding.

use anyhow::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use super::users::{NewUser, UserRecord, UserRepository};

/// Enterprise record from database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EnterpriseRecord {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub cnpj: String,
    pub logo_url: Option<String>,
    pub primary_color: String,
    pub monthly_goal: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for inserting an enterprise. `cnpj` must be normalized.
#[derive(Debug, Clone)]
pub struct NewEnterprise {
    pub name: String,
    pub slug: String,
    pub cnpj: String,
    pub logo_url: Option<String>,
    pub primary_color: Option<String>,
}

const COLUMNS: &str =
    "id, name, slug, cnpj, logo_url, primary_color, monthly_goal, is_active, created_at, updated_at";

/// Enterprise repository for database operations
pub struct EnterpriseRepository;

impl EnterpriseRepository {
    /// Insert an enterprise. Takes any executor so onboarding can run it
    /// inside its transaction.
    pub async fn create<'e, E>(executor: E, enterprise: &NewEnterprise) -> Result<EnterpriseRecord>
    where
        E: PgExecutor<'e>,
    {
        let record = sqlx::query_as::<_, EnterpriseRecord>(&format!(
            r#"
            INSERT INTO enterprises (name, slug, cnpj, logo_url, primary_color)
            VALUES ($1, $2, $3, $4, COALESCE($5, '#000000'))
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(&enterprise.name)
        .bind(&enterprise.slug)
        .bind(&enterprise.cnpj)
        .bind(&enterprise.logo_url)
        .bind(&enterprise.primary_color)
        .fetch_one(executor)
        .await?;

        Ok(record)
    }

    /// Create an enterprise and its first administrator atomically.
    ///
    /// The enterprise insert is strictly ordered before the account insert
    /// (the account needs the generated enterprise id). Any failure rolls
    /// the whole unit back; no partial state can remain. The caller is
    /// expected to have hashed the admin password before calling, keeping
    /// the transaction window to two inserts.
    pub async fn create_with_admin(
        pool: &PgPool,
        enterprise: &NewEnterprise,
        admin: &NewUser,
    ) -> Result<(EnterpriseRecord, UserRecord)> {
        let mut tx = pool.begin().await?;

        let enterprise_record = Self::create(&mut *tx, enterprise).await?;

        let admin = NewUser {
            enterprise_id: Some(enterprise_record.id),
            ..admin.clone()
        };
        let admin_record = UserRepository::create(&mut *tx, &admin).await?;

        tx.commit().await?;

        Ok((enterprise_record, admin_record))
    }

    /// Find enterprise by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<EnterpriseRecord>> {
        let enterprise = sqlx::query_as::<_, EnterpriseRecord>(&format!(
            r#"
            SELECT {COLUMNS} FROM enterprises WHERE id = $1
            "#,
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(enterprise)
    }

    /// Find enterprise by normalized CNPJ
    pub async fn find_by_cnpj(pool: &PgPool, cnpj: &str) -> Result<Option<EnterpriseRecord>> {
        let enterprise = sqlx::query_as::<_, EnterpriseRecord>(&format!(
            r#"
            SELECT {COLUMNS} FROM enterprises WHERE cnpj = $1
            "#,
        ))
        .bind(cnpj)
        .fetch_optional(pool)
        .await?;

        Ok(enterprise)
    }

    /// Find enterprise by slug
    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<EnterpriseRecord>> {
        let enterprise = sqlx::query_as::<_, EnterpriseRecord>(&format!(
            r#"
            SELECT {COLUMNS} FROM enterprises WHERE slug = $1
            "#,
        ))
        .bind(slug)
        .fetch_optional(pool)
        .await?;

        Ok(enterprise)
    }

    /// List all enterprises, newest first.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<EnterpriseRecord>> {
        let enterprises = sqlx::query_as::<_, EnterpriseRecord>(&format!(
            r#"
            SELECT {COLUMNS} FROM enterprises ORDER BY created_at DESC
            "#,
        ))
        .fetch_all(pool)
        .await?;

        Ok(enterprises)
    }

    /// Update the monthly revenue goal. Returns None when the enterprise
    /// does not exist.
    pub async fn update_goal(
        pool: &PgPool,
        id: Uuid,
        goal: Decimal,
    ) -> Result<Option<EnterpriseRecord>> {
        let enterprise = sqlx::query_as::<_, EnterpriseRecord>(&format!(
            r#"
            UPDATE enterprises
            SET monthly_goal = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(goal)
        .fetch_optional(pool)
        .await?;

        Ok(enterprise)
    }
}

#[cfg(test)]
mod tests {
    // Integration tests require a database and live under backend/tests/.
}
