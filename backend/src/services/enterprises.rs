//! Enterprise service: tenant management and onboarding
//!
//! Onboarding creates an enterprise and its first administrator as one
//! atomic unit. The pre-checks are advisory only; the storage layer's
//! unique constraints are the authoritative race detector, and rollback
//! (never retry) is the correctness mechanism when they fire.

use crate::auth::PasswordService;
use crate::error::ApiError;
use crate::repositories::{
    EnterpriseRecord, EnterpriseRepository, NewEnterprise, NewUser, UserRepository,
};
use crate::services::is_unique_violation;
use crm_platform_shared::types::{
    EnterpriseCreateRequest, EnterpriseSummary, OnboardingRequest, OnboardingResponse,
    UpdateGoalRequest,
};
use crm_platform_shared::{validation, UserRole};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::error;
use uuid::Uuid;

pub struct EnterpriseService;

impl EnterpriseService {
    fn to_summary(record: EnterpriseRecord) -> EnterpriseSummary {
        EnterpriseSummary {
            id: record.id,
            name: record.name,
            slug: record.slug,
            cnpj: record.cnpj,
            logo_url: record.logo_url,
            primary_color: record.primary_color,
            is_active: record.is_active,
            monthly_goal: record.monthly_goal,
            created_at: record.created_at,
        }
    }

    fn validate_enterprise_fields(
        name: &str,
        slug: &str,
        cnpj: &str,
        primary_color: Option<&str>,
    ) -> Result<String, ApiError> {
        validation::validate_enterprise_name(name).map_err(ApiError::Validation)?;
        validation::validate_slug(slug).map_err(ApiError::Validation)?;
        validation::validate_cnpj(cnpj).map_err(ApiError::Validation)?;
        if let Some(color) = primary_color {
            validation::validate_hex_color(color).map_err(ApiError::Validation)?;
        }
        Ok(validation::normalize_cnpj(cnpj))
    }

    /// Create an enterprise directly (MASTER operation).
    pub async fn create(
        pool: &PgPool,
        request: &EnterpriseCreateRequest,
    ) -> Result<EnterpriseSummary, ApiError> {
        if request.name.is_empty() && request.slug.is_empty() && request.cnpj.is_empty() {
            return Err(ApiError::Validation(
                "Request payload is empty".to_string(),
            ));
        }

        let cnpj = Self::validate_enterprise_fields(
            &request.name,
            &request.slug,
            &request.cnpj,
            request.primary_color.as_deref(),
        )?;

        // Advisory pre-checks; the unique indexes still close the race
        if EnterpriseRepository::find_by_cnpj(pool, &cnpj)
            .await
            .map_err(ApiError::Internal)?
            .is_some()
        {
            return Err(ApiError::Conflict(
                "An enterprise is already registered with this CNPJ".to_string(),
            ));
        }

        if EnterpriseRepository::find_by_slug(pool, &request.slug)
            .await
            .map_err(ApiError::Internal)?
            .is_some()
        {
            return Err(ApiError::Conflict(
                "An enterprise is already registered with this slug".to_string(),
            ));
        }

        let new_enterprise = NewEnterprise {
            name: request.name.clone(),
            slug: request.slug.clone(),
            cnpj,
            logo_url: request.logo_url.clone(),
            primary_color: request.primary_color.clone(),
        };

        let record = EnterpriseRepository::create(pool, &new_enterprise)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    return ApiError::Conflict(
                        "CNPJ or slug already exists (race condition)".to_string(),
                    );
                }
                error!(
                    operation = "create_enterprise",
                    name = %new_enterprise.name,
                    cnpj = %new_enterprise.cnpj,
                    slug = %new_enterprise.slug,
                    "Failed to create enterprise: {e:#}"
                );
                ApiError::Internal(e)
            })?;

        Ok(Self::to_summary(record))
    }

    /// Onboard a new tenant: enterprise plus its first administrator,
    /// created atomically. Partial creation is never observable.
    pub async fn onboard(
        pool: &PgPool,
        request: &OnboardingRequest,
    ) -> Result<OnboardingResponse, ApiError> {
        if request.enterprise_name.is_empty()
            && request.cnpj.is_empty()
            && request.admin_email.is_empty()
        {
            return Err(ApiError::Validation(
                "Request payload is empty".to_string(),
            ));
        }

        let cnpj = Self::validate_enterprise_fields(
            &request.enterprise_name,
            &request.slug,
            &request.cnpj,
            request.primary_color.as_deref(),
        )?;
        validation::validate_name(&request.admin_name).map_err(ApiError::Validation)?;
        validation::validate_email(&request.admin_email).map_err(ApiError::Validation)?;
        validation::validate_password(&request.admin_password).map_err(ApiError::Validation)?;

        // Advisory pre-checks, outside the transaction. A concurrent
        // onboarding can still slip past these; step 3 handles that.
        if UserRepository::email_exists(pool, &request.admin_email)
            .await
            .map_err(ApiError::Internal)?
        {
            return Err(ApiError::Conflict(
                "A user is already registered with this email".to_string(),
            ));
        }

        if EnterpriseRepository::find_by_cnpj(pool, &cnpj)
            .await
            .map_err(ApiError::Internal)?
            .is_some()
        {
            return Err(ApiError::Conflict(
                "An enterprise is already registered with this CNPJ".to_string(),
            ));
        }

        if EnterpriseRepository::find_by_slug(pool, &request.slug)
            .await
            .map_err(ApiError::Internal)?
            .is_some()
        {
            return Err(ApiError::Conflict(
                "An enterprise is already registered with this slug".to_string(),
            ));
        }

        // Hash before opening the transaction to keep its window at two
        // inserts.
        let password_hash = PasswordService::hash_async(request.admin_password.clone())
            .await
            .map_err(ApiError::Internal)?;

        let new_enterprise = NewEnterprise {
            name: request.enterprise_name.clone(),
            slug: request.slug.clone(),
            cnpj,
            logo_url: request.logo_url.clone(),
            primary_color: request.primary_color.clone(),
        };
        let admin = NewUser {
            name: request.admin_name.clone(),
            email: request.admin_email.clone(),
            password_hash,
            role: UserRole::ClientAdmin,
            // Replaced by the generated enterprise id inside the transaction
            enterprise_id: None,
        };

        let (enterprise, admin) =
            EnterpriseRepository::create_with_admin(pool, &new_enterprise, &admin)
                .await
                .map_err(|e| {
                    if is_unique_violation(&e) {
                        return ApiError::Conflict(
                            "CNPJ, slug, or email already exists (race condition)".to_string(),
                        );
                    }
                    error!(
                        operation = "onboard",
                        enterprise = %new_enterprise.name,
                        cnpj = %new_enterprise.cnpj,
                        slug = %new_enterprise.slug,
                        admin_email = %request.admin_email,
                        "Onboarding transaction failed: {e:#}"
                    );
                    ApiError::Internal(e)
                })?;

        Ok(OnboardingResponse {
            admin_id: admin.id,
            admin_name: admin.name,
            admin_email: admin.email,
            created_at: admin.created_at,
            enterprise_id: enterprise.id,
            enterprise_name: enterprise.name,
            slug: enterprise.slug,
            cnpj: enterprise.cnpj,
            logo_url: enterprise.logo_url,
            primary_color: enterprise.primary_color,
            is_active: enterprise.is_active,
        })
    }

    /// Find an enterprise by id.
    pub async fn get(pool: &PgPool, id: Uuid) -> Result<EnterpriseSummary, ApiError> {
        let enterprise = EnterpriseRepository::find_by_id(pool, id)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| ApiError::NotFound("Enterprise not found".to_string()))?;

        Ok(Self::to_summary(enterprise))
    }

    /// Find an enterprise by CNPJ, accepting punctuated or bare input.
    pub async fn get_by_cnpj(pool: &PgPool, cnpj: &str) -> Result<EnterpriseSummary, ApiError> {
        let normalized = validation::normalize_cnpj(cnpj);

        let enterprise = EnterpriseRepository::find_by_cnpj(pool, &normalized)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| {
                ApiError::NotFound("Enterprise not found with this CNPJ".to_string())
            })?;

        Ok(Self::to_summary(enterprise))
    }

    /// List all enterprises (MASTER operation).
    pub async fn list(pool: &PgPool) -> Result<Vec<EnterpriseSummary>, ApiError> {
        let enterprises = EnterpriseRepository::list_all(pool)
            .await
            .map_err(ApiError::Internal)?;

        Ok(enterprises.into_iter().map(Self::to_summary).collect())
    }

    /// The caller's own enterprise.
    pub async fn get_own(
        pool: &PgPool,
        caller_enterprise: Option<Uuid>,
    ) -> Result<EnterpriseSummary, ApiError> {
        let enterprise_id = caller_enterprise.ok_or_else(|| {
            ApiError::Forbidden("You are not registered with any enterprise".to_string())
        })?;

        Self::get(pool, enterprise_id).await
    }

    /// Update the monthly revenue goal of the caller's enterprise.
    pub async fn update_goal(
        pool: &PgPool,
        caller_enterprise: Option<Uuid>,
        request: &UpdateGoalRequest,
    ) -> Result<EnterpriseSummary, ApiError> {
        if request.goal < Decimal::ZERO {
            return Err(ApiError::Validation(
                "The monthly goal cannot be negative".to_string(),
            ));
        }

        let enterprise_id = caller_enterprise.ok_or_else(|| {
            ApiError::Forbidden("You are not registered with any enterprise".to_string())
        })?;

        let enterprise = EnterpriseRepository::update_goal(pool, enterprise_id, request.goal)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| ApiError::NotFound("Enterprise not found".to_string()))?;

        Ok(Self::to_summary(enterprise))
    }
}
