//! User management service
//!
//! Account creation always hashes before persistence, logs failures
//! without the plaintext password, and treats the storage layer's
//! unique-constraint violation as the authoritative duplicate signal.

use crate::auth::PasswordService;
use crate::error::ApiError;
use crate::repositories::{
    EnterpriseRepository, NewUser, UserRecord, UserRepository,
};
use crate::services::is_unique_violation;
use crm_platform_shared::types::{
    ActivationResponse, ChangePasswordRequest, CreateAdminRequest, CreateViewerRequest,
    ListUsersQuery, RegisterRequest, UserSummary,
};
use crm_platform_shared::{validation, UserRole};
use sqlx::PgPool;
use tracing::error;
use uuid::Uuid;

pub struct UserService;

impl UserService {
    fn to_summary(record: UserRecord, enterprise_cnpj: Option<String>) -> UserSummary {
        UserSummary {
            id: record.id,
            name: record.name,
            email: record.email,
            role: record.role,
            is_active: record.is_active,
            enterprise_cnpj,
            created_at: record.created_at,
        }
    }

    async fn insert(
        pool: &PgPool,
        operation: &'static str,
        new_user: NewUser,
    ) -> Result<UserRecord, ApiError> {
        let email = new_user.email.clone();
        UserRepository::create(pool, &new_user).await.map_err(|e| {
            if is_unique_violation(&e) {
                return ApiError::Conflict(
                    "This email is already registered (concurrency detected)".to_string(),
                );
            }
            error!(operation, email = %email, "User creation failed: {e:#}");
            ApiError::Internal(e)
        })
    }

    /// Create a platform-level MASTER account. No enterprise reference.
    pub async fn create_master(
        pool: &PgPool,
        request: &RegisterRequest,
    ) -> Result<UserSummary, ApiError> {
        if UserRepository::email_exists(pool, &request.email)
            .await
            .map_err(ApiError::Internal)?
        {
            return Err(ApiError::Conflict(
                "A user is already registered with this email".to_string(),
            ));
        }

        let password_hash = PasswordService::hash_async(request.password.clone())
            .await
            .map_err(ApiError::Internal)?;

        let record = Self::insert(
            pool,
            "create_master",
            NewUser {
                name: request.name.clone(),
                email: request.email.clone(),
                password_hash,
                role: UserRole::Master,
                enterprise_id: None,
            },
        )
        .await?;

        Ok(Self::to_summary(record, None))
    }

    /// Create a client account attached to an existing enterprise by CNPJ.
    pub async fn create_client(
        pool: &PgPool,
        request: &RegisterRequest,
        role: UserRole,
        enterprise_cnpj: &str,
    ) -> Result<UserSummary, ApiError> {
        let cnpj = validation::normalize_cnpj(enterprise_cnpj);
        validation::validate_cnpj(&cnpj).map_err(ApiError::Validation)?;

        let enterprise = EnterpriseRepository::find_by_cnpj(pool, &cnpj)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| {
                ApiError::NotFound(format!("Enterprise with CNPJ {} not found", cnpj))
            })?;

        if UserRepository::email_exists(pool, &request.email)
            .await
            .map_err(ApiError::Internal)?
        {
            return Err(ApiError::Conflict(
                "A user is already registered with this email".to_string(),
            ));
        }

        let password_hash = PasswordService::hash_async(request.password.clone())
            .await
            .map_err(ApiError::Internal)?;

        let record = Self::insert(
            pool,
            "create_client",
            NewUser {
                name: request.name.clone(),
                email: request.email.clone(),
                password_hash,
                role,
                enterprise_id: Some(enterprise.id),
            },
        )
        .await?;

        Ok(Self::to_summary(record, Some(enterprise.cnpj)))
    }

    /// Create a CLIENT_ADMIN for a given enterprise (MASTER operation).
    pub async fn create_admin(
        pool: &PgPool,
        request: &CreateAdminRequest,
    ) -> Result<UserSummary, ApiError> {
        validation::validate_name(&request.name).map_err(ApiError::Validation)?;
        validation::validate_email(&request.email).map_err(ApiError::Validation)?;
        validation::validate_password(&request.password).map_err(ApiError::Validation)?;

        let enterprise = EnterpriseRepository::find_by_id(pool, request.enterprise_id)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| {
                ApiError::NotFound("No enterprise exists with this id".to_string())
            })?;

        if UserRepository::email_exists(pool, &request.email)
            .await
            .map_err(ApiError::Internal)?
        {
            return Err(ApiError::Conflict(
                "A user is already registered with this email".to_string(),
            ));
        }

        let password_hash = PasswordService::hash_async(request.password.clone())
            .await
            .map_err(ApiError::Internal)?;

        let record = Self::insert(
            pool,
            "create_admin",
            NewUser {
                name: request.name.clone(),
                email: request.email.clone(),
                password_hash,
                role: UserRole::ClientAdmin,
                enterprise_id: Some(enterprise.id),
            },
        )
        .await?;

        Ok(Self::to_summary(record, Some(enterprise.cnpj)))
    }

    /// Create a CLIENT_VIEWER inside the caller's own enterprise.
    pub async fn create_viewer(
        pool: &PgPool,
        request: &CreateViewerRequest,
        enterprise_id: Uuid,
    ) -> Result<UserSummary, ApiError> {
        validation::validate_name(&request.name).map_err(ApiError::Validation)?;
        validation::validate_email(&request.email).map_err(ApiError::Validation)?;
        validation::validate_password(&request.password).map_err(ApiError::Validation)?;

        let enterprise = EnterpriseRepository::find_by_id(pool, enterprise_id)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| ApiError::NotFound("Manager enterprise not found".to_string()))?;

        if UserRepository::email_exists(pool, &request.email)
            .await
            .map_err(ApiError::Internal)?
        {
            return Err(ApiError::Conflict(
                "This email is already in use".to_string(),
            ));
        }

        let password_hash = PasswordService::hash_async(request.password.clone())
            .await
            .map_err(ApiError::Internal)?;

        let record = Self::insert(
            pool,
            "create_viewer",
            NewUser {
                name: request.name.clone(),
                email: request.email.clone(),
                password_hash,
                role: UserRole::ClientViewer,
                enterprise_id: Some(enterprise.id),
            },
        )
        .await?;

        Ok(Self::to_summary(record, Some(enterprise.cnpj)))
    }

    /// Get an account's profile. Never includes the password hash.
    pub async fn get_profile(pool: &PgPool, user_id: Uuid) -> Result<UserSummary, ApiError> {
        let user = UserRepository::find_by_id(pool, user_id)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        let enterprise_cnpj = match user.enterprise_id {
            Some(id) => EnterpriseRepository::find_by_id(pool, id)
                .await
                .map_err(ApiError::Internal)?
                .map(|e| e.cnpj),
            None => None,
        };

        Ok(Self::to_summary(user, enterprise_cnpj))
    }

    /// List the accounts of one enterprise.
    ///
    /// MASTER callers name the enterprise explicitly; client admins are
    /// scoped to their own tenant regardless of the query parameter.
    pub async fn list(
        pool: &PgPool,
        caller_role: UserRole,
        caller_enterprise: Option<Uuid>,
        query: &ListUsersQuery,
    ) -> Result<Vec<UserSummary>, ApiError> {
        let enterprise_id = match caller_role {
            UserRole::Master => query.enterprise_id.ok_or_else(|| {
                ApiError::Validation("enterprise_id query parameter is required".to_string())
            })?,
            _ => caller_enterprise.ok_or_else(|| {
                ApiError::Forbidden("You are not registered with any enterprise".to_string())
            })?,
        };

        let enterprise_cnpj = EnterpriseRepository::find_by_id(pool, enterprise_id)
            .await
            .map_err(ApiError::Internal)?
            .map(|e| e.cnpj);

        let users = UserRepository::list_by_enterprise(pool, enterprise_id)
            .await
            .map_err(ApiError::Internal)?;

        Ok(users
            .into_iter()
            .map(|u| Self::to_summary(u, enterprise_cnpj.clone()))
            .collect())
    }

    /// Activate or deactivate an account within the caller's enterprise.
    ///
    /// Deactivation is the preferred destructive operation: never self,
    /// never another administrator, same tenant only.
    pub async fn set_active(
        pool: &PgPool,
        caller_id: Uuid,
        caller_enterprise: Option<Uuid>,
        target_id: Uuid,
        active: bool,
    ) -> Result<ActivationResponse, ApiError> {
        if target_id == caller_id {
            return Err(ApiError::Validation(
                "You cannot change the active state of your own account".to_string(),
            ));
        }

        let target = UserRepository::find_by_id(pool, target_id)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        if target.role == UserRole::ClientAdmin {
            return Err(ApiError::Forbidden(
                "Administrator accounts cannot be deactivated here".to_string(),
            ));
        }

        if target.enterprise_id.is_none() || target.enterprise_id != caller_enterprise {
            return Err(ApiError::Forbidden(
                "You do not have permission to modify this user".to_string(),
            ));
        }

        let updated = UserRepository::set_active(pool, target_id, active)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        Ok(ActivationResponse {
            id: updated.id,
            is_active: updated.is_active,
        })
    }

    /// Change the caller's own password after verifying the current one.
    pub async fn change_password(
        pool: &PgPool,
        user_id: Uuid,
        request: &ChangePasswordRequest,
    ) -> Result<(), ApiError> {
        validation::validate_password(&request.new_password).map_err(ApiError::Validation)?;

        let current_hash = UserRepository::get_password_hash(pool, user_id)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        let valid =
            PasswordService::verify_async(request.old_password.clone(), current_hash)
                .await
                .map_err(ApiError::Internal)?;

        if !valid {
            return Err(ApiError::Forbidden(
                "The current password is incorrect".to_string(),
            ));
        }

        let new_hash = PasswordService::hash_async(request.new_password.clone())
            .await
            .map_err(ApiError::Internal)?;

        UserRepository::update_password(pool, user_id, &new_hash)
            .await
            .map_err(ApiError::Internal)?;

        Ok(())
    }
}
