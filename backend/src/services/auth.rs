//! Authentication service: login and registration orchestration
//!
//! Login walks a fixed sequence of states, failing out with a classified
//! error at each one: payload check, account lookup, password check,
//! claim build, issuance. Unexpected failures are logged with context and
//! surfaced as opaque internal errors; the plaintext password is never
//! logged anywhere on these paths.

use crate::auth::{JwtService, PasswordService};
use crate::config::AuthConfig;
use crate::error::ApiError;
use crate::repositories::UserRepository;
use crate::services::UserService;
use crm_platform_shared::types::{AccessTokenResponse, LoginRequest, RegisterRequest, UserSummary};
use crm_platform_shared::{validation, UserRole};
use sqlx::PgPool;
use tracing::error;
use validator::ValidateEmail;

pub struct AuthService;

impl AuthService {
    /// Authenticate by email and password and issue a session token.
    pub async fn login(
        pool: &PgPool,
        jwt: &JwtService,
        request: &LoginRequest,
    ) -> Result<AccessTokenResponse, ApiError> {
        // PayloadCheck: an empty body is a client error, not a gateway one
        if request.email.trim().is_empty() && request.password.is_empty() {
            return Err(ApiError::Validation(
                "Request payload is empty".to_string(),
            ));
        }

        // Lookup: the one read that retrieves the password hash
        let user = UserRepository::find_by_email_with_password(pool, request.email.trim())
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| {
                ApiError::NotFound(
                    "Unable to find an account registered with this email".to_string(),
                )
            })?;

        // PasswordCheck: offloaded to the blocking pool; a hasher failure
        // (e.g. corrupt digest) is reclassified, never leaked
        let valid = PasswordService::verify_async(
            request.password.clone(),
            user.password_hash.clone(),
        )
        .await
        .map_err(|e| {
            error!(
                operation = "login",
                email = %user.email,
                "Credential verification failed: {e:#}"
            );
            ApiError::Internal(e)
        })?;

        if !valid {
            return Err(ApiError::Unauthorized(
                "The data provided is incorrect".to_string(),
            ));
        }

        // ClaimBuild + Issued
        let token = jwt
            .issue(user.id, &user.email, user.role, user.enterprise_id)
            .map_err(|e| {
                error!(
                    operation = "login",
                    email = %user.email,
                    "Token issuance failed: {e:#}"
                );
                ApiError::Internal(e)
            })?;

        Ok(AccessTokenResponse {
            access_token: token,
        })
    }

    /// Register a new account.
    ///
    /// Validates input, then delegates creation to the user service:
    /// client accounts (the default) attach to an existing enterprise by
    /// CNPJ; a MASTER account requires the configured registration key.
    pub async fn register(
        pool: &PgPool,
        auth_config: &AuthConfig,
        request: &RegisterRequest,
    ) -> Result<UserSummary, ApiError> {
        if request.name.is_empty() && request.email.is_empty() && request.password.is_empty() {
            return Err(ApiError::Validation(
                "Request payload is empty".to_string(),
            ));
        }

        validation::validate_name(&request.name).map_err(ApiError::Validation)?;
        if !request.email.validate_email() {
            return Err(ApiError::Validation(
                "Email must be a valid email address".to_string(),
            ));
        }
        validation::validate_password(&request.password).map_err(ApiError::Validation)?;

        match request.role.unwrap_or(UserRole::ClientViewer) {
            UserRole::Master => {
                let key = request.master_key.as_deref().unwrap_or_default();
                if key.is_empty() || key != auth_config.master_key {
                    return Err(ApiError::Forbidden(
                        "A valid registration key is required for MASTER accounts".to_string(),
                    ));
                }
                UserService::create_master(pool, request).await
            }
            role => {
                let cnpj = request.enterprise_cnpj.as_deref().ok_or_else(|| {
                    ApiError::Validation(
                        "enterprise_cnpj is required for client accounts".to_string(),
                    )
                })?;
                UserService::create_client(pool, request, role, cnpj).await
            }
        }
    }
}
