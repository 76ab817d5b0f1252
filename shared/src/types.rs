//! API request and response types

use crate::roles::UserRole;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Login request
///
/// Fields default to empty strings so an empty `{}` body still reaches the
/// authentication service, which classifies it instead of the framework.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Successful login response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
}

/// Registration request
///
/// Client accounts (the default) are attached to an existing enterprise by
/// CNPJ. A `MASTER` account requires the configured registration key.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: Option<UserRole>,
    #[serde(default)]
    pub enterprise_cnpj: Option<String>,
    #[serde(default)]
    pub master_key: Option<String>,
}

/// Account summary returned by registration and profile reads.
/// Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enterprise_cnpj: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Create a CLIENT_ADMIN for an enterprise (MASTER only)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAdminRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub enterprise_id: Uuid,
}

/// Create a CLIENT_VIEWER in the caller's enterprise (CLIENT_ADMIN only)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateViewerRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Change the caller's own password
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// Result of an activate/deactivate operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivationResponse {
    pub id: Uuid,
    pub is_active: bool,
}

/// Query parameters for listing accounts.
/// MASTER callers pass an explicit enterprise id; client admins are scoped
/// to their own tenant.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ListUsersQuery {
    pub enterprise_id: Option<Uuid>,
}

/// Direct enterprise creation (MASTER only)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EnterpriseCreateRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub cnpj: String,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub primary_color: Option<String>,
}

/// Enterprise summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnterpriseSummary {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub cnpj: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    pub primary_color: String,
    pub is_active: bool,
    pub monthly_goal: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Tenant onboarding request: a new enterprise plus its first
/// administrator account, created as one unit.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OnboardingRequest {
    #[serde(default)]
    pub enterprise_name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub cnpj: String,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub primary_color: Option<String>,
    #[serde(default)]
    pub admin_name: String,
    #[serde(default)]
    pub admin_email: String,
    #[serde(default)]
    pub admin_password: String,
}

/// Composite response combining the new enterprise and its administrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnboardingResponse {
    // Admin account
    pub admin_id: Uuid,
    pub admin_name: String,
    pub admin_email: String,
    pub created_at: DateTime<Utc>,
    // Enterprise
    pub enterprise_id: Uuid,
    pub enterprise_name: String,
    pub slug: String,
    pub cnpj: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    pub primary_color: String,
    pub is_active: bool,
}

/// Update the monthly revenue goal of the caller's enterprise
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateGoalRequest {
    pub goal: Decimal,
}
