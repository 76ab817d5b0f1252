//! User management routes
//!
//! All routes here sit behind the guard pair. Administrator creation is a
//! platform-master operation; viewer management is scoped to the calling
//! admin's own tenant.

use crate::auth::{auth_guard, require_roles, CurrentUser};
use crate::error::{ApiError, ApiResult};
use crate::services::UserService;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    routing::{get, patch, post, put},
    Json, Router,
};
use crm_platform_shared::types::{
    ActivationResponse, ChangePasswordRequest, CreateAdminRequest, CreateViewerRequest,
    ListUsersQuery, UserSummary,
};
use crm_platform_shared::UserRole;
use serde_json::{json, Value};
use uuid::Uuid;

const MASTER_ONLY: &[UserRole] = &[UserRole::Master];
const CLIENT_ADMIN_ONLY: &[UserRole] = &[UserRole::ClientAdmin];
const ACCOUNT_MANAGERS: &[UserRole] = &[UserRole::Master, UserRole::ClientAdmin];

/// Create user management routes
pub fn user_routes(state: AppState) -> Router<AppState> {
    let master = Router::new()
        .route("/users/admins", post(create_admin))
        .route_layer(require_roles(MASTER_ONLY));

    let admin = Router::new()
        .route("/users/viewers", post(create_viewer))
        .route("/users/:id/activate", patch(activate_user))
        .route("/users/:id/deactivate", patch(deactivate_user))
        .route_layer(require_roles(CLIENT_ADMIN_ONLY));

    let managers = Router::new()
        .route("/users", get(list_users))
        .route_layer(require_roles(ACCOUNT_MANAGERS));

    Router::new()
        .route("/users/me", get(get_profile))
        .route("/users/password", put(change_password))
        .merge(master)
        .merge(admin)
        .merge(managers)
        .layer(middleware::from_fn_with_state(state, auth_guard))
}

/// Current account profile (never includes the password hash)
///
/// GET /users/me
async fn get_profile(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<UserSummary>> {
    let profile = UserService::get_profile(state.db(), user.id).await?;
    Ok(Json(profile))
}

/// Create a CLIENT_ADMIN for an enterprise (MASTER only)
///
/// POST /users/admins
async fn create_admin(
    State(state): State<AppState>,
    Json(req): Json<CreateAdminRequest>,
) -> ApiResult<(StatusCode, Json<UserSummary>)> {
    let summary = UserService::create_admin(state.db(), &req).await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

/// Create a CLIENT_VIEWER in the caller's enterprise (CLIENT_ADMIN only)
///
/// POST /users/viewers
async fn create_viewer(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<CreateViewerRequest>,
) -> ApiResult<(StatusCode, Json<UserSummary>)> {
    let enterprise_id = user.enterprise_id.ok_or_else(|| {
        ApiError::Forbidden("You are not registered with any enterprise".to_string())
    })?;
    let summary = UserService::create_viewer(state.db(), &req, enterprise_id).await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

/// List the accounts of an enterprise
///
/// GET /users
async fn list_users(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ListUsersQuery>,
) -> ApiResult<Json<Vec<UserSummary>>> {
    let users = UserService::list(state.db(), user.role, user.enterprise_id, &query).await?;
    Ok(Json(users))
}

/// Reactivate an account in the caller's enterprise
///
/// PATCH /users/{id}/activate
async fn activate_user(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ActivationResponse>> {
    let response =
        UserService::set_active(state.db(), user.id, user.enterprise_id, id, true).await?;
    Ok(Json(response))
}

/// Deactivate an account in the caller's enterprise
///
/// PATCH /users/{id}/deactivate
async fn deactivate_user(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ActivationResponse>> {
    let response =
        UserService::set_active(state.db(), user.id, user.enterprise_id, id, false).await?;
    Ok(Json(response))
}

/// Change the caller's own password
///
/// PUT /users/password
async fn change_password(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<ChangePasswordRequest>,
) -> ApiResult<Json<Value>> {
    UserService::change_password(state.db(), user.id, &req).await?;
    Ok(Json(json!({ "message": "Password changed successfully" })))
}
