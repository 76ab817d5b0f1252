//! Authentication routes
//!
//! Registration and login. Both are public; password hashing and
//! verification run on the blocking thread pool.

use crate::error::ApiResult;
use crate::services::AuthService;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use crm_platform_shared::types::{
    AccessTokenResponse, LoginRequest, RegisterRequest, UserSummary,
};

/// Create auth routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

/// Register a new account
///
/// POST /auth/register
async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserSummary>)> {
    let summary = AuthService::register(state.db(), &state.config().auth, &req).await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

/// Login with email and password
///
/// POST /auth/login
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AccessTokenResponse>> {
    let response = AuthService::login(state.db(), state.jwt(), &req).await?;
    Ok(Json(response))
}
