//! Enterprise routes
//!
//! Onboarding is public; everything else sits behind the guard pair.
//! Role sets mirror who may operate on a tenant: platform masters manage
//! the catalog, tenant members read their own record.

use crate::auth::{auth_guard, require_roles, CurrentUser};
use crate::error::ApiResult;
use crate::services::EnterpriseService;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{get, patch, post},
    Json, Router,
};
use crm_platform_shared::types::{
    EnterpriseCreateRequest, EnterpriseSummary, OnboardingRequest, OnboardingResponse,
    UpdateGoalRequest,
};
use crm_platform_shared::UserRole;
use uuid::Uuid;

const MASTER_ONLY: &[UserRole] = &[UserRole::Master];
const TENANT_MEMBERS: &[UserRole] = &[UserRole::ClientAdmin, UserRole::ClientViewer];
const GOAL_EDITORS: &[UserRole] = &[UserRole::Master, UserRole::ClientAdmin];

/// Create enterprise routes
pub fn enterprise_routes(state: AppState) -> Router<AppState> {
    let master = Router::new()
        .route("/enterprises", get(list_enterprises).post(create_enterprise))
        .route("/enterprises/:id", get(get_enterprise))
        .route_layer(require_roles(MASTER_ONLY));

    let tenant = Router::new()
        .route("/enterprises/me", get(my_enterprise))
        .route_layer(require_roles(TENANT_MEMBERS));

    let goal = Router::new()
        .route("/enterprises/goal", patch(update_goal))
        .route_layer(require_roles(GOAL_EDITORS));

    let guarded = Router::new()
        .route("/enterprises/cnpj/:cnpj", get(get_by_cnpj))
        .merge(master)
        .merge(tenant)
        .merge(goal)
        .layer(middleware::from_fn_with_state(state, auth_guard));

    Router::new()
        .route("/enterprises/onboarding", post(onboard))
        .merge(guarded)
}

/// Onboard a new tenant: enterprise + first administrator, atomically
///
/// POST /enterprises/onboarding
async fn onboard(
    State(state): State<AppState>,
    Json(req): Json<OnboardingRequest>,
) -> ApiResult<(StatusCode, Json<OnboardingResponse>)> {
    let response = EnterpriseService::onboard(state.db(), &req).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Create an enterprise directly (MASTER only)
///
/// POST /enterprises
async fn create_enterprise(
    State(state): State<AppState>,
    Json(req): Json<EnterpriseCreateRequest>,
) -> ApiResult<(StatusCode, Json<EnterpriseSummary>)> {
    let summary = EnterpriseService::create(state.db(), &req).await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

/// List all enterprises (MASTER only)
///
/// GET /enterprises
async fn list_enterprises(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<EnterpriseSummary>>> {
    let enterprises = EnterpriseService::list(state.db()).await?;
    Ok(Json(enterprises))
}

/// The caller's own enterprise
///
/// GET /enterprises/me
async fn my_enterprise(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<EnterpriseSummary>> {
    let enterprise = EnterpriseService::get_own(state.db(), user.enterprise_id).await?;
    Ok(Json(enterprise))
}

/// Find an enterprise by id (MASTER only)
///
/// GET /enterprises/{id}
async fn get_enterprise(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<EnterpriseSummary>> {
    let enterprise = EnterpriseService::get(state.db(), id).await?;
    Ok(Json(enterprise))
}

/// Find an enterprise by CNPJ (punctuated or bare)
///
/// GET /enterprises/cnpj/{cnpj}
async fn get_by_cnpj(
    State(state): State<AppState>,
    Path(cnpj): Path<String>,
) -> ApiResult<Json<EnterpriseSummary>> {
    let enterprise = EnterpriseService::get_by_cnpj(state.db(), &cnpj).await?;
    Ok(Json(enterprise))
}

/// Update the monthly revenue goal of the caller's enterprise
///
/// PATCH /enterprises/goal
async fn update_goal(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<UpdateGoalRequest>,
) -> ApiResult<Json<EnterpriseSummary>> {
    let enterprise =
        EnterpriseService::update_goal(state.db(), user.enterprise_id, &req).await?;
    Ok(Json(enterprise))
}
