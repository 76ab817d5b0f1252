//! Authentication and authorization guards
//!
//! Two cooperating stages, composed explicitly at route registration:
//!
//! 1. `auth_guard` validates the bearer token, then re-resolves the
//!    subject to a live account record. Tokens are valid for a week, so
//!    trusting their claims alone would let them outlive an account's or
//!    tenant's deactivation.
//! 2. `require_roles` compares the resolved role against the route's
//!    declared role set. Missing identity with a non-empty set rejects:
//!    the guard fails closed.
//!
//! Each route carries exactly one effective role set, resolved here at
//! registration time.

use crate::error::ApiError;
use crate::repositories::UserRepository;
use crate::state::AppState;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use crm_platform_shared::UserRole;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use uuid::Uuid;

/// The live account resolved for the current request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub enterprise_id: Option<Uuid>,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized("Missing authentication".to_string()))
    }
}

/// Token-validating guard stage.
///
/// Apply with `middleware::from_fn_with_state` to every guarded router.
/// Rejects before any handler runs when the token is missing, malformed,
/// expired, or when the re-fetched account (or its enterprise) is gone or
/// inactive. On success the resolved `CurrentUser` is inserted into the
/// request extensions.
pub async fn auth_guard(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthorized("Invalid authorization format".to_string()))?;

    let claims = state
        .jwt()
        .validate(token)
        .map_err(|_| ApiError::Unauthorized("Invalid or expired token".to_string()))?;

    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| ApiError::Unauthorized("Invalid subject in token".to_string()))?;

    // Re-resolve the subject instead of trusting week-old claims.
    let record = UserRepository::find_auth_context(state.db(), user_id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::Unauthorized("User not found".to_string()))?;

    if !record.is_active {
        return Err(ApiError::Unauthorized(
            "This user has been deactivated".to_string(),
        ));
    }

    if record.enterprise_active == Some(false) {
        return Err(ApiError::Unauthorized(
            "This user's enterprise is inactive".to_string(),
        ));
    }

    request.extensions_mut().insert(CurrentUser {
        id: record.id,
        name: record.name,
        email: record.email,
        role: record.role,
        enterprise_id: record.enterprise_id,
    });

    Ok(next.run(request).await)
}

/// Role membership check shared by the layer and its tests.
///
/// An empty set means the route declared no restriction. A non-empty set
/// with no resolved identity rejects with Forbidden rather than allowing.
pub fn check_required_roles(
    allowed: &[UserRole],
    role: Option<UserRole>,
) -> Result<(), ApiError> {
    if allowed.is_empty() {
        return Ok(());
    }

    let Some(role) = role else {
        return Err(ApiError::Forbidden(
            "Access denied: user not identified".to_string(),
        ));
    };

    if !allowed.contains(&role) {
        return Err(ApiError::Forbidden(
            "Access denied: insufficient role".to_string(),
        ));
    }

    Ok(())
}

/// Declare a route's required-role set.
///
/// Used as a `route_layer` inside routers already wrapped by
/// `auth_guard`, e.g. `.route_layer(require_roles(&[UserRole::Master]))`.
pub fn require_roles(allowed: &'static [UserRole]) -> RequireRoles {
    RequireRoles { allowed }
}

/// Role-checking guard stage (tower layer).
#[derive(Clone, Copy)]
pub struct RequireRoles {
    allowed: &'static [UserRole],
}

impl<S> Layer<S> for RequireRoles {
    type Service = RequireRolesService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequireRolesService {
            inner,
            allowed: self.allowed,
        }
    }
}

#[derive(Clone)]
pub struct RequireRolesService<S> {
    inner: S,
    allowed: &'static [UserRole],
}

impl<S> Service<Request> for RequireRolesService<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let role = request
            .extensions()
            .get::<CurrentUser>()
            .map(|user| user.role);

        if let Err(rejection) = check_required_roles(self.allowed, role) {
            return Box::pin(std::future::ready(Ok(rejection.into_response())));
        }

        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        Box::pin(async move { inner.call(request).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_role_set_allows_anyone() {
        assert!(check_required_roles(&[], None).is_ok());
        assert!(check_required_roles(&[], Some(UserRole::ClientViewer)).is_ok());
    }

    #[test]
    fn test_missing_identity_fails_closed() {
        let result = check_required_roles(&[UserRole::Master], None);
        assert!(matches!(result, Err(ApiError::Forbidden(_))));
    }

    #[test]
    fn test_role_outside_set_is_forbidden() {
        let result = check_required_roles(&[UserRole::Master], Some(UserRole::ClientViewer));
        assert!(matches!(result, Err(ApiError::Forbidden(_))));
    }

    #[test]
    fn test_role_in_set_is_allowed() {
        let allowed = [UserRole::Master, UserRole::ClientAdmin];
        assert!(check_required_roles(&allowed, Some(UserRole::ClientAdmin)).is_ok());
    }

    #[test]
    fn test_current_user_debug() {
        let user = CurrentUser {
            id: Uuid::new_v4(),
            name: "Test".to_string(),
            email: "t@x.com".to_string(),
            role: UserRole::ClientViewer,
            enterprise_id: Some(Uuid::new_v4()),
        };
        let debug_str = format!("{:?}", user);
        assert!(debug_str.contains("CurrentUser"));
    }
}
