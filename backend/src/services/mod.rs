//! Business logic layer

mod auth;
mod enterprises;
mod users;

pub use auth::AuthService;
pub use enterprises::EnterpriseService;
pub use users::UserService;

/// Whether an error chain bottoms out in a database unique-constraint
/// violation. This is the authoritative conflict signal: advisory
/// pre-checks can always lose a race that the constraint cannot.
pub(crate) fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .is_some_and(|db| db.is_unique_violation())
}
