//! Authentication module
//!
//! Provides JWT-based authentication with argon2 password hashing and the
//! request guards enforcing account liveness and role membership.

mod jwt;
mod middleware;
mod password;

pub use jwt::{Claims, JwtService, TOKEN_VALIDITY_SECS};
pub use middleware::{auth_guard, check_required_roles, require_roles, CurrentUser};
pub use password::PasswordService;
