//! Data access layer

mod enterprises;
mod users;

pub use enterprises::{EnterpriseRecord, EnterpriseRepository, NewEnterprise};
pub use users::{AuthContextRecord, NewUser, UserCredentials, UserRecord, UserRepository};
