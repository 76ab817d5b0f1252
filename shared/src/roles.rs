//! User role enumeration
//!
//! Roles are a small closed set. `Master` is platform-wide and belongs to
//! no enterprise; the client roles always belong to exactly one.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of account roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    /// Platform operator. Not attached to any enterprise.
    Master,
    /// Enterprise administrator.
    ClientAdmin,
    /// Enterprise member with reduced privileges.
    ClientViewer,
}

impl UserRole {
    /// Client roles must reference an enterprise; `Master` must not.
    pub fn requires_enterprise(&self) -> bool {
        !matches!(self, UserRole::Master)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Master => "MASTER",
            UserRole::ClientAdmin => "CLIENT_ADMIN",
            UserRole::ClientViewer => "CLIENT_VIEWER",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MASTER" => Ok(UserRole::Master),
            "CLIENT_ADMIN" => Ok(UserRole::ClientAdmin),
            "CLIENT_VIEWER" => Ok(UserRole::ClientViewer),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_uses_wire_names() {
        let json = serde_json::to_string(&UserRole::ClientAdmin).unwrap();
        assert_eq!(json, "\"CLIENT_ADMIN\"");

        let role: UserRole = serde_json::from_str("\"MASTER\"").unwrap();
        assert_eq!(role, UserRole::Master);
    }

    #[test]
    fn test_display_round_trips_through_from_str() {
        for role in [UserRole::Master, UserRole::ClientAdmin, UserRole::ClientViewer] {
            assert_eq!(role.to_string().parse::<UserRole>().unwrap(), role);
        }
    }

    #[test]
    fn test_only_master_is_enterprise_free() {
        assert!(!UserRole::Master.requires_enterprise());
        assert!(UserRole::ClientAdmin.requires_enterprise());
        assert!(UserRole::ClientViewer.requires_enterprise());
    }
}
