//! User types.

use bolster_commerce::ids::UserId;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// User role for authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Role {
    /// Regular customer.
    #[default]
    Customer,
    /// Store administrator.
    Admin,
}

impl Role {
    /// Get role as string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Role::Customer),
            "admin" => Ok(Role::Admin),
            _ => Err(()),
        }
    }
}

/// An authenticated user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    /// User ID.
    pub id: UserId,
    /// Email address (unique).
    pub email: String,
    /// Display name.
    pub name: String,
    /// Role for authorization.
    pub role: Role,
    /// Unix timestamp of creation.
    pub created_at: i64,
}

impl User {
    /// Create a new customer.
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: UserId::generate(),
            email: email.into(),
            name: name.into(),
            role: Role::Customer,
            created_at: current_timestamp(),
        }
    }

    /// Check if the user can access the admin back-office.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Get current Unix timestamp.
fn current_timestamp() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_is_customer() {
        let user = User::new("a@example.com", "A");
        assert_eq!(user.role, Role::Customer);
        assert!(!user.is_admin());
    }

    #[test]
    fn test_role_roundtrip() {
        assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!(Role::Admin.as_str(), "admin");
        assert!("superuser".parse::<Role>().is_err());
    }
}
