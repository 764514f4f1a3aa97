//! Core user domain types.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, PasswordHash};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors. It also gives the auth middleware a unique type to store in request extensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserId(i64);

impl UserId {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// What a user account is allowed to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// May manage the user roster and admin-defined payment methods on top of
    /// their own data.
    Admin,
    /// May only manage their own expenses, categories and payment methods.
    User,
}

impl Role {
    /// The string stored in the database for this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            _ => Err(Error::InvalidRole(s.to_string())),
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let title = match self {
            Role::Admin => "Admin",
            Role::User => "User",
        };

        write!(f, "{title}")
    }
}

/// A user of the application.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserId,
    /// The email address the user logs in with.
    pub email: String,
    /// The user's password hash.
    pub password_hash: PasswordHash,
    /// What the user is allowed to do.
    pub role: Role,
    /// Whether an administrator has allowed this user to log in.
    pub approved: bool,
    /// When the account was created (UTC).
    pub created_at: OffsetDateTime,
}

#[cfg(test)]
mod role_tests {
    use std::str::FromStr;

    use crate::Error;

    use super::Role;

    #[test]
    fn round_trips_through_storage_string() {
        assert_eq!(Role::from_str(Role::Admin.as_str()), Ok(Role::Admin));
        assert_eq!(Role::from_str(Role::User.as_str()), Ok(Role::User));
    }

    #[test]
    fn rejects_unknown_role_string() {
        assert_eq!(
            Role::from_str("superuser"),
            Err(Error::InvalidRole("superuser".to_string()))
        );
    }
}
