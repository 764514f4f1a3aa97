//! Core payment method domain types.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    Error,
    user::{Role, User, UserId},
};

/// Alias for payment method IDs.
pub type PaymentMethodId = i64;

/// The name of a payment method, e.g. "Cash" or "KNET".
///
/// The name is trimmed of leading and trailing whitespace, and cannot be empty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct PaymentMethodName(String);

impl PaymentMethodName {
    /// Create and validate a payment method name.
    ///
    /// # Errors
    /// Returns [Error::EmptyPaymentMethodName] if `name` is empty or only
    /// whitespace.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyPaymentMethodName)
        } else {
            Ok(Self(name.to_string()))
        }
    }

    /// Create a payment method name without validation.
    ///
    /// The caller must ensure that the name is not an empty string.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for PaymentMethodName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for PaymentMethodName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentMethodName::new(s)
    }
}

impl Display for PaymentMethodName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a payment method belongs to one user or is shared with everyone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodType {
    /// Created by a user for their own expenses.
    UserDefined,
    /// Created by an administrator and visible to every user.
    AdminDefined,
}

impl MethodType {
    /// The string stored in the database for this method type.
    pub fn as_str(&self) -> &'static str {
        match self {
            MethodType::UserDefined => "user_defined",
            MethodType::AdminDefined => "admin_defined",
        }
    }
}

impl FromStr for MethodType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user_defined" => Ok(MethodType::UserDefined),
            "admin_defined" => Ok(MethodType::AdminDefined),
            _ => Err(Error::InvalidMethodType(s.to_string())),
        }
    }
}

/// A way of paying for an expense.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentMethod {
    /// The payment method's ID in the application database.
    pub id: PaymentMethodId,
    /// The name of the payment method.
    pub name: PaymentMethodName,
    /// Whether the method is owned by one user or shared with everyone.
    pub method_type: MethodType,
    /// The owning user. `None` for admin-defined methods.
    pub user_id: Option<UserId>,
}

impl PaymentMethod {
    /// Whether `user` may rename or delete this payment method.
    ///
    /// Users may modify their own methods. Admin-defined methods are visible
    /// to everyone but only administrators may modify them.
    pub fn can_be_modified_by(&self, user: &User) -> bool {
        match self.method_type {
            MethodType::UserDefined => self.user_id == Some(user.id),
            MethodType::AdminDefined => user.role == Role::Admin,
        }
    }
}

/// The data submitted from payment method forms.
///
/// `shared` comes from a checkbox only shown to administrators, so it either
/// has a string value or is not set (see the
/// [MDN docs](https://developer.mozilla.org/en-US/docs/Web/HTML/Element/input/checkbox#value_2)).
#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentMethodFormData {
    pub name: String,
    pub shared: Option<String>,
}
