//! Core category domain types.

use std::{fmt::Display, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Error, user::UserId};

/// The icon names a category may use, rendered client-side by the icon font.
pub const CATEGORY_ICONS: [&str; 12] = [
    "ShoppingCart",
    "Home",
    "Car",
    "Coffee",
    "Heart",
    "Briefcase",
    "Book",
    "Smartphone",
    "Utensils",
    "Plane",
    "Gift",
    "Zap",
];

/// A validated, non-empty category name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::EmptyCategoryName] if `name` is an empty string.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyCategoryName)
        } else {
            Ok(Self(name.to_string()))
        }
    }

    /// Create a category name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if the non-empty invariant is violated it will cause incorrect behaviour but not affect memory safety.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for CategoryName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryName::new(s)
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Database identifier for a category.
pub type CategoryId = i64;

/// A spending category owned by one user.
///
/// `expenses_count` and `total_expenses_amount` are maintained incrementally
/// with every expense write rather than recomputed per read, see
/// [crate::category::adjust_category_aggregates].
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    /// The ID of the category.
    pub id: CategoryId,
    /// The name of the category.
    pub name: CategoryName,
    /// The name of the icon displayed next to the category.
    pub icon: String,
    /// An optional CSS hex color for the category, e.g. "#16a34a".
    pub color: Option<String>,
    /// The ID of the user that owns the category.
    pub user_id: UserId,
    /// The number of live expenses referencing this category.
    pub expenses_count: i64,
    /// The exact sum of those expenses' amounts.
    pub total_expenses_amount: Decimal,
}

/// Form data for category creation and editing.
#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryFormData {
    /// The name the user entered for the category.
    pub name: String,
    /// The icon name the user picked.
    pub icon: String,
    /// The hex color the user picked, if any.
    pub color: Option<String>,
}

#[cfg(test)]
mod category_name_tests {
    use crate::{Error, category::CategoryName};

    #[test]
    fn new_fails_on_empty_string() {
        let category_name = CategoryName::new("");

        assert_eq!(category_name, Err(Error::EmptyCategoryName));
    }

    #[test]
    fn new_fails_on_just_whitespace() {
        let category_name = CategoryName::new("\n\t \r");

        assert_eq!(category_name, Err(Error::EmptyCategoryName));
    }

    #[test]
    fn new_trims_surrounding_whitespace() {
        let category_name = CategoryName::new("  Groceries ");

        assert_eq!(category_name, Ok(CategoryName::new_unchecked("Groceries")));
    }

    #[test]
    fn new_succeeds_on_non_empty_string() {
        let category_name = CategoryName::new("🔥");

        assert!(category_name.is_ok())
    }
}
