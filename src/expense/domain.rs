//! The core types for recorded expenses.

use rust_decimal::Decimal;
use serde::Deserialize;
use time::{Date, OffsetDateTime};

use crate::{category::CategoryId, payment_method::PaymentMethodId, user::UserId};

/// Alias for expense IDs.
pub type ExpenseId = i64;

/// A single recorded purchase.
///
/// To create a new `Expense`, use [Expense::build].
#[derive(Debug, Clone, PartialEq)]
pub struct Expense {
    /// The ID of the expense.
    pub id: ExpenseId,
    /// How much money was spent, in dinars.
    pub amount: Decimal,
    /// When the purchase happened.
    pub date: Date,
    /// Free-form notes about the purchase.
    pub notes: Option<String>,
    /// The category the expense counts towards, if any.
    pub category_id: Option<CategoryId>,
    /// The payment method that was used, if recorded.
    pub payment_method_id: Option<PaymentMethodId>,
    /// The user who recorded the expense.
    pub user_id: UserId,
    /// When the expense was recorded.
    pub created_at: OffsetDateTime,
}

impl Expense {
    /// Create a new expense.
    ///
    /// Shortcut for [ExpenseBuilder] for discoverability.
    pub fn build(amount: Decimal, date: Date, user_id: UserId) -> ExpenseBuilder {
        ExpenseBuilder {
            amount,
            date,
            user_id,
            notes: None,
            category_id: None,
            payment_method_id: None,
        }
    }
}

/// A builder for creating [Expense] rows.
///
/// The required fields are set by [Expense::build], the optional ones default
/// to `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseBuilder {
    /// How much money was spent, in dinars. Must be positive with at most
    /// three decimal places.
    pub amount: Decimal,
    /// When the purchase happened. Must not be in the future.
    pub date: Date,
    /// The user recording the expense. Referenced categories and payment
    /// methods must be visible to this user.
    pub user_id: UserId,
    /// Free-form notes about the purchase.
    pub notes: Option<String>,
    /// The category to record the expense against.
    pub category_id: Option<CategoryId>,
    /// The payment method that was used.
    pub payment_method_id: Option<PaymentMethodId>,
}

impl ExpenseBuilder {
    /// Set the notes for the expense.
    pub fn notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }

    /// Set the category for the expense.
    pub fn category_id(mut self, category_id: Option<CategoryId>) -> Self {
        self.category_id = category_id;
        self
    }

    /// Set the payment method for the expense.
    pub fn payment_method_id(mut self, payment_method_id: Option<PaymentMethodId>) -> Self {
        self.payment_method_id = payment_method_id;
        self
    }
}

/// The data submitted by the expense create and edit forms.
#[derive(Debug, Deserialize)]
pub struct ExpenseFormData {
    /// The amount spent, in dinars.
    pub amount: Decimal,
    /// The date of the purchase.
    pub date: Date,
    /// Free-form notes. Empty submissions are stored as no notes.
    pub notes: Option<String>,
    /// The selected category, if any. The form select submits an empty string
    /// when nothing is chosen.
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    /// The selected payment method, if any.
    #[serde(default)]
    pub payment_method_id: Option<PaymentMethodId>,
}
