//! Conversion between decimal dinar amounts and the integer milliunit
//! representation used in the database.
//!
//! Amounts are stored in SQLite as whole milliunits (the Kuwaiti dinar is
//! divided into 1000 fils) so that the category aggregate columns can be
//! adjusted with plain integer arithmetic and compare exactly.

use rust_decimal::{Decimal, prelude::ToPrimitive};

use crate::Error;

/// The number of milliunits (fils) in one dinar.
pub const MILLIUNITS_PER_DINAR: i64 = 1_000;

/// Validate `amount` as an expense amount and convert it to milliunits.
///
/// # Errors
/// Returns [Error::InvalidAmount] if `amount` is zero or negative, or has
/// more than three decimal places.
pub fn validate_amount(amount: Decimal) -> Result<i64, Error> {
    if amount <= Decimal::ZERO {
        return Err(Error::InvalidAmount(amount));
    }

    to_milliunits(amount).ok_or(Error::InvalidAmount(amount))
}

/// Convert a decimal dinar amount to whole milliunits.
///
/// Returns `None` if `amount` has more than three decimal places or does not
/// fit in an `i64`.
pub fn to_milliunits(amount: Decimal) -> Option<i64> {
    let scaled = amount * Decimal::from(MILLIUNITS_PER_DINAR);

    if !scaled.is_integer() {
        return None;
    }

    scaled.to_i64()
}

/// Convert whole milliunits back to a decimal dinar amount with three
/// decimal places.
pub fn from_milliunits(milliunits: i64) -> Decimal {
    Decimal::new(milliunits, 3)
}
