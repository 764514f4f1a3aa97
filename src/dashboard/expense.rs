//! Database query for the dashboard's expense window.
//!
//! The dashboard reduces one year of expense rows in memory, so it uses a
//! row type trimmed down to the two fields the reductions look at.

use std::ops::RangeInclusive;

use rusqlite::{Connection, named_params};
use rust_decimal::Decimal;
use time::Date;

use crate::{Error, money::from_milliunits, user::UserId};

/// An expense row trimmed down to the fields the dashboard reductions need.
///
/// This is separate from the full expense model because the summary figures
/// and the bar chart only look at amounts and dates.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct ExpenseAmount {
    pub amount: Decimal,
    pub date: Date,
}

/// Get the amount and date of `user_id`'s expenses dated within `date_range`.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub(super) fn get_expense_amounts_in_date_range(
    date_range: RangeInclusive<Date>,
    user_id: UserId,
    connection: &Connection,
) -> Result<Vec<ExpenseAmount>, Error> {
    connection
        .prepare(
            "SELECT amount, date FROM expense
             WHERE user_id = :user_id AND date BETWEEN :date_from AND :date_to;",
        )?
        .query_map(
            named_params! {
                ":user_id": user_id.as_i64(),
                ":date_from": date_range.start(),
                ":date_to": date_range.end(),
            },
            |row| {
                let amount_milliunits: i64 = row.get(0)?;

                Ok(ExpenseAmount {
                    amount: from_milliunits(amount_milliunits),
                    date: row.get(1)?,
                })
            },
        )?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|error| error.into())
}
