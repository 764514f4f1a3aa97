//! Filtered queries over a user's expenses.
//!
//! The expenses page and the reports build their listings from
//! [get_expenses], which assembles a WHERE clause from whichever filters are
//! set and annotates each row with its category and payment method names.

use rusqlite::{Connection, Row, params_from_iter, types::Value};
use rust_decimal::Decimal;
use time::{Date, Month, util::days_in_year_month};

use crate::{
    Error,
    category::{CategoryId, CategoryName},
    money::to_milliunits,
    payment_method::PaymentMethodName,
    user::UserId,
};

use super::{db::map_row, domain::Expense};

/// The filters a user can apply to their expense listing.
///
/// Explicit `date_from`/`date_to` bounds take precedence over `year` and
/// `month`. A `month` without a `year` means that month of the current year.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseFilter {
    /// Only include expenses recorded against one of these categories.
    /// An empty list includes every expense.
    pub category_ids: Vec<CategoryId>,
    /// Only include expenses from this calendar year.
    pub year: Option<i32>,
    /// Only include expenses from this month (1 to 12).
    pub month: Option<u8>,
    /// Only include expenses on or after this date.
    pub date_from: Option<Date>,
    /// Only include expenses on or before this date.
    pub date_to: Option<Date>,
    /// Only include expenses of at least this amount, in dinars.
    pub min_amount: Option<Decimal>,
    /// Only include expenses of at most this amount, in dinars.
    pub max_amount: Option<Decimal>,
}

/// An expense annotated with the display names its row references.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedExpense {
    pub expense: Expense,
    /// The name of the expense's category, if it has one.
    pub category_name: Option<CategoryName>,
    /// The color of the expense's category, if one was set.
    pub category_color: Option<String>,
    /// The name of the payment method that was used, if recorded.
    pub payment_method_name: Option<PaymentMethodName>,
}

/// Retrieve the expenses of `user_id` matching `filter`, most recent first.
///
/// Expenses on the same date are returned in reverse insertion order.
/// `today` anchors a month filter that does not name a year.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidDateFormat] if the filter's month is not a calendar month,
/// - [Error::InvalidAmount] if an amount bound has more than three decimal places,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_expenses(
    filter: &ExpenseFilter,
    user_id: UserId,
    today: Date,
    connection: &Connection,
) -> Result<Vec<AnnotatedExpense>, Error> {
    let mut query_string_parts = vec![
        "SELECT expense.id, expense.amount, expense.date, expense.notes, \
         expense.category_id, expense.payment_method_id, expense.user_id, expense.created_at, \
         category.name, category.color, payment_method.name \
         FROM expense \
         LEFT JOIN category ON category.id = expense.category_id \
         LEFT JOIN payment_method ON payment_method.id = expense.payment_method_id"
            .to_string(),
    ];
    let mut where_clause_parts = vec![];
    let mut query_parameters: Vec<Value> = vec![];

    query_parameters.push(Value::Integer(user_id.as_i64()));
    where_clause_parts.push(format!("expense.user_id = ?{}", query_parameters.len()));

    if !filter.category_ids.is_empty() {
        let placeholders = filter
            .category_ids
            .iter()
            .map(|category_id| {
                query_parameters.push(Value::Integer(*category_id));
                format!("?{}", query_parameters.len())
            })
            .collect::<Vec<_>>()
            .join(", ");
        where_clause_parts.push(format!("expense.category_id IN ({placeholders})"));
    }

    let (date_from, date_to) = resolve_date_bounds(filter, today)?;

    if let Some(date_from) = date_from {
        query_parameters.push(Value::Text(date_from.to_string()));
        where_clause_parts.push(format!("expense.date >= ?{}", query_parameters.len()));
    }

    if let Some(date_to) = date_to {
        query_parameters.push(Value::Text(date_to.to_string()));
        where_clause_parts.push(format!("expense.date <= ?{}", query_parameters.len()));
    }

    if let Some(min_amount) = filter.min_amount {
        let milliunits = to_milliunits(min_amount).ok_or(Error::InvalidAmount(min_amount))?;
        query_parameters.push(Value::Integer(milliunits));
        where_clause_parts.push(format!("expense.amount >= ?{}", query_parameters.len()));
    }

    if let Some(max_amount) = filter.max_amount {
        let milliunits = to_milliunits(max_amount).ok_or(Error::InvalidAmount(max_amount))?;
        query_parameters.push(Value::Integer(milliunits));
        where_clause_parts.push(format!("expense.amount <= ?{}", query_parameters.len()));
    }

    query_string_parts.push(String::from("WHERE ") + &where_clause_parts.join(" AND "));
    query_string_parts.push("ORDER BY expense.date DESC, expense.id DESC".to_string());

    let query_string = query_string_parts.join(" ");
    let params = params_from_iter(query_parameters.iter());

    connection
        .prepare(&query_string)?
        .query_map(params, map_annotated_row)?
        .map(|maybe_expense| maybe_expense.map_err(|error| error.into()))
        .collect()
}

/// Retrieve the `limit` most recently recorded expenses of `user_id`,
/// annotated with their category and payment method names.
pub fn get_recent_expenses(
    user_id: UserId,
    limit: u32,
    connection: &Connection,
) -> Result<Vec<AnnotatedExpense>, Error> {
    connection
        .prepare(
            "SELECT expense.id, expense.amount, expense.date, expense.notes,
             expense.category_id, expense.payment_method_id, expense.user_id, expense.created_at,
             category.name, category.color, payment_method.name
             FROM expense
             LEFT JOIN category ON category.id = expense.category_id
             LEFT JOIN payment_method ON payment_method.id = expense.payment_method_id
             WHERE expense.user_id = :user_id
             ORDER BY expense.created_at DESC, expense.id DESC
             LIMIT :limit",
        )?
        .query_map(
            &[
                (":user_id", &user_id.as_i64()),
                (":limit", &i64::from(limit)),
            ],
            map_annotated_row,
        )?
        .map(|maybe_expense| maybe_expense.map_err(|error| error.into()))
        .collect()
}

/// Resolve the filter's inclusive date range.
fn resolve_date_bounds(
    filter: &ExpenseFilter,
    today: Date,
) -> Result<(Option<Date>, Option<Date>), Error> {
    if filter.date_from.is_some() || filter.date_to.is_some() {
        return Ok((filter.date_from, filter.date_to));
    }

    if let Some(month_number) = filter.month {
        let year = filter.year.unwrap_or(today.year());
        let month = Month::try_from(month_number).map_err(|error| {
            Error::InvalidDateFormat(error.to_string(), month_number.to_string())
        })?;

        let first = Date::from_calendar_date(year, month, 1)
            .map_err(|error| Error::InvalidDateFormat(error.to_string(), year.to_string()))?;
        let last = Date::from_calendar_date(year, month, days_in_year_month(year, month))
            .map_err(|error| Error::InvalidDateFormat(error.to_string(), year.to_string()))?;

        return Ok((Some(first), Some(last)));
    }

    if let Some(year) = filter.year {
        let first = Date::from_calendar_date(year, Month::January, 1)
            .map_err(|error| Error::InvalidDateFormat(error.to_string(), year.to_string()))?;
        let last = Date::from_calendar_date(year, Month::December, 31)
            .map_err(|error| Error::InvalidDateFormat(error.to_string(), year.to_string()))?;

        return Ok((Some(first), Some(last)));
    }

    Ok((None, None))
}

fn map_annotated_row(row: &Row) -> Result<AnnotatedExpense, rusqlite::Error> {
    let expense = map_row(row)?;
    let category_name = row
        .get::<usize, Option<String>>(8)?
        .map(|name| CategoryName::new_unchecked(&name));
    let category_color = row.get(9)?;
    let payment_method_name = row
        .get::<usize, Option<String>>(10)?
        .map(|name| PaymentMethodName::new_unchecked(&name));

    Ok(AnnotatedExpense {
        expense,
        category_name,
        category_color,
        payment_method_name,
    })
}
