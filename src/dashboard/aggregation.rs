//! Expense reductions for the dashboard's figures and charts.
//!
//! Provides functions to total expenses by month, compute the headline
//! spending figures, and rank categories for the breakdown pie chart.

use std::collections::HashMap;

use rust_decimal::Decimal;
use time::{Date, Month};

use crate::{
    category::Category,
    charts::{PIE_PALETTE, PieSlice},
};

use super::expense::ExpenseAmount;

/// The dashboard's headline spending figures.
///
/// All figures are rounded to whole fils so they match what the currency
/// formatter displays.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct SpendingSummary {
    /// Everything spent between the first of the current month and today.
    pub month_to_date: Decimal,
    /// Everything spent since the first of January.
    pub year_to_date: Decimal,
    /// The month-to-date total divided by the current day of the month.
    pub daily_average: Decimal,
    /// The month-to-date total divided by four.
    pub weekly_average: Decimal,
    /// The year-to-date total divided by twelve.
    pub monthly_average: Decimal,
}

/// Compute the headline spending figures from the expenses dated within the
/// last year.
pub(super) fn calculate_spending_summary(
    expenses: &[ExpenseAmount],
    today: Date,
) -> SpendingSummary {
    let month_start = today.replace_day(1).unwrap();
    let year_start = today.replace_ordinal(1).unwrap();

    let mut month_to_date = Decimal::ZERO;
    let mut year_to_date = Decimal::ZERO;

    for expense in expenses {
        if expense.date >= year_start && expense.date <= today {
            year_to_date += expense.amount;
        }

        if expense.date >= month_start && expense.date <= today {
            month_to_date += expense.amount;
        }
    }

    SpendingSummary {
        month_to_date,
        year_to_date,
        daily_average: (month_to_date / Decimal::from(today.day())).round_dp(3),
        weekly_average: (month_to_date / Decimal::from(4)).round_dp(3),
        monthly_average: (year_to_date / Decimal::from(12)).round_dp(3),
    }
}

/// The first day of each of the `count` months ending at `today`'s month,
/// oldest first.
pub(super) fn trailing_month_starts(today: Date, count: usize) -> Vec<Date> {
    let mut month_start = today.replace_day(1).unwrap();
    let mut months = Vec::with_capacity(count);

    for _ in 0..count {
        months.push(month_start);
        month_start = previous_month(month_start);
    }

    months.reverse();
    months
}

fn previous_month(month_start: Date) -> Date {
    let month = month_start.month().previous();
    let year = if month == Month::December {
        month_start.year() - 1
    } else {
        month_start.year()
    };

    Date::from_calendar_date(year, month, 1).unwrap()
}

/// Total expense amounts by calendar month.
fn total_by_month(expenses: &[ExpenseAmount]) -> HashMap<Date, Decimal> {
    let mut totals = HashMap::new();

    for expense in expenses {
        let month = expense.date.replace_day(1).unwrap();
        *totals.entry(month).or_insert(Decimal::ZERO) += expense.amount;
    }

    totals
}

/// Monthly spending totals for the bar chart, zero-filled so that every
/// month in `month_starts` gets a value.
pub(super) fn monthly_series(expenses: &[ExpenseAmount], month_starts: &[Date]) -> Vec<Decimal> {
    let totals = total_by_month(expenses);

    month_starts
        .iter()
        .map(|month| totals.get(month).copied().unwrap_or(Decimal::ZERO))
        .collect()
}

/// Format month dates as three-letter abbreviations for chart axes.
pub(super) fn format_month_labels(months: &[Date]) -> Vec<String> {
    let month_to_str = |date: &Date| {
        match date.month() {
            Month::January => "Jan",
            Month::February => "Feb",
            Month::March => "Mar",
            Month::April => "Apr",
            Month::May => "May",
            Month::June => "Jun",
            Month::July => "Jul",
            Month::August => "Aug",
            Month::September => "Sep",
            Month::October => "Oct",
            Month::November => "Nov",
            Month::December => "Dec",
        }
        .to_string()
    };

    months.iter().map(month_to_str).collect()
}

/// The category with the most spent against it, if anything has been spent.
///
/// Trusts the maintained aggregate totals rather than recomputing them.
pub(super) fn top_category(categories: &[Category]) -> Option<&Category> {
    categories
        .iter()
        .filter(|category| category.total_expenses_amount > Decimal::ZERO)
        .max_by(|a, b| a.total_expenses_amount.cmp(&b.total_expenses_amount))
}

/// The top `count` categories by aggregate total, largest first, as pie
/// slices.
///
/// Categories with nothing spent against them are skipped. Slices take the
/// category's stored color when it has one and a palette color otherwise.
pub(super) fn category_breakdown(categories: &[Category], count: usize) -> Vec<PieSlice> {
    let mut ranked: Vec<&Category> = categories
        .iter()
        .filter(|category| category.total_expenses_amount > Decimal::ZERO)
        .collect();
    ranked.sort_by(|a, b| b.total_expenses_amount.cmp(&a.total_expenses_amount));

    ranked
        .into_iter()
        .take(count)
        .enumerate()
        .map(|(rank, category)| PieSlice {
            name: category.name.to_string(),
            value: category.total_expenses_amount,
            color: category
                .color
                .clone()
                .unwrap_or_else(|| PIE_PALETTE[rank % PIE_PALETTE.len()].to_owned()),
        })
        .collect()
}
