//! The filtered report page.
//!
//! Reuses the expense filter form and query so the report always agrees with
//! the expenses listing, and adds a grand total over the matching rows.

use axum::{
    Extension,
    extract::State,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Query since that collects repeated category_ids keys
// into a Vec and parses empty values as None, neither of which axum's Query
// does.
use axum_extra::extract::Query;
use maud::{Markup, html};
use rust_decimal::Decimal;

use crate::{
    Error,
    category::{Category, get_all_categories},
    endpoints,
    expense::{
        AnnotatedExpense, ExpenseFilter, ExpensesQueryParams, filter_form_view, get_expenses,
    },
    html::{
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base, format_currency,
    },
    navigation::NavBar,
    timezone::{get_local_offset, local_date},
    user::{Role, UserId, get_user_by_id},
};

use super::ReportsState;

/// Render the filtered report page: every expense matching the filters in the
/// query string, newest first, with a grand total.
pub async fn get_reports_page(
    State(state): State<ReportsState>,
    Extension(user_id): Extension<UserId>,
    Query(query): Query<ExpensesQueryParams>,
) -> Result<Response, Error> {
    let filter = ExpenseFilter::from(query);

    let local_timezone = get_local_offset(&state.local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        Error::InvalidTimezoneError(state.local_timezone.clone())
    })?;
    let today = local_date(local_timezone);

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let user = get_user_by_id(user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve user: {error}"))?;

    let available_categories = get_all_categories(user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve categories: {error}"))?;

    let expenses = get_expenses(&filter, user_id, today, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve expenses: {error}"))?;

    Ok(reports_view(
        &expenses,
        &filter,
        &available_categories,
        user.role == Role::Admin,
    )
    .into_response())
}

fn reports_view(
    expenses: &[AnnotatedExpense],
    filter: &ExpenseFilter,
    available_categories: &[Category],
    is_admin: bool,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::REPORTS_VIEW, is_admin).into_html();
    let grand_total = expenses
        .iter()
        .fold(Decimal::ZERO, |total, row| total + row.expense.amount);
    let results_label = match expenses.len() {
        1 => "1 matching expense".to_owned(),
        count => format!("{count} matching expenses"),
    };

    let table_row = |row: &AnnotatedExpense| {
        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                td class=(TABLE_CELL_STYLE)
                {
                    time datetime=(row.expense.date) { (row.expense.date) }
                }

                td class=(TABLE_CELL_STYLE)
                {
                    @if let Some(name) = &row.category_name {
                        (name)
                    } @else {
                        span class="text-gray-400 dark:text-gray-500" { "-" }
                    }
                }

                td class=(TABLE_CELL_STYLE)
                {
                    @if let Some(notes) = &row.expense.notes {
                        (notes)
                    } @else {
                        span class="text-gray-400 dark:text-gray-500" { "-" }
                    }
                }

                td class="px-6 py-4 text-right tabular-nums"
                {
                    (format_currency(row.expense.amount))
                }
            }
        )
    };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="w-full space-y-4 lg:max-w-5xl lg:mx-auto"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Reports" }

                    a href=(endpoints::YEARLY_REPORT_VIEW) class=(LINK_STYLE)
                    {
                        "Yearly Report"
                    }
                }

                section class="rounded bg-gray-50 p-4 dark:bg-gray-800"
                {
                    (filter_form_view(endpoints::REPORTS_VIEW, filter, available_categories))
                }

                p class="text-sm text-gray-500 dark:text-gray-400" { (results_label) }

                section class="dark:bg-gray-800"
                {
                    div class="overflow-x-auto rounded-lg shadow"
                    {
                        table
                            class="w-full text-sm text-left rtl:text-right
                                text-gray-500 dark:text-gray-400"
                        {
                            thead class=(TABLE_HEADER_STYLE)
                            {
                                tr
                                {
                                    th scope="col" class=(TABLE_CELL_STYLE)
                                    {
                                        "Date"
                                    }
                                    th scope="col" class=(TABLE_CELL_STYLE)
                                    {
                                        "Category"
                                    }
                                    th scope="col" class=(TABLE_CELL_STYLE)
                                    {
                                        "Notes"
                                    }
                                    th scope="col" class="px-6 py-3 text-right"
                                    {
                                        "Amount"
                                    }
                                }
                            }

                            tbody
                            {
                                @for row in expenses {
                                    (table_row(row))
                                }

                                @if expenses.is_empty() {
                                    tr
                                    {
                                        td
                                            colspan="4"
                                            class="px-6 py-4 text-center
                                                text-gray-500 dark:text-gray-400"
                                        {
                                            "No expenses match the current filters."
                                        }
                                    }
                                }
                            }

                            tfoot
                            {
                                tr class="font-semibold text-gray-900 dark:text-white"
                                {
                                    th scope="row" colspan="3" class="px-6 py-3 text-base"
                                    {
                                        "Total"
                                    }
                                    td class="px-6 py-3 text-right tabular-nums"
                                    {
                                        (format_currency(grand_total))
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base("Reports", &[], &content)
}
