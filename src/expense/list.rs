//! Expenses listing page with the filter form.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
// Must use axum_extra's Query since that collects repeated category_ids keys
// into a Vec and parses empty values as None, neither of which axum's Query
// does.
use axum_extra::extract::Query;
use maud::{Markup, html};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Deserialize;
use time::Date;
use unicode_segmentation::UnicodeSegmentation;

use crate::{
    AppState, Error,
    category::{Category, CategoryId, CategoryName, get_all_categories},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, CATEGORY_BADGE_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base, edit_delete_action_links, format_currency,
    },
    navigation::NavBar,
    timezone::{get_local_offset, local_date},
    user::{Role, UserId, get_user_by_id},
};

use super::query::{AnnotatedExpense, ExpenseFilter, get_expenses};

/// The max number of graphemes to display in the expense table rows before
/// truncating and displaying ellipses.
const MAX_NOTES_GRAPHEMES: usize = 32;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// The state needed for the expenses listing page.
#[derive(Debug, Clone)]
pub struct ExpensesPageState {
    /// The local timezone as a canonical timezone name, e.g. "Asia/Kuwait".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ExpensesPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The filter values accepted by the expenses page query string.
#[derive(Debug, Default, Deserialize)]
pub struct ExpensesQueryParams {
    #[serde(default)]
    pub category_ids: Vec<CategoryId>,
    pub year: Option<i32>,
    pub month: Option<u8>,
    pub date_from: Option<Date>,
    pub date_to: Option<Date>,
    pub min_amount: Option<Decimal>,
    pub max_amount: Option<Decimal>,
}

impl From<ExpensesQueryParams> for ExpenseFilter {
    fn from(query: ExpensesQueryParams) -> Self {
        Self {
            category_ids: query.category_ids,
            year: query.year,
            month: query.month,
            date_from: query.date_from,
            date_to: query.date_to,
            min_amount: query.min_amount,
            max_amount: query.max_amount,
        }
    }
}

/// Render the expenses listing page, newest first, restricted to the filters
/// in the query string.
pub async fn get_expenses_page(
    State(state): State<ExpensesPageState>,
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

    Ok(expenses_view(
        &expenses,
        &filter,
        &available_categories,
        user.role == Role::Admin,
    )
    .into_response())
}

/// The category name in a pill, prefixed with a dot in the category's color
/// when one is set.
fn expense_category_badge(name: &CategoryName, color: Option<&str>) -> Markup {
    html!(
        span class=(CATEGORY_BADGE_STYLE)
        {
            @if let Some(color) = color {
                span
                    class="mr-1.5 inline-block h-2 w-2 rounded-full"
                    style=(format!("background-color: {color}"))
                {}
            }

            (name)
        }
    )
}

fn expenses_view(
    expenses: &[AnnotatedExpense],
    filter: &ExpenseFilter,
    available_categories: &[Category],
    is_admin: bool,
) -> Markup {
    let new_expense_route = endpoints::NEW_EXPENSE_VIEW;
    let nav_bar = NavBar::new(endpoints::EXPENSES_VIEW, is_admin).into_html();
    let is_filtered = *filter != ExpenseFilter::default();

    let table_row = |row: &AnnotatedExpense| {
        let edit_url = endpoints::format_endpoint(endpoints::EDIT_EXPENSE_VIEW, row.expense.id);
        let delete_url = endpoints::format_endpoint(endpoints::DELETE_EXPENSE, row.expense.id);
        let notes_cell = match &row.expense.notes {
            Some(notes) => {
                let (display, tooltip) = format_notes(notes);
                html!( td class=(TABLE_CELL_STYLE) title=[tooltip] { (display) } )
            }
            None => html!(
                td class=(TABLE_CELL_STYLE)
                {
                    span class="text-gray-400 dark:text-gray-500" { "-" }
                }
            ),
        };

        html!(
            tr class=(TABLE_ROW_STYLE) data-expense-row="true"
            {
                td class=(TABLE_CELL_STYLE)
                {
                    time datetime=(row.expense.date) { (row.expense.date) }
                }

                td class=(TABLE_CELL_STYLE)
                {
                    @if let Some(name) = &row.category_name {
                        (expense_category_badge(name, row.category_color.as_deref()))
                    } @else {
                        span class="text-gray-400 dark:text-gray-500" { "-" }
                    }
                }

                (notes_cell)

                td class=(TABLE_CELL_STYLE)
                {
                    @if let Some(payment_method_name) = &row.payment_method_name {
                        (payment_method_name)
                    } @else {
                        span class="text-gray-400 dark:text-gray-500" { "-" }
                    }
                }

                td class="px-6 py-4 text-right tabular-nums"
                {
                    (format_currency(row.expense.amount))
                }

                td class=(TABLE_CELL_STYLE)
                {
                    div class="flex gap-4"
                    {
                        (edit_delete_action_links(
                            &edit_url,
                            &delete_url,
                            "Are you sure you want to delete this expense? This cannot be undone.",
                            "closest tr",
                            "delete",
                        ))
                    }
                }
            }
        )
    };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Expenses" }

                    a href=(new_expense_route) class=(LINK_STYLE)
                    {
                        "Record Expense"
                    }
                }

                section class="rounded bg-gray-50 p-4 dark:bg-gray-800 lg:max-w-5xl lg:w-full lg:mx-auto"
                {
                    (filter_form_view(endpoints::EXPENSES_VIEW, filter, available_categories))
                }

                (expense_cards_view(expenses, is_filtered, new_expense_route))

                section class="hidden lg:block dark:bg-gray-800 lg:max-w-5xl lg:w-full lg:mx-auto"
                {
                    table class="w-full text-sm text-left rtl:text-right
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
                                th scope="col" class=(TABLE_CELL_STYLE)
                                {
                                    "Payment Method"
                                }
                                th scope="col" class="px-6 py-3 text-right"
                                {
                                    "Amount"
                                }
                                th scope="col" class=(TABLE_CELL_STYLE)
                                {
                                    "Actions"
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
                                        colspan="6"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        (empty_state_message(is_filtered, new_expense_route))
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base("Expenses", &[], &content)
}

fn empty_state_message(is_filtered: bool, new_expense_route: &str) -> Markup {
    html!(
        @if is_filtered {
            "No expenses match the current filters."
        } @else {
            "No expenses recorded yet. "
            a href=(new_expense_route) class=(LINK_STYLE)
            {
                "Record your first expense"
            }
        }
    )
}

/// The shared filter form for the expenses listing and the filtered report.
///
/// `action` is the route the form submits to; the "Clear" link also points
/// there so clearing keeps the user on the same page.
pub(crate) fn filter_form_view(
    action: &str,
    filter: &ExpenseFilter,
    available_categories: &[Category],
) -> Markup {
    html!(
        form method="get" action=(action) class="grid gap-4 md:grid-cols-3 lg:grid-cols-4 items-end"
        {
            div
            {
                label for="category_ids" class=(FORM_LABEL_STYLE) { "Categories" }

                select
                    id="category_ids"
                    name="category_ids"
                    multiple
                    size="3"
                    class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for category in available_categories {
                        @if filter.category_ids.contains(&category.id) {
                            option value=(category.id) selected { (category.name) }
                        } @else {
                            option value=(category.id) { (category.name) }
                        }
                    }
                }
            }

            div
            {
                label for="year" class=(FORM_LABEL_STYLE) { "Year" }

                input
                    id="year"
                    name="year"
                    type="number"
                    placeholder="Year"
                    value=[filter.year]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="month" class=(FORM_LABEL_STYLE) { "Month" }

                select id="month" name="month" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "Any month" }

                    @for (index, month_name) in MONTH_NAMES.iter().enumerate() {
                        @let month_number = index as u8 + 1;

                        @if Some(month_number) == filter.month {
                            option value=(month_number) selected { (month_name) }
                        } @else {
                            option value=(month_number) { (month_name) }
                        }
                    }
                }
            }

            div
            {
                label for="date_from" class=(FORM_LABEL_STYLE) { "From" }

                input
                    id="date_from"
                    name="date_from"
                    type="date"
                    value=[filter.date_from]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="date_to" class=(FORM_LABEL_STYLE) { "To" }

                input
                    id="date_to"
                    name="date_to"
                    type="date"
                    value=[filter.date_to]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="min_amount" class=(FORM_LABEL_STYLE) { "Min Amount" }

                input
                    id="min_amount"
                    name="min_amount"
                    type="number"
                    step="0.001"
                    min="0"
                    placeholder="0.000"
                    value=[filter.min_amount]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="max_amount" class=(FORM_LABEL_STYLE) { "Max Amount" }

                input
                    id="max_amount"
                    name="max_amount"
                    type="number"
                    step="0.001"
                    min="0"
                    placeholder="0.000"
                    value=[filter.max_amount]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div class="flex items-center gap-4"
            {
                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Apply Filters" }

                a href=(action) class=(LINK_STYLE) { "Clear" }
            }
        }
    )
}

fn expense_cards_view(
    expenses: &[AnnotatedExpense],
    is_filtered: bool,
    new_expense_route: &str,
) -> Markup {
    struct ExpenseCardView<'a> {
        row: &'a AnnotatedExpense,
        amount: String,
        notes: Option<(String, Option<&'a str>)>,
        edit_url: String,
        delete_url: String,
    }

    let cards = expenses
        .iter()
        .map(|row| ExpenseCardView {
            row,
            amount: format_currency(row.expense.amount),
            notes: row.expense.notes.as_deref().map(format_notes),
            edit_url: endpoints::format_endpoint(endpoints::EDIT_EXPENSE_VIEW, row.expense.id),
            delete_url: endpoints::format_endpoint(endpoints::DELETE_EXPENSE, row.expense.id),
        })
        .collect::<Vec<_>>();

    html!(
        ul class="lg:hidden space-y-4"
        {
            @for card in &cards {
                li class="rounded border border-gray-200 bg-white px-4 py-3 shadow-sm dark:border-gray-700 dark:bg-gray-800"
                    data-expense-card="true"
                {
                    div class="flex items-start justify-between gap-3"
                    {
                        div class="min-w-0 flex-1"
                        {
                            time
                                datetime=(card.row.expense.date)
                                class="text-sm font-medium text-gray-900 dark:text-white"
                            {
                                (card.row.expense.date)
                            }

                            @if let Some(name) = &card.row.category_name {
                                div class="mt-1"
                                {
                                    (expense_category_badge(name, card.row.category_color.as_deref()))
                                }
                            }
                        }

                        span class="shrink-0 text-sm tabular-nums text-right whitespace-nowrap text-gray-900 dark:text-white"
                        {
                            (card.amount)
                        }
                    }

                    @if let Some((notes, tooltip)) = &card.notes {
                        div class="mt-2 text-sm text-gray-500 dark:text-gray-400" title=[tooltip]
                        {
                            (notes)
                        }
                    }

                    div class="mt-3 flex items-center justify-between gap-3 border-t border-gray-200 pt-2 dark:border-gray-700/80"
                    {
                        span class="text-xs text-gray-500 dark:text-gray-400"
                        {
                            @if let Some(payment_method_name) = &card.row.payment_method_name {
                                (payment_method_name)
                            } @else {
                                "-"
                            }
                        }

                        div class="flex items-center gap-4 text-sm"
                        {
                            (edit_delete_action_links(
                                &card.edit_url,
                                &card.delete_url,
                                "Are you sure you want to delete this expense? This cannot be undone.",
                                "closest [data-expense-card='true']",
                                "outerHTML",
                            ))
                        }
                    }
                }
            }

            @if cards.is_empty() {
                li class="rounded border border-dashed border-gray-300 bg-white px-4 py-6 text-center text-sm text-gray-500 dark:border-gray-700 dark:bg-gray-800 dark:text-gray-400"
                {
                    (empty_state_message(is_filtered, new_expense_route))
                }
            }
        }
    )
}

fn format_notes(notes: &str) -> (String, Option<&str>) {
    let notes_length = notes.graphemes(true).count();

    if notes_length <= MAX_NOTES_GRAPHEMES {
        (notes.to_owned(), None)
    } else {
        let truncated: String = notes.graphemes(true).take(MAX_NOTES_GRAPHEMES - 3).collect();
        let truncated = truncated + "...";
        (truncated, Some(notes))
    }
}
