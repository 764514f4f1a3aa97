//! The printable yearly report page.
//!
//! The per-category figures on this page are reduced live from the year's
//! expense rows rather than read from the maintained category aggregates, so
//! the report can serve as an audit of a historical year slice.

use std::collections::HashMap;

use axum::{
    Extension,
    extract::State,
    response::{IntoResponse, Response},
};
// axum_extra's Query parses an empty year value as None instead of rejecting
// the request.
use axum_extra::extract::Query;
use maud::{Markup, PreEscaped, html};
use rusqlite::{Connection, named_params};
use rust_decimal::Decimal;
use serde::Deserialize;
use time::{Date, Month};

use crate::{
    Error,
    category::CategoryId,
    charts::{
        ECHARTS_SCRIPT, EmbeddedChart, PIE_PALETTE, PieSlice, category_pie_chart, charts_script,
        charts_view,
    },
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, HeadElement,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
        format_currency,
    },
    money::from_milliunits,
    navigation::NavBar,
    timezone::{get_local_offset, local_date},
    user::{Role, UserId, get_user_by_id},
};

use super::ReportsState;

/// How many years the report's year selector offers.
const YEAR_CHOICES: i32 = 6;

/// The label for expenses that were recorded without a category.
const UNCATEGORISED_LABEL: &str = "Uncategorised";

/// The year selected in the yearly report query string.
#[derive(Debug, Default, Deserialize)]
pub struct YearlyReportQueryParams {
    pub year: Option<i32>,
}

/// One row of the yearly report query: an expense amount with its category's
/// display details joined in.
#[derive(Debug, Clone, PartialEq)]
struct YearlyExpenseRow {
    amount: Decimal,
    category_id: Option<CategoryId>,
    category_name: Option<String>,
    category_icon: Option<String>,
    category_color: Option<String>,
}

/// A category's share of the year's spending.
#[derive(Debug, Clone, PartialEq)]
struct CategoryYearSummary {
    name: String,
    icon: Option<String>,
    color: Option<String>,
    expenses_count: i64,
    total: Decimal,
}

/// Everything the yearly report page displays.
#[derive(Debug)]
struct YearlyReport {
    year: i32,
    expenses_count: usize,
    grand_total: Decimal,
    categories: Vec<CategoryYearSummary>,
}

/// Render the printable yearly report for the selected year, defaulting to
/// the current year.
pub async fn get_yearly_report_page(
    State(state): State<ReportsState>,
    Extension(user_id): Extension<UserId>,
    Query(query): Query<YearlyReportQueryParams>,
) -> Result<Response, Error> {
    let local_timezone = get_local_offset(&state.local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        Error::InvalidTimezoneError(state.local_timezone.clone())
    })?;
    let today = local_date(local_timezone);
    let year = query.year.unwrap_or(today.year());

    let (is_admin, report) = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        let user = get_user_by_id(user_id, &connection)
            .inspect_err(|error| tracing::error!("Failed to retrieve user {user_id}: {error}"))?;

        let rows = get_yearly_expense_rows(year, user_id, &connection).inspect_err(|error| {
            tracing::error!("Failed to retrieve the expenses of {year}: {error}")
        })?;

        (user.role == Role::Admin, build_yearly_report(year, &rows))
    };

    let year_choices = year_selector_choices(year, today.year());

    Ok(yearly_report_view(&report, &year_choices, is_admin).into_response())
}

/// Fetch the year's expense amounts with their category details joined in.
fn get_yearly_expense_rows(
    year: i32,
    user_id: UserId,
    connection: &Connection,
) -> Result<Vec<YearlyExpenseRow>, Error> {
    let date_from = Date::from_calendar_date(year, Month::January, 1)
        .map_err(|error| Error::InvalidDateFormat(error.to_string(), year.to_string()))?;
    let date_to = Date::from_calendar_date(year, Month::December, 31)
        .map_err(|error| Error::InvalidDateFormat(error.to_string(), year.to_string()))?;

    connection
        .prepare(
            "SELECT expense.amount, category.id, category.name, category.icon, category.color
             FROM expense
             LEFT JOIN category ON category.id = expense.category_id
             WHERE expense.user_id = :user_id
               AND expense.date BETWEEN :date_from AND :date_to",
        )?
        .query_map(
            named_params! {
                ":user_id": user_id.as_i64(),
                ":date_from": date_from,
                ":date_to": date_to,
            },
            |row| {
                let amount_milliunits: i64 = row.get(0)?;

                Ok(YearlyExpenseRow {
                    amount: from_milliunits(amount_milliunits),
                    category_id: row.get(1)?,
                    category_name: row.get(2)?,
                    category_icon: row.get(3)?,
                    category_color: row.get(4)?,
                })
            },
        )?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|error| error.into())
}

/// Reduce the year's expense rows into per-category counts and totals in one
/// pass.
///
/// Expenses without a category are collected under an "Uncategorised" bucket
/// so the per-category figures always reconcile with the grand total.
/// Categories are ordered by total spent, largest first, with ties broken
/// alphabetically.
fn build_yearly_report(year: i32, rows: &[YearlyExpenseRow]) -> YearlyReport {
    let mut by_category: HashMap<Option<CategoryId>, CategoryYearSummary> = HashMap::new();
    let mut grand_total = Decimal::ZERO;

    for row in rows {
        grand_total += row.amount;

        let summary = by_category
            .entry(row.category_id)
            .or_insert_with(|| CategoryYearSummary {
                name: row
                    .category_name
                    .clone()
                    .unwrap_or_else(|| UNCATEGORISED_LABEL.to_owned()),
                icon: row.category_icon.clone(),
                color: row.category_color.clone(),
                expenses_count: 0,
                total: Decimal::ZERO,
            });
        summary.expenses_count += 1;
        summary.total += row.amount;
    }

    let mut categories = by_category.into_values().collect::<Vec<_>>();
    categories.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.name.cmp(&b.name)));

    YearlyReport {
        year,
        expenses_count: rows.len(),
        grand_total,
        categories,
    }
}

/// Derive the pie chart slices from the reduced category totals, falling
/// back to the shared palette by rank for categories without a stored color.
fn pie_slices(categories: &[CategoryYearSummary]) -> Vec<PieSlice> {
    categories
        .iter()
        .enumerate()
        .map(|(rank, summary)| PieSlice {
            name: summary.name.clone(),
            value: summary.total,
            color: summary
                .color
                .clone()
                .unwrap_or_else(|| PIE_PALETTE[rank % PIE_PALETTE.len()].to_owned()),
        })
        .collect()
}

/// The years offered by the year selector: the current year and the five
/// before it, plus the selected year when it falls outside that window.
fn year_selector_choices(selected_year: i32, current_year: i32) -> Vec<i32> {
    let mut years = (0..YEAR_CHOICES)
        .map(|years_ago| current_year - years_ago)
        .collect::<Vec<_>>();

    if !years.contains(&selected_year) {
        years.push(selected_year);
        years.sort_unstable_by(|a, b| b.cmp(a));
    }

    years
}

/// Hides the navigation and the report controls when the page is printed.
fn print_styles() -> HeadElement {
    HeadElement::Style(PreEscaped(
        r#"
        @media print {
            nav, [data-report-controls] {
                display: none !important;
            }
            body {
                background: white !important;
            }
        }
        "#
        .to_owned(),
    ))
}

fn yearly_report_view(report: &YearlyReport, year_choices: &[i32], is_admin: bool) -> Markup {
    let nav_bar = NavBar::new(endpoints::REPORTS_VIEW, is_admin).into_html();

    let charts = (!report.categories.is_empty())
        .then(|| EmbeddedChart {
            id: "yearly-category-chart",
            options: category_pie_chart(
                "Spending by Category",
                &format!("January to December {}", report.year),
                &pie_slices(&report.categories),
            )
            .to_string(),
        })
        .into_iter()
        .collect::<Vec<_>>();

    let table_row = |summary: &CategoryYearSummary| {
        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                td class=(TABLE_CELL_STYLE)
                {
                    span data-icon=[summary.icon.as_ref()]
                    {
                        @if let Some(color) = &summary.color {
                            span
                                class="mr-1.5 inline-block h-2 w-2 rounded-full"
                                style=(format!("background-color: {color}"))
                            {}
                        }

                        (summary.name)
                    }
                }

                td class=(TABLE_CELL_STYLE)
                {
                    (summary.expenses_count)
                }

                td class="px-6 py-4 text-right tabular-nums"
                {
                    (format_currency(summary.total))
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
                header class="flex justify-between flex-wrap items-end gap-4"
                {
                    h1 class="text-xl font-bold" { "Yearly Report" }

                    form
                        method="get"
                        action=(endpoints::YEARLY_REPORT_VIEW)
                        class="flex items-end gap-4"
                        data-report-controls="true"
                    {
                        div
                        {
                            label for="year" class=(FORM_LABEL_STYLE) { "Year" }

                            select id="year" name="year" class=(FORM_TEXT_INPUT_STYLE)
                            {
                                @for year in year_choices {
                                    option value=(year) selected[*year == report.year]
                                    {
                                        (year)
                                    }
                                }
                            }
                        }

                        button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Show" }

                        button
                            type="button"
                            class=(BUTTON_PRIMARY_STYLE)
                            onclick="window.print()"
                        {
                            "Print"
                        }
                    }
                }

                section
                    class="w-full rounded-lg border border-gray-200 bg-white p-4 shadow-md
                        dark:border-gray-700 dark:bg-gray-800"
                {
                    h4 class="text-sm font-semibold uppercase text-gray-600 dark:text-gray-400"
                    {
                        "Total for " (report.year)
                    }

                    div class="text-3xl font-bold mt-1 tabular-nums"
                    {
                        (format_currency(report.grand_total))
                    }

                    div class="text-sm text-gray-500 dark:text-gray-400 mt-1"
                    {
                        @if report.expenses_count == 1 {
                            "1 expense recorded"
                        } @else {
                            (report.expenses_count) " expenses recorded"
                        }
                    }
                }

                @if report.categories.is_empty() {
                    p class="text-gray-500 dark:text-gray-400"
                    {
                        "No expenses were recorded in " (report.year) "."
                    }
                } @else {
                    (charts_view(&charts))

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
                                            "Category"
                                        }
                                        th scope="col" class=(TABLE_CELL_STYLE)
                                        {
                                            "Expenses"
                                        }
                                        th scope="col" class="px-6 py-3 text-right"
                                        {
                                            "Total"
                                        }
                                    }
                                }

                                tbody
                                {
                                    @for summary in &report.categories {
                                        (table_row(summary))
                                    }
                                }

                                tfoot
                                {
                                    tr class="font-semibold text-gray-900 dark:text-white"
                                    {
                                        th scope="row" class="px-6 py-3 text-base"
                                        {
                                            "Total"
                                        }
                                        td class=(TABLE_CELL_STYLE)
                                        {
                                            (report.expenses_count)
                                        }
                                        td class="px-6 py-3 text-right tabular-nums"
                                        {
                                            (format_currency(report.grand_total))
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    let mut head_elements = vec![print_styles()];
    if !charts.is_empty() {
        head_elements.push(HeadElement::ScriptLink(ECHARTS_SCRIPT.to_owned()));
        head_elements.push(charts_script(&charts));
    }

    base("Yearly Report", &head_elements, &content)
}
