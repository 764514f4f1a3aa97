//! Dashboard page handler and view.

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use time::Date;

use crate::{
    AppState, Error,
    category::{Category, get_all_categories},
    charts::{
        ECHARTS_SCRIPT, EmbeddedChart, category_pie_chart, charts_script, charts_view,
        monthly_spending_chart,
    },
    endpoints,
    expense::{AnnotatedExpense, get_recent_expenses},
    html::{HeadElement, base, link},
    navigation::NavBar,
    timezone::{get_local_offset, local_date},
    user::{Role, UserId, get_user_by_id},
};

use super::{
    aggregation::{
        SpendingSummary, calculate_spending_summary, category_breakdown, format_month_labels,
        monthly_series, top_category, trailing_month_starts,
    },
    cards::summary_cards_view,
    expense::{ExpenseAmount, get_expense_amounts_in_date_range},
    tables::recent_expenses_table,
};

/// How many months of history the bar chart covers, including the current
/// month.
const TRAILING_MONTHS: usize = 12;

/// How many expenses the recent activity table shows.
const RECENT_EXPENSES_LIMIT: u32 = 5;

/// How many categories the breakdown pie chart shows.
const TOP_CATEGORIES_LIMIT: usize = 5;

/// The state needed for displaying the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The local timezone as a canonical timezone name, e.g. "Asia/Kuwait".
    pub local_timezone: String,
    /// The database connection for reading the user's expenses.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Holds all the data needed to render the dashboard.
struct DashboardData {
    summary: SpendingSummary,
    top_category: Option<Category>,
    charts: Vec<EmbeddedChart>,
    recent_expenses: Vec<AnnotatedExpense>,
}

/// Display a page summarising the user's spending.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Response, Error> {
    let local_timezone = get_local_offset(&state.local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        Error::InvalidTimezoneError(state.local_timezone.clone())
    })?;
    let today = local_date(local_timezone);

    let (is_admin, data) = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        let user = get_user_by_id(user_id, &connection)
            .inspect_err(|error| tracing::error!("Failed to retrieve user {user_id}: {error}"))?;

        (
            user.role == Role::Admin,
            build_dashboard_data(user_id, today, &connection)?,
        )
    };

    match data {
        Some(data) => Ok(dashboard_view(&data, is_admin).into_response()),
        None => Ok(dashboard_no_data_view(is_admin).into_response()),
    }
}

/// Fetches and reduces all data needed for the dashboard display.
///
/// Returns `None` if the user has not recorded any expenses yet.
fn build_dashboard_data(
    user_id: UserId,
    today: Date,
    connection: &Connection,
) -> Result<Option<DashboardData>, Error> {
    let recent_expenses = get_recent_expenses(user_id, RECENT_EXPENSES_LIMIT, connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve recent expenses: {error}"))?;

    if recent_expenses.is_empty() {
        return Ok(None);
    }

    let month_starts = trailing_month_starts(today, TRAILING_MONTHS);
    let window_expenses =
        get_expense_amounts_in_date_range(month_starts[0]..=today, user_id, connection)
            .inspect_err(|error| {
                tracing::error!("Failed to retrieve expenses for the last year: {error}")
            })?;

    let categories = get_all_categories(user_id, connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve categories: {error}"))?;

    Ok(Some(DashboardData {
        summary: calculate_spending_summary(&window_expenses, today),
        top_category: top_category(&categories).cloned(),
        charts: build_dashboard_charts(&window_expenses, &month_starts, &categories),
        recent_expenses,
    }))
}

/// Creates the dashboard charts from the year of expense data.
///
/// The category pie chart is left out when nothing has been spent against a
/// category yet.
fn build_dashboard_charts(
    window_expenses: &[ExpenseAmount],
    month_starts: &[Date],
    categories: &[Category],
) -> Vec<EmbeddedChart> {
    let labels = format_month_labels(month_starts);
    let totals = monthly_series(window_expenses, month_starts);

    let mut charts = vec![EmbeddedChart {
        id: "monthly-spending-chart",
        options: monthly_spending_chart(labels, &totals).to_string(),
    }];

    let slices = category_breakdown(categories, TOP_CATEGORIES_LIMIT);

    if !slices.is_empty() {
        charts.push(EmbeddedChart {
            id: "category-breakdown-chart",
            options: category_pie_chart("Spending by Category", "Top five categories", &slices)
                .to_string(),
        });
    }

    charts
}

/// Renders the dashboard page when the user has no expenses yet.
fn dashboard_no_data_view(is_admin: bool) -> Markup {
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW, is_admin).into_html();
    let record_expense_link = link(endpoints::NEW_EXPENSE_VIEW, "recording your first expense");

    let content = html!(
        (nav_bar)

        div class="flex flex-col items-center px-6 py-8 mx-auto text-gray-900 dark:text-white"
        {
            h2 class="text-xl font-bold"
            {
                "Nothing here yet..."
            }

            p
            {
                "Charts will show up here once you add some expenses.
                Get started by " (record_expense_link) "."
            }
        }
    );

    base("Dashboard", &[], &content)
}

/// Renders the main dashboard page with the summary cards, charts, and the
/// recent activity table.
fn dashboard_view(data: &DashboardData, is_admin: bool) -> Markup {
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW, is_admin).into_html();

    let content = html!(
        (nav_bar)

        div
            class="flex flex-col items-center px-2 lg:px-6 lg:py-8 mx-auto
                max-w-screen-xl text-gray-900 dark:text-white"
        {
            (summary_cards_view(&data.summary, data.top_category.as_ref()))

            (charts_view(&data.charts))

            section class="w-full mx-auto mb-4"
            {
                (recent_expenses_table(&data.recent_expenses))
            }
        }
    );

    let scripts = [
        HeadElement::ScriptLink(ECHARTS_SCRIPT.to_owned()),
        charts_script(&data.charts),
    ];

    base("Dashboard", &scripts, &content)
}
