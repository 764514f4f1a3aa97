//! Summary cards for the dashboard's headline figures.

use maud::{Markup, html};

use crate::{category::Category, html::format_currency};

use super::aggregation::SpendingSummary;

const CARD_STYLE: &str = "bg-white dark:bg-gray-800 border border-gray-200 \
    dark:border-gray-700 rounded-lg p-4 shadow-md";

const CARD_TITLE_STYLE: &str =
    "text-sm font-semibold uppercase text-gray-600 dark:text-gray-400";

const CARD_SUBTEXT_STYLE: &str = "text-sm text-gray-600 dark:text-gray-400 mt-1";

/// Renders the grid of headline figure cards at the top of the dashboard.
pub(super) fn summary_cards_view(
    summary: &SpendingSummary,
    top_category: Option<&Category>,
) -> Markup {
    html! {
        section class="w-full mx-auto mb-4" {
            div class="grid grid-cols-1 sm:grid-cols-2 xl:grid-cols-4 gap-4" {
                (summary_card(
                    "This Month",
                    &format_currency(summary.month_to_date),
                    &format!("{} per week", format_currency(summary.weekly_average)),
                ))

                (summary_card(
                    "This Year",
                    &format_currency(summary.year_to_date),
                    &format!("{} per month", format_currency(summary.monthly_average)),
                ))

                (top_category_card(top_category))

                (summary_card(
                    "Daily Average",
                    &format_currency(summary.daily_average),
                    "This month so far",
                ))
            }
        }
    }
}

fn summary_card(title: &str, figure: &str, subtext: &str) -> Markup {
    html! {
        div class=(CARD_STYLE) {
            h4 class=(CARD_TITLE_STYLE) { (title) }

            div class="text-3xl font-bold mt-1 tabular-nums" { (figure) }

            div class=(CARD_SUBTEXT_STYLE) { (subtext) }
        }
    }
}

fn top_category_card(top_category: Option<&Category>) -> Markup {
    html! {
        div class=(CARD_STYLE) {
            h4 class=(CARD_TITLE_STYLE) { "Top Category" }

            @match top_category {
                Some(category) => {
                    div class="text-3xl font-bold mt-1 truncate" title=(category.name) {
                        (category.name)
                    }

                    div class={(CARD_SUBTEXT_STYLE) " tabular-nums"} {
                        (format_currency(category.total_expenses_amount)) " all time"
                    }
                }
                None => {
                    div class="text-3xl font-bold mt-1" { "-" }

                    div class=(CARD_SUBTEXT_STYLE) { "Nothing categorised yet" }
                }
            }
        }
    }
}
