//! The recent activity table for the dashboard.

use maud::{Markup, html};

use crate::{
    endpoints,
    expense::AnnotatedExpense,
    html::{TABLE_CELL_STYLE, TABLE_ROW_STYLE, format_currency, link},
};

/// Renders the table of the user's most recently recorded expenses.
pub(super) fn recent_expenses_table(expenses: &[AnnotatedExpense]) -> Markup {
    html! {
        div {
            div class="flex justify-between items-baseline mb-4" {
                h3 class="text-xl font-semibold" { "Recent Expenses" }

                (link(endpoints::EXPENSES_VIEW, "View all"))
            }

            div class="overflow-x-auto rounded-lg shadow" {
                table class="w-full text-sm text-left text-gray-500 dark:text-gray-400" {
                    thead class="text-xs text-gray-900 uppercase bg-gray-100 dark:bg-gray-700 dark:text-gray-400" {
                        tr {
                            th scope="col" class="px-6 py-3" { "Date" }
                            th scope="col" class="px-6 py-3" { "Category" }
                            th scope="col" class="px-6 py-3" { "Payment Method" }
                            th scope="col" class="px-6 py-3 text-right" { "Amount" }
                        }
                    }

                    tbody {
                        @for annotated in expenses {
                            tr class=(TABLE_ROW_STYLE) {
                                td class=(TABLE_CELL_STYLE) {
                                    time datetime=(annotated.expense.date) {
                                        (annotated.expense.date)
                                    }
                                }

                                td class=(TABLE_CELL_STYLE) {
                                    @match &annotated.category_name {
                                        Some(name) => { (name) }
                                        None => {
                                            span class="text-gray-400 dark:text-gray-500" { "-" }
                                        }
                                    }
                                }

                                td class=(TABLE_CELL_STYLE) {
                                    @match &annotated.payment_method_name {
                                        Some(name) => { (name) }
                                        None => {
                                            span class="text-gray-400 dark:text-gray-500" { "-" }
                                        }
                                    }
                                }

                                td class={(TABLE_CELL_STYLE) " text-right tabular-nums"} {
                                    (format_currency(annotated.expense.amount))
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}
