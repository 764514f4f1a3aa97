//! Payment methods listing page.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    html::{
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base, edit_delete_action_links,
    },
    navigation::NavBar,
    user::{Role, UserId, get_user_by_id},
};

use super::{MethodType, get_all_payment_methods};

const SHARED_BADGE_STYLE: &str = "inline-flex items-center px-2.5 py-0.5 rounded-full \
    text-xs font-medium bg-purple-100 text-purple-800 dark:bg-purple-900 dark:text-purple-300";

/// The state needed for the payment methods listing page.
#[derive(Debug, Clone)]
pub struct PaymentMethodsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for PaymentMethodsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A payment method with its formatted action URLs for template rendering.
#[derive(Debug, Clone)]
struct PaymentMethodRowView {
    name: String,
    shared: bool,
    /// Whether the viewing user may edit or delete this method. Admin-defined
    /// methods render without actions for regular users.
    can_modify: bool,
    edit_url: String,
    delete_url: String,
    confirm_message: String,
}

/// Render the payment methods listing page: the user's own methods plus the
/// admin-defined ones shared with everyone.
pub async fn get_payment_methods_page(
    State(state): State<PaymentMethodsPageState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let user = get_user_by_id(user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve user: {error}"))?;

    let payment_methods = get_all_payment_methods(user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve payment methods: {error}"))?;

    let rows = payment_methods
        .into_iter()
        .map(|payment_method| PaymentMethodRowView {
            shared: payment_method.method_type == MethodType::AdminDefined,
            can_modify: payment_method.can_be_modified_by(&user),
            edit_url: endpoints::format_endpoint(
                endpoints::EDIT_PAYMENT_METHOD_VIEW,
                payment_method.id,
            ),
            delete_url: endpoints::format_endpoint(
                endpoints::DELETE_PAYMENT_METHOD,
                payment_method.id,
            ),
            confirm_message: format!("Are you sure you want to delete '{}'?", payment_method.name),
            name: payment_method.name.to_string(),
        })
        .collect::<Vec<_>>();

    Ok(payment_methods_view(&rows, user.role == Role::Admin).into_response())
}

fn shared_badge(shared: bool) -> Markup {
    html!(
        @if shared {
            span class=(SHARED_BADGE_STYLE) { "Shared" }
        }
    )
}

fn payment_methods_view(payment_methods: &[PaymentMethodRowView], is_admin: bool) -> Markup {
    let new_payment_method_route = endpoints::NEW_PAYMENT_METHOD_VIEW;
    let nav_bar = NavBar::new(endpoints::PAYMENT_METHODS_VIEW, is_admin).into_html();

    let table_row = |row: &PaymentMethodRowView| {
        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                td class=(TABLE_CELL_STYLE)
                {
                    span class="font-medium text-gray-900 dark:text-white"
                    {
                        (row.name)
                    }
                }

                td class=(TABLE_CELL_STYLE)
                {
                    (shared_badge(row.shared))
                }

                td class=(TABLE_CELL_STYLE)
                {
                    @if row.can_modify {
                        div class="flex gap-4"
                        {
                            (edit_delete_action_links(
                                &row.edit_url,
                                &row.delete_url,
                                &row.confirm_message,
                                "closest tr",
                                "delete",
                            ))
                        }
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
                    h1 class="text-xl font-bold" { "Payment Methods" }

                    a href=(new_payment_method_route) class=(LINK_STYLE)
                    {
                        "Create Payment Method"
                    }
                }

                (payment_methods_cards_view(payment_methods, new_payment_method_route))

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
                                    "Name"
                                }
                                th scope="col" class=(TABLE_CELL_STYLE)
                                {
                                    "Type"
                                }
                                th scope="col" class=(TABLE_CELL_STYLE)
                                {
                                    "Actions"
                                }
                            }
                        }

                        tbody
                        {
                            @for row in payment_methods {
                                (table_row(row))
                            }

                            @if payment_methods.is_empty() {
                                tr
                                {
                                    td
                                        colspan="3"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        "No payment methods created yet. "
                                        a href=(new_payment_method_route) class=(LINK_STYLE)
                                        {
                                            "Create your first payment method"
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

    base("Payment Methods", &[], &content)
}

fn payment_methods_cards_view(
    payment_methods: &[PaymentMethodRowView],
    new_payment_method_route: &str,
) -> Markup {
    html!(
        ul class="lg:hidden space-y-4"
        {
            @for row in payment_methods {
                li class="rounded border border-gray-200 bg-white px-4 py-3 shadow-sm dark:border-gray-700 dark:bg-gray-800"
                    data-payment-method-card="true"
                {
                    div class="flex items-start justify-between gap-3"
                    {
                        span class="font-medium text-gray-900 dark:text-white"
                        {
                            (row.name)
                        }
                        (shared_badge(row.shared))
                    }

                    @if row.can_modify {
                        div class="mt-2 flex items-center gap-4 text-sm"
                        {
                            (edit_delete_action_links(
                                &row.edit_url,
                                &row.delete_url,
                                &row.confirm_message,
                                "closest [data-payment-method-card='true']",
                                "outerHTML",
                            ))
                        }
                    }
                }
            }

            @if payment_methods.is_empty() {
                li class="rounded border border-dashed border-gray-300 bg-white px-4 py-6 text-center text-sm text-gray-500 dark:border-gray-700 dark:bg-gray-800 dark:text-gray-400"
                {
                    "No payment methods created yet. "
                    a href=(new_payment_method_route) class=(LINK_STYLE)
                    {
                        "Create your first payment method"
                    }
                }
            }
        }
    )
}
