//! Admin page listing every user account.
//!
//! From here an administrator can create accounts, approve or revoke
//! log in access, and delete accounts.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::Date;

use crate::{
    AppState, Error, endpoints,
    html::{
        BUTTON_DELETE_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
    },
    navigation::NavBar,
    user::{Role, UserId, get_all_users, require_admin},
};

use super::create::new_user_form_view;

const ROLE_BADGE_STYLE: &str = "inline-flex items-center px-2.5 py-0.5 rounded-full \
    text-xs font-medium bg-blue-100 text-blue-800 dark:bg-blue-900 dark:text-blue-300";

const APPROVED_BADGE_STYLE: &str = "inline-flex items-center px-2.5 py-0.5 rounded-full \
    text-xs font-medium bg-green-100 text-green-800 dark:bg-green-900 dark:text-green-300";

const NOT_APPROVED_BADGE_STYLE: &str = "inline-flex items-center px-2.5 py-0.5 rounded-full \
    text-xs font-medium bg-amber-100 text-amber-800 dark:bg-amber-900 dark:text-amber-300";

/// The state needed for the users page.
#[derive(Debug, Clone)]
pub struct UsersPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UsersPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A user with its formatted action URLs for template rendering.
#[derive(Debug, Clone)]
struct UserRowView {
    email: String,
    role: Role,
    approved: bool,
    created_on: Date,
    toggle_url: String,
    toggle_label: &'static str,
    delete_url: String,
    confirm_message: String,
}

/// Render the users page. Only administrators may view it.
pub async fn get_users_page(
    State(state): State<UsersPageState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    require_admin(user_id, &connection)?;

    let users = get_all_users(&connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve users: {error}"))?;

    let rows = users
        .into_iter()
        .map(|user| UserRowView {
            toggle_url: endpoints::format_endpoint(
                endpoints::TOGGLE_USER_APPROVAL,
                user.id.as_i64(),
            ),
            toggle_label: if user.approved {
                "Revoke approval"
            } else {
                "Approve"
            },
            delete_url: endpoints::format_endpoint(endpoints::DELETE_USER, user.id.as_i64()),
            confirm_message: format!(
                "Are you sure you want to delete '{}'? This will also delete their categories, \
                payment methods, and expenses.",
                user.email
            ),
            created_on: user.created_at.date(),
            email: user.email,
            role: user.role,
            approved: user.approved,
        })
        .collect::<Vec<_>>();

    Ok(users_view(&rows).into_response())
}

fn status_badge(approved: bool) -> Markup {
    if approved {
        html!(span class=(APPROVED_BADGE_STYLE) { "Approved" })
    } else {
        html!(span class=(NOT_APPROVED_BADGE_STYLE) { "Not approved" })
    }
}

fn action_buttons(row: &UserRowView, hx_target: &str, hx_swap: &str) -> Markup {
    html!(
        button
            type="button"
            class=(LINK_STYLE)
            hx-post=(row.toggle_url)
            hx-target-error="#alert-container"
        {
            (row.toggle_label)
        }

        button
            type="button"
            class=(BUTTON_DELETE_STYLE)
            hx-delete=(row.delete_url)
            hx-confirm=(row.confirm_message)
            hx-target=(hx_target)
            hx-swap=(hx_swap)
            hx-target-error="#alert-container"
        {
            "Delete"
        }
    )
}

fn users_view(users: &[UserRowView]) -> Markup {
    let nav_bar = NavBar::new(endpoints::USERS_VIEW, true).into_html();

    let table_row = |row: &UserRowView| {
        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                td class=(TABLE_CELL_STYLE)
                {
                    span class="font-medium text-gray-900 dark:text-white"
                    {
                        (row.email)
                    }
                }

                td class=(TABLE_CELL_STYLE)
                {
                    span class=(ROLE_BADGE_STYLE) { (row.role) }
                }

                td class=(TABLE_CELL_STYLE)
                {
                    (status_badge(row.approved))
                }

                td class=(TABLE_CELL_STYLE)
                {
                    (row.created_on)
                }

                td class=(TABLE_CELL_STYLE)
                {
                    div class="flex gap-4"
                    {
                        (action_buttons(row, "closest tr", "delete"))
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
                    h1 class="text-xl font-bold" { "Users" }
                }

                (users_cards_view(users))

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
                                    "Email"
                                }
                                th scope="col" class=(TABLE_CELL_STYLE)
                                {
                                    "Role"
                                }
                                th scope="col" class=(TABLE_CELL_STYLE)
                                {
                                    "Status"
                                }
                                th scope="col" class=(TABLE_CELL_STYLE)
                                {
                                    "Created"
                                }
                                th scope="col" class=(TABLE_CELL_STYLE)
                                {
                                    "Actions"
                                }
                            }
                        }

                        tbody
                        {
                            @for row in users {
                                (table_row(row))
                            }
                        }
                    }
                }

                section class="rounded border border-gray-200 bg-white p-4 shadow-sm
                    dark:border-gray-700 dark:bg-gray-800 lg:max-w-md"
                {
                    h2 class="text-lg font-semibold text-gray-900 dark:text-white mb-4"
                    {
                        "Add User"
                    }

                    (new_user_form_view("", None, None, None))
                }
            }
        }
    );

    base("Users", &[], &content)
}

fn users_cards_view(users: &[UserRowView]) -> Markup {
    html!(
        ul class="lg:hidden space-y-4"
        {
            @for row in users {
                li class="rounded border border-gray-200 bg-white px-4 py-3 shadow-sm dark:border-gray-700 dark:bg-gray-800"
                    data-user-card="true"
                {
                    div class="flex items-start justify-between gap-3"
                    {
                        span class="font-medium text-gray-900 dark:text-white break-all"
                        {
                            (row.email)
                        }
                        span class=(ROLE_BADGE_STYLE) { (row.role) }
                    }

                    div class="mt-2 flex items-center justify-between gap-3 text-sm"
                    {
                        (status_badge(row.approved))
                        span class="text-gray-500 dark:text-gray-400"
                        {
                            "Joined " (row.created_on)
                        }
                    }

                    div class="mt-2 flex items-center gap-4 text-sm"
                    {
                        (action_buttons(row, "closest [data-user-card='true']", "outerHTML"))
                    }
                }
            }
        }
    )
}
