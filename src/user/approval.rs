//! Endpoint for an administrator to toggle whether a user may log in.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    user::{UserId, db::toggle_user_approval, require_admin},
};

/// The state needed for toggling user approval.
#[derive(Debug, Clone)]
pub struct ToggleUserApprovalEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ToggleUserApprovalEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Flip whether the user may log in. Unapproved users are rejected at the
/// log in endpoint until an administrator approves them here.
///
/// Redirects back to the users page so the updated status is shown.
pub async fn toggle_user_approval_endpoint(
    Path(user_id): Path<i64>,
    State(state): State<ToggleUserApprovalEndpointState>,
    Extension(current_user_id): Extension<UserId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    if let Err(error) = require_admin(current_user_id, &connection) {
        return error.into_alert_response();
    }

    match toggle_user_approval(UserId::new(user_id), &connection) {
        Ok(_) => (
            HxRedirect(endpoints::USERS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(Error::UpdateMissingUser) => Error::UpdateMissingUser.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while toggling approval for user {user_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}
