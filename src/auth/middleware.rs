//! Middleware that gates protected routes behind a valid auth cookie.
//!
//! Two flavors share the same cookie check and differ only in how they turn
//! away unauthenticated requests: [auth_guard] answers with an HTTP redirect
//! to the log-in page, while [auth_guard_hx] sets the `HX-Redirect` header so
//! HTMX performs the navigation client-side.

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{StatusCode, header::SET_COOKIE},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use time::Duration;

use crate::{
    AppState,
    auth::{
        cookie::{extend_auth_cookie_duration_if_needed, get_token_from_cookies},
        redirect::{build_log_in_redirect_url, build_log_in_redirect_url_from_target},
    },
    endpoints,
    timezone::get_local_offset,
    user::UserId,
};

/// The sliding window granted on each authenticated request.
const ACTIVITY_EXTENSION: Duration = Duration::minutes(5);

/// The subset of [AppState] the auth middleware needs.
#[derive(Clone)]
pub struct AuthState {
    /// The key for decrypting and verifying private cookies.
    pub cookie_key: Key,
    /// How long a freshly issued auth cookie stays valid.
    pub cookie_duration: Duration,
    /// The canonical name of the local timezone, e.g. "Asia/Kuwait".
    pub local_timezone: String,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            local_timezone: state.local_timezone.clone(),
        }
    }
}

// Lets `PrivateCookieJar` find its key in the middleware state.
impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

/// Where to send an unauthenticated request: the log-in page, carrying the
/// originally requested URL so log-in can resume it.
fn log_in_url_for(request: &Request) -> String {
    build_log_in_redirect_url(request).unwrap_or_else(|| {
        if request.uri().path().starts_with("/api") {
            tracing::warn!("Missing or invalid HTMX headers on an /api request, resuming at the dashboard instead.");
        } else {
            tracing::warn!("Request URI did not yield a valid redirect URL, resuming at the dashboard instead.");
        }

        build_log_in_redirect_url_from_target(endpoints::DASHBOARD_VIEW)
            .unwrap_or_else(|| endpoints::LOG_IN_VIEW.to_owned())
    })
}

/// Copy the jar's `Set-Cookie` headers onto `response` so the refreshed
/// expiry reaches the browser.
fn apply_cookie_headers(jar: PrivateCookieJar, response: Response) -> Response {
    let (mut parts, body) = response.into_parts();

    for (name, value) in jar.into_response().headers() {
        if name == SET_COOKIE {
            parts.headers.append(name, value.to_owned());
        }
    }

    Response::from_parts(parts, body)
}

/// The shared guard body. Validates the auth cookie, stores the caller's
/// [UserId] in the request extensions, runs the inner handler, and slides the
/// cookie expiry forward to reflect the activity. `reject` builds the
/// response for requests that fail the cookie check.
#[inline]
async fn run_guard(
    state: AuthState,
    request: Request,
    next: Next,
    reject: impl Fn(&str) -> Response,
) -> Response {
    let log_in_url = log_in_url_for(&request);

    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        tracing::error!("Could not resolve the local timezone, treating the request as unauthenticated.");
        return reject(&log_in_url);
    };

    let (mut parts, body) = request.into_parts();
    let jar = match PrivateCookieJar::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(error) => {
            tracing::error!("Could not read the cookie jar: {error:?}.");
            return reject(&log_in_url);
        }
    };

    let user_id: UserId = match get_token_from_cookies(&jar) {
        Ok(token) => token.user_id,
        Err(_) => return reject(&log_in_url),
    };

    parts.extensions.insert(user_id);
    let response = next.run(Request::from_parts(parts, body)).await;

    let jar = match extend_auth_cookie_duration_if_needed(jar.clone(), ACTIVITY_EXTENSION, local_offset) {
        Ok(updated_jar) => updated_jar,
        Err(error) => {
            tracing::error!("Could not slide the cookie expiry: {error:?}. Keeping the original cookie.");
            jar
        }
    };

    apply_cookie_headers(jar, response)
}

/// Guard for full-page routes. Requests without a valid auth cookie get a
/// `303 See Other` to the log-in page.
///
/// Handlers behind this guard receive the caller's ID through
/// `Extension(user_id): Extension<UserId>`.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    run_guard(state, request, next, |url| {
        Redirect::to(url).into_response()
    })
    .await
}

/// Guard for the HTMX mutation routes. Requests without a valid auth cookie
/// get a `200 OK` carrying an `HX-Redirect` header to the log-in page, which
/// HTMX follows with a full-page navigation.
///
/// Handlers behind this guard receive the caller's ID through
/// `Extension(user_id): Extension<UserId>`.
pub async fn auth_guard_hx(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    run_guard(state, request, next, |url| {
        (HxRedirect(url.to_owned()), StatusCode::OK).into_response()
    })
    .await
}
