//! Alert system for displaying success and error messages to users.
//!
//! Alerts are rendered as HTML fragments that HTMX swaps into the fixed
//! alert container at the bottom of every page.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use maud::{Markup, PreEscaped, html};

const SUCCESS_STYLE: &str = "flex items-start gap-3 w-full p-4 mb-4 text-sm rounded-lg shadow-sm \
    border text-green-800 bg-green-50 border-green-300 \
    dark:bg-gray-800 dark:text-green-400 dark:border-green-800";

const ERROR_STYLE: &str = "flex items-start gap-3 w-full p-4 mb-4 text-sm rounded-lg shadow-sm \
    border text-red-800 bg-red-50 border-red-300 \
    dark:bg-gray-800 dark:text-red-400 dark:border-red-800";

/// An alert message to display to the user.
pub enum Alert {
    /// The operation succeeded, with extra details.
    Success {
        /// Short summary shown in bold.
        message: String,
        /// Extra details shown below the summary.
        details: String,
    },
    /// The operation succeeded.
    SuccessSimple {
        /// Short summary shown in bold.
        message: String,
    },
    /// The operation failed, with extra details.
    Error {
        /// Short summary shown in bold.
        message: String,
        /// Extra details shown below the summary.
        details: String,
    },
}

impl Alert {
    fn markup(&self) -> Markup {
        let (message, details, style) = match self {
            Alert::Success { message, details } => (message, details.as_str(), SUCCESS_STYLE),
            Alert::SuccessSimple { message } => (message, "", SUCCESS_STYLE),
            Alert::Error { message, details } => (message, details.as_str(), ERROR_STYLE),
        };

        html!(
            div class=(style) role="alert"
            {
                div class="flex-1"
                {
                    p class="font-semibold" { (message) }

                    @if !details.is_empty() {
                        p class="mt-1" { (details) }
                    }
                }

                button
                    type="button"
                    class="shrink-0 rounded-lg p-1.5 inline-flex items-center justify-center hover:bg-black/10 dark:hover:bg-white/10"
                    aria-label="Close"
                    onclick="const alert = this.closest('[role=alert]'); const container = alert.parentElement; alert.remove(); if (container && container.childElementCount === 0) { container.classList.add('hidden'); }"
                {
                    "✕"
                }
            }

            script
            {
                (PreEscaped("document.getElementById('alert-container')?.classList.remove('hidden');"))
            }
        )
    }

    /// Render the alert as an HTML fragment.
    pub fn into_html(self) -> Html<String> {
        Html(self.markup().into_string())
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        let status_code = match self {
            Alert::Success { .. } | Alert::SuccessSimple { .. } => StatusCode::OK,
            Alert::Error { .. } => StatusCode::BAD_REQUEST,
        };

        (status_code, self.into_html()).into_response()
    }
}
