//! Assertions over raw `axum` responses for handler-level tests.

use axum::{body::Body, http::StatusCode, response::Response};

#[track_caller]
pub(crate) fn assert_content_type(response: &Response<Body>, content_type: &str) {
    match response.headers().get("content-type") {
        Some(value) => assert_eq!(value, content_type),
        None => panic!("response has no content-type header, want {content_type}"),
    }
}

/// Fetch `header_name` from `response`, panicking if it is absent or not
/// valid UTF-8.
#[track_caller]
pub(crate) fn get_header(response: &Response<Body>, header_name: &str) -> String {
    let Some(value) = response.headers().get(header_name) else {
        panic!("response has no {header_name} header");
    };

    value
        .to_str()
        .unwrap_or_else(|_| panic!("{header_name} header is not valid UTF-8"))
        .to_string()
}

#[track_caller]
pub(crate) fn assert_hx_redirect(response: &Response<Body>, endpoint: &str) {
    assert_eq!(get_header(response, "hx-redirect"), endpoint);
}

#[track_caller]
pub(crate) fn assert_see_other_redirect(response: &Response<Body>, endpoint: &str) {
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(get_header(response, "location"), endpoint);
}
