//! Response construction helpers.
//!
//! # Design Decisions
//! - Handlers return a complete `Response`; status, headers and body are
//!   assembled together, so headers can never follow body bytes
//! - JSON bodies always carry `Content-Type: application/json`

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Serialize `value` as the (two-space indented) JSON body of a response.
pub fn json<T: Serialize>(status: StatusCode, value: &T) -> Response {
    match serde_json::to_vec_pretty(value) {
        Ok(bytes) => (
            status,
            [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
            bytes,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize response body");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// A `text/plain` response.
pub fn plain_text(status: StatusCode, text: impl Into<String>) -> Response {
    (
        status,
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        )],
        text.into(),
    )
        .into_response()
}

pub fn not_found() -> Response {
    plain_text(StatusCode::NOT_FOUND, "404 page not found\n")
}

/// Status-only response with no body.
pub fn empty(status: StatusCode) -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    response
}

/// Redirect to `target`: 308 when permanent, 302 otherwise.
pub fn redirect(target: &str, permanent: bool) -> Response {
    let status = if permanent {
        StatusCode::PERMANENT_REDIRECT
    } else {
        StatusCode::FOUND
    };

    match HeaderValue::from_str(target) {
        Ok(location) => {
            let mut response = empty(status);
            response.headers_mut().insert(header::LOCATION, location);
            response
        }
        Err(_) => {
            tracing::warn!(target = %target, "Redirect target is not a valid header value");
            plain_text(StatusCode::BAD_REQUEST, "invalid redirect target")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_status() {
        let permanent = redirect("https://example.com/", true);
        assert_eq!(permanent.status(), StatusCode::PERMANENT_REDIRECT);
        assert_eq!(
            permanent.headers()[header::LOCATION],
            "https://example.com/"
        );

        assert_eq!(redirect("/elsewhere", false).status(), StatusCode::FOUND);
    }

    #[test]
    fn test_json_content_type() {
        let response = json(StatusCode::OK, &serde_json::json!({"ok": true}));
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    }
}
