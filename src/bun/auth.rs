//! Authentication-status endpoints.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::auth::Scheme;
use crate::http::response;
use crate::routing::Exchange;

/// `/basic-auth/{user}/{pass}`
pub async fn basic_auth(exchange: Exchange) -> Response {
    let scheme = Scheme::Basic {
        user: exchange.field("user").unwrap_or_default(),
        pass: exchange.field("pass").unwrap_or_default(),
    };
    scheme.authenticate(&exchange).into_response()
}

/// `/bearer` accepts any token, `/bearer/{tok}` only that one.
pub async fn bearer(exchange: Exchange) -> Response {
    let scheme = Scheme::Bearer {
        token: exchange.field("tok").filter(|t| !t.is_empty()),
    };
    scheme.authenticate(&exchange).into_response()
}

/// `/digest-auth/{qop}/{user}/{pass}`
pub async fn digest_auth(exchange: Exchange) -> Response {
    let qop = exchange.field("qop").unwrap_or_default();
    if qop != "auth" && qop != "auth-int" {
        return response::plain_text(
            StatusCode::BAD_REQUEST,
            format!("qop {qop:?} not supported, use auth or auth-int\n"),
        );
    }

    let scheme = Scheme::Digest {
        user: exchange.field("user").unwrap_or_default(),
        pass: exchange.field("pass").unwrap_or_default(),
    };
    scheme.authenticate(&exchange).into_response()
}
