//! Endpoint table.
//!
//! # Data Flow
//! ```text
//! Mux (allow-list, prefix, redirect, match)
//!     → before hook (stage X-Powered-By)
//!     → handlers.rs (echo: request, headers, ip, response headers)
//!     → auth.rs (basic, bearer, digest status)
//! ```
//!
//! # Design Decisions
//! - Registration order is match order; specific patterns come first
//! - Handlers only read the resolved Exchange, never the raw request

pub mod auth;
pub mod handlers;

use axum::http::{HeaderName, HeaderValue, Method};

use crate::config::BunConfig;
use crate::routing::Mux;

/// Build the router with every endpoint registered.
pub fn make_bun_mux(config: &BunConfig) -> Mux {
    let mut mux = Mux::new(&config.routing, &config.limits);

    mux.before(|exchange| {
        exchange.stage_header(
            HeaderName::from_static("x-powered-by"),
            HeaderValue::from_static("httpbun"),
        );
    });

    mux.handle("/get", handlers::echo(Some(Method::GET)))
        .handle("/post", handlers::echo(Some(Method::POST)))
        .handle("/put", handlers::echo(Some(Method::PUT)))
        .handle("/patch", handlers::echo(Some(Method::PATCH)))
        .handle("/delete", handlers::echo(Some(Method::DELETE)))
        .handle("/anything(/.*)?", handlers::echo(None))
        .handle("/headers", handlers::headers)
        .handle("/ip", handlers::ip)
        .handle("/user-agent", handlers::user_agent)
        .handle("/response-headers", handlers::response_headers)
        .handle("/basic-auth/(?P<user>[^/]+)/(?P<pass>[^/]+)", auth::basic_auth)
        .handle("/bearer(/(?P<tok>[^/]+))?", auth::bearer)
        .handle(
            "/digest-auth/(?P<qop>[^/]+)/(?P<user>[^/]+)/(?P<pass>[^/]+)",
            auth::digest_auth,
        )
        .handle("/health", handlers::health);

    mux
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, HeaderValue, Request, StatusCode};
    use axum::response::Response;
    use serde_json::{json, Value};

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn status(mux: &Mux, uri: &str) -> StatusCode {
        let request = Request::builder()
            .uri(uri)
            .header(header::HOST, "localhost")
            .body(Body::empty())
            .unwrap();
        mux.dispatch(request, None, false).await.status()
    }

    #[tokio::test]
    async fn test_every_route_reachable() {
        let mux = make_bun_mux(&BunConfig::default());

        for (uri, expected) in [
            ("/get", StatusCode::OK),
            ("/anything", StatusCode::OK),
            ("/anything/a/b", StatusCode::OK),
            ("/headers", StatusCode::OK),
            ("/ip", StatusCode::OK),
            ("/user-agent", StatusCode::OK),
            ("/response-headers?x=1", StatusCode::OK),
            ("/basic-auth/u/p", StatusCode::UNAUTHORIZED),
            ("/bearer", StatusCode::UNAUTHORIZED),
            ("/bearer/tok", StatusCode::UNAUTHORIZED),
            ("/digest-auth/auth/u/p", StatusCode::UNAUTHORIZED),
            ("/digest-auth/auth-int/u/p", StatusCode::UNAUTHORIZED),
            ("/health", StatusCode::OK),
            ("/post", StatusCode::METHOD_NOT_ALLOWED),
            ("/basic-auth/u", StatusCode::NOT_FOUND),
            ("/headers/", StatusCode::NOT_FOUND),
        ] {
            assert_eq!(status(&mux, uri).await, expected, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_route_captures_reach_handler() {
        let mux = make_bun_mux(&BunConfig::default());
        let request = Request::builder()
            .uri("/basic-auth/scott/tiger")
            .header(header::AUTHORIZATION, "Basic c2NvdHQ6dGlnZXI=")
            .body(Body::empty())
            .unwrap();

        let response = mux.dispatch(request, None, false).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-powered-by"], "httpbun");
    }

    #[tokio::test]
    async fn test_encoded_capture_authenticates() {
        let mux = make_bun_mux(&BunConfig::default());
        let request = Request::builder()
            .uri("/basic-auth/a%20b/p")
            .header(header::HOST, "h")
            .header(header::AUTHORIZATION, "Basic YSBiOnA=")
            .body(Body::empty())
            .unwrap();

        let response = mux.dispatch(request, None, false).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"authenticated": true, "user": "a b"})
        );
    }

    #[tokio::test]
    async fn test_headers_echo_whole_map() {
        let mux = make_bun_mux(&BunConfig::default());
        let request = Request::builder()
            .uri("/headers")
            .header(header::HOST, "h")
            .header("x-one", "one")
            .header("x-two", "two")
            .header("x-two", HeaderValue::from_bytes("café".as_bytes()).unwrap())
            .body(Body::empty())
            .unwrap();

        let response = mux.dispatch(request, None, false).await;
        assert_eq!(
            body_json(response).await,
            json!({"headers": {"X-One": "one", "X-Two": "two,café"}})
        );
    }

    #[tokio::test]
    async fn test_response_headers_echo_matches_sent_headers() {
        let mux = make_bun_mux(&BunConfig::default());
        let request = Request::builder()
            .uri("/response-headers?one=two&one=three")
            .header(header::HOST, "h")
            .body(Body::empty())
            .unwrap();

        let response = mux.dispatch(request, None, false).await;
        assert_eq!(response.headers()["x-powered-by"], "httpbun");
        assert_eq!(response.headers().get_all("x-powered-by").iter().count(), 1);

        let length = response.headers()[header::CONTENT_LENGTH].clone();
        let echoed = body_json(response).await;
        assert_eq!(echoed["X-Powered-By"], json!("httpbun"));
        assert_eq!(echoed["One"], json!(["two", "three"]));
        assert_eq!(echoed["Content-Length"], json!(length.to_str().unwrap()));
    }
}
