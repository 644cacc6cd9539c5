//! Echo endpoints: reflect the request back as JSON.

use std::collections::BTreeMap;

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use axum::response::Response;
use serde::Serialize;
use serde_json::Value;

use crate::http::response;
use crate::routing::Exchange;

/// `x-forwarded-for` → `X-Forwarded-For`.
pub fn canonical_header_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = true;
    for c in name.chars() {
        if upper {
            out.extend(c.to_uppercase());
        } else {
            out.extend(c.to_lowercase());
        }
        upper = c == '-';
    }
    out
}

/// Inbound headers, repeated values joined with `,`.
///
/// `Host` is left out: it describes the target, not the request headers.
fn echo_headers(exchange: &Exchange) -> BTreeMap<String, String> {
    exchange
        .headers()
        .keys()
        .filter(|name| *name != header::HOST)
        .map(|name| {
            (
                canonical_header_name(name.as_str()),
                exchange.header_value_joined(name.as_str()),
            )
        })
        .collect()
}

/// One value stays a string, repeated values become a list.
fn collapse(mut values: Vec<String>) -> Value {
    if values.len() == 1 {
        Value::String(values.remove(0))
    } else {
        Value::Array(values.into_iter().map(Value::String).collect())
    }
}

fn group_pairs(pairs: Vec<(String, String)>) -> BTreeMap<String, Vec<String>> {
    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (key, value) in pairs {
        grouped.entry(key).or_default().push(value);
    }
    grouped
}

#[derive(Serialize)]
struct HeadersEcho {
    headers: BTreeMap<String, String>,
}

pub async fn headers(exchange: Exchange) -> Response {
    response::json(
        StatusCode::OK,
        &HeadersEcho {
            headers: echo_headers(&exchange),
        },
    )
}

#[derive(Serialize)]
struct Origin {
    origin: String,
}

pub async fn ip(exchange: Exchange) -> Response {
    response::json(
        StatusCode::OK,
        &Origin {
            origin: exchange.client_ip(),
        },
    )
}

#[derive(Serialize)]
struct UserAgent<'a> {
    #[serde(rename = "user-agent")]
    user_agent: &'a str,
}

pub async fn user_agent(exchange: Exchange) -> Response {
    let agent = exchange.header_value_last("User-Agent");
    response::json(
        StatusCode::OK,
        &UserAgent {
            user_agent: agent.as_deref().unwrap_or_default(),
        },
    )
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

pub async fn health(_exchange: Exchange) -> Response {
    response::json(StatusCode::OK, &Health { status: "ok" })
}

#[derive(Serialize)]
struct RequestEcho {
    method: String,
    args: BTreeMap<String, Value>,
    headers: BTreeMap<String, String>,
    origin: String,
    url: String,
    data: String,
    json: Option<Value>,
}

/// Echo handler restricted to one method, or any method when `None`.
pub fn echo(
    only: Option<Method>,
) -> impl Fn(Exchange) -> futures_util::future::BoxFuture<'static, Response> + Send + Sync + 'static
{
    move |exchange| {
        let only = only.clone();
        Box::pin(async move {
            match only {
                Some(method) if *exchange.method() != method => {
                    response::plain_text(StatusCode::METHOD_NOT_ALLOWED, "405 method not allowed\n")
                }
                _ => request_echo(exchange).await,
            }
        })
    }
}

async fn request_echo(mut exchange: Exchange) -> Response {
    let body = exchange.read_body().await;

    let echo = RequestEcho {
        method: exchange.method().to_string(),
        args: group_pairs(exchange.query_params())
            .into_iter()
            .map(|(k, v)| (k, collapse(v)))
            .collect(),
        headers: echo_headers(&exchange),
        origin: exchange.client_ip(),
        url: exchange.url().to_string(),
        data: String::from_utf8_lossy(&body).into_owned(),
        json: serde_json::from_slice(&body).ok(),
    };

    response::json(StatusCode::OK, &echo)
}

/// Sets each query parameter as a response header and echoes the header set.
///
/// Headers staged by the before hook are part of the echo. The echoed
/// `Content-Length` is the length of the body that contains it.
pub async fn response_headers(exchange: Exchange) -> Response {
    let mut headers = exchange.staged_headers().clone();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));

    for (key, value) in exchange.query_params() {
        let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(key.as_bytes()),
            HeaderValue::from_str(&value),
        ) else {
            return response::plain_text(
                StatusCode::BAD_REQUEST,
                format!("invalid header {key:?}\n"),
            );
        };
        headers.append(name, value);
    }

    let mut echoed: BTreeMap<String, Value> = headers
        .keys()
        .map(|name| {
            let values = headers
                .get_all(name)
                .iter()
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                .collect();
            (canonical_header_name(name.as_str()), collapse(values))
        })
        .collect();

    let mut length = 0;
    let body = loop {
        echoed.insert(
            "Content-Length".to_string(),
            Value::String(length.to_string()),
        );
        let body = match serde_json::to_vec_pretty(&echoed) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize response headers");
                return response::empty(StatusCode::INTERNAL_SERVER_ERROR);
            }
        };
        if body.len() == length {
            break body;
        }
        length = body.len();
    };

    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    let mut response = Response::new(Body::from(body));
    *response.headers_mut() = headers;
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_header_name() {
        assert_eq!(canonical_header_name("x-forwarded-for"), "X-Forwarded-For");
        assert_eq!(canonical_header_name("content-type"), "Content-Type");
        assert_eq!(canonical_header_name("DNT"), "Dnt");
        assert_eq!(canonical_header_name("one"), "One");
    }

    #[test]
    fn test_collapse() {
        assert_eq!(collapse(vec!["a".into()]), Value::String("a".into()));
        assert_eq!(
            collapse(vec!["a".into(), "b".into()]),
            serde_json::json!(["a", "b"])
        );
    }

    #[test]
    fn test_group_pairs_keeps_order() {
        let grouped = group_pairs(vec![
            ("one".into(), "two".into()),
            ("three".into(), "x".into()),
            ("one".into(), "four".into()),
        ]);
        assert_eq!(grouped["one"], vec!["two".to_string(), "four".to_string()]);
        assert_eq!(grouped["three"], vec!["x".to_string()]);
    }
}
