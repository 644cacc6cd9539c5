//! Per-request context handed to handlers.
//!
//! An [`Exchange`] resolves scheme, host and prefix-stripped path once, when
//! the dispatcher builds it, and carries the route captures, the capped body
//! and any response headers staged before the handler runs.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;

use axum::body::{Body, Bytes};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, Uri};
use futures_util::StreamExt;
use percent_encoding::percent_decode_str;

/// Request URL after proxy-header resolution and prefix stripping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedUrl {
    pub scheme: String,
    pub host: String,
    /// Decoded path with the mount prefix removed. Routes match against this.
    pub path: String,
    /// `path` as it appeared on the wire, still percent-encoded.
    pub raw_path: String,
    pub raw_query: String,
    pub fragment: String,
}

impl fmt::Display for ResolvedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}{}", self.scheme, self.host, self.raw_path)?;
        if !self.raw_query.is_empty() {
            write!(f, "?{}", self.raw_query)?;
        }
        if !self.fragment.is_empty() {
            write!(f, "#{}", self.fragment)?;
        }
        Ok(())
    }
}

/// Transport facts the dispatcher knows about a request.
#[derive(Debug, Clone, Copy)]
pub struct Transport<'a> {
    pub path_prefix: &'a str,
    pub peer: Option<SocketAddr>,
    /// Whether the connection to this process was encrypted.
    pub encrypted: bool,
    pub body_limit: usize,
}

/// Normalized request context.
pub struct Exchange {
    method: Method,
    url: ResolvedUrl,
    request_uri: String,
    headers: HeaderMap,
    fields: HashMap<String, String>,
    peer: Option<SocketAddr>,
    body: Option<Body>,
    body_limit: usize,
    staged: HeaderMap,
}

impl fmt::Debug for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exchange")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("fields", &self.fields)
            .field("peer", &self.peer)
            .finish_non_exhaustive()
    }
}

/// The host the transport reports: absolute-form authority first, then `Host`.
///
/// An absolute-form request target names the host it wants, so its authority
/// outranks the `Host` header for the allow-list and redirect targets alike.
pub fn transport_host(parts: &Parts) -> Option<String> {
    if let Some(authority) = parts.uri.authority() {
        return Some(authority.to_string());
    }
    parts
        .headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .filter(|h| !h.is_empty())
        .map(String::from)
}

/// Percent-decoded request path. Invalid UTF-8 is replaced, not rejected.
pub fn decoded_path(uri: &Uri) -> String {
    percent_decode_str(uri.path())
        .decode_utf8_lossy()
        .into_owned()
}

impl Exchange {
    /// Build an exchange, resolving scheme and host and stripping the prefix.
    pub fn new(parts: Parts, body: Body, transport: Transport<'_>) -> Self {
        let request_uri = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| "/".to_string());

        let decoded = decoded_path(&parts.uri);
        let path = decoded
            .strip_prefix(transport.path_prefix)
            .unwrap_or(&decoded)
            .to_string();
        let raw_path = parts
            .uri
            .path()
            .strip_prefix(transport.path_prefix)
            .unwrap_or(parts.uri.path())
            .to_string();

        let mut exchange = Self {
            method: parts.method.clone(),
            url: ResolvedUrl {
                path,
                raw_path,
                raw_query: parts.uri.query().unwrap_or_default().to_string(),
                ..ResolvedUrl::default()
            },
            request_uri,
            headers: parts.headers.clone(),
            fields: HashMap::new(),
            peer: transport.peer,
            body: Some(body),
            body_limit: transport.body_limit,
            staged: HeaderMap::new(),
        };

        let scheme = match parts.uri.scheme_str() {
            Some(scheme) => scheme.to_string(),
            None => match exchange.header_value_last("X-Forwarded-Proto").as_deref() {
                Some(proto) if !proto.is_empty() => proto.to_string(),
                _ if transport.encrypted => "https".to_string(),
                _ => "http".to_string(),
            },
        };

        let host = transport_host(&parts)
            .or_else(|| {
                exchange
                    .header_value_last("X-Forwarded-Host")
                    .filter(|h| !h.is_empty())
                    .map(Cow::into_owned)
            })
            .unwrap_or_default();

        exchange.url.scheme = scheme;
        exchange.url.host = host;
        exchange
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &ResolvedUrl {
        &self.url
    }

    /// Path and query exactly as the client sent them, prefix included.
    pub fn request_uri(&self) -> &str {
        &self.request_uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// A named route capture.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub(crate) fn set_fields(&mut self, fields: HashMap<String, String>) {
        self.fields = fields;
    }

    /// Last value of a header. Use this for forwarded headers: proxies append.
    ///
    /// Values are decoded lossily, so non-ASCII bytes never hide a value.
    pub fn header_value_last(&self, name: &str) -> Option<Cow<'_, str>> {
        self.headers
            .get_all(name)
            .iter()
            .last()
            .map(|v| String::from_utf8_lossy(v.as_bytes()))
    }

    /// Every value of a header in arrival order.
    pub fn header_values(&self, name: &str) -> Vec<Cow<'_, str>> {
        self.headers
            .get_all(name)
            .iter()
            .map(|v| String::from_utf8_lossy(v.as_bytes()))
            .collect()
    }

    /// Every value of a header joined with `,`, the form echo endpoints use.
    pub fn header_value_joined(&self, name: &str) -> String {
        self.header_values(name).join(",")
    }

    /// Query parameters, decoded, in the order they appear.
    pub fn query_params(&self) -> Vec<(String, String)> {
        url::form_urlencoded::parse(self.url.raw_query.as_bytes())
            .into_owned()
            .collect()
    }

    /// Every value of one query parameter.
    pub fn query_values(&self, name: &str) -> Vec<String> {
        self.query_params()
            .into_iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v)
            .collect()
    }

    /// Client address: last `X-Forwarded-For`, else the transport peer.
    pub fn client_ip(&self) -> String {
        match self.header_value_last("X-Forwarded-For") {
            Some(ip) if !ip.is_empty() => ip.into_owned(),
            _ => self.peer.map(|p| p.ip().to_string()).unwrap_or_default(),
        }
    }

    /// Value of a cookie sent in any `Cookie` header.
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.header_values("Cookie")
            .iter()
            .flat_map(|line| line.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.trim_matches('"').to_string())
    }

    /// Read the request body, at most `body_limit` bytes.
    ///
    /// The body can be read once; later calls return an empty buffer.
    /// Bytes past the limit are dropped, not reported as an error.
    pub async fn read_body(&mut self) -> Bytes {
        let Some(body) = self.body.take() else {
            return Bytes::new();
        };

        let mut stream = body.into_data_stream();
        let mut buf = Vec::new();

        while buf.len() < self.body_limit {
            match stream.next().await {
                Some(Ok(chunk)) => {
                    let room = self.body_limit - buf.len();
                    buf.extend_from_slice(&chunk[..chunk.len().min(room)]);
                }
                Some(Err(e)) => {
                    tracing::debug!(error = %e, "Request body read failed");
                    break;
                }
                None => break,
            }
        }

        Bytes::from(buf)
    }

    /// Stage a header for the response, applied unless the handler sets it.
    pub fn stage_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.staged.append(name, value);
    }

    /// Headers staged so far. They reach the client unless the handler
    /// sets the same name itself.
    pub fn staged_headers(&self) -> &HeaderMap {
        &self.staged
    }
}
