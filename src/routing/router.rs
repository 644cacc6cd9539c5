//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Reject hosts outside the allow-list before anything else
//! - Enforce and strip the mount prefix
//! - Redirect plain-HTTP root requests when HTTPS is forced
//! - Run the first route whose pattern matches the whole path
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) ordered scan (route table is small and static)
//! - Explicit 404 rather than silent default

use std::future::Future;
use std::net::SocketAddr;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use futures_util::future::BoxFuture;

use crate::config::{LimitsConfig, RoutingConfig};
use crate::http::response;
use crate::routing::exchange::{decoded_path, transport_host, Exchange, Transport};
use crate::routing::matcher::{HostAllowList, Pattern};

/// An async request handler.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, exchange: Exchange) -> BoxFuture<'static, Response>;
}

impl<F, Fut> Handler for F
where
    F: Fn(Exchange) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    fn call(&self, exchange: Exchange) -> BoxFuture<'static, Response> {
        Box::pin(self(exchange))
    }
}

/// Hook run after a route matched and before its handler.
pub type BeforeHook = Box<dyn Fn(&mut Exchange) + Send + Sync>;

struct Route {
    pattern: Pattern,
    handler: Box<dyn Handler>,
}

/// Ordered, first-match-wins route table.
pub struct Mux {
    path_prefix: String,
    allowed_hosts: HostAllowList,
    force_https: bool,
    body_limit: usize,
    before: Option<BeforeHook>,
    routes: Vec<Route>,
}

impl std::fmt::Debug for Mux {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mux")
            .field("path_prefix", &self.path_prefix)
            .field("allowed_hosts", &self.allowed_hosts)
            .field("force_https", &self.force_https)
            .field(
                "routes",
                &self.routes.iter().map(|r| r.pattern.as_str()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Mux {
    pub fn new(routing: &RoutingConfig, limits: &LimitsConfig) -> Self {
        Self {
            path_prefix: routing.path_prefix.clone(),
            allowed_hosts: HostAllowList::new(routing.allowed_hosts.iter().cloned()),
            force_https: routing.force_https,
            body_limit: limits.max_body_bytes,
            before: None,
            routes: Vec::new(),
        }
    }

    /// Register a route.
    ///
    /// # Panics
    /// If `pattern` is not a valid regular expression. Use [`Mux::try_handle`]
    /// for patterns that do not come from source code.
    pub fn handle<H: Handler>(&mut self, pattern: &str, handler: H) -> &mut Self {
        if let Err(e) = self.try_handle(pattern, handler) {
            panic!("invalid route pattern {pattern:?}: {e}");
        }
        self
    }

    /// Register a route, reporting an invalid pattern.
    pub fn try_handle<H: Handler>(
        &mut self,
        pattern: &str,
        handler: H,
    ) -> Result<&mut Self, regex::Error> {
        self.routes.push(Route {
            pattern: Pattern::new(pattern)?,
            handler: Box::new(handler),
        });
        Ok(self)
    }

    /// Set the hook run before every matched handler.
    pub fn before<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&mut Exchange) + Send + Sync + 'static,
    {
        self.before = Some(Box::new(hook));
        self
    }

    /// Route one request and produce its response.
    pub async fn dispatch(
        &self,
        request: Request<Body>,
        peer: Option<SocketAddr>,
        encrypted: bool,
    ) -> Response {
        let (parts, body) = request.into_parts();
        let host = transport_host(&parts).unwrap_or_default();

        if !self.allowed_hosts.permits(&host) {
            tracing::warn!(host = %host, "Host not in allow-list");
            return response::plain_text(
                StatusCode::FORBIDDEN,
                format!("403 host {host:?} not allowed"),
            );
        }

        if !decoded_path(&parts.uri).starts_with(&self.path_prefix) {
            return response::not_found();
        }

        let mut exchange = Exchange::new(
            parts,
            body,
            Transport {
                path_prefix: &self.path_prefix,
                peer,
                encrypted,
                body_limit: self.body_limit,
            },
        );

        if self.force_https
            && exchange.header_value_last("X-Forwarded-Proto").as_deref() == Some("http")
            && exchange.url().path == "/"
        {
            let target = format!("https://{}{}", host, exchange.request_uri());
            tracing::debug!(target = %target, "Forcing HTTPS");
            return response::redirect(&target, true);
        }

        let matched = self.routes.iter().find_map(|route| {
            route
                .pattern
                .captures(&exchange.url().path)
                .map(|fields| (route, fields))
        });

        let Some((route, fields)) = matched else {
            tracing::info!(
                ip = %exchange.client_ip(),
                method = %exchange.method(),
                url = %exchange.request_uri(),
                "NotFound"
            );
            return response::not_found();
        };

        tracing::debug!(pattern = route.pattern.as_str(), "Route matched");
        exchange.set_fields(fields);
        self.run(route, exchange).await
    }

    async fn run(&self, route: &Route, mut exchange: Exchange) -> Response {
        if let Some(hook) = &self.before {
            hook(&mut exchange);
        }

        let staged = exchange.staged_headers().clone();
        let mut response = route.handler.call(exchange).await;

        let headers = response.headers_mut();
        for name in staged.keys() {
            if !headers.contains_key(name) {
                for value in staged.get_all(name) {
                    headers.append(name.clone(), value.clone());
                }
            }
        }

        response
    }
}
