//! Authentication engine.
//!
//! # Data Flow
//! ```text
//! Exchange (Authorization header, nonce cookie)
//!     → Scheme::authenticate (basic.rs | bearer.rs | digest.rs)
//!     → AuthOutcome::Approved(identity)  → 200 + JSON status
//!     → AuthOutcome::Rejected(challenge) → 401 + WWW-Authenticate
//! ```
//!
//! # Design Decisions
//! - Malformed credentials are routine input: every failure is a 401, never an error
//! - Digest nonces live only in a client cookie; nothing is stored server-side
//! - Bearer rejections carry no body, Basic and Digest approvals carry JSON

pub mod basic;
pub mod bearer;
pub mod digest;

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::http::response;
use crate::routing::Exchange;

/// The authentication scheme protecting a route, with its expected credentials.
#[derive(Debug, Clone, Copy)]
pub enum Scheme<'a> {
    Basic { user: &'a str, pass: &'a str },
    /// `token` restricts the accepted token; `None` accepts any.
    Bearer { token: Option<&'a str> },
    Digest { user: &'a str, pass: &'a str },
}

impl Scheme<'_> {
    pub fn authenticate(&self, exchange: &Exchange) -> AuthOutcome {
        match *self {
            Scheme::Basic { user, pass } => basic::authenticate(exchange, user, pass),
            Scheme::Bearer { token } => bearer::authenticate(exchange, token),
            Scheme::Digest { user, pass } => digest::authenticate(exchange, user, pass),
        }
    }
}

/// Who the client claimed or proved to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    User(String),
    Token(String),
}

/// A `WWW-Authenticate` challenge for one 401 response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Challenge {
    Basic {
        realm: String,
    },
    Bearer,
    Digest {
        realm: String,
        nonce: String,
        opaque: String,
    },
}

impl Challenge {
    pub fn scheme(&self) -> &'static str {
        match self {
            Challenge::Basic { .. } => "basic",
            Challenge::Bearer => "bearer",
            Challenge::Digest { .. } => "digest",
        }
    }

    /// The exact `WWW-Authenticate` value. Field order is fixed.
    pub fn header_value(&self) -> String {
        match self {
            Challenge::Basic { realm } => format!("Basic realm=\"{realm}\""),
            Challenge::Bearer => "Bearer".to_string(),
            Challenge::Digest {
                realm,
                nonce,
                opaque,
            } => format!(
                "Digest realm=\"{realm}\", qop=\"auth,auth-int\", nonce=\"{nonce}\", \
                 opaque=\"{opaque}\", algorithm=MD5, stale=FALSE"
            ),
        }
    }
}

/// Result of checking a request's credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Approved(Identity),
    Rejected {
        challenge: Challenge,
        /// What the client claimed, if anything could be decoded.
        identity: Identity,
    },
}

impl AuthOutcome {
    pub fn is_approved(&self) -> bool {
        matches!(self, AuthOutcome::Approved(_))
    }
}

#[derive(Serialize)]
struct UserStatus<'a> {
    authenticated: bool,
    user: &'a str,
}

#[derive(Serialize)]
struct TokenStatus<'a> {
    authenticated: bool,
    token: &'a str,
}

fn status_body(status: StatusCode, authenticated: bool, identity: &Identity) -> Response {
    match identity {
        Identity::User(user) => response::json(status, &UserStatus { authenticated, user }),
        Identity::Token(token) => response::json(status, &TokenStatus { authenticated, token }),
    }
}

impl IntoResponse for AuthOutcome {
    fn into_response(self) -> Response {
        let (challenge, identity) = match self {
            AuthOutcome::Approved(identity) => {
                return status_body(StatusCode::OK, true, &identity);
            }
            AuthOutcome::Rejected {
                challenge,
                identity,
            } => (challenge, identity),
        };

        tracing::debug!(scheme = challenge.scheme(), "Authentication rejected");

        let mut response = match &challenge {
            Challenge::Basic { .. } => status_body(StatusCode::UNAUTHORIZED, false, &identity),
            Challenge::Bearer | Challenge::Digest { .. } => {
                response::empty(StatusCode::UNAUTHORIZED)
            }
        };

        let headers = response.headers_mut();
        match HeaderValue::from_str(&challenge.header_value()) {
            Ok(value) => {
                headers.insert(header::WWW_AUTHENTICATE, value);
            }
            Err(e) => tracing::error!(error = %e, "Challenge is not a valid header value"),
        }

        if let Challenge::Digest { nonce, .. } = &challenge {
            match HeaderValue::from_str(&format!("{}={nonce}", digest::NONCE_COOKIE)) {
                Ok(value) => {
                    headers.insert(header::SET_COOKIE, value);
                }
                Err(e) => tracing::error!(error = %e, "Nonce cookie is not a valid header value"),
            }
        }

        response
    }
}
