//! Bearer token authentication.

use crate::auth::{AuthOutcome, Challenge, Identity};
use crate::routing::Exchange;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BearerVerdict {
    pub authenticated: bool,
    pub token: String,
}

/// Check a `Bearer <token>` header, optionally against an expected token.
pub fn verify(header: Option<&str>, expected: Option<&str>) -> BearerVerdict {
    let token = match header.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(token) if !token.is_empty() => token,
        _ => return BearerVerdict::default(),
    };

    BearerVerdict {
        authenticated: expected.map_or(true, |e| e == token),
        token: token.to_string(),
    }
}

pub fn authenticate(exchange: &Exchange, expected: Option<&str>) -> AuthOutcome {
    let verdict = verify(
        exchange.header_value_last("Authorization").as_deref(),
        expected,
    );
    let identity = Identity::Token(verdict.token);

    if verdict.authenticated {
        AuthOutcome::Approved(identity)
    } else {
        AuthOutcome::Rejected {
            challenge: Challenge::Bearer,
            identity,
        }
    }
}
