//! HTTP Basic authentication.

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};

use crate::auth::{AuthOutcome, Challenge, Identity};
use crate::routing::Exchange;

pub const REALM: &str = "Fake Realm";

/// Outcome of checking a Basic `Authorization` header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BasicVerdict {
    pub authenticated: bool,
    /// Decoded user name, even when the password was wrong. Empty if the
    /// header was absent or could not be decoded.
    pub user: String,
}

pub fn verify(header: Option<&str>, expected_user: &str, expected_pass: &str) -> BasicVerdict {
    let Some((user, pass)) = header.and_then(decode) else {
        return BasicVerdict::default();
    };

    BasicVerdict {
        authenticated: user == expected_user && pass == expected_pass,
        user,
    }
}

fn decode(header: &str) -> Option<(String, String)> {
    let encoded = header.strip_prefix("Basic ")?;
    let decoded = BASE64_STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

pub fn authenticate(exchange: &Exchange, user: &str, pass: &str) -> AuthOutcome {
    let verdict = verify(
        exchange.header_value_last("Authorization").as_deref(),
        user,
        pass,
    );
    let identity = Identity::User(verdict.user);

    if verdict.authenticated {
        AuthOutcome::Approved(identity)
    } else {
        AuthOutcome::Rejected {
            challenge: Challenge::Basic {
                realm: REALM.to_string(),
            },
            identity,
        }
    }
}
