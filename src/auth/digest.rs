//! HTTP Digest authentication (RFC 2617, MD5, `qop=auth`).
//!
//! # Lifecycle
//! ```text
//! no Authorization / no nonce cookie ──▶ challenge (fresh nonce + opaque, Set-Cookie)
//! Authorization: Digest ... + cookie  ──▶ recompute response
//!                                          ├─ equal   ──▶ approved
//!                                          └─ unequal ──▶ challenge again
//! ```
//!
//! The server never remembers a nonce. The cookie carries it back, and the
//! response hash binds it to the method, uri and known password.
//! `opaque` must be present in the client's header but is not compared with
//! the issued value.

use std::collections::HashMap;
use std::sync::LazyLock;

use md5::{Digest, Md5};
use regex::Regex;
use thiserror::Error;

use crate::auth::{AuthOutcome, Challenge, Identity};
use crate::routing::Exchange;

pub const REALM: &str = "testrealm@host.com";
pub const NONCE_COOKIE: &str = "nonce";

static PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z]+)\s*=\s*(?:"([^"]*)"|([^,\s"]*))"#).expect("digest parameter regex")
});

/// Why a `Digest` header could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DigestError {
    #[error("authorization header is not a Digest credential")]
    NotDigest,

    #[error("digest credential is missing {0:?}")]
    MissingField(&'static str),

    #[error("unsupported qop {0:?}")]
    UnsupportedQop(String),

    #[error("unsupported algorithm {0:?}")]
    UnsupportedAlgorithm(String),
}

/// Parameters of an `Authorization: Digest ...` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestCredentials {
    pub username: String,
    pub realm: String,
    pub nonce: String,
    pub uri: String,
    pub response: String,
    pub opaque: String,
    pub qop: String,
    pub nc: String,
    pub cnonce: String,
    pub algorithm: Option<String>,
}

pub fn parse_authorization(header: &str) -> Result<DigestCredentials, DigestError> {
    let params = header
        .strip_prefix("Digest ")
        .ok_or(DigestError::NotDigest)?;

    let mut fields: HashMap<String, String> = PARAM
        .captures_iter(params)
        .map(|caps| {
            let value = caps.get(2).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
            (caps[1].to_ascii_lowercase(), value.to_string())
        })
        .collect();

    let mut take = |name: &'static str| fields.remove(name).ok_or(DigestError::MissingField(name));

    let credentials = DigestCredentials {
        username: take("username")?,
        realm: take("realm")?,
        nonce: take("nonce")?,
        uri: take("uri")?,
        response: take("response")?,
        opaque: take("opaque")?,
        qop: take("qop")?,
        nc: take("nc")?,
        cnonce: take("cnonce")?,
        algorithm: take("algorithm").ok(),
    };

    if credentials.qop != "auth" {
        return Err(DigestError::UnsupportedQop(credentials.qop));
    }

    if let Some(algorithm) = &credentials.algorithm {
        if !algorithm.eq_ignore_ascii_case("MD5") {
            return Err(DigestError::UnsupportedAlgorithm(algorithm.clone()));
        }
    }

    Ok(credentials)
}

fn md5_hex(input: &str) -> String {
    hex::encode(Md5::digest(input.as_bytes()))
}

/// Expected `response` value for the given inputs, in realm [`REALM`].
#[allow(clippy::too_many_arguments)]
pub fn compute_response(
    username: &str,
    password: &str,
    nonce: &str,
    nc: &str,
    cnonce: &str,
    qop: &str,
    method: &str,
    uri: &str,
) -> String {
    let ha1 = md5_hex(&format!("{username}:{REALM}:{password}"));
    let ha2 = md5_hex(&format!("{method}:{uri}"));
    md5_hex(&format!("{ha1}:{nonce}:{nc}:{cnonce}:{qop}:{ha2}"))
}

/// 16 random bytes as lower-case hex.
pub fn random_token() -> String {
    hex::encode(rand::random::<[u8; 16]>())
}

/// A challenge with a fresh nonce and opaque.
pub fn challenge() -> Challenge {
    Challenge::Digest {
        realm: REALM.to_string(),
        nonce: random_token(),
        opaque: random_token(),
    }
}

pub fn authenticate(exchange: &Exchange, user: &str, pass: &str) -> AuthOutcome {
    let rechallenge = |reason: &str| {
        tracing::debug!(reason, "Digest credentials not accepted");
        AuthOutcome::Rejected {
            challenge: challenge(),
            identity: Identity::User(String::new()),
        }
    };

    let Some(header) = exchange.header_value_last("Authorization") else {
        return rechallenge("no authorization header");
    };

    let Some(server_nonce) = exchange.cookie(NONCE_COOKIE) else {
        return rechallenge("no nonce cookie");
    };

    let credentials = match parse_authorization(&header) {
        Ok(credentials) => credentials,
        Err(e) => return rechallenge(&e.to_string()),
    };

    if credentials.username != user {
        return rechallenge("unknown user");
    }

    if credentials.nonce != server_nonce {
        return rechallenge("nonce does not match cookie");
    }

    let expected = compute_response(
        user,
        pass,
        &server_nonce,
        &credentials.nc,
        &credentials.cnonce,
        &credentials.qop,
        exchange.method().as_str(),
        &credentials.uri,
    );

    if !expected.eq_ignore_ascii_case(&credentials.response) {
        return rechallenge("response mismatch");
    }

    AuthOutcome::Approved(Identity::User(credentials.username))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::exchange::Transport;
    use axum::body::Body;
    use axum::http::Request;

    const DAVE_HEADER: &str = "Digest username=\"dave\", realm=\"testrealm@host.com\", \
        nonce=\"d9fc96d7fe39099441042eea21006d77\", uri=\"/digest-auth/auth/dave/diamond\", \
        algorithm=MD5, response=\"10c1132a06ac0de7c39a07e8553f0f14\", \
        opaque=\"362d9b0fe6787b534eb27677f4210b61\", qop=auth, nc=00000001, \
        cnonce=\"bb2ec71d21a27e19\"";

    fn exchange(headers: &[(&str, &str)]) -> Exchange {
        let mut builder = Request::builder().uri("/digest-auth/auth/dave/diamond");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let (parts, body) = builder.body(Body::empty()).unwrap().into_parts();
        Exchange::new(
            parts,
            body,
            Transport {
                path_prefix: "",
                peer: None,
                encrypted: false,
                body_limit: 1024,
            },
        )
    }

    #[test]
    fn test_rfc2617_vector() {
        assert_eq!(
            compute_response(
                "Mufasa",
                "Circle Of Life",
                "dcd98b7102dd2f0e8b11d0f600bfb0c093",
                "00000001",
                "0a4f113b",
                "auth",
                "GET",
                "/dir/index.html",
            ),
            "6629fae49393a05397450978507c4ef1"
        );
    }

    #[test]
    fn test_parse_mixed_quoting() {
        let credentials = parse_authorization(DAVE_HEADER).unwrap();
        assert_eq!(credentials.username, "dave");
        assert_eq!(credentials.qop, "auth");
        assert_eq!(credentials.nc, "00000001");
        assert_eq!(credentials.cnonce, "bb2ec71d21a27e19");
        assert_eq!(credentials.algorithm.as_deref(), Some("MD5"));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            parse_authorization("Basic abc"),
            Err(DigestError::NotDigest)
        );
        assert_eq!(
            parse_authorization(&format!("Authorization: {DAVE_HEADER}")),
            Err(DigestError::NotDigest)
        );
        assert_eq!(
            parse_authorization("Digest username=\"dave\""),
            Err(DigestError::MissingField("realm"))
        );
        assert_eq!(
            parse_authorization(&DAVE_HEADER.replace("qop=auth", "qop=auth-int")),
            Err(DigestError::UnsupportedQop("auth-int".into()))
        );
    }

    #[test]
    fn test_random_tokens_are_fresh_hex() {
        let a = random_token();
        let b = random_token();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        assert_ne!(a, b);
    }

    #[test]
    fn test_verified_with_matching_cookie() {
        let ex = exchange(&[
            ("Cookie", "nonce=d9fc96d7fe39099441042eea21006d77"),
            ("Authorization", DAVE_HEADER),
        ]);
        assert_eq!(
            authenticate(&ex, "dave", "diamond"),
            AuthOutcome::Approved(Identity::User("dave".into()))
        );
    }

    #[test]
    fn test_uppercase_response_accepted() {
        let header = DAVE_HEADER.replace(
            "10c1132a06ac0de7c39a07e8553f0f14",
            "10C1132A06AC0DE7C39A07E8553F0F14",
        );
        let ex = exchange(&[
            ("Cookie", "nonce=d9fc96d7fe39099441042eea21006d77"),
            ("Authorization", header.as_str()),
        ]);
        assert!(authenticate(&ex, "dave", "diamond").is_approved());
    }

    #[test]
    fn test_rejections_rechallenge() {
        let cases = [
            exchange(&[]),
            exchange(&[("Authorization", DAVE_HEADER)]),
            exchange(&[("Cookie", "nonce=other"), ("Authorization", DAVE_HEADER)]),
            exchange(&[
                ("Cookie", "nonce=d9fc96d7fe39099441042eea21006d77"),
                ("Authorization", DAVE_HEADER.replace("\"dave\"", "\"dave2\"").as_str()),
            ]),
        ];

        for ex in &cases {
            match authenticate(ex, "dave", "diamond") {
                AuthOutcome::Rejected {
                    challenge: Challenge::Digest { realm, nonce, opaque },
                    ..
                } => {
                    assert_eq!(realm, REALM);
                    assert!(!nonce.is_empty());
                    assert!(!opaque.is_empty());
                }
                other => panic!("expected digest challenge, got {other:?}"),
            }
        }

        let ex = exchange(&[
            ("Cookie", "nonce=d9fc96d7fe39099441042eea21006d77"),
            ("Authorization", DAVE_HEADER),
        ]);
        assert!(!authenticate(&ex, "dave", "wrong").is_approved());
    }
}
