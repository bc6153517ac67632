//! Bearer token validation.
//!
//! Fail-closed: every problem with the presented token (malformed, bad
//! signature, expired, not yet valid, wrong iss/aud) collapses into `None`.
//! Nothing here returns an error to the caller.

use std::sync::Arc;

use tracing::debug;

use crate::services::auth::claims::TokenClaims;
use crate::services::auth::identity::{Identity, PermissionSet};
use crate::services::auth::signing::SigningKeys;

const BEARER: &str = "bearer";

#[derive(Clone, Debug)]
pub struct TokenValidator {
    keys: Arc<SigningKeys>,
}

impl TokenValidator {
    pub fn new(keys: Arc<SigningKeys>) -> Self {
        Self { keys }
    }

    /// Validate a raw `Authorization` header value and derive the caller's identity.
    pub fn validate(&self, raw_header_value: &str) -> Option<Identity> {
        let token = strip_bearer(raw_header_value);
        if token.is_empty() {
            return None;
        }

        let params = self.keys.validation_parameters();
        let claims =
            match jsonwebtoken::decode::<TokenClaims>(token, params.key, params.validation) {
                Ok(data) => data.claims,
                Err(err) => {
                    debug!(reason = ?err.kind(), "bearer token rejected");
                    return None;
                }
            };

        // A subject that is not an integer verifies, but yields "not established".
        let user_id = claims.sub.trim().parse::<i64>().unwrap_or(0);

        Some(Identity {
            user_id,
            name: claims.name,
            email: claims.email.filter(|e| !e.trim().is_empty()),
            permissions: claims.permission.iter().collect::<PermissionSet>(),
        })
    }
}

/// Trim the header value and drop a leading `Bearer` scheme (any casing).
///
/// A value without the scheme marker is taken as the token itself.
fn strip_bearer(raw: &str) -> &str {
    let raw = raw.trim();
    match raw.get(..BEARER.len()) {
        Some(scheme) if scheme.eq_ignore_ascii_case(BEARER) => {
            let rest = &raw[BEARER.len()..];
            if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                rest.trim_start()
            } else {
                raw
            }
        }
        _ => raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SigningConfig;
    use crate::services::auth::issuer::TokenIssuer;
    use chrono::{Duration, Utc};

    fn keys_with(secret: &str, issuer: Option<&str>) -> Arc<SigningKeys> {
        keys_for(secret, issuer, None)
    }

    fn keys_for(secret: &str, issuer: Option<&str>, audience: Option<&str>) -> Arc<SigningKeys> {
        let cfg = SigningConfig::from_parts(Some(secret), issuer, audience, None).unwrap();
        Arc::new(SigningKeys::new(cfg))
    }

    fn pair() -> (TokenIssuer, TokenValidator) {
        let keys = keys_with("validator-test-secret", None);
        (TokenIssuer::new(keys.clone()), TokenValidator::new(keys))
    }

    #[test]
    fn round_trip_yields_identity() {
        let (issuer, validator) = pair();
        let token = issuer
            .issue(42, "alice", None, ["READ", "write"])
            .unwrap();

        let identity = validator.validate(&format!("Bearer {token}")).unwrap();
        assert_eq!(identity.user_id, 42);
        assert_eq!(identity.name, "alice");
        let expected: PermissionSet = ["read", "write"].into_iter().collect();
        assert_eq!(identity.permissions, expected);
    }

    #[test]
    fn scheme_is_case_insensitive_and_whitespace_tolerant() {
        let (issuer, validator) = pair();
        let token = issuer.issue(5, "eve", None, ["x"]).unwrap();

        for header in [
            format!("bearer {token}"),
            format!("  BEARER    {token}  "),
            format!("BeArEr\t{token}"),
            token.clone(),
        ] {
            assert_eq!(validator.validate(&header).map(|i| i.user_id), Some(5));
        }
    }

    #[test]
    fn blank_values_are_rejected_without_parsing() {
        let (_, validator) = pair();
        assert!(validator.validate("").is_none());
        assert!(validator.validate("   ").is_none());
        assert!(validator.validate("Bearer").is_none());
        assert!(validator.validate("Bearer    ").is_none());
    }

    #[test]
    fn expired_token_is_rejected() {
        let (issuer, validator) = pair();
        let token = issuer
            .issue_at(Utc::now() - Duration::hours(2), 42, "alice", None, ["read"])
            .unwrap();
        assert!(validator.validate(&format!("Bearer {token}")).is_none());
    }

    #[test]
    fn not_yet_valid_token_is_rejected() {
        let (issuer, validator) = pair();
        let token = issuer
            .issue_at(Utc::now() + Duration::minutes(10), 42, "alice", None, ["read"])
            .unwrap();
        assert!(validator.validate(&token).is_none());
    }

    #[test]
    fn tampered_signature_is_rejected() {
        let (issuer, validator) = pair();
        let token = issuer.issue(42, "alice", None, ["read"]).unwrap();

        let (head, sig) = token.rsplit_once('.').unwrap();
        let mut sig = sig.to_string().into_bytes();
        sig[0] = if sig[0] == b'A' { b'B' } else { b'A' };
        let tampered = format!("{head}.{}", String::from_utf8(sig).unwrap());

        assert!(validator.validate(&tampered).is_none());
    }

    #[test]
    fn foreign_secret_or_issuer_is_rejected() {
        let (_, validator) = pair();

        let other = TokenIssuer::new(keys_with("some-other-secret", None));
        let token = other.issue(1, "mallory", None, ["read"]).unwrap();
        assert!(validator.validate(&token).is_none());

        let other = TokenIssuer::new(keys_with("validator-test-secret", Some("SomeoneElse")));
        let token = other.issue(1, "mallory", None, ["read"]).unwrap();
        assert!(validator.validate(&token).is_none());
    }

    #[test]
    fn foreign_audience_is_rejected() {
        let (_, validator) = pair();

        let other = TokenIssuer::new(keys_for("validator-test-secret", None, Some("Other")));
        let token = other.issue(1, "mallory", None, ["read"]).unwrap();
        assert!(validator.validate(&format!("Bearer {token}")).is_none());
    }

    #[test]
    fn garbage_is_rejected() {
        let (_, validator) = pair();
        assert!(validator.validate("Bearer not.a.jwt").is_none());
        assert!(validator.validate("Bearer abc").is_none());
        assert!(validator.validate("Basic dXNlcjpwYXNz").is_none());
    }

    #[test]
    fn strip_bearer_keeps_prefix_like_tokens() {
        assert_eq!(strip_bearer("Bearer abc"), "abc");
        assert_eq!(strip_bearer("bearerabc"), "bearerabc");
        assert_eq!(strip_bearer("  abc "), "abc");
        assert_eq!(strip_bearer("Bearer"), "");
    }
}
