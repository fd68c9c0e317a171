//! Shared-secret authentication for the sync endpoints.
//!
//! The Edge sends the secret in `X-Edge-Token` (or as
//! `Authorization: Bearer <token>`). Both sides normalize the value by
//! trimming whitespace and one layer of surrounding quotes, which tend to
//! sneak in through env files.
//!
//! Tokens are compared as HMAC-SHA256 digests keyed by the secret, so the
//! comparison time does not depend on where the first mismatch is.

use crate::error::{ServerError, ServerResult};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tillsync_sync_protocol::BEARER_PREFIX;
use tracing::{debug, warn};

type HmacSha256 = Hmac<Sha256>;

/// Trims whitespace and one layer of matching quotes.
pub fn normalize_token(raw: &str) -> &str {
    let mut token = raw.trim();
    for quote in ['"', '\''] {
        if token.len() >= 2 && token.starts_with(quote) && token.ends_with(quote) {
            token = token[1..token.len() - 1].trim();
        }
    }
    token
}

/// Picks the presented token from the two accepted headers.
///
/// `X-Edge-Token` wins when both are present.
pub fn presented_token<'a>(
    edge_token: Option<&'a str>,
    authorization: Option<&'a str>,
) -> Option<&'a str> {
    let from_edge = edge_token.map(normalize_token).filter(|t| !t.is_empty());
    from_edge.or_else(|| {
        authorization
            .map(str::trim)
            .and_then(|value| value.strip_prefix(BEARER_PREFIX))
            .map(normalize_token)
            .filter(|t| !t.is_empty())
    })
}

/// Validates presented tokens against the configured secret.
///
/// Without a secret every request is denied.
#[derive(Clone)]
pub struct TokenValidator {
    secret: Option<Vec<u8>>,
    expected: Option<Vec<u8>>,
}

impl TokenValidator {
    /// Creates a validator; `None` or an empty secret denies everything.
    pub fn new(secret: Option<&str>) -> Self {
        let secret = secret
            .map(normalize_token)
            .filter(|s| !s.is_empty())
            .map(|s| s.as_bytes().to_vec());
        let expected = secret.as_deref().and_then(|key| digest(key, key));
        Self { secret, expected }
    }

    /// Returns true if a secret is configured.
    pub fn is_configured(&self) -> bool {
        self.expected.is_some()
    }

    /// Checks a presented token.
    pub fn validate(&self, presented: Option<&str>) -> ServerResult<()> {
        let (Some(secret), Some(expected)) = (&self.secret, &self.expected) else {
            warn!("sync token not configured, denying request");
            return Err(ServerError::Unauthorized);
        };
        let Some(presented) = presented.map(normalize_token) else {
            debug!(header_present = false, "sync auth check failed");
            return Err(ServerError::Unauthorized);
        };

        let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
            return Err(ServerError::Unauthorized);
        };
        mac.update(presented.as_bytes());
        match mac.verify_slice(expected) {
            Ok(()) => Ok(()),
            Err(_) => {
                debug!(
                    header_present = true,
                    header_len = presented.len(),
                    "sync auth check failed"
                );
                Err(ServerError::Unauthorized)
            }
        }
    }

    /// Checks the token carried by the request headers.
    pub fn validate_headers(
        &self,
        edge_token: Option<&str>,
        authorization: Option<&str>,
    ) -> ServerResult<()> {
        self.validate(presented_token(edge_token, authorization))
    }
}

impl std::fmt::Debug for TokenValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenValidator")
            .field("configured", &self.is_configured())
            .finish()
    }
}

fn digest(key: &[u8], data: &[u8]) -> Option<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key).ok()?;
    mac.update(data);
    Some(mac.finalize().into_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization() {
        assert_eq!(normalize_token("  abc \n"), "abc");
        assert_eq!(normalize_token("\"abc\""), "abc");
        assert_eq!(normalize_token("' abc '"), "abc");
        assert_eq!(normalize_token("\"abc"), "\"abc");
        assert_eq!(normalize_token("\""), "\"");
    }

    #[test]
    fn header_precedence() {
        assert_eq!(presented_token(Some("a"), Some("Bearer b")), Some("a"));
        assert_eq!(presented_token(None, Some("Bearer b")), Some("b"));
        assert_eq!(presented_token(Some("  "), Some("Bearer b")), Some("b"));
        assert_eq!(presented_token(None, Some("Basic b")), None);
        assert_eq!(presented_token(None, None), None);
    }

    #[test]
    fn accepts_matching_token() {
        let validator = TokenValidator::new(Some("shared-secret"));
        assert!(validator.is_configured());
        assert!(validator.validate(Some("shared-secret")).is_ok());
        assert!(validator.validate(Some(" 'shared-secret' ")).is_ok());
        assert!(validator
            .validate_headers(None, Some("Bearer shared-secret"))
            .is_ok());
    }

    #[test]
    fn rejects_wrong_or_missing_token() {
        let validator = TokenValidator::new(Some("shared-secret"));
        assert!(validator.validate(Some("shared-secreT")).is_err());
        assert!(validator.validate(Some("shared-secret-longer")).is_err());
        assert!(validator.validate(Some("")).is_err());
        assert!(validator.validate(None).is_err());
    }

    #[test]
    fn unconfigured_validator_denies_everything() {
        for secret in [None, Some(""), Some("  \"\" ")] {
            let validator = TokenValidator::new(secret);
            assert!(!validator.is_configured());
            assert!(validator.validate(Some("")).is_err());
            assert!(validator.validate(Some("anything")).is_err());
        }
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let validator = TokenValidator::new(Some("shared-secret"));
        assert!(!format!("{validator:?}").contains("shared-secret"));
    }
}
