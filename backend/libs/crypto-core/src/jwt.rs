/// Identity token issuing and verification
///
/// Tokens assert a single fact: the account id in `sub`. They are signed with a
/// server-held HMAC secret (HS256) and expire after a fixed window (30 days by
/// default).
///
/// ## Usage
///
/// Keys are constructed once at startup and handed to whoever needs them:
///
/// ```rust
/// use chrono::Duration;
/// use crypto_core::jwt::JwtKeys;
///
/// let keys = JwtKeys::from_secret(b"a-very-long-development-secret-value!", Duration::days(30));
/// let token = keys.issue(42).unwrap();
/// let claims = keys.verify(&token).unwrap();
/// assert_eq!(claims.subject_id().unwrap(), 42);
/// ```
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Constants
// ============================================================================

pub const DEFAULT_TOKEN_TTL_DAYS: i64 = 30;

const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

// ============================================================================
// Data Structures
// ============================================================================

/// JWT claims: subject plus issue/expiry timestamps
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (account id as decimal string)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Parse the subject back into an account id
    pub fn subject_id(&self) -> Result<i64, TokenError> {
        self.sub.parse().map_err(|_| TokenError::Invalid)
    }
}

/// Why a token could not be issued or accepted
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// Bad signature, malformed token, or unparsable claims
    #[error("Invalid token")]
    Invalid,

    #[error("Token expired")]
    Expired,

    #[error("Failed to sign token: {0}")]
    Signing(String),
}

// ============================================================================
// Keys
// ============================================================================

/// Signing and verification keys derived from one shared secret
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtKeys")
            .field("secret", &"[REDACTED]")
            .field("ttl_days", &self.ttl.num_days())
            .finish()
    }
}

impl JwtKeys {
    pub fn from_secret(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `subject` valid from now
    pub fn issue(&self, subject: i64) -> Result<String, TokenError> {
        self.issue_at(subject, Utc::now())
    }

    /// Issue a token as if it had been created at `issued_at`
    pub fn issue_at(&self, subject: i64, issued_at: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = Claims {
            sub: subject.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.ttl).timestamp(),
        };

        encode(&Header::new(JWT_ALGORITHM), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify signature and expiry, returning the decoded claims
    ///
    /// ## Errors
    ///
    /// - `TokenError::Expired` when `exp` is in the past
    /// - `TokenError::Invalid` for every other failure
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.validate_exp = true;
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => {
                    tracing::debug!("token rejected: {}", e);
                    TokenError::Invalid
                }
            })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &[u8] = b"unit-test-secret-that-is-long-enough-0123";

    fn keys() -> JwtKeys {
        JwtKeys::from_secret(TEST_SECRET, Duration::days(DEFAULT_TOKEN_TTL_DAYS))
    }

    #[test]
    fn test_issue_and_verify() {
        let token = keys().issue(7).expect("Failed to issue token");
        assert_eq!(token.matches('.').count(), 2);

        let claims = keys().verify(&token).expect("token should verify");
        assert_eq!(claims.sub, "7");
        assert_eq!(claims.subject_id().unwrap(), 7);
    }

    #[test]
    fn test_expiry_window_is_thirty_days() {
        let now = Utc::now();
        let token = keys().issue_at(1, now).unwrap();
        let claims = keys().verify(&token).unwrap();
        assert_eq!(claims.exp - claims.iat, 30 * 24 * 3600);
    }

    #[test]
    fn test_expired_token() {
        let long_ago = Utc::now() - Duration::days(31);
        let token = keys().issue_at(1, long_ago).unwrap();
        assert_eq!(keys().verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let token = keys().issue(1).unwrap();
        let other = JwtKeys::from_secret(b"another-secret-of-sufficient-length!!", Duration::days(30));
        assert_eq!(other.verify(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn test_garbage_is_invalid() {
        assert_eq!(keys().verify("invalid.token.here"), Err(TokenError::Invalid));
        assert_eq!(keys().verify(""), Err(TokenError::Invalid));
    }

    #[test]
    fn test_non_numeric_subject() {
        let claims = Claims {
            sub: "abc".to_string(),
            iat: 0,
            exp: 0,
        };
        assert_eq!(claims.subject_id(), Err(TokenError::Invalid));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let rendered = format!("{:?}", keys());
        assert!(rendered.contains("REDACTED"));
        assert!(!rendered.contains("unit-test-secret"));
    }
}
