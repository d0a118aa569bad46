use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use habitlog_core::UserId;

/// JWT claims carried by session tokens.
///
/// `iat` / `exp` are Unix timestamps in seconds, as registered by RFC 7519.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Authenticated user.
    pub user_id: UserId,

    /// Issued-at timestamp.
    pub iat: i64,

    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    pub fn new(user_id: UserId, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            user_id,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClaimsError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (iat is in the future)")]
    NotYetValid,

    #[error("invalid token time window (exp <= iat)")]
    InvalidTimeWindow,
}

/// Deterministically validate the time window of decoded claims.
///
/// Signature verification happens before this, in [`crate::Hs256Jwt`].
pub fn validate_claims(claims: &Claims, now: DateTime<Utc>) -> Result<(), ClaimsError> {
    let now = now.timestamp();
    if claims.exp <= claims.iat {
        return Err(ClaimsError::InvalidTimeWindow);
    }
    if now < claims.iat {
        return Err(ClaimsError::NotYetValid);
    }
    if now >= claims.exp {
        return Err(ClaimsError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_claims_are_valid() {
        let now = Utc::now();
        let claims = Claims::new(UserId::new(), now, Duration::hours(24));
        assert_eq!(validate_claims(&claims, now), Ok(()));
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn expired_claims_are_rejected() {
        let issued = Utc::now() - Duration::hours(25);
        let claims = Claims::new(UserId::new(), issued, Duration::hours(24));
        assert_eq!(validate_claims(&claims, Utc::now()), Err(ClaimsError::Expired));
    }

    #[test]
    fn future_claims_are_rejected() {
        let now = Utc::now();
        let claims = Claims::new(UserId::new(), now + Duration::hours(1), Duration::hours(24));
        assert_eq!(validate_claims(&claims, now), Err(ClaimsError::NotYetValid));
    }

    #[test]
    fn inverted_window_is_rejected() {
        let now = Utc::now();
        let mut claims = Claims::new(UserId::new(), now, Duration::hours(1));
        claims.exp = claims.iat;
        assert_eq!(validate_claims(&claims, now), Err(ClaimsError::InvalidTimeWindow));
    }
}
