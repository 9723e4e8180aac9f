use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::{debug, instrument};

use crate::{config::Config, error::AppError, schema::Claims};

/// Lifetime used when the caller does not ask for one.
const DEFAULT_TTL_MINUTES: i64 = 15;

/// Issues and verifies signed access tokens. Secret and algorithm are fixed
/// for the lifetime of the process.
#[derive(Clone)]
pub struct TokenIssuer {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenIssuer {
    pub fn new(secret: &str, algorithm: Algorithm) -> Self {
        let mut validation = Validation::new(algorithm);
        validation.leeway = 0;

        Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.jwt_secret, config.jwt_algorithm)
    }

    /// Creates a token for `subject_id` expiring `ttl` from now (15 minutes if `None`).
    #[instrument(skip(self))]
    pub fn issue(&self, subject_id: i64, ttl: Option<Duration>) -> Result<String, AppError> {
        let ttl = ttl.unwrap_or_else(|| Duration::minutes(DEFAULT_TTL_MINUTES));
        let expires_at = Utc::now().checked_add_signed(ttl).ok_or_else(|| {
            debug!(?ttl, "Access token lifetime overflows the clock");
            AppError::Internal("access token lifetime out of range".to_string())
        })?;
        let exp = expires_at.timestamp().max(0) as usize;

        debug!(subject_id, exp, "Issuing access token");

        let claims = Claims {
            sub: subject_id.to_string(),
            exp,
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key).map_err(|e| {
            debug!(error = %e, "Failed to encode access token");
            AppError::Internal(e.to_string())
        })
    }

    /// Returns the subject id carried by a valid, unexpired token.
    #[instrument(skip(self, token))]
    pub fn verify(&self, token: &str) -> Result<i64, AppError> {
        let claims = self.decode_claims(token)?;

        // A token whose expiry equals the current second is already stale.
        if claims.exp as i64 <= Utc::now().timestamp() {
            debug!(exp = claims.exp, "Access token expired");
            return Err(invalid_token());
        }

        claims.sub.parse::<i64>().map_err(|_| {
            debug!(sub = %claims.sub, "Access token subject is not a user id");
            invalid_token()
        })
    }

    pub(crate) fn decode_claims(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(error = %e, "Failed to decode access token");
                invalid_token()
            })
    }
}

pub(crate) fn invalid_token() -> AppError {
    AppError::Unauthorized("Invalid token".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::from_config(&Config::default())
    }

    #[test]
    fn test_issue_and_verify_round_trip() {
        let tokens = issuer();
        let token = tokens.issue(42, Some(Duration::minutes(60))).unwrap();
        assert!(!token.is_empty());
        assert_eq!(tokens.verify(&token).unwrap(), 42);
    }

    #[test]
    fn test_default_ttl_is_fifteen_minutes() {
        let tokens = issuer();
        let before = Utc::now().timestamp();
        let token = tokens.issue(1, None).unwrap();
        let claims = tokens.decode_claims(&token).unwrap();

        let ttl = claims.exp as i64 - before;
        assert!((15 * 60..=15 * 60 + 1).contains(&ttl), "ttl was {ttl}");
        assert_eq!(claims.sub, "1");
    }

    #[test]
    fn test_zero_ttl_is_expired() {
        let tokens = issuer();
        let token = tokens.issue(1, Some(Duration::zero())).unwrap();
        assert!(matches!(tokens.verify(&token), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_past_expiry_is_rejected() {
        let tokens = issuer();
        let token = tokens.issue(1, Some(Duration::minutes(-5))).unwrap();
        assert!(matches!(tokens.verify(&token), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_overflowing_ttl_is_an_error() {
        let ttl = Duration::try_minutes(i64::MAX / 60_000).unwrap();
        let result = issuer().issue(1, Some(ttl));
        assert!(matches!(result, Err(AppError::Internal(_))));
    }

    #[test]
    fn test_malformed_token() {
        let result = issuer().verify("invalid.token.here");
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_token_signed_with_other_secret() {
        let other = TokenIssuer::new("not-the-secret", Algorithm::HS256);
        let token = other.issue(1, None).unwrap();

        assert!(other.verify(&token).is_ok());
        assert!(matches!(issuer().verify(&token), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_non_numeric_subject() {
        let claims = Claims {
            sub: "alice".to_string(),
            exp: (Utc::now() + Duration::minutes(5)).timestamp() as usize,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        assert!(matches!(issuer().verify(&token), Err(AppError::Unauthorized(_))));
    }
}
