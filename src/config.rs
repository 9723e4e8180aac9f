use std::{env, net::SocketAddr, str::FromStr};

use chrono::Duration;
use jsonwebtoken::Algorithm;
use thiserror::Error;

const DEFAULT_SECRET: &str = "secret";
const ACCESS_TOKEN_EXPIRE_MINUTES: i64 = 60;
/// One year.
const MAX_ACCESS_TOKEN_EXPIRE_MINUTES: i64 = 365 * 24 * 60;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{name} has an invalid value: {value}")]
    InvalidValue { name: &'static str, value: String },

    #[error("{name} must be between 1 and {max} (got {value})")]
    OutOfRange {
        name: &'static str,
        value: String,
        max: i64,
    },

    #[error("JWT_ALGORITHM must be one of HS256, HS384, HS512 (got {0})")]
    UnsupportedAlgorithm(String),
}

/// Process-wide settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_algorithm: Algorithm,
    pub access_token_ttl: Duration,
    pub cors_origin: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            jwt_secret: DEFAULT_SECRET.to_string(),
            jwt_algorithm: Algorithm::HS256,
            access_token_ttl: Duration::minutes(ACCESS_TOKEN_EXPIRE_MINUTES),
            cors_origin: None,
        }
    }
}

impl Config {
    /// Loads `.env` if present, then overlays environment variables on the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = match lookup("PORT") {
            Some(value) => parse_var("PORT", value)?,
            None => defaults.port,
        };

        let jwt_algorithm = match lookup("JWT_ALGORITHM") {
            Some(value) => match Algorithm::from_str(&value) {
                Ok(alg @ (Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)) => alg,
                _ => return Err(ConfigError::UnsupportedAlgorithm(value)),
            },
            None => defaults.jwt_algorithm,
        };

        let access_token_ttl = match lookup("ACCESS_TOKEN_EXPIRE_MINUTES") {
            Some(value) => {
                let minutes: i64 = parse_var("ACCESS_TOKEN_EXPIRE_MINUTES", value.clone())?;
                if !(1..=MAX_ACCESS_TOKEN_EXPIRE_MINUTES).contains(&minutes) {
                    return Err(ConfigError::OutOfRange {
                        name: "ACCESS_TOKEN_EXPIRE_MINUTES",
                        value,
                        max: MAX_ACCESS_TOKEN_EXPIRE_MINUTES,
                    });
                }
                Duration::minutes(minutes)
            }
            None => defaults.access_token_ttl,
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port,
            jwt_secret: lookup("JWT_SECRET").unwrap_or(defaults.jwt_secret),
            jwt_algorithm,
            access_token_ttl,
            cors_origin: lookup("CORS_ORIGIN"),
        })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse()
            .map_err(|_| ConfigError::InvalidValue { name: "HOST", value: raw })
    }
}

fn parse_var<T: FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { name, value })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_match_service_constants() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.jwt_secret, "secret");
        assert_eq!(config.jwt_algorithm, Algorithm::HS256);
        assert_eq!(config.access_token_ttl, Duration::minutes(60));
        assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:8000");
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("PORT", "9001"),
            ("JWT_SECRET", "s3"),
            ("JWT_ALGORITHM", "HS512"),
            ("ACCESS_TOKEN_EXPIRE_MINUTES", "5"),
        ]))
        .unwrap();
        assert_eq!(config.port, 9001);
        assert_eq!(config.jwt_secret, "s3");
        assert_eq!(config.jwt_algorithm, Algorithm::HS512);
        assert_eq!(config.access_token_ttl, Duration::minutes(5));
    }

    #[test]
    fn test_rejects_non_hmac_algorithm() {
        let result = Config::from_lookup(lookup_from(&[("JWT_ALGORITHM", "RS256")]));
        assert!(matches!(result, Err(ConfigError::UnsupportedAlgorithm(_))));
    }

    #[test]
    fn test_rejects_non_positive_ttl() {
        for value in ["0", "-5"] {
            let result =
                Config::from_lookup(lookup_from(&[("ACCESS_TOKEN_EXPIRE_MINUTES", value)]));
            assert!(
                matches!(result, Err(ConfigError::OutOfRange { .. })),
                "{value} was accepted"
            );
        }
    }

    #[test]
    fn test_rejects_huge_ttl() {
        let huge = (i64::MAX / 60_000).to_string();
        let result = Config::from_lookup(lookup_from(&[("ACCESS_TOKEN_EXPIRE_MINUTES", huge.as_str())]));
        assert!(matches!(result, Err(ConfigError::OutOfRange { .. })));

        let one_year = Config::from_lookup(lookup_from(&[(
            "ACCESS_TOKEN_EXPIRE_MINUTES",
            "525600",
        )]))
        .unwrap();
        assert_eq!(one_year.access_token_ttl, Duration::days(365));
    }

    #[test]
    fn test_rejects_bad_port() {
        let result = Config::from_lookup(lookup_from(&[("PORT", "http")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { name: "PORT", .. })
        ));
    }
}
