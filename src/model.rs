use chrono::NaiveDateTime;

// Registered account. The password is kept and compared in plaintext.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct User {
    #[serde(deserialize_with = "lenient::int")]
    pub id: i64,
    pub email: String,
    pub password: String,
}

// Data model representing a Todo item
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Todo {
    #[serde(deserialize_with = "lenient::int")]
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient::int")]
    pub user_id: i64,
    #[serde(deserialize_with = "lenient::datetime")]
    pub scheduled_for: NaiveDateTime,
    #[serde(default, deserialize_with = "lenient::boolean")]
    pub completed: bool,
}

// Authenticated caller, attached to the request by the auth middleware
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub(crate) id: i64,
    pub(crate) email: String,
}

/// Checks the loose `local@domain.tld` shape and returns the address with its
/// domain lowercased, or `None` when it is not an address.
pub fn normalize_email(email: &str) -> Option<String> {
    if email.chars().any(char::is_whitespace) {
        return None;
    }

    let (local, domain) = email.split_once('@')?;
    let (host, tld) = domain.split_once('.')?;
    if local.is_empty() || domain.contains('@') || host.is_empty() || tld.is_empty() {
        return None;
    }

    Some(format!("{}@{}", local, domain.to_ascii_lowercase()))
}

/// Deserializers accepting the loosely typed input clients send: numeric
/// strings for ids, word booleans, and timestamps with or without an offset.
mod lenient {
    use std::fmt;

    use chrono::{DateTime, NaiveDateTime};
    use serde::de::{self, Deserializer, Unexpected, Visitor};

    const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

    pub fn int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        struct IntVisitor;

        impl<'de> Visitor<'de> for IntVisitor {
            type Value = i64;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an integer or a string holding one")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
                Ok(v)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
                i64::try_from(v).map_err(|_| E::invalid_value(Unexpected::Unsigned(v), &self))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<i64, E> {
                if v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64 {
                    Ok(v as i64)
                } else {
                    Err(E::invalid_value(Unexpected::Float(v), &self))
                }
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<i64, E> {
                v.trim()
                    .parse()
                    .map_err(|_| E::invalid_value(Unexpected::Str(v), &self))
            }
        }

        deserializer.deserialize_any(IntVisitor)
    }

    pub fn boolean<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        struct BoolVisitor;

        impl<'de> Visitor<'de> for BoolVisitor {
            type Value = bool;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a boolean, 0/1, or a word such as \"true\" or \"off\"")
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<bool, E> {
                Ok(v)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<bool, E> {
                match v {
                    0 => Ok(false),
                    1 => Ok(true),
                    _ => Err(E::invalid_value(Unexpected::Signed(v), &self)),
                }
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<bool, E> {
                match v {
                    0 => Ok(false),
                    1 => Ok(true),
                    _ => Err(E::invalid_value(Unexpected::Unsigned(v), &self)),
                }
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<bool, E> {
                match v.trim().to_ascii_lowercase().as_str() {
                    "true" | "t" | "yes" | "y" | "on" | "1" => Ok(true),
                    "false" | "f" | "no" | "n" | "off" | "0" => Ok(false),
                    _ => Err(E::invalid_value(Unexpected::Str(v), &self)),
                }
            }
        }

        deserializer.deserialize_any(BoolVisitor)
    }

    /// Offsets are dropped, keeping the wall-clock time as written.
    pub fn datetime<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<NaiveDateTime, D::Error> {
        struct DateTimeVisitor;

        impl<'de> Visitor<'de> for DateTimeVisitor {
            type Value = NaiveDateTime;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an ISO 8601 datetime, with or without an offset")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<NaiveDateTime, E> {
                parse_datetime(v).ok_or_else(|| E::invalid_value(Unexpected::Str(v), &self))
            }
        }

        deserializer.deserialize_str(DateTimeVisitor)
    }

    pub(super) fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
        let raw = raw.trim();
        if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
            return Some(with_offset.naive_local());
        }
        // RFC 3339 parsing also accepts a space separator, but not every offset form
        for format in ["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%:z"] {
            if let Ok(with_offset) = DateTime::parse_from_str(raw, format) {
                return Some(with_offset.naive_local());
            }
        }
        NAIVE_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
    }
}
