//! Booking identifiers: input normalization and shape validation.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::LoginError;

/// Length of every booking identifier.
pub const BOOKING_ID_LEN: usize = 8;

/// An identifier that passed [`is_valid`], stored uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct BookingId(String);

impl BookingId {
    /// Validate a candidate the way the login form does on submit.
    ///
    /// # Errors
    ///
    /// [`LoginError::EmptyInput`] for an empty string, and
    /// [`LoginError::InvalidShape`] for anything that is not 8 ASCII letters
    /// or digits.
    pub fn parse(candidate: &str) -> Result<Self, LoginError> {
        if candidate.is_empty() {
            return Err(LoginError::EmptyInput);
        }
        if !is_valid(candidate) {
            return Err(LoginError::InvalidShape);
        }
        Ok(Self(candidate.to_ascii_uppercase()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for BookingId {
    type Err = LoginError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for BookingId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Uppercase `raw` and keep only `A-Z` and `0-9`.
///
/// Uppercasing happens first, so characters whose uppercase form is ASCII
/// (e.g. `ı` → `I`) survive.
#[must_use]
pub fn normalize(raw: &str) -> String {
    raw.to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        .collect()
}

/// Apply a new raw field value.
///
/// Returns the normalized value, or `None` when it would exceed
/// [`BOOKING_ID_LEN`] and the update must be dropped.
#[must_use]
pub fn accept_input(raw: &str) -> Option<String> {
    let value = normalize(raw);
    (value.len() <= BOOKING_ID_LEN).then_some(value)
}

/// True iff `candidate` is exactly 8 ASCII letters (either case) or digits.
#[must_use]
pub fn is_valid(candidate: &str) -> bool {
    candidate.len() == BOOKING_ID_LEN && candidate.bytes().all(|b| b.is_ascii_alphanumeric())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn normalize_uppercases_and_strips() {
        assert_eq!(normalize("wme-12 34x"), "WME1234X");
        assert_eq!(normalize("äb#c!"), "BC");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn overlong_input_is_dropped() {
        assert_eq!(accept_input("abcd1234"), Some("ABCD1234".to_owned()));
        assert_eq!(accept_input("abcd12345"), None);
        // Stripped characters do not count toward the limit.
        assert_eq!(accept_input("ab-cd-12-34"), Some("ABCD1234".to_owned()));
    }

    #[test]
    fn validator_is_case_insensitive() {
        assert!(is_valid("wme1234x"));
        assert!(is_valid("WME1234X"));
        assert!(!is_valid("WME1234"));
        assert!(!is_valid("WME1234XY"));
        assert!(!is_valid("WME-234X"));
        assert!(!is_valid("WMÉ1234"));
    }

    #[test]
    fn parse_reports_the_right_error() {
        assert_eq!(BookingId::parse(""), Err(LoginError::EmptyInput));
        assert_eq!(BookingId::parse("abc123"), Err(LoginError::InvalidShape));
        let id: BookingId = "wme1234x".parse().unwrap();
        assert_eq!(id.as_str(), "WME1234X");
        assert_eq!(id.to_string(), "WME1234X");
    }
}
