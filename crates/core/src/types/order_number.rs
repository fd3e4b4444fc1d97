//! Human-facing order numbers such as `EZY482913`.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Default prefix for every order number.
pub const DEFAULT_PREFIX: &str = "EZY";

/// Number of digits after the prefix.
pub const DIGITS: usize = 6;

/// Smallest random suffix (keeps the suffix at exactly six digits).
pub const RANDOM_MIN: u32 = 100_000;

/// Largest random suffix.
pub const RANDOM_MAX: u32 = 999_999;

/// An order number: a letter prefix followed by six digits.
///
/// Deserialization goes through [`OrderNumber::parse`], so a malformed number
/// never reaches a handler.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrderNumber(String);

/// Error returned when a string is not a well-formed order number.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid order number: {0}")]
pub struct InvalidOrderNumber(pub String);

impl OrderNumber {
    /// Build an order number from a prefix and a numeric suffix.
    ///
    /// The suffix is zero-padded to six digits and truncated to its last six
    /// digits if it is longer.
    #[must_use]
    pub fn from_parts(prefix: &str, suffix: u64) -> Self {
        Self(format!("{prefix}{:06}", suffix % 1_000_000))
    }

    /// Build an order number from the last six digits of a millisecond clock.
    #[must_use]
    pub fn from_timestamp_millis(prefix: &str, millis: i64) -> Self {
        Self::from_parts(prefix, millis.unsigned_abs())
    }

    /// Parse and validate an order number.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidOrderNumber`] unless the input is one or more ASCII
    /// uppercase letters followed by exactly six digits.
    pub fn parse(s: &str) -> Result<Self, InvalidOrderNumber> {
        let split = s
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| InvalidOrderNumber(s.to_owned()))?;
        let (prefix, digits) = s.split_at(split);

        let prefix_ok = !prefix.is_empty() && prefix.chars().all(|c| c.is_ascii_uppercase());
        let digits_ok = digits.len() == DIGITS && digits.chars().all(|c| c.is_ascii_digit());

        if prefix_ok && digits_ok {
            Ok(Self(s.to_owned()))
        } else {
            Err(InvalidOrderNumber(s.to_owned()))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for OrderNumber {
    type Err = InvalidOrderNumber;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for OrderNumber {
    type Error = InvalidOrderNumber;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<OrderNumber> for String {
    fn from(number: OrderNumber) -> Self {
        number.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parts_pads_and_truncates() {
        assert_eq!(OrderNumber::from_parts("EZY", 42).as_str(), "EZY000042");
        assert_eq!(OrderNumber::from_parts("EZY", 482_913).as_str(), "EZY482913");
        assert_eq!(
            OrderNumber::from_timestamp_millis("EZY", 1_760_000_123_456).as_str(),
            "EZY123456"
        );
    }

    #[test]
    fn test_parse() {
        assert!(OrderNumber::parse("EZY482913").is_ok());
        assert!(OrderNumber::parse("EZY48291").is_err());
        assert!(OrderNumber::parse("ezy482913").is_err());
        assert!(OrderNumber::parse("482913").is_err());
        assert!(OrderNumber::parse("EZY48291X").is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let number: OrderNumber = serde_json::from_str("\"EZY482913\"").unwrap();
        assert_eq!(number.as_str(), "EZY482913");
        assert_eq!(serde_json::to_string(&number).unwrap(), "\"EZY482913\"");

        assert!(serde_json::from_str::<OrderNumber>("\"not-an-order-number\"").is_err());
        assert!(serde_json::from_str::<OrderNumber>("\"EZY48291\"").is_err());
    }
}
