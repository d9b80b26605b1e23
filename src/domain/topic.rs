//! Topic name validation.
//!
//! A topic is an opaque, case-sensitive channel name on the broker. Topics
//! arrive from untrusted input as URL paths, so validation is the boundary
//! that keeps wildcard characters and path tricks away from the broker.
//!
//! Validation is a pure function: strip boundary separators, map the empty
//! path to the reserved default topic, and require everything else to match
//! `^[a-z0-9._-]+$`.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use super::errors::TopicError;

/// Topic assigned when a client connects on the root path.
pub const DEFAULT_TOPIC: &str = "default";

/// Broker-internal wildcard matching every topic.
///
/// Never accepted from untrusted input; only trusted in-process subscribers
/// (the traffic logger) may use it.
pub const WILDCARD_ALL: &str = ">";

static TOPIC_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9._-]+$").expect("topic pattern is valid"));

/// A validated pub/sub channel name.
///
/// Construction goes through [`Topic::parse`], so holding a `Topic` is proof
/// the name is safe to hand to the broker. The one exception is
/// [`Topic::wildcard_all`], reserved for trusted internal subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Topic(String);

impl Topic {
    /// Validates a raw request path as a topic name.
    ///
    /// Leading and trailing `/` are stripped. An empty result maps to the
    /// reserved `"default"` topic. Anything else must match
    /// `^[a-z0-9._-]+$`; uppercase letters, embedded path separators, and
    /// the broker wildcards `*` and `>` are all rejected.
    ///
    /// # Errors
    ///
    /// Returns [`TopicError`] when the stripped path contains any character
    /// outside the allowed set.
    pub fn parse(raw_path: &str) -> Result<Self, TopicError> {
        let trimmed = raw_path.trim_matches('/');

        if trimmed.is_empty() {
            return Ok(Self(DEFAULT_TOPIC.to_string()));
        }

        if TOPIC_PATTERN.is_match(trimmed) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(TopicError::invalid(trimmed))
        }
    }

    /// The universal wildcard topic for trusted internal subscribers.
    pub fn wildcard_all() -> Self {
        Self(WILDCARD_ALL.to_string())
    }

    /// Whether this topic is the universal wildcard.
    pub fn is_wildcard(&self) -> bool {
        self.0 == WILDCARD_ALL
    }

    /// The validated topic name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_path_maps_to_default_topic() {
        assert_eq!(Topic::parse("").unwrap().as_str(), "default");
    }

    #[test]
    fn root_path_maps_to_default_topic() {
        assert_eq!(Topic::parse("/").unwrap().as_str(), "default");
    }

    #[test]
    fn boundary_separators_are_stripped() {
        assert_eq!(Topic::parse("/orders/").unwrap().as_str(), "orders");
    }

    #[test]
    fn accepts_lowercase_digits_and_punctuation() {
        for raw in ["orders", "sensor.temp-1", "a_b.c-d", "0", "chat"] {
            assert!(Topic::parse(raw).is_ok(), "expected accept: {raw}");
        }
    }

    #[test]
    fn rejects_uppercase() {
        assert!(Topic::parse("Orders").is_err());
    }

    #[test]
    fn rejects_broker_wildcards() {
        assert!(Topic::parse("*").is_err());
        assert!(Topic::parse(">").is_err());
        assert!(Topic::parse("orders.*").is_err());
        assert!(Topic::parse("orders.>").is_err());
    }

    #[test]
    fn rejects_embedded_path_separator() {
        assert!(Topic::parse("orders/eu").is_err());
    }

    #[test]
    fn rejects_whitespace_and_control_characters() {
        assert!(Topic::parse("or ders").is_err());
        assert!(Topic::parse("orders\n").is_err());
        assert!(Topic::parse("\x07").is_err());
    }

    #[test]
    fn wildcard_all_is_flagged_and_unparsable() {
        let wildcard = Topic::wildcard_all();
        assert!(wildcard.is_wildcard());
        assert!(Topic::parse(wildcard.as_str()).is_err());
    }

    proptest! {
        /// Re-validating an accepted topic yields the same topic.
        #[test]
        fn validation_is_idempotent(raw in "[a-z0-9._-]{1,32}") {
            let first = Topic::parse(&raw).unwrap();
            let second = Topic::parse(first.as_str()).unwrap();
            prop_assert_eq!(first, second);
        }

        /// Any input containing a disallowed character is rejected outright.
        #[test]
        fn disallowed_characters_are_rejected(
            prefix in "[a-z0-9._-]{0,8}",
            bad in prop::sample::select(vec!['A', 'Z', '*', '>', ' ', '\u{1}']),
            suffix in "[a-z0-9._-]{0,8}",
        ) {
            let raw = format!("{prefix}{bad}{suffix}");
            prop_assert!(Topic::parse(&raw).is_err());
        }
    }
}
