//! # Topic Addresses
//!
//! A [`TopicAddress`] is an ordered list of segments rendered with `/` between
//! them. The last segment may be the wildcard `*`, which turns the address into
//! a subscription pattern matching the prefix itself and any deeper sub-topic.
//!
//! ```rust
//! use participant_framework::TopicAddress;
//!
//! let pattern = TopicAddress::root("PickupRequest").unwrap()
//!     .segment("D1").unwrap()
//!     .wildcard();
//! assert_eq!(pattern.render(), "PickupRequest/D1/*");
//! assert!(pattern.matches_str("PickupRequest/D1/ride-7"));
//! assert!(!pattern.matches_str("PickupRequest/D2/ride-7"));
//! ```

use std::fmt;
use std::str::FromStr;

/// Separator between topic segments.
pub const DELIMITER: char = '/';

/// Trailing wildcard token.
pub const WILDCARD: &str = "*";

/// Errors raised while building or parsing topic addresses.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TopicError {
    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),
    #[error("Wildcard must be the final segment: {0}")]
    MisplacedWildcard(String),
    #[error("Empty topic")]
    Empty,
}

/// One level of a topic address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Literal(String),
    Wildcard,
}

impl Segment {
    pub fn as_str(&self) -> &str {
        match self {
            Segment::Literal(value) => value,
            Segment::Wildcard => WILDCARD,
        }
    }
}

/// Checks that `value` can be used as a single literal segment.
pub fn validate_identifier(value: &str) -> Result<&str, TopicError> {
    if value.trim().is_empty() || value.contains(DELIMITER) || value == WILDCARD {
        return Err(TopicError::InvalidIdentifier(value.to_string()));
    }
    Ok(value)
}

/// A hierarchical topic, optionally ending in a wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TopicAddress {
    segments: Vec<Segment>,
}

impl TopicAddress {
    /// Starts an address with a single literal segment.
    pub fn root(segment: impl Into<String>) -> Result<Self, TopicError> {
        Self { segments: Vec::new() }.segment(segment)
    }

    /// Appends a literal segment.
    pub fn segment(mut self, segment: impl Into<String>) -> Result<Self, TopicError> {
        let segment = segment.into();
        if self.is_pattern() {
            return Err(TopicError::MisplacedWildcard(format!("{}/{}", self.render(), segment)));
        }
        validate_identifier(&segment)?;
        self.segments.push(Segment::Literal(segment));
        Ok(self)
    }

    /// Terminates the address with a wildcard. A second call is a no-op.
    pub fn wildcard(mut self) -> Self {
        if !self.is_pattern() {
            self.segments.push(Segment::Wildcard);
        }
        self
    }

    /// Splits a topic string on the delimiter.
    pub fn parse(topic: &str) -> Result<Self, TopicError> {
        if topic.is_empty() {
            return Err(TopicError::Empty);
        }
        let parts: Vec<&str> = topic.split(DELIMITER).collect();
        let last = parts.len() - 1;
        let mut segments = Vec::with_capacity(parts.len());
        for (index, part) in parts.into_iter().enumerate() {
            if part == WILDCARD {
                if index != last {
                    return Err(TopicError::MisplacedWildcard(topic.to_string()));
                }
                segments.push(Segment::Wildcard);
            } else {
                validate_identifier(part)?;
                segments.push(Segment::Literal(part.to_string()));
            }
        }
        Ok(Self { segments })
    }

    /// Joins the segments with the delimiter.
    pub fn render(&self) -> String {
        self.segments
            .iter()
            .map(Segment::as_str)
            .collect::<Vec<_>>()
            .join("/")
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The literal at `index`, if there is one.
    pub fn literal(&self, index: usize) -> Option<&str> {
        match self.segments.get(index) {
            Some(Segment::Literal(value)) => Some(value),
            _ => None,
        }
    }

    pub fn is_pattern(&self) -> bool {
        matches!(self.segments.last(), Some(Segment::Wildcard))
    }

    /// Returns true when `candidate` is selected by this address.
    ///
    /// Literal segments compare exactly; a trailing wildcard accepts the
    /// prefix itself and anything below it.
    pub fn matches(&self, candidate: &TopicAddress) -> bool {
        for (index, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Wildcard => return true,
                Segment::Literal(expected) => match candidate.segments.get(index) {
                    Some(Segment::Literal(actual)) if actual == expected => {}
                    _ => return false,
                },
            }
        }
        candidate.segments.len() == self.segments.len()
    }

    /// Like [`matches`](Self::matches) for a raw topic string. Unparseable
    /// topics never match.
    pub fn matches_str(&self, candidate: &str) -> bool {
        TopicAddress::parse(candidate)
            .map(|candidate| self.matches(&candidate))
            .unwrap_or(false)
    }
}

impl fmt::Display for TopicAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl FromStr for TopicAddress {
    type Err = TopicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_then_parse_keeps_segments() {
        let topic = TopicAddress::root("LocationUpdate")
            .unwrap()
            .segment("D1")
            .unwrap()
            .segment("AVAILABLE")
            .unwrap()
            .segment("LocationA")
            .unwrap();

        let parsed = TopicAddress::parse(&topic.render()).unwrap();
        assert_eq!(parsed.segments(), topic.segments());

        let pattern = TopicAddress::root("PaymentRequest").unwrap().wildcard();
        let parsed = TopicAddress::parse(&pattern.render()).unwrap();
        assert_eq!(parsed, pattern);
    }

    #[test]
    fn test_identifiers_with_delimiter_are_rejected() {
        let err = TopicAddress::root("PickupRequest")
            .unwrap()
            .segment("D1/evil")
            .unwrap_err();
        assert_eq!(err, TopicError::InvalidIdentifier("D1/evil".into()));

        assert!(TopicAddress::root("").is_err());
        assert!(TopicAddress::root("   ").is_err());
        assert!(TopicAddress::root("*").is_err());
    }

    #[test]
    fn test_wildcard_only_as_final_segment() {
        let err = TopicAddress::root("a").unwrap().wildcard().segment("b").unwrap_err();
        assert!(matches!(err, TopicError::MisplacedWildcard(_)));

        assert!(matches!(
            TopicAddress::parse("a/*/b"),
            Err(TopicError::MisplacedWildcard(_))
        ));
        assert_eq!(TopicAddress::parse(""), Err(TopicError::Empty));
        assert!(TopicAddress::parse("a//b").is_err());

        // second wildcard is ignored
        let pattern = TopicAddress::root("a").unwrap().wildcard().wildcard();
        assert_eq!(pattern.render(), "a/*");
    }

    #[test]
    fn test_wildcard_matching() {
        let pattern = TopicAddress::parse("PaymentRequest/U1/*").unwrap();

        assert!(pattern.matches_str("PaymentRequest/U1/anything"));
        assert!(pattern.matches_str("PaymentRequest/U1/a/b/c"));
        assert!(pattern.matches_str("PaymentRequest/U1"));
        assert!(!pattern.matches_str("PaymentRequest/U2/anything"));
        assert!(!pattern.matches_str("PaymentRequest"));
        assert!(!pattern.matches_str("not a/valid//topic"));
    }

    #[test]
    fn test_exact_matching() {
        let exact = TopicAddress::parse("taxi/requests").unwrap();

        assert!(exact.matches_str("taxi/requests"));
        assert!(!exact.matches_str("taxi/requests/extra"));
        assert!(!exact.matches_str("taxi"));
        assert!(!exact.is_pattern());
        assert_eq!(exact.literal(1), Some("requests"));
        assert_eq!(exact.literal(2), None);
    }
}
