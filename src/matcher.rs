//! Tag matchers: single key/value predicates over a node's attributes.
//!
//! A matcher compares the attribute stored under `key` against `value`,
//! either literally (`equal`) or as a regex (`like`), with an optional
//! `inverse` flag that negates the outcome. Matchers are owned by the rule
//! that created them and are evaluated as opaque predicates.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::TagRuleError;

/// How a matcher compares the attribute value against its own value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compare {
    /// Exact string equality.
    Equal,
    /// `value` is a regex the attribute must match.
    Like,
}

impl FromStr for Compare {
    type Err = TagRuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "equal" => Ok(Compare::Equal),
            "like" => Ok(Compare::Like),
            other => Err(TagRuleError::InvalidCompare(other.to_string())),
        }
    }
}

impl fmt::Display for Compare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compare::Equal => write!(f, "equal"),
            Compare::Like => write!(f, "like"),
        }
    }
}

/// Parses the boundary representation of `inverse`, which is the literal
/// string `"true"` or `"false"`.
pub(crate) fn parse_inverse(s: &str) -> Result<bool, TagRuleError> {
    match s {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(TagRuleError::InvalidInverse(other.to_string())),
    }
}

// `inverse` is persisted as the strings "true"/"false", not as a JSON bool.
mod bool_string {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if *value { "true" } else { "false" })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_inverse(&raw).map_err(D::Error::custom)
    }
}

/// A single key/value/compare/inverse predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagMatcher {
    pub uuid: Uuid,
    pub key: String,
    pub value: String,
    pub compare: Compare,
    #[serde(with = "bool_string")]
    pub inverse: bool,
}

/// A matcher entry as it may appear in a persisted rule that predates the
/// typed form: all four fields as plain strings, no identity yet.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawMatcher {
    pub key: String,
    pub value: String,
    pub compare: String,
    pub inverse: String,
}

impl TagMatcher {
    pub fn new(
        key: impl Into<String>,
        value: impl Into<String>,
        compare: Compare,
        inverse: bool,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            key: key.into(),
            value: value.into(),
            compare,
            inverse,
        }
    }

    /// Upgrades a raw entry into the typed form, validating the string-typed
    /// `compare` and `inverse` and minting a fresh identity.
    pub(crate) fn from_raw(raw: &RawMatcher) -> Result<Self, TagRuleError> {
        Ok(Self::new(
            raw.key.clone(),
            raw.value.clone(),
            raw.compare.parse()?,
            parse_inverse(&raw.inverse)?,
        ))
    }

    /// Evaluates this matcher against the attribute value found under its
    /// key, or `None` when the key is absent.
    ///
    /// Non-string attribute values never match. An invalid `like` pattern is
    /// logged and treated as no-match. `inverse` negates the outcome, so an
    /// absent attribute satisfies an inverted matcher.
    pub fn check_for_match(&self, candidate: Option<&Value>) -> bool {
        let candidate = candidate.and_then(Value::as_str);
        let matched = match self.compare {
            Compare::Equal => candidate == Some(self.value.as_str()),
            Compare::Like => match regex::Regex::new(&self.value) {
                Ok(pattern) => candidate.is_some_and(|c| pattern.is_match(c)),
                Err(err) => {
                    tracing::warn!("invalid 'like' pattern '{}': {}", self.value, err);
                    false
                }
            },
        };
        if self.inverse {
            !matched
        } else {
            matched
        }
    }
}
