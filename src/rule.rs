//! # Tag rules
//!
//! A [`TagRule`] decides whether a tag applies to a node, given the node's
//! flat attribute map, and produces the literal tag string when it does.
//!
//! A rule is always in exactly one of two modes, decided solely by `field`:
//!
//! - **Field mode** (`field` is `Some`): the tag is read straight from the
//!   named attribute. The rule applies iff the attribute exists and holds a
//!   string. The template and matchers are ignored.
//! - **Template mode** (`field` is `None`): the rule applies iff every
//!   matcher passes (conjunction, in definition order), and the tag comes
//!   from expanding the template against the attributes.
//!
//! In both modes the produced tag is sanitized as a final, explicit step.
//! Evaluation never fails: missing keys, non-string values, and empty
//! matcher lists are ordinary "does not apply" outcomes.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::Result;
use crate::matcher::{RawMatcher, TagMatcher};
use crate::sanitize::sanitize_tag;
use crate::template::resolve;
use crate::AttributeMap;

/// A tagging rule: matching logic plus a tag template or a value field.
#[derive(Debug, Clone, Serialize)]
pub struct TagRule {
    uuid: Uuid,
    /// Display label; plays no part in evaluation.
    pub name: String,
    /// Tag template, used only in template mode. May be empty.
    pub tag: String,
    /// When set, the rule is a value tag over this attribute key.
    pub field: Option<String>,
    matchers: Vec<TagMatcher>,
}

impl TagRule {
    /// Creates an empty template-mode rule. The caller fills in `tag`,
    /// `field`, and matchers as needed.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            tag: String::new(),
            field: None,
            matchers: Vec::new(),
        }
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn matchers(&self) -> &[TagMatcher] {
        &self.matchers
    }

    /// Decides whether this rule fires against the given attributes.
    pub fn applies(&self, attrs: &AttributeMap) -> bool {
        if let Some(field) = &self.field {
            let Some(value) = attrs.get(field) else {
                tracing::warn!("field '{}' not found in attributes", field);
                return false;
            };
            let is_string = value.is_string();
            if !is_string {
                tracing::warn!("value in matching field '{}' is not a string", field);
            }
            return is_string;
        }

        if self.matchers.is_empty() {
            tracing::warn!("no matchers for tag rule '{}'", self.name);
            return false;
        }

        for matcher in &self.matchers {
            tracing::debug!("checking matcher key '{}'", matcher.key);
            let candidate = attrs.get(&matcher.key);

            // A non-inverted matcher requires the key to exist at all.
            if candidate.is_none() && !matcher.inverse {
                tracing::debug!("key '{}' does not exist", matcher.key);
                return false;
            }
            if !matcher.check_for_match(candidate) {
                tracing::debug!("key '{}' does not match", matcher.key);
                return false;
            }
        }

        true
    }

    /// Computes the sanitized tag for a node's attributes.
    ///
    /// Field mode reads the attribute directly (a missing or non-string
    /// value yields an empty tag); template mode expands the template first.
    pub fn get_tag(&self, attrs: &AttributeMap) -> String {
        if let Some(field) = &self.field {
            let raw = attrs.get(field).and_then(Value::as_str).unwrap_or("");
            return sanitize_tag(raw);
        }
        sanitize_tag(&resolve(&self.tag, attrs).into_text())
    }

    /// Validates and appends a matcher, returning a copy of it.
    ///
    /// `compare` must be `"equal"` or `"like"`; `inverse` must be the
    /// literal string `"true"` or `"false"`. A rejected matcher leaves the
    /// rule untouched.
    pub fn add_matcher(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
        compare: &str,
        inverse: &str,
    ) -> Result<TagMatcher> {
        let compare = compare.parse().inspect_err(|err| {
            tracing::warn!("rejected tag matcher: {}", err);
        })?;
        let inverse = crate::matcher::parse_inverse(inverse).inspect_err(|err| {
            tracing::warn!("rejected tag matcher: {}", err);
        })?;

        let matcher = TagMatcher::new(key, value, compare, inverse);
        tracing::debug!(
            "new tag matcher: '{}' {} '{}' inverse:{}",
            matcher.key,
            matcher.compare,
            matcher.value,
            matcher.inverse
        );
        self.matchers.push(matcher.clone());
        Ok(matcher)
    }

    /// Removes the matcher with the given identity, if present.
    pub fn remove_matcher(&mut self, uuid: Uuid) {
        self.matchers.retain(|matcher| matcher.uuid != uuid);
    }
}

// Persisted rules may carry matcher entries in a raw, string-typed shape
// from before matchers had identities. Deserialization accepts both shapes
// and upgrades raw entries to typed ones in place, preserving order; after
// this single step nothing in the crate branches on the raw shape again.
impl<'de> Deserialize<'de> for TagRule {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let helper = TagRuleHelper::deserialize(deserializer)?;

        let uuid = helper.uuid.unwrap_or_else(Uuid::new_v4);
        let matchers = helper
            .matchers
            .into_iter()
            .map(|entry| match entry {
                MatcherEntry::Typed(matcher) => Ok(matcher),
                MatcherEntry::Raw(raw) => TagMatcher::from_raw(&raw),
            })
            .collect::<Result<Vec<_>>>()
            .map_err(serde::de::Error::custom)?;

        Ok(TagRule {
            uuid,
            name: helper.name.unwrap_or_else(|| format!("Tag Rule: {uuid}")),
            tag: helper.tag,
            field: helper.field,
            matchers,
        })
    }
}

#[derive(Deserialize)]
struct TagRuleHelper {
    #[serde(default)]
    uuid: Option<Uuid>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    tag: String,
    #[serde(default)]
    field: Option<String>,
    #[serde(default)]
    matchers: Vec<MatcherEntry>,
}

// Typed first: a typed entry also satisfies the raw shape minus the uuid,
// so order matters here.
#[derive(Deserialize)]
#[serde(untagged)]
enum MatcherEntry {
    Typed(TagMatcher),
    Raw(RawMatcher),
}
