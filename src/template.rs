//! Tag template resolution.
//!
//! A tag template embeds metadata variables that are expanded against a
//! node's attribute map at evaluation time. Two grammars are supported:
//!
//! ```text
//! %V=key_name-%                 direct value: the value stored under
//!                               `key_name`, or nothing if absent
//! %R=selection_pattern:key-%    selected value: the first match of
//!                               `selection_pattern` (a regex) against the
//!                               value stored under `key`
//! ```
//!
//! The direct-value pass runs first over the whole template, then the
//! selected-value pass runs over the intermediate text. Surrounding text
//! and anything that matches neither grammar is preserved verbatim.
//!
//! Resolution never fails: a bad selection pattern is logged and the
//! template comes back unchanged. [`Resolution`] keeps that fallback
//! observable so callers (and tests) don't have to scrape logs for it.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::Result;
use crate::AttributeMap;

static DIRECT_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%V=([\w ]*)-%").expect("direct-value grammar is valid"));

// Greedy `.+` pins the split to the last ':' before the key.
static SELECTED_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%R=(.+):(\w+)-%").expect("selected-value grammar is valid"));

/// Outcome of resolving a template.
///
/// `FellBack` carries the original template verbatim: an error occurred
/// mid-resolution (in practice, an unparsable selection pattern) and was
/// masked, per the resolver's never-raises contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(String),
    FellBack(String),
}

impl Resolution {
    /// The resolved text, or the untouched template on fallback.
    pub fn into_text(self) -> String {
        match self {
            Resolution::Resolved(text) | Resolution::FellBack(text) => text,
        }
    }

    pub fn fell_back(&self) -> bool {
        matches!(self, Resolution::FellBack(_))
    }
}

/// Expands metadata variables in `template` against `meta`.
///
/// Missing keys are valid lookups and expand to the empty string. Values
/// that are not strings are treated as absent; the evaluator, not the
/// resolver, is where non-string values carry meaning.
pub fn resolve(template: &str, meta: &AttributeMap) -> Resolution {
    match try_resolve(template, meta) {
        Ok(text) => Resolution::Resolved(text),
        Err(err) => {
            tracing::warn!("template resolution failed, keeping '{}' verbatim: {}", template, err);
            Resolution::FellBack(template.to_string())
        }
    }
}

fn try_resolve(template: &str, meta: &AttributeMap) -> Result<String> {
    let mut text = template.to_string();

    // Direct-value pass: one forward scan, then apply. Lookups go against
    // the original metadata, never against partially substituted text.
    let direct: Vec<(String, String)> = DIRECT_VALUE
        .captures_iter(&text)
        .map(|caps| (caps[0].to_string(), caps[1].to_string()))
        .collect();
    for (var, key) in direct {
        let value = string_value(meta, &key).unwrap_or_default();
        text = text.replace(&var, value);
    }

    // Selected-value pass over the intermediate text.
    let selected: Vec<(String, String, String)> = SELECTED_VALUE
        .captures_iter(&text)
        .map(|caps| (caps[0].to_string(), caps[1].to_string(), caps[2].to_string()))
        .collect();
    for (var, pattern, key) in selected {
        let selector = Regex::new(&pattern)?;
        let value = string_value(meta, &key)
            .and_then(|v| selector.find(v))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        text = text.replace(&var, &value);
    }

    Ok(text)
}

fn string_value<'a>(meta: &'a AttributeMap, key: &str) -> Option<&'a str> {
    meta.get(key).and_then(Value::as_str)
}
