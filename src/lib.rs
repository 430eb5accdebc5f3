//! # Tagrules
//!
//! A small engine for deciding whether a tagging rule applies to a node and,
//! when it does, computing the literal tag string to attach.
//!
//! The flow, leaf to root:
//!
//! ```text
//! caller supplies a node's attribute map
//!        │
//!        ▼
//! TagRule::applies          field lookup, or a conjunction of TagMatchers
//!        │ (true)
//!        ▼
//! TagRule::get_tag          direct field value, or template::resolve
//!        │
//!        ▼
//! sanitize::sanitize_tag    strip everything outside the tag alphabet
//!        │
//!        ▼
//! final tag string
//! ```
//!
//! Rule storage, rule-set ordering, and presentation all live elsewhere;
//! this crate is the evaluation core only. Nothing here performs I/O, and
//! no failure is fatal: bad inputs degrade to "does not apply", an empty
//! tag, or the unresolved template, with diagnostics emitted via `tracing`.
//!
//! ## Example
//!
//! ```
//! use serde_json::json;
//! use tagrules::{AttributeMap, TagRule};
//!
//! let mut rule = TagRule::new("linux boxes");
//! rule.tag = "os_%V=os version-%".to_string();
//! rule.add_matcher("os", "linux", "equal", "false").unwrap();
//!
//! let attrs: AttributeMap = [
//!     ("os".to_string(), json!("linux")),
//!     ("os version".to_string(), json!("6.1")),
//! ]
//! .into();
//!
//! assert!(rule.applies(&attrs));
//! assert_eq!(rule.get_tag(&attrs), "os_6.1");
//! ```

use std::collections::HashMap;

pub mod error;
pub mod matcher;
pub mod rule;
pub mod sanitize;
pub mod template;

pub use error::{Result, TagRuleError};
pub use matcher::{Compare, TagMatcher};
pub use rule::TagRule;
pub use sanitize::sanitize_tag;
pub use template::{resolve, Resolution};

/// A node's flat attribute map: key → metadata value.
///
/// Values are usually strings; non-string values are legal input and are
/// treated as non-matching/absent by the evaluation and resolution paths.
pub type AttributeMap = HashMap<String, serde_json::Value>;
