//! Tag sanitization.
//!
//! Tags end up in inventories, hostnames, and downstream tooling, so they
//! are kept to a narrow character set: word characters plus `%`, `=`, `-`,
//! `\` and `+`. Everything else is stripped, not substituted.

use once_cell::sync::Lazy;
use regex::Regex;

static DISALLOWED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w%=\-\\+]+").expect("disallowed-character class is valid"));

/// Strips every run of disallowed characters from a candidate tag.
///
/// Total and pure: any input yields a (possibly empty) output, and applying
/// it twice gives the same result as applying it once.
pub fn sanitize_tag(raw: &str) -> String {
    DISALLOWED.replace_all(raw, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_allowed_characters() {
        assert_eq!(sanitize_tag("node-1_prod%v=2+a\\b"), "node-1_prod%v=2+a\\b");
    }

    #[test]
    fn strips_whitespace_and_symbols() {
        assert_eq!(sanitize_tag("web server #1!"), "webserver1");
        assert_eq!(sanitize_tag("a b\tc\nd"), "abcd");
        assert_eq!(sanitize_tag("rack:4/slot:2"), "rack4slot2");
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert_eq!(sanitize_tag(""), "");
        assert_eq!(sanitize_tag("!@# $^&"), "");
    }

    #[test]
    fn idempotent() {
        for raw in ["web server #1!", "", "node-1", "héllo wörld", "%V=os-%"] {
            let once = sanitize_tag(raw);
            assert_eq!(sanitize_tag(&once), once);
        }
    }
}
