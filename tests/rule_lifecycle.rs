//! Lifecycle tests: rules loaded from their persisted form, raw matcher
//! upgrade, end-to-end evaluation, and re-serialization.

use serde_json::{json, Value};
use tagrules::{AttributeMap, TagRule};

fn attrs(pairs: &[(&str, Value)]) -> AttributeMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

#[test]
fn loaded_rule_with_raw_matchers_evaluates_end_to_end() {
    let rule: TagRule = serde_json::from_value(json!({
        "name": "memtest nodes",
        "tag": "memtest_%R=^\\d+:mk_hw_mem_size-%",
        "matchers": [
            { "key": "mk_hw_nic_count", "value": "2", "compare": "equal", "inverse": "false" },
            { "key": "mk_hw_mem_size", "value": "^\\d+ GiB$", "compare": "like", "inverse": "false" }
        ]
    }))
    .unwrap();

    // Raw entries came up typed, in definition order.
    assert_eq!(rule.matchers().len(), 2);
    assert_eq!(rule.matchers()[0].key, "mk_hw_nic_count");
    assert_eq!(rule.matchers()[1].key, "mk_hw_mem_size");

    let node = attrs(&[
        ("mk_hw_nic_count", json!("2")),
        ("mk_hw_mem_size", json!("16 GiB")),
    ]);
    assert!(rule.applies(&node));
    assert_eq!(rule.get_tag(&node), "memtest_16");

    let wrong_nic = attrs(&[
        ("mk_hw_nic_count", json!("4")),
        ("mk_hw_mem_size", json!("16 GiB")),
    ]);
    assert!(!rule.applies(&wrong_nic));
}

#[test]
fn reserialized_rule_uses_the_typed_matcher_shape() {
    let rule: TagRule = serde_json::from_value(json!({
        "name": "virtual guests",
        "tag": "virtual",
        "matchers": [
            { "key": "mk_hw_virtual", "value": "true", "compare": "equal", "inverse": "false" }
        ]
    }))
    .unwrap();

    let persisted = serde_json::to_value(&rule).unwrap();
    assert!(persisted["matchers"][0]["uuid"].is_string());
    assert_eq!(persisted["matchers"][0]["compare"], json!("equal"));
    assert_eq!(persisted["matchers"][0]["inverse"], json!("false"));

    // A reload round-trips to the same evaluation behavior and identities.
    let reloaded: TagRule = serde_json::from_value(persisted).unwrap();
    assert_eq!(reloaded.uuid(), rule.uuid());
    assert_eq!(reloaded.matchers(), rule.matchers());
}

#[test]
fn field_mode_rule_end_to_end() {
    let rule: TagRule = serde_json::from_value(json!({
        "name": "hostname tag",
        "field": "hostname"
    }))
    .unwrap();

    let node = attrs(&[("hostname", json!("node1"))]);
    assert!(rule.applies(&node));
    assert_eq!(rule.get_tag(&node), "node1");

    // A non-string value means the rule does not apply at all.
    let bad_node = attrs(&[("hostname", json!(42))]);
    assert!(!rule.applies(&bad_node));
}

#[test]
fn matcher_mutation_survives_a_save_and_reload() {
    let mut rule = TagRule::new("mutating rule");
    rule.tag = "t".to_string();
    let keep = rule.add_matcher("os", "linux", "equal", "false").unwrap();
    let discard = rule.add_matcher("arch", "arm64", "equal", "true").unwrap();
    rule.remove_matcher(discard.uuid);

    let reloaded: TagRule =
        serde_json::from_value(serde_json::to_value(&rule).unwrap()).unwrap();
    assert_eq!(reloaded.matchers().len(), 1);
    assert_eq!(reloaded.matchers()[0].uuid, keep.uuid);
}

#[test]
fn unparsable_selection_pattern_keeps_template_text() {
    let mut rule = TagRule::new("bad pattern");
    rule.tag = "tag-%R=[:build-%".to_string();
    rule.add_matcher("build", ".", "like", "false").unwrap();

    let node = attrs(&[("build", json!("123"))]);
    assert!(rule.applies(&node));
    // Resolution fell back to the template; sanitization still runs.
    assert_eq!(rule.get_tag(&node), "tag-%R=build-%");
}
