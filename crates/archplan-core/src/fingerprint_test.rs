use super::{canonical_json_bytes, fingerprint_hex, run_id_for};
use serde_json::json;

#[test]
fn canonical_bytes_sort_nested_keys() {
    let value = json!({"steps": [{"id": 1, "action": "reply"}], "a": {"z": 1, "b": 2}});
    let bytes = canonical_json_bytes(&value).expect("must encode");
    let text = String::from_utf8(bytes).expect("utf8");
    assert_eq!(text, r#"{"a":{"b":2,"z":1},"steps":[{"action":"reply","id":1}]}"#);
}

#[test]
fn fingerprint_ignores_key_order_but_not_array_order() {
    let left = json!({"b": 2, "a": [1, 2]});
    let right = json!({"a": [1, 2], "b": 2});
    let swapped = json!({"a": [2, 1], "b": 2});
    let left_hash = fingerprint_hex(&left).expect("hash");
    assert_eq!(left_hash, fingerprint_hex(&right).expect("hash"));
    assert_ne!(left_hash, fingerprint_hex(&swapped).expect("hash"));
    assert_eq!(left_hash.len(), 64);
}

#[test]
fn run_id_is_short_and_stable() {
    let plan = json!({"steps": []});
    let first = run_id_for(&plan).expect("run id");
    let second = run_id_for(&plan).expect("run id");
    assert_eq!(first, second);
    assert!(first.starts_with("run-"));
    assert_eq!(first.len(), "run-".len() + 12);
}
