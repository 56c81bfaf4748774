use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Encodes `value` with object keys in lexical order at every depth, so two documents that
/// differ only in key order encode to the same bytes.
pub fn canonical_json_bytes(value: &Value) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec(&canonicalize(value))
}

pub fn fingerprint_hex(value: &Value) -> serde_json::Result<String> {
    let digest = Sha256::digest(canonical_json_bytes(value)?);
    Ok(format!("{digest:x}"))
}

/// Derives a short, deterministic run id from a plan fingerprint.
pub fn run_id_for(value: &Value) -> serde_json::Result<String> {
    let hash = fingerprint_hex(value)?;
    Ok(format!("run-{}", hash.get(0..12).unwrap_or(hash.as_str())))
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(object) => {
            let mut keys = object.keys().collect::<Vec<_>>();
            keys.sort();
            let mut out = Map::new();
            for key in keys {
                out.insert(key.clone(), canonicalize(&object[key]));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        _ => value.clone(),
    }
}

#[cfg(test)]
#[path = "fingerprint_test.rs"]
mod tests;
