pub mod fingerprint;
pub mod issues;

pub use fingerprint::{canonical_json_bytes, fingerprint_hex, run_id_for};
pub use issues::{IssueSeverity, StructuredIssue};
