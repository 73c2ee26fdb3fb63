//! Idempotency-key validation and request fingerprinting.
//!
//! Create-order and charge requests carry a caller-supplied `Idempotency-Key`
//! header. The first request under a key is executed; any later request with
//! the same key and the same [`request_hash`] replays the stored result, and
//! a later request with the same key but a different payload is a conflict.

use serde::Serialize;
use uuid::Uuid;

use crate::error::CoreError;
use crate::hashing;

/// Header carrying the caller-supplied idempotency key.
pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

/// Parse and canonicalise an idempotency key.
///
/// Keys must be UUIDs (any version, any case, hyphenated or not). The
/// canonical form is lower-case hyphenated, so `ABC...` and `abc...` resolve to
/// the same stored key.
pub fn parse_idempotency_key(raw: Option<&str>) -> Result<String, CoreError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| CoreError::validation("Idempotency-Key header is required"))?;

    Uuid::parse_str(raw)
        .map(|uuid| uuid.hyphenated().to_string())
        .map_err(|_| CoreError::validation("Idempotency-Key must be a valid UUID"))
}

/// Stable SHA-256 fingerprint of a request payload.
///
/// The payload is converted to a `serde_json::Value` and every object is
/// rebuilt with sorted keys, so field order never changes the hash. Callers
/// normalise string fields (trim, case) before hashing.
pub fn request_hash<T: Serialize>(payload: &T) -> Result<String, CoreError> {
    let value = serde_json::to_value(payload)
        .map_err(|e| CoreError::Internal(format!("failed to encode request payload: {e}")))?;
    Ok(hashing::sha256_hex(canonicalize(value).to_string().as_bytes()))
}

fn canonicalize(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut entries: Vec<_> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            serde_json::Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, canonicalize(v)))
                    .collect(),
            )
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.into_iter().map(canonicalize).collect())
        }
        other => other,
    }
}

/// Outcome of looking up an idempotency key against a fresh request hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Replay<T> {
    /// No prior request under this key.
    Fresh,
    /// A prior identical request exists; return its result unchanged.
    Existing(T),
}

/// Compare a previously stored record's hash with the incoming one.
pub fn check_replay<T>(
    existing: Option<T>,
    incoming_hash: &str,
    stored_hash: impl Fn(&T) -> &str,
) -> Result<Replay<T>, CoreError> {
    match existing {
        None => Ok(Replay::Fresh),
        Some(record) if stored_hash(&record) == incoming_hash => Ok(Replay::Existing(record)),
        Some(_) => Err(CoreError::conflict(
            "idempotency key reused with different payload",
        )),
    }
}
