//! Storage trait definitions for evalscope
//!
//! `RunStore` is the only abstraction the explorer depends on. It hands out
//! whole run documents as loosely-typed JSON and writes whole documents back.
//! Field-level interpretation happens in `evalscope-core`.
//!
//! In-memory fakes are provided for testing via the `fakes` module.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha256;

use crate::error::StorageError;

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

// ---------------------------------------------------------------------------
// RevisionDigest
// ---------------------------------------------------------------------------

/// SHA-256 hex digest of a document's persisted bytes.
///
/// Two reads of an unchanged document yield the same revision. Used for
/// optional optimistic concurrency on writes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RevisionDigest(String);

impl RevisionDigest {
    /// Compute the SHA-256 digest of the given bytes.
    pub fn from_bytes(data: &[u8]) -> Self {
        use sha2::Digest;
        let mut hasher = Sha256::new();
        hasher.update(data);
        RevisionDigest(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form (first 12 hex chars).
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

impl TryFrom<String> for RevisionDigest {
    type Error = StorageError;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        if s.len() != 64 || !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(StorageError::Malformed {
                location: "revision".to_string(),
                reason: format!("not a sha256 hex digest: {s}"),
            });
        }
        Ok(RevisionDigest(s.to_ascii_lowercase()))
    }
}

impl std::fmt::Display for RevisionDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// StoredRun
// ---------------------------------------------------------------------------

/// Where a run document lives, as the backend names it (a path for the
/// filesystem store, a key for the in-memory fake).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunLocation(pub String);

impl std::fmt::Display for RunLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A run document together with where it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRun {
    pub location: RunLocation,
    /// Display path of the backing document relative to the project root.
    pub file_path: String,
    /// The full document, unknown fields included.
    pub document: Value,
    /// Revision of the bytes the document was parsed from.
    pub revision: RevisionDigest,
}

impl StoredRun {
    /// The document's `evaluation_id`, if it is a string.
    pub fn evaluation_id(&self) -> Option<&str> {
        evaluation_id_of(&self.document)
    }
}

/// Read `evaluation_id` from a raw document.
pub fn evaluation_id_of(document: &Value) -> Option<&str> {
    document.get("evaluation_id").and_then(Value::as_str)
}

/// Serialize a document the way it is persisted: pretty-printed with a
/// trailing newline.
pub fn serialize_document(document: &Value) -> StorageResult<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(document)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Parse persisted bytes into a document. Anything other than a JSON object
/// is rejected as malformed.
pub fn parse_document(location: &RunLocation, bytes: &[u8]) -> StorageResult<Value> {
    let document: Value = serde_json::from_slice(bytes).map_err(|e| StorageError::Malformed {
        location: location.0.clone(),
        reason: e.to_string(),
    })?;
    if !document.is_object() {
        return Err(StorageError::Malformed {
            location: location.0.clone(),
            reason: "top-level value is not an object".to_string(),
        });
    }
    Ok(document)
}

// ---------------------------------------------------------------------------
// RunStore
// ---------------------------------------------------------------------------

/// Run document store.
///
/// Guarantees:
/// - `list` returns every parseable document; a malformed document is skipped
///   and never aborts the listing.
/// - `find` matches `evaluation_id` exactly (case-sensitive) and returns the
///   first match in discovery order. Discovery order is not stable.
/// - `save` rewrites the whole document. There is no locking: concurrent
///   writers to the same run are last-writer-wins.
#[async_trait]
pub trait RunStore: Send + Sync {
    /// All discoverable run documents, in discovery order.
    async fn list(&self) -> StorageResult<Vec<StoredRun>>;

    /// Load one document by location. Parse failures surface as `Malformed`.
    async fn load(&self, location: &RunLocation) -> StorageResult<StoredRun>;

    /// Locate a run by its `evaluation_id`. Returns `RunNotFound` if absent.
    async fn find(&self, evaluation_id: &str) -> StorageResult<StoredRun> {
        self.list()
            .await?
            .into_iter()
            .find(|run| run.evaluation_id() == Some(evaluation_id))
            .ok_or_else(|| StorageError::RunNotFound {
                evaluation_id: evaluation_id.to_string(),
            })
    }

    /// Persist `document` at `location`, returning the new revision.
    async fn save(&self, location: &RunLocation, document: &Value)
        -> StorageResult<RevisionDigest>;

    /// Persist only if the stored revision still equals `expected`.
    ///
    /// The check and the write are not atomic; this narrows the lost-update
    /// window without closing it.
    async fn save_if_unchanged(
        &self,
        location: &RunLocation,
        document: &Value,
        expected: &RevisionDigest,
    ) -> StorageResult<RevisionDigest> {
        let current = self.load(location).await?;
        if &current.revision != expected {
            return Err(StorageError::RevisionConflict {
                evaluation_id: current
                    .evaluation_id()
                    .unwrap_or(location.0.as_str())
                    .to_string(),
                expected: expected.to_string(),
                actual: current.revision.to_string(),
            });
        }
        self.save(location, document).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn revision_is_deterministic() {
        let a = RevisionDigest::from_bytes(b"{}\n");
        let b = RevisionDigest::from_bytes(b"{}\n");
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
        assert_eq!(a.short().len(), 12);
    }

    #[test]
    fn revision_try_from_rejects_garbage() {
        assert!(RevisionDigest::try_from("xyz".to_string()).is_err());
        let ok = RevisionDigest::from_bytes(b"x").to_string().to_uppercase();
        assert!(RevisionDigest::try_from(ok).is_ok());
    }

    #[test]
    fn serialized_document_ends_with_newline() {
        let bytes = serialize_document(&json!({"evaluation_id": "a"})).unwrap();
        assert_eq!(bytes.last(), Some(&b'\n'));
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("\n  \"evaluation_id\": \"a\""));
    }

    #[test]
    fn serialization_preserves_key_order() {
        let raw = r#"{"zeta":1,"alpha":{"y":2,"b":3},"evaluation_id":"x"}"#;
        let doc = parse_document(&RunLocation("mem".into()), raw.as_bytes()).unwrap();
        let text = String::from_utf8(serialize_document(&doc).unwrap()).unwrap();
        let zeta = text.find("zeta").unwrap();
        let alpha = text.find("alpha").unwrap();
        let y = text.find("\"y\"").unwrap();
        let b = text.find("\"b\"").unwrap();
        assert!(zeta < alpha);
        assert!(y < b);
    }

    #[test]
    fn parse_rejects_non_object() {
        let loc = RunLocation("mem".into());
        assert!(matches!(
            parse_document(&loc, b"[1,2]"),
            Err(StorageError::Malformed { .. })
        ));
        assert!(matches!(
            parse_document(&loc, b"{not json"),
            Err(StorageError::Malformed { .. })
        ));
    }
}
