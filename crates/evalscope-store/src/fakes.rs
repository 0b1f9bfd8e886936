//! In-memory fake for the run store (testing only)
//!
//! `MemoryRunStore` keeps serialized bytes per location so that revisions and
//! malformed documents behave exactly like the filesystem store.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StorageError;
use crate::storage_traits::*;

/// In-memory run store backed by an insertion-ordered list of documents.
#[derive(Debug, Default)]
pub struct MemoryRunStore {
    documents: Mutex<Vec<(RunLocation, Vec<u8>)>>,
}

impl MemoryRunStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document under `location`, replacing any existing one.
    pub fn insert(&self, location: &str, document: &Value) -> StorageResult<RunLocation> {
        let bytes = serialize_document(document)?;
        Ok(self.insert_raw(location, bytes))
    }

    /// Seed raw bytes, which need not be valid JSON.
    pub fn insert_raw(&self, location: &str, bytes: impl Into<Vec<u8>>) -> RunLocation {
        let location = RunLocation(location.to_string());
        let bytes = bytes.into();
        let mut documents = self.documents.lock().unwrap();
        match documents.iter_mut().find(|(loc, _)| *loc == location) {
            Some(entry) => entry.1 = bytes,
            None => documents.push((location.clone(), bytes)),
        }
        location
    }

    /// Raw bytes currently stored at `location`.
    pub fn raw(&self, location: &str) -> Option<Vec<u8>> {
        let documents = self.documents.lock().unwrap();
        documents
            .iter()
            .find(|(loc, _)| loc.0 == location)
            .map(|(_, bytes)| bytes.clone())
    }

    fn to_stored(location: &RunLocation, bytes: &[u8]) -> StorageResult<StoredRun> {
        let document = parse_document(location, bytes)?;
        Ok(StoredRun {
            location: location.clone(),
            file_path: location.0.clone(),
            document,
            revision: RevisionDigest::from_bytes(bytes),
        })
    }
}

#[async_trait]
impl RunStore for MemoryRunStore {
    async fn list(&self) -> StorageResult<Vec<StoredRun>> {
        let documents = self.documents.lock().unwrap();
        let runs = documents
            .iter()
            .filter_map(|(location, bytes)| Self::to_stored(location, bytes).ok())
            .collect();
        Ok(runs)
    }

    async fn load(&self, location: &RunLocation) -> StorageResult<StoredRun> {
        let documents = self.documents.lock().unwrap();
        let (_, bytes) = documents
            .iter()
            .find(|(loc, _)| loc == location)
            .ok_or_else(|| {
                StorageError::io(
                    location.0.clone(),
                    std::io::Error::new(std::io::ErrorKind::NotFound, "no such document"),
                )
            })?;
        Self::to_stored(location, bytes)
    }

    async fn save(
        &self,
        location: &RunLocation,
        document: &Value,
    ) -> StorageResult<RevisionDigest> {
        let bytes = serialize_document(document)?;
        let revision = RevisionDigest::from_bytes(&bytes);
        self.insert_raw(&location.0, bytes);
        Ok(revision)
    }
}
