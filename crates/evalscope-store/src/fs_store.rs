//! Filesystem-backed run store.
//!
//! Every `*.json` file below the results directory is a candidate run
//! document. Files are discovered recursively; a file that fails to parse is
//! logged and skipped during enumeration.

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::StorageError;
use crate::storage_traits::*;

/// Run store rooted at a results directory.
///
/// Layout: `<results_dir>/**/<anything>.json`, one run per file.
#[derive(Debug, Clone)]
pub struct FsRunStore {
    results_dir: PathBuf,
    project_root: PathBuf,
}

impl FsRunStore {
    /// Create a store over `results_dir`. `file_path` values are reported
    /// relative to `results_dir` until a project root is set.
    pub fn new(results_dir: impl AsRef<Path>) -> Self {
        let results_dir = absolute(results_dir.as_ref());
        Self {
            project_root: results_dir.clone(),
            results_dir,
        }
    }

    /// Report `file_path` relative to `project_root`.
    pub fn with_project_root(mut self, project_root: impl AsRef<Path>) -> Self {
        self.project_root = absolute(project_root.as_ref());
        self
    }

    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    fn display_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.project_root)
            .unwrap_or(path)
            .to_string_lossy()
            .into_owned()
    }

    /// All `*.json` files under the results directory, sorted by path.
    async fn discover(&self) -> StorageResult<Vec<PathBuf>> {
        let mut found = Vec::new();
        if !tokio::fs::try_exists(&self.results_dir)
            .await
            .map_err(|e| StorageError::io(self.results_dir.to_string_lossy(), e))?
        {
            debug!(dir = %self.results_dir.display(), "results directory does not exist");
            return Ok(found);
        }

        let mut pending = vec![self.results_dir.clone()];
        while let Some(dir) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir)
                .await
                .map_err(|e| StorageError::io(dir.to_string_lossy(), e))?;
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| StorageError::io(dir.to_string_lossy(), e))?
            {
                let path = entry.path();
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| StorageError::io(path.to_string_lossy(), e))?;
                if file_type.is_dir() {
                    pending.push(path);
                } else if path.extension().is_some_and(|ext| ext == "json") {
                    found.push(path);
                }
            }
        }
        found.sort();
        Ok(found)
    }

    async fn read(&self, path: &Path) -> StorageResult<StoredRun> {
        let location = RunLocation(path.to_string_lossy().into_owned());
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| StorageError::io(location.0.clone(), e))?;
        let document = parse_document(&location, &bytes)?;
        Ok(StoredRun {
            file_path: self.display_path(path),
            location,
            document,
            revision: RevisionDigest::from_bytes(&bytes),
        })
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[async_trait]
impl RunStore for FsRunStore {
    async fn list(&self) -> StorageResult<Vec<StoredRun>> {
        let mut runs = Vec::new();
        for path in self.discover().await? {
            match self.read(&path).await {
                Ok(run) => runs.push(run),
                Err(err) => {
                    warn!(
                        event = "store.document_skipped",
                        path = %path.display(),
                        error = %err,
                    );
                }
            }
        }
        Ok(runs)
    }

    async fn load(&self, location: &RunLocation) -> StorageResult<StoredRun> {
        self.read(Path::new(&location.0)).await
    }

    async fn save(
        &self,
        location: &RunLocation,
        document: &Value,
    ) -> StorageResult<RevisionDigest> {
        let bytes = serialize_document(document)?;
        let revision = RevisionDigest::from_bytes(&bytes);
        let path = PathBuf::from(&location.0);

        tokio::task::spawn_blocking(move || write_atomic(&path, &bytes))
            .await
            .map_err(|e| {
                StorageError::io(
                    location.0.clone(),
                    std::io::Error::new(std::io::ErrorKind::Other, e.to_string()),
                )
            })?
            .map_err(|e| StorageError::io(location.0.clone(), e))?;

        debug!(path = %location, revision = %revision.short(), "run document written");
        Ok(revision)
    }
}

/// Write to a temp file next to the target, then rename over it.
///
/// Symlinks are followed so the link itself survives, and an existing
/// target's permissions carry over to the new file.
fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let (target, permissions) = match std::fs::canonicalize(path) {
        Ok(resolved) => {
            let permissions = std::fs::metadata(&resolved)?.permissions();
            (resolved, Some(permissions))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => (path.to_path_buf(), None),
        Err(e) => return Err(e),
    };
    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    if let Some(permissions) = permissions {
        tmp.as_file().set_permissions(permissions)?;
    }
    tmp.persist(&target).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn make_store() -> (tempfile::TempDir, FsRunStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsRunStore::new(dir.path());
        (dir, store)
    }

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[tokio::test]
    async fn list_discovers_nested_json_only() {
        let (dir, store) = make_store();
        write(dir.path(), "a.json", r#"{"evaluation_id": "a"}"#);
        write(dir.path(), "nested/deeper/b.json", r#"{"evaluation_id": "b"}"#);
        write(dir.path(), "notes.txt", "not a run");

        let runs = store.list().await.unwrap();
        let mut ids: Vec<_> = runs.iter().filter_map(|r| r.evaluation_id()).collect();
        ids.sort();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn list_skips_malformed_documents() {
        let (dir, store) = make_store();
        write(dir.path(), "good.json", r#"{"evaluation_id": "good"}"#);
        write(dir.path(), "broken.json", "{ truncated");
        write(dir.path(), "array.json", "[1, 2, 3]");

        let runs = store.list().await.unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].evaluation_id(), Some("good"));
    }

    #[tokio::test]
    async fn missing_results_dir_lists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsRunStore::new(dir.path().join("does-not-exist"));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn file_path_is_relative_to_project_root() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "evals/results/run.json",
            r#"{"evaluation_id": "rel"}"#,
        );
        let store =
            FsRunStore::new(dir.path().join("evals/results")).with_project_root(dir.path());

        let run = store.find("rel").await.unwrap();
        assert_eq!(
            Path::new(&run.file_path),
            Path::new("evals/results/run.json")
        );
    }

    #[tokio::test]
    async fn save_writes_pretty_json_with_trailing_newline() {
        let (dir, store) = make_store();
        let path = write(dir.path(), "run.json", r#"{"evaluation_id":"w"}"#);
        let run = store.find("w").await.unwrap();

        let revision = store
            .save(&run.location, &json!({"evaluation_id": "w", "extra": 1}))
            .await
            .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.ends_with("}\n"));
        assert!(text.contains("\n  \"extra\": 1"));
        assert_eq!(revision, RevisionDigest::from_bytes(text.as_bytes()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn save_keeps_file_mode() {
        use std::os::unix::fs::PermissionsExt;

        let (dir, store) = make_store();
        let path = write(dir.path(), "run.json", r#"{"evaluation_id":"m"}"#);
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();
        let run = store.find("m").await.unwrap();

        store
            .save(&run.location, &json!({"evaluation_id": "m", "note": "x"}))
            .await
            .unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn save_through_symlink_rewrites_the_target() {
        let (dir, store) = make_store();
        let real = write(dir.path(), "archive/real.txt", r#"{"evaluation_id":"s"}"#);
        let link = dir.path().join("linked.json");
        std::os::unix::fs::symlink(&real, &link).unwrap();
        let run = store.find("s").await.unwrap();

        store
            .save(&run.location, &json!({"evaluation_id": "s", "note": "y"}))
            .await
            .unwrap();

        assert!(std::fs::symlink_metadata(&link)
            .unwrap()
            .file_type()
            .is_symlink());
        let text = std::fs::read_to_string(&real).unwrap();
        assert!(text.contains("\"note\": \"y\""));
    }

    #[tokio::test]
    async fn load_reports_malformed_document() {
        let (dir, store) = make_store();
        let path = write(dir.path(), "bad.json", "nope");
        let err = store
            .load(&RunLocation(path.to_string_lossy().into_owned()))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Malformed { .. }));
    }
}
