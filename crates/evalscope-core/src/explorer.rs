//! Read and annotation API over a [`RunStore`].
//!
//! Each call is independent: there is no cache and no coordination between
//! concurrent callers. Annotation updates are whole-document rewrites with
//! last-writer-wins semantics unless the caller opts into a revision check.

use evalscope_store::{RevisionDigest, RunStore, StoredRun};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::Instrument;

use crate::aggregate::{compute_run_rollup, RunRollup};
use crate::domain::{ExplorerError, Result, RunView};
use crate::metrics::METRICS;
use crate::obs::{
    emit_document_skipped, emit_run_annotated, emit_run_loaded, emit_run_not_found,
    emit_runs_listed, run_span,
};

/// A run in the list view: the document without `results`, plus rollups.
///
/// Serializes as one object. Rollup keys overwrite document keys of the same
/// name.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub document: Map<String, Value>,
    pub rollup: RunRollup,
}

impl RunSummary {
    /// Build a summary from a full document. Rollups are computed before
    /// `results` is dropped.
    pub fn from_document(document: Value) -> Self {
        let rollup = compute_run_rollup(&document);
        let mut document = match document {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        document.remove("results");
        Self { document, rollup }
    }

    pub fn evaluation_id(&self) -> Option<&str> {
        self.document.get("evaluation_id").and_then(Value::as_str)
    }

    /// The document with rollup fields merged in.
    pub fn to_value(&self) -> serde_json::Result<Value> {
        let mut merged = self.document.clone();
        if let Value::Object(rollup) = serde_json::to_value(self.rollup)? {
            merged.extend(rollup);
        }
        Ok(Value::Object(merged))
    }

    /// `started_at` as written; missing values sort last.
    pub fn started_at(&self) -> &str {
        self.document
            .get("started_at")
            .and_then(Value::as_str)
            .unwrap_or("")
    }
}

/// Sort newest first by lexical `started_at`. Stable, so ties keep
/// discovery order.
pub fn sort_newest_first(summaries: &mut [RunSummary]) {
    summaries.sort_by(|a, b| b.started_at().cmp(a.started_at()));
}

impl Serialize for RunSummary {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_value()
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}

/// A single run with its samples intact.
///
/// Serializes as the document plus `file_path`, which overwrites any
/// `file_path` the document already had.
#[derive(Debug, Clone, PartialEq)]
pub struct RunDetail {
    pub document: Map<String, Value>,
    /// Backing document path relative to the project root.
    pub file_path: String,
    pub revision: RevisionDigest,
}

impl RunDetail {
    /// The full document as a JSON value.
    pub fn to_value(&self) -> Value {
        Value::Object(self.document.clone())
    }
}

impl Serialize for RunDetail {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut merged = self.document.clone();
        merged.insert("file_path".to_string(), Value::String(self.file_path.clone()));
        merged.serialize(serializer)
    }
}

/// Copy `model_name`/`model_provider` from the first sample's output into
/// `metadata` when the run has no top-level `model_name`.
///
/// In-memory only; callers must not persist the result. Returns whether the
/// document changed.
pub fn enrich_metadata_from_samples(document: &mut Value) -> bool {
    let run = RunView::new(document);
    if run.metadata().get("model_name").is_present() {
        return false;
    }
    let Some(first) = run.samples().next() else {
        return false;
    };
    let output = first.output_value();
    let copied: Vec<(&str, Value)> = ["model_name", "model_provider"]
        .into_iter()
        .filter_map(|key| output.get(key).value().map(|v| (key, v.clone())))
        .collect();
    if copied.is_empty() {
        return false;
    }

    let Some(root) = document.as_object_mut() else {
        return false;
    };
    let metadata = root
        .entry("metadata")
        .or_insert_with(|| Value::Object(Map::new()));
    if metadata.is_null() {
        *metadata = Value::Object(Map::new());
    }
    let Some(metadata) = metadata.as_object_mut() else {
        return false;
    };
    for (key, value) in copied {
        metadata.insert(key.to_string(), value);
    }
    true
}

/// Set `metadata.annotation`, creating `metadata` if it is missing.
///
/// Every other field is left as it was. Fails only when `metadata` exists
/// but is not an object, since overwriting it would lose data.
pub fn apply_annotation(document: &mut Value, evaluation_id: &str, annotation: &str) -> Result<()> {
    let load_failure = |reason: &str| ExplorerError::LoadFailure {
        evaluation_id: evaluation_id.to_string(),
        reason: reason.to_string(),
    };
    let root = document
        .as_object_mut()
        .ok_or_else(|| load_failure("run document is not an object"))?;
    let metadata = root
        .entry("metadata")
        .or_insert_with(|| Value::Object(Map::new()));
    if metadata.is_null() {
        *metadata = Value::Object(Map::new());
    }
    let metadata = metadata
        .as_object_mut()
        .ok_or_else(|| load_failure("metadata is not an object"))?;
    metadata.insert("annotation".to_string(), Value::String(annotation.to_string()));
    Ok(())
}

/// Thin API layer over a run store backend.
pub struct RunExplorer<S> {
    store: S,
}

impl<S> RunExplorer<S>
where
    S: RunStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Summaries of every displayable run, newest first.
    ///
    /// Documents missing `metadata.test_config` or `metadata.test_results`
    /// are skipped; they never abort the listing.
    pub async fn list_runs(&self) -> Result<Vec<RunSummary>> {
        let stored = self
            .store
            .list()
            .await
            .map_err(ExplorerError::Storage)?;

        let mut skipped = 0usize;
        let mut summaries = Vec::with_capacity(stored.len());
        for run in stored {
            let missing = RunView::new(&run.document).missing_required();
            if !missing.is_empty() {
                skipped += 1;
                METRICS.inc_documents_skipped();
                emit_document_skipped(
                    &run.file_path,
                    &format!("missing metadata.{}", missing.join(", metadata.")),
                );
                continue;
            }
            let mut document = run.document;
            enrich_metadata_from_samples(&mut document);
            summaries.push(RunSummary::from_document(document));
        }

        sort_newest_first(&mut summaries);
        METRICS.add_runs_listed(summaries.len() as u64);
        emit_runs_listed(summaries.len(), skipped);
        Ok(summaries)
    }

    /// Full run by evaluation id, with `file_path` attached.
    pub async fn get_run(&self, evaluation_id: &str) -> Result<RunDetail> {
        self.load_detail(evaluation_id)
            .instrument(run_span(evaluation_id))
            .await
    }

    async fn load_detail(&self, evaluation_id: &str) -> Result<RunDetail> {
        let run = self.find(evaluation_id).await?;

        let missing = RunView::new(&run.document).missing_required();
        if !missing.is_empty() {
            return Err(ExplorerError::LoadFailure {
                evaluation_id: evaluation_id.to_string(),
                reason: format!("missing metadata.{}", missing.join(", metadata.")),
            });
        }

        let StoredRun {
            file_path,
            mut document,
            revision,
            ..
        } = run;
        enrich_metadata_from_samples(&mut document);
        let sample_count = RunView::new(&document).sample_count();
        let document = match document {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        METRICS.inc_runs_loaded();
        emit_run_loaded(evaluation_id, &file_path, sample_count);
        Ok(RunDetail {
            document,
            file_path,
            revision,
        })
    }

    /// Overwrite `metadata.annotation` and persist the whole document.
    ///
    /// Last writer wins: a concurrent update to the same run between this
    /// call's read and write is silently lost.
    pub async fn update_annotation(
        &self,
        evaluation_id: &str,
        annotation: &str,
    ) -> Result<RevisionDigest> {
        self.write_annotation(evaluation_id, annotation, None)
            .instrument(run_span(evaluation_id))
            .await
    }

    /// Like [`update_annotation`](Self::update_annotation), but refuses the
    /// write with `Conflict` if the stored document no longer matches
    /// `expected`.
    pub async fn update_annotation_checked(
        &self,
        evaluation_id: &str,
        annotation: &str,
        expected: &RevisionDigest,
    ) -> Result<RevisionDigest> {
        self.write_annotation(evaluation_id, annotation, Some(expected))
            .instrument(run_span(evaluation_id))
            .await
    }

    async fn write_annotation(
        &self,
        evaluation_id: &str,
        annotation: &str,
        expected: Option<&RevisionDigest>,
    ) -> Result<RevisionDigest> {
        let run = self.find(evaluation_id).await?;

        if let Some(expected) = expected {
            if &run.revision != expected {
                return Err(ExplorerError::Conflict {
                    evaluation_id: evaluation_id.to_string(),
                    expected: expected.to_string(),
                });
            }
        }

        let mut document = run.document;
        apply_annotation(&mut document, evaluation_id, annotation)?;

        let saved = match expected {
            Some(expected) => {
                self.store
                    .save_if_unchanged(&run.location, &document, expected)
                    .await
            }
            None => self.store.save(&run.location, &document).await,
        };
        let revision = saved.map_err(|e| ExplorerError::from_storage(evaluation_id, e))?;

        METRICS.inc_annotations_written();
        emit_run_annotated(evaluation_id, revision.short(), annotation.chars().count());
        Ok(revision)
    }

    async fn find(&self, evaluation_id: &str) -> Result<StoredRun> {
        self.store.find(evaluation_id).await.map_err(|e| {
            if e.is_not_found() {
                emit_run_not_found(evaluation_id);
            }
            ExplorerError::from_storage(evaluation_id, e)
        })
    }
}
