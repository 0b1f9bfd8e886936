//! Structured observability hooks for explorer operations.
//!
//! This module provides:
//! - Run-scoped tracing spans via `RunSpan` RAII guard
//! - Emission functions for list, load, skip and annotate events
//!
//! Events are emitted at `info!` level unless noted (configurable via `RUST_LOG`).
//! For JSON output, pass `json = true` to [`init_tracing`](crate::init_tracing).

use tracing::{debug, info, warn};

/// RAII guard that enters a span tagged with an evaluation id.
///
/// # Example
///
/// ```ignore
/// let _span = RunSpan::enter("eval-12345");
/// // tracing calls are now associated with evaluation_id = "eval-12345"
/// ```
pub struct RunSpan {
    _span: tracing::span::EnteredSpan,
}

impl RunSpan {
    pub fn enter(evaluation_id: &str) -> Self {
        Self {
            _span: run_span(evaluation_id).entered(),
        }
    }
}

/// Span tagged with an evaluation id, for use with `Instrument::instrument`
/// around async work where an entered guard must not cross an `.await`.
pub fn run_span(evaluation_id: &str) -> tracing::Span {
    tracing::info_span!("evalscope.run", evaluation_id = %evaluation_id)
}

/// Emit event: runs listed, with how many documents were left out.
pub fn emit_runs_listed(count: usize, skipped: usize) {
    info!(event = "runs.listed", count = count, skipped = skipped);
}

/// Emit event: a single run loaded for detail view.
pub fn emit_run_loaded(evaluation_id: &str, file_path: &str, sample_count: usize) {
    info!(
        event = "run.loaded",
        evaluation_id = %evaluation_id,
        file_path = %file_path,
        sample_count = sample_count,
    );
}

/// Emit event: a document was left out of a listing (warning level).
pub fn emit_document_skipped(location: &str, reason: &dyn std::fmt::Display) {
    warn!(event = "run.document_skipped", location = %location, reason = %reason);
}

/// Emit event: annotation written back to a run document.
pub fn emit_run_annotated(evaluation_id: &str, revision: &str, annotation_len: usize) {
    info!(
        event = "run.annotated",
        evaluation_id = %evaluation_id,
        revision = %revision,
        annotation_len = annotation_len,
    );
}

/// Emit event: lookup missed (debug level).
pub fn emit_run_not_found(evaluation_id: &str) {
    debug!(event = "run.not_found", evaluation_id = %evaluation_id);
}
