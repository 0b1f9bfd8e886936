//! Observability tests for explorer tracing and metrics.
//!
//! These tests verify that the lifecycle emitters and run spans can be
//! driven from outside the crate, and that explorer operations move the
//! global counters.

use evalscope_core::{
    emit_document_skipped, emit_run_annotated, emit_run_loaded, emit_run_not_found,
    emit_runs_listed, RunExplorer, RunSpan, METRICS,
};
use evalscope_store::fakes::MemoryRunStore;
use serde_json::json;
use tracing_test::traced_test;

#[traced_test]
#[test]
fn test_emit_runs_listed() {
    emit_runs_listed(12, 1);
}

#[traced_test]
#[test]
fn test_emit_run_loaded() {
    emit_run_loaded("eval-1", "evals/results/eval-1.json", 4);
}

#[traced_test]
#[test]
fn test_emit_document_skipped_warns() {
    emit_document_skipped("evals/results/bad.json", &"expected value at line 1");
}

#[traced_test]
#[test]
fn test_emit_run_annotated() {
    emit_run_annotated("eval-1", "a1b2c3d4e5f6", 11);
}

#[traced_test]
#[test]
fn test_emit_run_not_found() {
    emit_run_not_found("missing-id");
}

#[traced_test]
#[test]
fn test_run_span_enter_creates_span() {
    let span = RunSpan::enter("eval-span");
    drop(span);
}

/// Counters are process-wide, so only monotonic movement is asserted.
#[traced_test]
#[tokio::test]
async fn test_explorer_operations_move_counters() {
    let store = MemoryRunStore::new();
    store
        .insert(
            "r.json",
            &json!({
                "evaluation_id": "r",
                "metadata": {"test_config": {}, "test_results": {}},
                "results": []
            }),
        )
        .unwrap();
    store
        .insert("partial.json", &json!({"evaluation_id": "p"}))
        .unwrap();
    let explorer = RunExplorer::new(store);

    let listed = METRICS.runs_listed();
    let skipped = METRICS.documents_skipped();
    let loaded = METRICS.runs_loaded();
    let annotated = METRICS.annotations_written();

    explorer.list_runs().await.unwrap();
    explorer.get_run("r").await.unwrap();
    explorer.update_annotation("r", "ok").await.unwrap();

    assert!(METRICS.runs_listed() >= listed + 1);
    assert!(METRICS.documents_skipped() >= skipped + 1);
    assert!(METRICS.runs_loaded() >= loaded + 1);
    assert!(METRICS.annotations_written() >= annotated + 1);

    METRICS.flush();
}
