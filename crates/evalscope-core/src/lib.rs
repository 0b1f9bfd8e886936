//! evalscope core library
//!
//! Read-side model of evaluation run documents: safe field access, usage and
//! pass/fail aggregation, per-check presentation, and the explorer service
//! that lists, loads and annotates runs through an `evalscope_store::RunStore`.

pub mod aggregate;
pub mod config;
pub mod domain;
pub mod explorer;
pub mod metrics;
pub mod obs;
pub mod presentation;
pub mod render;
pub mod report;
pub mod telemetry;

pub use aggregate::{
    agent_usage, compute_run_rollup, compute_usage_totals, judge_usage, sample_usage, RunRollup,
    UsageTotals,
};
pub use config::{ExplorerConfig, DEFAULT_RESULTS_DIR};
pub use domain::{
    CheckType, CheckView, ExplorerError, Field, Result, RunOverview, RunView, SampleView,
    PLACEHOLDER, REQUIRED_METADATA,
};
pub use explorer::{
    apply_annotation, enrich_metadata_from_samples, sort_newest_first, RunDetail, RunExplorer,
    RunSummary,
};
pub use metrics::METRICS;
pub use obs::{
    emit_document_skipped, emit_run_annotated, emit_run_loaded, emit_run_not_found,
    emit_runs_listed, run_span, RunSpan,
};
pub use presentation::{
    present, present_view, CheckDetail, FlagDisplay, PresentationModel, ResolvedField,
};
pub use render::{render_check_md, render_run_list_md, render_run_report_md, RenderOptions};
pub use report::{build_report, RunReport, SampleReport};
pub use telemetry::init_tracing;

pub use evalscope_store::{FsRunStore, RevisionDigest, RunStore, StorageError};

/// Crate version, for `--version` style output.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
