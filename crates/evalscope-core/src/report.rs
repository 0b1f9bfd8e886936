//! Detail-view projection of one run.
//!
//! Combines the header overview, usage totals, rollups and per-sample check
//! presentations into a single serializable report.

use serde::Serialize;
use serde_json::Value;

use crate::aggregate::{
    agent_usage, compute_run_rollup, compute_usage_totals, judge_usage, RunRollup, UsageTotals,
};
use crate::domain::{RunOverview, RunView, SampleView};
use crate::explorer::RunDetail;
use crate::presentation::{present_view, PresentationModel};

/// One sample with its checks presented.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleReport {
    pub index: usize,
    pub test_case_id: Option<String>,
    pub input: Option<Value>,
    pub expected: Option<Value>,
    pub response: Option<Value>,
    pub status: Option<String>,
    pub passed: bool,
    pub duration_seconds: f64,
    pub agent_usage: UsageTotals,
    pub judge_usage: UsageTotals,
    pub checks: Vec<PresentationModel>,
}

impl SampleReport {
    pub fn from_sample(index: usize, sample: &SampleView<'_>) -> Self {
        let test_case = sample.test_case();
        Self {
            index,
            test_case_id: sample.test_case_id().map(str::to_string),
            input: test_case.get("input").value().cloned(),
            expected: test_case.get("expected").value().cloned(),
            response: sample.output_value().get("response").value().cloned(),
            status: sample.status().map(str::to_string),
            passed: sample.passed(),
            duration_seconds: sample.duration_seconds(),
            agent_usage: agent_usage(sample),
            judge_usage: judge_usage(sample),
            checks: sample.checks().map(|c| present_view(&c)).collect(),
        }
    }
}

/// Everything the detail view shows for a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub overview: RunOverview,
    pub file_path: String,
    pub revision: String,
    pub usage: UsageTotals,
    pub rollup: RunRollup,
    pub samples: Vec<SampleReport>,
}

/// Build the detail report for a loaded run.
pub fn build_report(detail: &RunDetail) -> RunReport {
    let document = detail.to_value();
    let run = RunView::new(&document);
    RunReport {
        overview: RunOverview::from_run(&run),
        file_path: detail.file_path.clone(),
        revision: detail.revision.to_string(),
        usage: compute_usage_totals(&document),
        rollup: compute_run_rollup(&document),
        samples: run
            .samples()
            .enumerate()
            .map(|(i, s)| SampleReport::from_sample(i, &s))
            .collect(),
    }
}
