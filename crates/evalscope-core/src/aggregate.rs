//! Run-level rollups.
//!
//! Sums agent usage and judge usage across a run's samples and derives the
//! averages shown in the run list. Every function here is a pure fold over
//! loosely-typed input: absent or non-numeric values count as 0 and nothing
//! returns an error.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{Field, RunView, SampleView};

/// Token and cost totals. Derived on demand, never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageTotals {
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub total_cost: f64,
}

impl UsageTotals {
    /// Read a usage block (`input_tokens`, `output_tokens`, `total_cost`).
    pub fn from_field(usage: Field<'_>) -> Self {
        Self {
            input_tokens: usage.get("input_tokens").count_or_zero(),
            output_tokens: usage.get("output_tokens").count_or_zero(),
            total_cost: usage.get("total_cost").number_or_zero(),
        }
    }

    pub fn add(&mut self, other: UsageTotals) {
        self.input_tokens = self.input_tokens.saturating_add(other.input_tokens);
        self.output_tokens = self.output_tokens.saturating_add(other.output_tokens);
        self.total_cost += other.total_cost;
    }

    pub fn total_tokens(&self) -> i64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

impl std::ops::Add for UsageTotals {
    type Output = UsageTotals;

    fn add(mut self, rhs: UsageTotals) -> UsageTotals {
        UsageTotals::add(&mut self, rhs);
        self
    }
}

impl std::iter::Sum for UsageTotals {
    fn sum<I: Iterator<Item = UsageTotals>>(iter: I) -> Self {
        iter.fold(UsageTotals::default(), |acc, u| acc + u)
    }
}

/// Usage reported by the agent itself for one sample.
pub fn agent_usage(sample: &SampleView<'_>) -> UsageTotals {
    UsageTotals::from_field(sample.usage())
}

/// Usage reported by LLM judges across one sample's checks.
///
/// Judge usage lives in `results.judge_metadata` and is disjoint from the
/// agent's `usage` block.
pub fn judge_usage(sample: &SampleView<'_>) -> UsageTotals {
    sample
        .checks()
        .map(|check| check.judge_metadata())
        .filter(|meta| meta.is_present())
        .map(UsageTotals::from_field)
        .sum()
}

/// Agent plus judge usage for one sample.
pub fn sample_usage(sample: &SampleView<'_>) -> UsageTotals {
    agent_usage(sample) + judge_usage(sample)
}

/// Sum agent and judge usage over every sample in `run`.
///
/// A run with absent or empty `results` yields zero totals.
pub fn compute_usage_totals(run: &Value) -> UsageTotals {
    RunView::new(run).samples().map(|s| sample_usage(&s)).sum()
}

/// Aggregates shown for a run in the list view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RunRollup {
    pub total_cost: f64,
    pub total_input_tokens: i64,
    pub total_output_tokens: i64,
    pub avg_cost: f64,
    pub total_duration_seconds: f64,
    pub avg_duration_seconds: f64,
    pub sample_count: usize,
    pub passed_samples: usize,
    pub failed_samples: usize,
    pub pass_rate: f64,
}

/// Compute list-view rollups for `run`.
///
/// Totals match [`compute_usage_totals`]. Averages divide by `sample_count`
/// and are 0 when there are no samples.
pub fn compute_run_rollup(run: &Value) -> RunRollup {
    let view = RunView::new(run);
    let mut usage = UsageTotals::default();
    let mut total_duration_seconds = 0.0;
    let mut sample_count = 0usize;
    let mut passed_samples = 0usize;

    for sample in view.samples() {
        usage.add(sample_usage(&sample));
        total_duration_seconds += sample.duration_seconds();
        sample_count += 1;
        if sample.passed() {
            passed_samples += 1;
        }
    }

    let per_sample = |total: f64| {
        if sample_count == 0 {
            0.0
        } else {
            total / sample_count as f64
        }
    };

    RunRollup {
        total_cost: usage.total_cost,
        total_input_tokens: usage.input_tokens,
        total_output_tokens: usage.output_tokens,
        avg_cost: per_sample(usage.total_cost),
        total_duration_seconds,
        avg_duration_seconds: per_sample(total_duration_seconds),
        sample_count,
        passed_samples,
        failed_samples: sample_count - passed_samples,
        pass_rate: per_sample(passed_samples as f64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample(usage: Value, checks: Value, duration: f64) -> Value {
        json!({
            "execution_context": {
                "output": {
                    "value": {"response": "ok", "usage": usage},
                    "metadata": {"duration_seconds": duration}
                }
            },
            "check_results": checks
        })
    }

    #[test]
    fn empty_run_is_all_zero() {
        let run = json!({"results": []});
        assert_eq!(compute_usage_totals(&run), UsageTotals::default());
        assert_eq!(compute_run_rollup(&run), RunRollup::default());

        let no_results = json!({});
        assert_eq!(compute_run_rollup(&no_results).sample_count, 0);
        assert_eq!(compute_run_rollup(&no_results).avg_cost, 0.0);
    }

    #[test]
    fn missing_usage_subfields_are_zero() {
        let run = json!({"results": [sample(json!({"input_tokens": 7}), json!([]), 0.0)]});
        let totals = compute_usage_totals(&run);
        assert_eq!(totals.input_tokens, 7);
        assert_eq!(totals.output_tokens, 0);
        assert_eq!(totals.total_cost, 0.0);
    }

    #[test]
    fn malformed_usage_is_ignored() {
        let run = json!({
            "results": [
                sample(json!("not an object"), json!("not a list"), 0.0),
                sample(json!({"input_tokens": "10", "total_cost": null}), json!([]), 0.0),
                "garbage"
            ]
        });
        assert_eq!(compute_usage_totals(&run), UsageTotals::default());
    }

    #[test]
    fn judge_cost_is_additive_with_agent_cost() {
        let without_judge = json!({
            "results": [sample(
                json!({"input_tokens": 10, "output_tokens": 1, "total_cost": 0.5}),
                json!([{"results": {"passed": true}}]),
                0.0
            )]
        });
        let with_judge = json!({
            "results": [sample(
                json!({"input_tokens": 10, "output_tokens": 1, "total_cost": 0.5}),
                json!([{"results": {"passed": true, "judge_metadata": {"total_cost": 0.25}}}]),
                0.0
            )]
        });

        let base = compute_usage_totals(&without_judge);
        let judged = compute_usage_totals(&with_judge);
        assert_eq!(judged.total_cost - base.total_cost, 0.25);
        assert_eq!(judged.input_tokens, base.input_tokens);

        let view = json!(with_judge["results"][0]);
        let sample = SampleView::new(&view);
        assert_eq!(agent_usage(&sample).total_cost, 0.5);
        assert_eq!(judge_usage(&sample).total_cost, 0.25);
    }

    #[test]
    fn rollup_averages_divide_by_sample_count() {
        let run = json!({
            "results": [
                sample(json!({"total_cost": 0.2}), json!([{"results": {"passed": true}}]), 2.0),
                sample(json!({"total_cost": 0.4}), json!([{"results": {"passed": false}}]), 4.0),
            ]
        });
        let rollup = compute_run_rollup(&run);
        assert_eq!(rollup.sample_count, 2);
        assert!((rollup.total_cost - 0.6).abs() < 1e-12);
        assert!((rollup.avg_cost - rollup.total_cost / 2.0).abs() < 1e-12);
        assert_eq!(rollup.avg_duration_seconds, 3.0);
        assert_eq!(rollup.total_duration_seconds, 6.0);
        assert_eq!(rollup.passed_samples, 1);
        assert_eq!(rollup.failed_samples, 1);
        assert_eq!(rollup.pass_rate, 0.5);
    }

    #[test]
    fn sample_order_does_not_change_totals() {
        let a = sample(json!({"input_tokens": 3, "total_cost": 0.5}), json!([]), 1.0);
        let b = sample(json!({"output_tokens": 9, "total_cost": 0.25}), json!([]), 1.0);
        let forward = json!({"results": [a.clone(), b.clone()]});
        let reverse = json!({"results": [b, a]});
        assert_eq!(compute_usage_totals(&forward), compute_usage_totals(&reverse));
    }
}
