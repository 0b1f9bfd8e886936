//! Markdown rendering for run lists, run reports and check presentations.

use serde_json::Value;

use crate::domain::{display, Field, PLACEHOLDER};
use crate::explorer::RunSummary;
use crate::presentation::{CheckDetail, FlagDisplay, PresentationModel, ResolvedField};
use crate::report::{RunReport, SampleReport};

/// Options for [`render_run_report_md`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// Include per-sample check sections.
    pub show_checks: bool,
    /// Print judge prompts instead of collapsing them.
    pub reveal_prompts: bool,
}

/// Render the run list as a markdown table.
pub fn render_run_list_md(runs: &[RunSummary]) -> String {
    if runs.is_empty() {
        return "No evaluation runs found.\n".to_string();
    }

    let mut out = String::new();
    out.push_str("| Started | Evaluation | Eval | Model | Passed | Samples | Total cost | Avg cost | Avg duration | Annotation |\n");
    out.push_str("|---|---|---|---|---|---|---|---|---|---|\n");
    for run in runs {
        let doc = Value::Object(run.document.clone());
        let root = Field::of(&doc);
        let metadata = root.get("metadata");
        let passed = match metadata.path(&["test_results", "passed"]).as_bool() {
            Some(true) => "yes",
            Some(false) => "no",
            None => PLACEHOLDER,
        };
        out.push_str(&format!(
            "| {} | `{}` | {} | {} | {} | {}/{} | ${:.4} | ${:.4} | {:.2}s | {} |\n",
            display(root.get("started_at")),
            display(root.get("evaluation_id")),
            display(metadata.get("eval_name")),
            display(metadata.get("model_name")),
            passed,
            run.rollup.passed_samples,
            run.rollup.sample_count,
            run.rollup.total_cost,
            run.rollup.avg_cost,
            run.rollup.avg_duration_seconds,
            metadata.get("annotation").as_str().unwrap_or(""),
        ));
    }
    out
}

/// Render a run report as markdown.
pub fn render_run_report_md(report: &RunReport, options: RenderOptions) -> String {
    let o = &report.overview;
    let mut out = String::new();
    out.push_str(&format!("# {}\n\n", o.eval_name));
    if o.eval_description != PLACEHOLDER {
        out.push_str(&format!("{}\n\n", o.eval_description));
    }

    out.push_str("## Run\n");
    out.push_str(&format!("- evaluation id: `{}`\n", o.evaluation_id));
    out.push_str(&format!("- file: `{}`\n", report.file_path));
    out.push_str(&format!("- revision: `{}`\n", report.revision));
    out.push_str(&format!(
        "- model: {} ({})\n- temperature: {}\n",
        o.model_name, o.model_provider, o.temperature
    ));
    out.push_str(&format!(
        "- test function: {}\n- test cases: {}\n- samples per case: {}\n",
        o.test_function, o.num_test_cases, o.samples_per_case
    ));
    out.push_str(&format!(
        "- started: {}\n- completed: {}\n",
        o.started_at, o.completed_at
    ));
    if let Some(secs) = o.duration_seconds {
        out.push_str(&format!("- wall clock: {:.1}s\n", secs));
    }
    out.push('\n');

    out.push_str("## Results\n");
    let verdict = match o.passed {
        Some(true) => "PASSED",
        Some(false) => "FAILED",
        None => PLACEHOLDER,
    };
    out.push_str(&format!("- verdict: {}\n", verdict));
    out.push_str(&format!(
        "- success rate: {} (threshold {})\n",
        percent(o.success_rate),
        percent(o.success_threshold)
    ));
    out.push_str(&format!(
        "- samples passed: {}/{}\n",
        o.passed_samples
            .map_or_else(|| PLACEHOLDER.to_string(), |n| n.to_string()),
        o.total_samples
            .map_or_else(|| PLACEHOLDER.to_string(), |n| n.to_string()),
    ));
    out.push_str(&format!(
        "- tokens: {} in / {} out\n- total cost: ${:.4} (avg ${:.4} per sample)\n- avg duration: {:.2}s\n",
        report.usage.input_tokens,
        report.usage.output_tokens,
        report.usage.total_cost,
        report.rollup.avg_cost,
        report.rollup.avg_duration_seconds,
    ));
    if let Some(note) = &o.annotation {
        out.push_str(&format!("\n> {}\n", note));
    }

    if options.show_checks {
        for sample in &report.samples {
            out.push('\n');
            out.push_str(&render_sample_md(sample, options));
        }
    }
    out
}

fn render_sample_md(sample: &SampleReport, options: RenderOptions) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "## Sample {} ({}) {}\n",
        sample.index + 1,
        sample.test_case_id.as_deref().unwrap_or(PLACEHOLDER),
        if sample.passed { "PASS" } else { "FAIL" },
    ));
    if let Some(input) = &sample.input {
        out.push_str(&format!("- input: {}\n", compact(input)));
    }
    if let Some(response) = &sample.response {
        out.push_str(&format!("- response: {}\n", compact(response)));
    }
    out.push_str(&format!(
        "- duration: {:.2}s\n- agent usage: {} in / {} out, ${:.4}\n",
        sample.duration_seconds,
        sample.agent_usage.input_tokens,
        sample.agent_usage.output_tokens,
        sample.agent_usage.total_cost,
    ));
    for check in &sample.checks {
        out.push('\n');
        out.push_str(&render_check_md(check, options.reveal_prompts));
    }
    out
}

/// Render one presented check.
pub fn render_check_md(check: &PresentationModel, reveal_prompt: bool) -> String {
    let mut out = String::new();
    let status = match check.passed {
        Some(true) => "pass",
        Some(false) => "fail",
        None => PLACEHOLDER,
    };
    match &check.name {
        Some(name) => out.push_str(&format!("### {} [{}] {}\n", name, check.check_type, status)),
        None => out.push_str(&format!("### {} {}\n", check.check_type, status)),
    }

    match &check.detail {
        CheckDetail::ExactMatch { expected, actual } | CheckDetail::Equals { expected, actual } => {
            push_resolved(&mut out, "Expected", expected.as_ref());
            push_resolved(&mut out, "Actual", actual.as_ref());
        }
        CheckDetail::Contains {
            phrases,
            found,
            text,
        } => {
            if let Some(phrases) = phrases {
                out.push_str(&format!(
                    "- Phrases: {}{}\n",
                    phrases.as_list().join(", "),
                    provenance(phrases)
                ));
            }
            if let Some(found) = found {
                out.push_str(&format!("- Found: {}\n", compact(found)));
            }
            push_resolved(&mut out, "Text Searched", text.as_ref());
        }
        CheckDetail::LlmJudge {
            reasoning,
            judge_model,
            judge_cost,
            input_tokens,
            output_tokens,
            prompt,
        } => {
            if let Some(reasoning) = reasoning {
                out.push_str(&format!("- Reasoning: {}\n", reasoning));
            }
            out.push_str(&format!(
                "- Judge: {}\n",
                judge_model.as_deref().unwrap_or(PLACEHOLDER)
            ));
            if let Some(cost) = judge_cost {
                out.push_str(&format!("- Judge cost: ${:.4}\n", cost));
            }
            if input_tokens.is_some() || output_tokens.is_some() {
                out.push_str(&format!(
                    "- Judge tokens: {} in / {} out\n",
                    input_tokens.unwrap_or(0),
                    output_tokens.unwrap_or(0)
                ));
            }
            if let Some(prompt) = prompt {
                if reveal_prompt {
                    out.push_str(&format!("- Prompt:\n\n```\n{}\n```\n", text(&prompt.value)));
                } else {
                    out.push_str("- Prompt: (hidden, pass --reveal-prompts to show)\n");
                }
            }
        }
        CheckDetail::Generic { results, arguments } => {
            out.push_str(&format!("- Results: {}\n", compact(results)));
            out.push_str(&format!("- Arguments: {}\n", compact(arguments)));
        }
    }

    if !check.flags.is_empty() {
        let flags: Vec<String> = check.flags.iter().map(render_flag).collect();
        out.push_str(&format!("- Flags: {}\n", flags.join(", ")));
    }
    out
}

fn render_flag(flag: &FlagDisplay) -> String {
    if flag.is_default {
        format!("{}={} (default)", flag.name, compact(&flag.value))
    } else {
        format!(
            "{}={} (override, default {})",
            flag.name,
            compact(&flag.value),
            flag.default
        )
    }
}

fn push_resolved(out: &mut String, label: &str, field: Option<&ResolvedField>) {
    if let Some(field) = field {
        out.push_str(&format!(
            "- {}: {}{}\n",
            label,
            compact(&field.value),
            provenance(field)
        ));
    }
}

fn provenance(field: &ResolvedField) -> String {
    field
        .jsonpath
        .as_deref()
        .map(|p| format!(" (from `{}`)", p))
        .unwrap_or_default()
}

fn percent(value: Option<f64>) -> String {
    value.map_or_else(|| PLACEHOLDER.to_string(), |v| format!("{:.1}%", v * 100.0))
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn compact(value: &Value) -> String {
    match value {
        Value::String(s) => format!("{:?}", s),
        other => other.to_string(),
    }
}
