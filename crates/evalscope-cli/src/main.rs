//! evalscope - explore evaluation run results
//!
//! Reads run documents from a results directory and shows them as tables,
//! detail reports or JSON.
//!
//! ## Commands
//!
//! - `list`: Summaries of every run, newest first
//! - `show`: One run with overview, usage and optionally every check
//! - `annotate`: Set a run's free-text annotation
//! - `check`: Present a single raw check result from a JSON file

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use evalscope_core::{
    build_report, present, render_check_md, render_run_list_md, render_run_report_md,
    ExplorerConfig, ExplorerError, RenderOptions, RevisionDigest, RunExplorer, RunSpan, RunStore,
    METRICS,
};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "evalscope")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Explore LLM agent evaluation runs", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Directory holding run documents, relative to the project root
    #[arg(
        long,
        global = true,
        env = "EVALSCOPE_RESULTS_DIR",
        default_value = evalscope_core::DEFAULT_RESULTS_DIR
    )]
    results_dir: PathBuf,

    /// Root that reported file paths are relative to
    #[arg(long, global = true, env = "EVALSCOPE_PROJECT_ROOT", default_value = ".")]
    project_root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// List runs, newest first
    List {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Show one run
    Show {
        /// Evaluation id of the run
        evaluation_id: String,

        /// Include every sample and its checks
        #[arg(long)]
        checks: bool,

        /// Print llm-judge prompts in full
        #[arg(long)]
        reveal_prompts: bool,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Set the annotation of a run (replaces any existing one)
    Annotate {
        /// Evaluation id of the run
        evaluation_id: String,

        /// Annotation text; an empty string clears it
        text: String,

        /// Only write if the run is still at this revision (from `show`)
        #[arg(long)]
        if_revision: Option<String>,
    },

    /// Present a single check result read from a JSON file
    Check {
        /// File containing one check result object
        path: PathBuf,

        /// Print llm-judge prompts in full
        #[arg(long)]
        reveal_prompts: bool,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    evalscope_core::init_tracing(cli.json, level);

    let config = ExplorerConfig::new(cli.results_dir, cli.project_root);
    let explorer = config.open();

    let result = match cli.command {
        Commands::List { format } => cmd_list(&explorer, format).await,
        Commands::Show {
            evaluation_id,
            checks,
            reveal_prompts,
            format,
        } => {
            let options = RenderOptions {
                show_checks: checks,
                reveal_prompts,
            };
            cmd_show(&explorer, &evaluation_id, options, format).await
        }
        Commands::Annotate {
            evaluation_id,
            text,
            if_revision,
        } => cmd_annotate(&explorer, &evaluation_id, &text, if_revision).await,
        Commands::Check {
            path,
            reveal_prompts,
            format,
        } => cmd_check(&path, reveal_prompts, format),
    };

    METRICS.flush();
    let output = result?;
    print!("{}", output);
    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)? + "\n")
}

/// Run summaries, newest first.
async fn cmd_list<S: RunStore>(explorer: &RunExplorer<S>, format: OutputFormat) -> Result<String> {
    let runs = explorer
        .list_runs()
        .await
        .context("Failed to list evaluation runs")?;

    match format {
        OutputFormat::Json => to_json(&runs),
        OutputFormat::Text => Ok(render_run_list_md(&runs)),
    }
}

/// One run. JSON output is the enriched document plus `file_path`; text
/// output is the rendered report.
async fn cmd_show<S: RunStore>(
    explorer: &RunExplorer<S>,
    evaluation_id: &str,
    options: RenderOptions,
    format: OutputFormat,
) -> Result<String> {
    let detail = explorer
        .get_run(evaluation_id)
        .await
        .map_err(|e| user_error(evaluation_id, e))?;

    let _span = RunSpan::enter(evaluation_id);
    match format {
        OutputFormat::Json if options.show_checks => to_json(&json!({
            "run": &detail,
            "report": build_report(&detail),
        })),
        OutputFormat::Json => to_json(&detail),
        OutputFormat::Text => Ok(render_run_report_md(&build_report(&detail), options)),
    }
}

async fn cmd_annotate<S: RunStore>(
    explorer: &RunExplorer<S>,
    evaluation_id: &str,
    text: &str,
    if_revision: Option<String>,
) -> Result<String> {
    let revision = match if_revision {
        Some(hex) => {
            let expected = RevisionDigest::try_from(hex).context("Invalid --if-revision")?;
            explorer
                .update_annotation_checked(evaluation_id, text, &expected)
                .await
        }
        None => explorer.update_annotation(evaluation_id, text).await,
    }
    .map_err(|e| user_error(evaluation_id, e))?;

    info!(evaluation_id, revision = %revision.short(), "annotation saved");
    Ok(format!(
        "Annotated {} (revision {})\n",
        evaluation_id,
        revision.short()
    ))
}

fn cmd_check(path: &Path, reveal_prompts: bool, format: OutputFormat) -> Result<String> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read check file: {:?}", path))?;
    let raw: Value = serde_json::from_slice(&bytes)
        .with_context(|| format!("Check file is not valid JSON: {:?}", path))?;

    let model = present(&raw);
    match format {
        OutputFormat::Json => to_json(&model),
        OutputFormat::Text => Ok(render_check_md(&model, reveal_prompts)),
    }
}

fn user_error(evaluation_id: &str, err: ExplorerError) -> anyhow::Error {
    match err {
        ExplorerError::NotFound(_) => {
            anyhow::anyhow!("Evaluation run not found: {}", evaluation_id)
        }
        ExplorerError::Conflict { .. } => anyhow::Error::new(err)
            .context("Run was modified since that revision; re-run `show` and retry"),
        other => anyhow::Error::new(other).context(format!("Run {} failed", evaluation_id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evalscope_store::fakes::MemoryRunStore;

    fn explorer() -> RunExplorer<MemoryRunStore> {
        let store = MemoryRunStore::new();
        store
            .insert(
                "evals/results/r1.json",
                &json!({
                    "evaluation_id": "r1",
                    "started_at": "2025-05-01T10:00:00",
                    "metadata": {
                        "eval_name": "capitals",
                        "test_config": {"test_function": "test_capitals"},
                        "test_results": {"passed": true}
                    },
                    "results": [{
                        "execution_context": {
                            "output": {"value": {"response": "Paris", "usage": {"input_tokens": 7}}}
                        },
                        "check_results": [{
                            "check_type": "contains",
                            "resolved_arguments": {"phrases": {"value": ["Paris"], "jsonpath": "$.r"}},
                            "results": {"passed": true, "found": ["Paris"]}
                        }]
                    }]
                }),
            )
            .unwrap();
        RunExplorer::new(store)
    }

    #[tokio::test]
    async fn test_list_text_and_json() {
        let explorer = explorer();
        let text = cmd_list(&explorer, OutputFormat::Text).await.unwrap();
        assert!(text.contains("`r1`"));

        let json: Value =
            serde_json::from_str(&cmd_list(&explorer, OutputFormat::Json).await.unwrap()).unwrap();
        assert_eq!(json[0]["evaluation_id"], "r1");
        assert_eq!(json[0]["total_input_tokens"], 7);
        assert!(json[0].get("results").is_none());
    }

    #[tokio::test]
    async fn test_show_json_carries_file_path() {
        let explorer = explorer();
        let out = cmd_show(&explorer, "r1", RenderOptions::default(), OutputFormat::Json)
            .await
            .unwrap();
        let json: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["file_path"], "evals/results/r1.json");
        assert_eq!(json["results"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_show_text_with_checks() {
        let explorer = explorer();
        let options = RenderOptions {
            show_checks: true,
            reveal_prompts: false,
        };
        let out = cmd_show(&explorer, "r1", options, OutputFormat::Text)
            .await
            .unwrap();
        assert!(out.starts_with("# capitals"));
        assert!(out.contains("- Phrases: Paris (from `$.r`)"));
    }

    #[tokio::test]
    async fn test_show_missing_run_is_an_error() {
        let explorer = explorer();
        let err = cmd_show(&explorer, "nope", RenderOptions::default(), OutputFormat::Text)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn test_annotate_then_show() {
        let explorer = explorer();
        let out = cmd_annotate(&explorer, "r1", "looks right", None)
            .await
            .unwrap();
        assert!(out.starts_with("Annotated r1"));

        let shown = cmd_show(&explorer, "r1", RenderOptions::default(), OutputFormat::Json)
            .await
            .unwrap();
        let json: Value = serde_json::from_str(&shown).unwrap();
        assert_eq!(json["metadata"]["annotation"], "looks right");
    }

    #[tokio::test]
    async fn test_annotate_rejects_bad_revision() {
        let explorer = explorer();
        let err = cmd_annotate(&explorer, "r1", "x", Some("abc".to_string()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("--if-revision"));
    }

    #[tokio::test]
    async fn test_annotate_with_stale_revision_conflicts() {
        let explorer = explorer();
        let stale = RevisionDigest::from_bytes(b"something else").to_string();
        let err = cmd_annotate(&explorer, "r1", "x", Some(stale))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("modified"));
    }

    #[test]
    fn test_check_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("check.json");
        std::fs::write(
            &path,
            r#"{"check_type": "equals", "resolved_arguments": {"expected": 4, "actual": 4}, "results": {"passed": true}}"#,
        )
        .unwrap();
        let out = cmd_check(&path, false, OutputFormat::Text).unwrap();
        assert!(out.contains("- Expected: 4"));

        let json: Value =
            serde_json::from_str(&cmd_check(&path, false, OutputFormat::Json).unwrap()).unwrap();
        assert_eq!(json["detail"]["kind"], "equals");
    }
}
