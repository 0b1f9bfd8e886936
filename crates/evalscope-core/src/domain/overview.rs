//! Display projection of a run header.
//!
//! Optional fields degrade to [`PLACEHOLDER`]; nothing here can fail.

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::access::Field;
use super::record::RunView;

/// Shown wherever an optional value is missing.
pub const PLACEHOLDER: &str = "unknown";

/// Header fields of a run, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOverview {
    pub evaluation_id: String,
    pub eval_name: String,
    pub eval_description: String,
    pub model_name: String,
    pub model_provider: String,
    pub temperature: String,
    pub test_function: String,
    pub num_test_cases: String,
    pub samples_per_case: String,
    pub passed: Option<bool>,
    pub success_rate: Option<f64>,
    pub success_threshold: Option<f64>,
    pub passed_samples: Option<i64>,
    pub total_samples: Option<i64>,
    pub started_at: String,
    pub completed_at: String,
    /// Wall-clock seconds between `started_at` and `completed_at`.
    pub duration_seconds: Option<f64>,
    pub annotation: Option<String>,
}

impl RunOverview {
    pub fn from_run(run: &RunView<'_>) -> Self {
        let metadata = run.metadata();
        let config = run.test_config();
        let results = run.test_results();
        let first_output = run.samples().next().map(|s| s.output_value());

        let temperature = match metadata.get("temperature") {
            Field::Absent => first_output.map_or(Field::Absent, |o| o.get("temperature")),
            present => present,
        };

        Self {
            evaluation_id: display(run.root().get("evaluation_id")),
            eval_name: display(metadata.get("eval_name")),
            eval_description: display(metadata.get("eval_description")),
            model_name: display(metadata.get("model_name")),
            model_provider: display(metadata.get("model_provider")),
            temperature: display(temperature),
            test_function: display(config.get("test_function")),
            num_test_cases: display(config.get("num_test_cases")),
            samples_per_case: display(config.get("samples")),
            passed: results.get("passed").as_bool(),
            success_rate: results.get("success_rate").as_number(),
            success_threshold: results.get("success_threshold").as_number(),
            passed_samples: results
                .get("passed_samples")
                .as_number()
                .map(|n| n as i64),
            total_samples: results.get("total_samples").as_number().map(|n| n as i64),
            started_at: display(run.root().get("started_at")),
            completed_at: display(run.root().get("completed_at")),
            duration_seconds: wall_clock_seconds(run.started_at(), run.completed_at()),
            annotation: run.annotation().map(str::to_string),
        }
    }
}

/// Render a scalar for display; absent values become the placeholder.
pub fn display(field: Field<'_>) -> String {
    match field.value() {
        None => PLACEHOLDER.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.naive_utc())
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
}

fn wall_clock_seconds(started: Option<&str>, completed: Option<&str>) -> Option<f64> {
    let started = parse_timestamp(started?)?;
    let completed = parse_timestamp(completed?)?;
    let millis = (completed - started).num_milliseconds();
    Some(millis as f64 / 1000.0)
}
