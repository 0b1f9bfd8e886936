//! Run record model.
//!
//! Borrowed views over a raw run document. The document itself stays a
//! `serde_json::Value` so that unknown fields survive a rewrite untouched;
//! these views only describe where things live.
//!
//! ```text
//! run
//! ├── evaluation_id, started_at, completed_at
//! ├── metadata { test_config, test_results, annotation, model_name, ... }
//! └── results[]                         (samples)
//!     ├── execution_context
//!     │   ├── test_case { id, input, expected }
//!     │   └── output { value { usage, response, ... }, metadata { duration_seconds } }
//!     └── check_results[]
//!         { check_type, resolved_arguments, results { passed, ... } }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::access::Field;

/// Metadata sections a run needs before it can be displayed.
pub const REQUIRED_METADATA: [&str; 2] = ["test_config", "test_results"];

/// View over a whole run document.
#[derive(Debug, Clone, Copy)]
pub struct RunView<'a> {
    doc: &'a Value,
}

impl<'a> RunView<'a> {
    pub fn new(doc: &'a Value) -> Self {
        Self { doc }
    }

    pub fn root(&self) -> Field<'a> {
        Field::of(self.doc)
    }

    pub fn evaluation_id(&self) -> Option<&'a str> {
        self.root().get("evaluation_id").as_str()
    }

    pub fn started_at(&self) -> Option<&'a str> {
        self.root().get("started_at").as_str()
    }

    pub fn completed_at(&self) -> Option<&'a str> {
        self.root().get("completed_at").as_str()
    }

    pub fn metadata(&self) -> Field<'a> {
        self.root().get("metadata")
    }

    pub fn test_config(&self) -> Field<'a> {
        self.metadata().get("test_config")
    }

    pub fn test_results(&self) -> Field<'a> {
        self.metadata().get("test_results")
    }

    pub fn annotation(&self) -> Option<&'a str> {
        self.metadata().get("annotation").as_str()
    }

    /// Required metadata sections that are missing.
    pub fn missing_required(&self) -> Vec<&'static str> {
        REQUIRED_METADATA
            .iter()
            .copied()
            .filter(|key| !self.metadata().get(key).is_present())
            .collect()
    }

    /// A run is displayable once `test_config` and `test_results` exist.
    pub fn is_displayable(&self) -> bool {
        self.missing_required().is_empty()
    }

    pub fn samples(&self) -> impl Iterator<Item = SampleView<'a>> + 'a {
        self.root().get("results").items().iter().map(SampleView::new)
    }

    pub fn sample_count(&self) -> usize {
        self.root().get("results").items().len()
    }
}

/// View over one sample (one agent execution for one test case repetition).
#[derive(Debug, Clone, Copy)]
pub struct SampleView<'a> {
    value: &'a Value,
}

impl<'a> SampleView<'a> {
    pub fn new(value: &'a Value) -> Self {
        Self { value }
    }

    fn root(&self) -> Field<'a> {
        Field::of(self.value)
    }

    /// The agent's structured output.
    pub fn output_value(&self) -> Field<'a> {
        self.root().path(&["execution_context", "output", "value"])
    }

    /// Agent usage block (`input_tokens`, `output_tokens`, `total_cost`).
    pub fn usage(&self) -> Field<'a> {
        self.output_value().get("usage")
    }

    pub fn duration_seconds(&self) -> f64 {
        self.root()
            .path(&["execution_context", "output", "metadata", "duration_seconds"])
            .number_or_zero()
    }

    pub fn test_case(&self) -> Field<'a> {
        self.root().path(&["execution_context", "test_case"])
    }

    pub fn test_case_id(&self) -> Option<&'a str> {
        self.test_case().get("id").as_str()
    }

    pub fn status(&self) -> Option<&'a str> {
        self.root().get("status").as_str()
    }

    pub fn checks(&self) -> impl Iterator<Item = CheckView<'a>> + 'a {
        self.root().get("check_results").items().iter().map(CheckView::new)
    }

    /// A sample passes when every check reports `passed == true`.
    /// A sample without checks passes vacuously.
    pub fn passed(&self) -> bool {
        self.checks().all(|check| check.passed() == Some(true))
    }
}

/// View over one check result.
#[derive(Debug, Clone, Copy)]
pub struct CheckView<'a> {
    value: &'a Value,
}

impl<'a> CheckView<'a> {
    pub fn new(value: &'a Value) -> Self {
        Self { value }
    }

    fn root(&self) -> Field<'a> {
        Field::of(self.value)
    }

    /// Check type exactly as the producer wrote it.
    pub fn check_type_tag(&self) -> &'a str {
        self.root().get("check_type").as_str().unwrap_or("")
    }

    pub fn check_type(&self) -> CheckType {
        CheckType::parse(self.check_type_tag())
    }

    pub fn resolved_arguments(&self) -> Field<'a> {
        self.root().get("resolved_arguments")
    }

    pub fn argument(&self, name: &str) -> Field<'a> {
        self.resolved_arguments().get(name)
    }

    pub fn results(&self) -> Field<'a> {
        self.root().get("results")
    }

    pub fn passed(&self) -> Option<bool> {
        self.results().get("passed").as_bool()
    }

    pub fn judge_metadata(&self) -> Field<'a> {
        self.results().get("judge_metadata")
    }

    /// Optional human name from check metadata.
    pub fn name(&self) -> Option<&'a str> {
        self.root().path(&["metadata", "name"]).as_str()
    }
}

/// Known check types. Anything else is carried verbatim in `Other`.
///
/// Tags compare with `-` and `_` treated as the same character and ignoring
/// ASCII case, so `llm_judge` and `llm-judge` are one type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckType {
    ExactMatch,
    Contains,
    Equals,
    LlmJudge,
    Other(String),
}

impl CheckType {
    pub fn parse(tag: &str) -> Self {
        let normalized = tag.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "exact-match" => Self::ExactMatch,
            "contains" => Self::Contains,
            "equals" => Self::Equals,
            "llm-judge" => Self::LlmJudge,
            _ => Self::Other(tag.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::ExactMatch => "exact-match",
            Self::Contains => "contains",
            Self::Equals => "equals",
            Self::LlmJudge => "llm-judge",
            Self::Other(tag) => tag,
        }
    }
}

impl From<&str> for CheckType {
    fn from(tag: &str) -> Self {
        Self::parse(tag)
    }
}

impl std::fmt::Display for CheckType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn check_type_normalizes_separators() {
        assert_eq!(CheckType::parse("llm_judge"), CheckType::LlmJudge);
        assert_eq!(CheckType::parse("llm-judge"), CheckType::LlmJudge);
        assert_eq!(CheckType::parse("exact_match"), CheckType::ExactMatch);
        assert_eq!(CheckType::parse("Contains"), CheckType::Contains);
        assert_eq!(
            CheckType::parse("semantic_similarity"),
            CheckType::Other("semantic_similarity".to_string())
        );
    }

    #[test]
    fn run_without_required_metadata_is_not_displayable() {
        let doc = json!({"metadata": {"test_config": {}}});
        let run = RunView::new(&doc);
        assert!(!run.is_displayable());
        assert_eq!(run.missing_required(), vec!["test_results"]);
    }

    #[test]
    fn samples_of_missing_results_is_empty() {
        let doc = json!({"evaluation_id": "x"});
        let run = RunView::new(&doc);
        assert_eq!(run.samples().count(), 0);
        assert_eq!(run.sample_count(), 0);
    }

    #[test]
    fn sample_passed_requires_every_check() {
        let doc = json!({
            "check_results": [
                {"results": {"passed": true}},
                {"results": {"passed": false}}
            ]
        });
        assert!(!SampleView::new(&doc).passed());

        let no_checks = json!({});
        assert!(SampleView::new(&no_checks).passed());
    }

    #[test]
    fn sample_reads_nested_usage_and_duration() {
        let doc = json!({
            "execution_context": {
                "test_case": {"id": "tc-1"},
                "output": {
                    "value": {"usage": {"input_tokens": 5}},
                    "metadata": {"duration_seconds": 1.5}
                }
            }
        });
        let sample = SampleView::new(&doc);
        assert_eq!(sample.usage().get("input_tokens").count_or_zero(), 5);
        assert_eq!(sample.duration_seconds(), 1.5);
        assert_eq!(sample.test_case_id(), Some("tc-1"));
    }
}
