//! Check presentation resolver.
//!
//! Turns one raw check result into a [`PresentationModel`] whose shape
//! depends on the check type. Known types get structured fields; every other
//! type falls back to a raw dump of its results and arguments, so any check a
//! producer emits, now or later, can be shown.
//!
//! Resolved arguments may be bare values or `{value, jsonpath}` wrappers.
//! [`ResolvedField`] unwraps both shapes the same way for every check type.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{CheckType, CheckView, Field};

/// A displayed argument value and where it was extracted from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedField {
    pub value: Value,
    pub jsonpath: Option<String>,
}

impl ResolvedField {
    /// `None` when the argument is absent altogether.
    pub fn from_argument(argument: Field<'_>) -> Option<Self> {
        if !argument.is_present() {
            return None;
        }
        Some(Self {
            value: argument
                .resolved_value()
                .value()
                .cloned()
                .unwrap_or(Value::Null),
            jsonpath: argument.resolved_jsonpath().map(str::to_string),
        })
    }

    /// The value as a list of display strings (strings unquoted).
    pub fn as_list(&self) -> Vec<String> {
        match &self.value {
            Value::Array(items) => items.iter().map(scalar_text).collect(),
            other => vec![scalar_text(other)],
        }
    }
}

/// A boolean option of a check, shown only when the argument is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagDisplay {
    pub name: String,
    pub value: Value,
    pub default: bool,
    /// Whether the explicit value equals the default.
    pub is_default: bool,
}

/// Type-specific fields of a presented check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckDetail {
    ExactMatch {
        expected: Option<ResolvedField>,
        actual: Option<ResolvedField>,
    },
    Contains {
        phrases: Option<ResolvedField>,
        found: Option<Value>,
        text: Option<ResolvedField>,
    },
    Equals {
        expected: Option<ResolvedField>,
        actual: Option<ResolvedField>,
    },
    LlmJudge {
        reasoning: Option<String>,
        judge_model: Option<String>,
        judge_cost: Option<f64>,
        input_tokens: Option<i64>,
        output_tokens: Option<i64>,
        /// Long; renderers keep it collapsed until asked.
        prompt: Option<ResolvedField>,
    },
    Generic {
        results: Value,
        arguments: Value,
    },
}

/// Display-ready view of one check result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresentationModel {
    /// Tag as written by the producer.
    pub check_type: String,
    pub name: Option<String>,
    pub passed: Option<bool>,
    pub flags: Vec<FlagDisplay>,
    pub detail: CheckDetail,
}

struct FlagSpec {
    name: &'static str,
    default: bool,
}

const EXACT_MATCH_FLAGS: &[FlagSpec] = &[
    FlagSpec {
        name: "case_sensitive",
        default: true,
    },
    FlagSpec {
        name: "negate",
        default: false,
    },
];

const CONTAINS_FLAGS: &[FlagSpec] = &[
    FlagSpec {
        name: "case_sensitive",
        default: true,
    },
    FlagSpec {
        name: "match_all",
        default: true,
    },
    FlagSpec {
        name: "negate",
        default: false,
    },
];

const EQUALS_FLAGS: &[FlagSpec] = &[FlagSpec {
    name: "negate",
    default: false,
}];

fn present_flags(check: &CheckView<'_>, specs: &[FlagSpec]) -> Vec<FlagDisplay> {
    specs
        .iter()
        .filter_map(|flag| {
            let value = check.argument(flag.name).resolved_value().value()?.clone();
            Some(FlagDisplay {
                name: flag.name.to_string(),
                is_default: value == Value::Bool(flag.default),
                value,
                default: flag.default,
            })
        })
        .collect()
}

/// Present a raw check result. Total over any input shape.
pub fn present(check: &Value) -> PresentationModel {
    present_view(&CheckView::new(check))
}

pub fn present_view(check: &CheckView<'_>) -> PresentationModel {
    let (flags, detail) = match check.check_type() {
        CheckType::ExactMatch => (
            present_flags(check, EXACT_MATCH_FLAGS),
            CheckDetail::ExactMatch {
                expected: ResolvedField::from_argument(check.argument("expected")),
                actual: ResolvedField::from_argument(check.argument("actual")),
            },
        ),
        CheckType::Contains => (
            present_flags(check, CONTAINS_FLAGS),
            CheckDetail::Contains {
                phrases: ResolvedField::from_argument(check.argument("phrases")),
                found: check.results().get("found").value().cloned(),
                text: ResolvedField::from_argument(check.argument("text")),
            },
        ),
        CheckType::Equals => (
            present_flags(check, EQUALS_FLAGS),
            CheckDetail::Equals {
                expected: ResolvedField::from_argument(check.argument("expected")),
                actual: ResolvedField::from_argument(check.argument("actual")),
            },
        ),
        CheckType::LlmJudge => {
            let judge = check.judge_metadata();
            (
                Vec::new(),
                CheckDetail::LlmJudge {
                    reasoning: check.results().get("reasoning").as_str().map(str::to_string),
                    judge_model: judge.get("judge_model").as_str().map(str::to_string),
                    judge_cost: judge.get("total_cost").as_number(),
                    input_tokens: count(judge.get("input_tokens")),
                    output_tokens: count(judge.get("output_tokens")),
                    prompt: ResolvedField::from_argument(check.argument("prompt")),
                },
            )
        }
        CheckType::Other(_) => (
            Vec::new(),
            CheckDetail::Generic {
                results: results_without_passed(check.results()),
                arguments: check
                    .resolved_arguments()
                    .value()
                    .cloned()
                    .unwrap_or(Value::Null),
            },
        ),
    };

    PresentationModel {
        check_type: check.check_type_tag().to_string(),
        name: check.name().map(str::to_string),
        passed: check.passed(),
        flags,
        detail,
    }
}

fn count(field: Field<'_>) -> Option<i64> {
    field.as_number().map(|_| field.count_or_zero())
}

/// The results mapping minus `passed`, unless `passed` is all there is.
fn results_without_passed(results: Field<'_>) -> Value {
    match results.value() {
        Some(Value::Object(map)) if map.keys().any(|k| k != "passed") => Value::Object(
            map.iter()
                .filter(|(key, _)| key.as_str() != "passed")
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        ),
        Some(other) => other.clone(),
        None => Value::Null,
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
