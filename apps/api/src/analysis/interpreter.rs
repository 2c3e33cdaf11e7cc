//! Response Interpreter: turns raw model text into a JSON analysis value and score.
//!
//! Parsing is best-effort: text that is not JSON becomes a fallback object that
//! keeps the original text under `raw` with an overall score of 0. Whether a
//! syntactically valid document must also match the report contract is decided
//! by `SchemaPolicy`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::warn;

use crate::analysis::prompts::CATEGORY_WEIGHTS;

/// Key holding unparsed model output in the fallback object.
pub const RAW_KEY: &str = "raw";
/// Key holding the overall score in both real reports and the fallback.
pub const OVERALL_SCORE_KEY: &str = "Overall Score";
/// How far a reported overall score may drift from the weighted category sum
/// before it is logged.
const WEIGHTED_SCORE_TOLERANCE: u32 = 5;

/// Whether parsed model output is checked against the report contract.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SchemaPolicy {
    /// Reject valid JSON that does not match `ScoreReport`.
    #[default]
    Strict,
    /// Trust any valid JSON the model returns.
    Lenient,
}

impl FromStr for SchemaPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(SchemaPolicy::Strict),
            "lenient" => Ok(SchemaPolicy::Lenient),
            other => Err(format!("expected 'strict' or 'lenient', got '{other}'")),
        }
    }
}

impl fmt::Display for SchemaPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaPolicy::Strict => f.write_str("strict"),
            SchemaPolicy::Lenient => f.write_str("lenient"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SchemaMismatch {
    #[error("report does not match the expected structure: {0}")]
    Structure(#[from] serde_json::Error),

    #[error("{field} score {score} is outside 0..=100")]
    ScoreOutOfRange { field: String, score: u32 },

    #[error("{0} has an empty ImprovementPlan")]
    EmptyImprovementPlan(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "Strong Candidate")]
    StrongCandidate,
    #[serde(rename = "Good Candidate")]
    GoodCandidate,
    Mixed,
    Weak,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImprovementItem {
    pub issue: String,
    pub change_from: String,
    pub change_to: String,
    pub expected_gain: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryAssessment<E> {
    pub score: u32,
    pub reason: String,
    pub evidence: E,
    #[serde(rename = "ImprovementPlan")]
    pub improvement_plan: Vec<ImprovementItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeywordEvidence {
    pub present_keywords: Vec<String>,
    pub missing_critical_keywords: Vec<String>,
}

/// The full report contract the scoring prompt asks the model for.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScoreReport {
    #[serde(rename = "Skill Match")]
    pub skill_match: CategoryAssessment<Vec<String>>,
    #[serde(rename = "Experience Relevance")]
    pub experience_relevance: CategoryAssessment<Vec<String>>,
    #[serde(rename = "Keyword Match")]
    pub keyword_match: CategoryAssessment<KeywordEvidence>,
    #[serde(rename = "ATS Friendliness")]
    pub ats_friendliness: CategoryAssessment<Vec<String>>,
    #[serde(rename = "Achievements Impact")]
    pub achievements_impact: CategoryAssessment<Vec<String>>,
    #[serde(rename = "Cultural & Role Fit")]
    pub cultural_role_fit: CategoryAssessment<Vec<String>>,
    #[serde(rename = "Contradictions")]
    pub contradictions: Vec<String>,
    #[serde(rename = "Overall Score")]
    pub overall_score: u32,
    #[serde(rename = "Verdict")]
    pub verdict: Verdict,
    #[serde(rename = "GlobalSuggestions")]
    pub global_suggestions: Vec<String>,
}

impl ScoreReport {
    /// Category scores combined with `CATEGORY_WEIGHTS`, rounded to the nearest integer.
    pub fn weighted_score(&self) -> u32 {
        let categories = self.categories();
        let total: u32 = CATEGORY_WEIGHTS
            .iter()
            .filter_map(|(name, weight)| {
                categories
                    .iter()
                    .find(|(category, _, _)| category == name)
                    .map(|(_, score, _)| score * weight)
            })
            .sum();
        (total + 50) / 100
    }

    /// (category name, score, improvement items) for each of the six categories.
    fn categories(&self) -> [(&'static str, u32, usize); 6] {
        [
            ("Skill Match", self.skill_match.score, self.skill_match.improvement_plan.len()),
            (
                "Experience Relevance",
                self.experience_relevance.score,
                self.experience_relevance.improvement_plan.len(),
            ),
            ("Keyword Match", self.keyword_match.score, self.keyword_match.improvement_plan.len()),
            (
                "ATS Friendliness",
                self.ats_friendliness.score,
                self.ats_friendliness.improvement_plan.len(),
            ),
            (
                "Achievements Impact",
                self.achievements_impact.score,
                self.achievements_impact.improvement_plan.len(),
            ),
            (
                "Cultural & Role Fit",
                self.cultural_role_fit.score,
                self.cultural_role_fit.improvement_plan.len(),
            ),
        ]
    }
}

/// Checks a parsed document against the report contract.
pub fn validate_report(value: &Value) -> Result<ScoreReport, SchemaMismatch> {
    let report = ScoreReport::deserialize(value)?;

    for (category, score, plan_items) in report.categories() {
        if score > 100 {
            return Err(SchemaMismatch::ScoreOutOfRange {
                field: category.to_string(),
                score,
            });
        }
        if plan_items == 0 {
            return Err(SchemaMismatch::EmptyImprovementPlan(category.to_string()));
        }
    }
    if report.overall_score > 100 {
        return Err(SchemaMismatch::ScoreOutOfRange {
            field: OVERALL_SCORE_KEY.to_string(),
            score: report.overall_score,
        });
    }

    // The reported score is kept as-is; a large drift is only worth a log line.
    let weighted = report.weighted_score();
    if report.overall_score.abs_diff(weighted) > WEIGHTED_SCORE_TOLERANCE {
        warn!(
            "Reported overall score {} differs from weighted category sum {weighted}",
            report.overall_score
        );
    }

    Ok(report)
}

/// Result of interpreting one model response.
#[derive(Debug, Clone, PartialEq)]
pub struct Interpretation {
    /// The parsed document, or the fallback object.
    pub value: Value,
    /// Overall score in 0..=100; 0 when absent or unparsed.
    pub overall_score: i64,
    /// Whether the text was valid JSON.
    pub parsed: bool,
}

impl Interpretation {
    /// Applies `policy` to a parsed document. Fallback objects always pass.
    pub fn enforce(self, policy: SchemaPolicy) -> Result<Self, SchemaMismatch> {
        if self.parsed && policy == SchemaPolicy::Strict {
            validate_report(&self.value)?;
        }
        Ok(self)
    }
}

/// Interprets raw model text. Never fails.
pub fn interpret(raw: &str) -> Interpretation {
    match serde_json::from_str::<Value>(strip_json_fences(raw)) {
        Ok(value) => {
            let overall_score = extract_overall_score(&value);
            Interpretation {
                value,
                overall_score,
                parsed: true,
            }
        }
        Err(_) => Interpretation {
            value: fallback(raw),
            overall_score: 0,
            parsed: false,
        },
    }
}

fn fallback(raw: &str) -> Value {
    json!({ (RAW_KEY): raw, (OVERALL_SCORE_KEY): 0 })
}

/// Reads `Overall Score` as an integer, rounding floats and parsing numeric strings.
fn extract_overall_score(value: &Value) -> i64 {
    let score = match value.get(OVERALL_SCORE_KEY) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok().map(|f| f.round() as i64),
        _ => None,
    };
    score.unwrap_or(0).clamp(0, 100)
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A report that satisfies the full contract.
    pub(crate) fn sample_report(overall: u32) -> Value {
        let category = |name: &str| {
            json!({
                "score": overall,
                "reason": "Solid overlap.",
                "evidence": ["\"Rust\""],
                "ImprovementPlan": [{
                    "issue": "Thin metrics",
                    "change_from": "Worked on services",
                    "change_to": "Cut p99 latency 40% on 3 services",
                    "expected_gain": format!("Likely +5 to {name}")
                }]
            })
        };
        json!({
            "Skill Match": category("Skill Match"),
            "Experience Relevance": category("Experience Relevance"),
            "Keyword Match": {
                "score": overall,
                "reason": "Most terms present.",
                "evidence": {
                    "present_keywords": ["Rust"],
                    "missing_critical_keywords": ["Kafka"]
                },
                "ImprovementPlan": [{
                    "issue": "Missing critical keyword(s).",
                    "change_from": "No direct evidence found.",
                    "change_to": "Add: 'Kafka'",
                    "expected_gain": "Likely +4 to Keyword Match"
                }]
            },
            "ATS Friendliness": category("ATS Friendliness"),
            "Achievements Impact": category("Achievements Impact"),
            "Cultural & Role Fit": category("Cultural & Role Fit"),
            "Contradictions": [],
            "Overall Score": overall,
            "Verdict": "Good Candidate",
            "GlobalSuggestions": ["Quantify outcomes"]
        })
    }

    #[test]
    fn test_valid_json_is_returned_unchanged() {
        let report = sample_report(72);
        let raw = serde_json::to_string(&report).unwrap();
        let interpretation = interpret(&raw);
        assert!(interpretation.parsed);
        assert_eq!(interpretation.value, report);
        assert_eq!(interpretation.overall_score, 72);
    }

    #[test]
    fn test_non_json_yields_fallback_with_raw_text() {
        let raw = "Sorry, I cannot evaluate this resume.";
        let interpretation = interpret(raw);
        assert!(!interpretation.parsed);
        assert_eq!(interpretation.overall_score, 0);
        assert_eq!(interpretation.value[RAW_KEY], raw);
        assert_eq!(interpretation.value[OVERALL_SCORE_KEY], 0);
    }

    #[test]
    fn test_fallback_preserves_fenced_text_verbatim() {
        let raw = "```json\n{not json\n```";
        let interpretation = interpret(raw);
        assert_eq!(interpretation.value[RAW_KEY], raw);
    }

    #[test]
    fn test_fenced_json_is_parsed() {
        let raw = "```json\n{\"Overall Score\": 64}\n```";
        let interpretation = interpret(raw);
        assert!(interpretation.parsed);
        assert_eq!(interpretation.overall_score, 64);
    }

    #[test]
    fn test_overall_score_coercions() {
        assert_eq!(interpret(r#"{"Overall Score": 70.6}"#).overall_score, 71);
        assert_eq!(interpret(r#"{"Overall Score": "55"}"#).overall_score, 55);
        assert_eq!(interpret(r#"{"Overall Score": 140}"#).overall_score, 100);
        assert_eq!(interpret(r#"{"Overall Score": -3}"#).overall_score, 0);
        assert_eq!(interpret(r#"{"Verdict": "Weak"}"#).overall_score, 0);
    }

    #[test]
    fn test_lenient_policy_accepts_incomplete_document() {
        let interpretation = interpret(r#"{"Overall Score": 80}"#);
        let enforced = interpretation.clone().enforce(SchemaPolicy::Lenient).unwrap();
        assert_eq!(enforced, interpretation);
    }

    #[test]
    fn test_strict_policy_rejects_incomplete_document() {
        let result = interpret(r#"{"Overall Score": 80}"#).enforce(SchemaPolicy::Strict);
        assert!(matches!(result, Err(SchemaMismatch::Structure(_))));
    }

    #[test]
    fn test_strict_policy_passes_fallback_through() {
        let enforced = interpret("plain text").enforce(SchemaPolicy::Strict).unwrap();
        assert!(!enforced.parsed);
    }

    #[test]
    fn test_validate_accepts_full_report() {
        let report = validate_report(&sample_report(88)).unwrap();
        assert_eq!(report.verdict, Verdict::GoodCandidate);
        assert_eq!(report.keyword_match.evidence.missing_critical_keywords, vec!["Kafka"]);
    }

    #[test]
    fn test_weighted_score_uses_category_weights() {
        let mut report = sample_report(50);
        report["Skill Match"]["score"] = json!(90);
        report["Keyword Match"]["score"] = json!(71);
        // 90*25 + 50*20 + 71*15 + 50*10 + 50*20 + 50*10 = 6315 -> 63
        let parsed = validate_report(&report).unwrap();
        assert_eq!(parsed.weighted_score(), 63);
        assert_eq!(validate_report(&sample_report(80)).unwrap().weighted_score(), 80);
    }

    #[test]
    fn test_drifting_overall_score_is_still_accepted() {
        let mut report = sample_report(40);
        report["Overall Score"] = json!(95);
        let parsed = validate_report(&report).unwrap();
        assert_eq!(parsed.overall_score, 95);
        assert_eq!(parsed.weighted_score(), 40);
    }

    #[test]
    fn test_validate_rejects_unknown_top_level_key() {
        let mut report = sample_report(50);
        report["Notes"] = json!("extra");
        assert!(validate_report(&report).is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_verdict() {
        let mut report = sample_report(50);
        report["Verdict"] = json!("Maybe");
        assert!(validate_report(&report).is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range_category() {
        let mut report = sample_report(50);
        report["ATS Friendliness"]["score"] = json!(130);
        assert!(matches!(
            validate_report(&report),
            Err(SchemaMismatch::ScoreOutOfRange { field, score: 130 }) if field == "ATS Friendliness"
        ));
    }

    #[test]
    fn test_validate_rejects_empty_improvement_plan() {
        let mut report = sample_report(50);
        report["Skill Match"]["ImprovementPlan"] = json!([]);
        assert!(matches!(
            validate_report(&report),
            Err(SchemaMismatch::EmptyImprovementPlan(c)) if c == "Skill Match"
        ));
    }

    #[test]
    fn test_schema_policy_parses_case_insensitively() {
        assert_eq!("STRICT".parse::<SchemaPolicy>().unwrap(), SchemaPolicy::Strict);
        assert!("loose".parse::<SchemaPolicy>().is_err());
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }
}
