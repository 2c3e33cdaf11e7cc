// Prompt template for resume-vs-JD scoring.
// The report keys named here are the same keys `interpreter::ScoreReport` checks.

/// Scoring categories and their weight (percent) in the overall score.
pub const CATEGORY_WEIGHTS: [(&str, u32); 6] = [
    ("Skill Match", 25),
    ("Experience Relevance", 20),
    ("Keyword Match", 15),
    ("ATS Friendliness", 10),
    ("Achievements Impact", 20),
    ("Cultural & Role Fit", 10),
];

const PREAMBLE: &str = "\
System:
You are a strict applicant-tracking system and technical recruiter. Stay factual and terse, \
and ground every statement in the two texts below. Never invent details. \
Respond with a single JSON object: no commentary, no markdown.

Task:
Evaluate ONE resume against ONE job description. Score each category from 0 to 100 and err \
on the conservative side. Every claim needs direct evidence from the job description or the \
resume. When none exists, write \"No direct evidence found\" and lower the score.

Job Description:
";

const BETWEEN: &str = "\n\nResume:\n";

const RUBRIC: &str = r#"

Category definitions:
- Skill Match: overlap of technical and soft skills with the job description. Missing critical skills lower the score.
- Experience Relevance: how well prior roles and projects line up with the responsibilities and domain.
- Keyword Match: critical job-description terms present in the resume verbatim or as clear synonyms.
- ATS Friendliness: headings, bullet structure, consistent formatting, extractable skills, clarity.
- Achievements Impact: concrete metrics, outcomes, scope and ownership. Vague claims score lower.
- Cultural & Role Fit: collaboration, leadership, product mindset, domain context, communication.

Evidence rules:
- Evidence entries are short exact quotes from the job description or the resume.
- Before listing a keyword as missing, search the resume text for it case-insensitively. If it is present it is not missing.
- If a term flagged as missing does appear, record the mistake under "Contradictions" and lower that category by 3.

Improvement plan:
- Every category carries at least one ImprovementPlan item with:
  - issue: plain description of the gap
  - change_from: current resume wording, or "No direct evidence found"
  - change_to: a resume-ready sentence or bullet to add or revise
  - expected_gain: e.g. "Likely +7 to Skill Match"; typically 3 to 12, never pushing a category above 100

Output format (strict JSON, exactly these keys, no trailing commas):
{
  "Skill Match": {
    "score": 0,
    "reason": "2-3 concise sentences.",
    "evidence": ["short quotes, or 'No direct evidence found'"],
    "ImprovementPlan": [
      {"issue": "...", "change_from": "...", "change_to": "...", "expected_gain": "Likely +X to Skill Match"}
    ]
  },
  "Experience Relevance": {
    "score": 0,
    "reason": "2-3 concise sentences.",
    "evidence": ["..."],
    "ImprovementPlan": [
      {"issue": "...", "change_from": "...", "change_to": "...", "expected_gain": "Likely +X to Experience Relevance"}
    ]
  },
  "Keyword Match": {
    "score": 0,
    "reason": "2-3 concise sentences.",
    "evidence": {
      "present_keywords": ["resume words or phrases matching the job description"],
      "missing_critical_keywords": ["job-description terms absent from the resume"]
    },
    "ImprovementPlan": [
      {"issue": "Missing critical keyword(s).", "change_from": "No direct evidence found.", "change_to": "Add: '...' using the exact term naturally.", "expected_gain": "Likely +X to Keyword Match"}
    ]
  },
  "ATS Friendliness": {
    "score": 0,
    "reason": "2-3 concise sentences.",
    "evidence": ["heading, bullet or format cues"],
    "ImprovementPlan": [
      {"issue": "...", "change_from": "...", "change_to": "...", "expected_gain": "Likely +X to ATS Friendliness"}
    ]
  },
  "Achievements Impact": {
    "score": 0,
    "reason": "2-3 concise sentences.",
    "evidence": ["metrics, or 'No direct evidence found'"],
    "ImprovementPlan": [
      {"issue": "Lacks quantifiable outcomes.", "change_from": "...", "change_to": "Cut page load time from 4.2s to 2.1s across the checkout flow in one quarter.", "expected_gain": "Likely +X to Achievements Impact"}
    ]
  },
  "Cultural & Role Fit": {
    "score": 0,
    "reason": "2-3 concise sentences.",
    "evidence": ["leadership, collaboration or domain quotes, or 'No direct evidence found'"],
    "ImprovementPlan": [
      {"issue": "Needs stronger cross-functional detail.", "change_from": "...", "change_to": "Ran weekly design reviews with 4 backend engineers and 2 designers.", "expected_gain": "Likely +X to Cultural & Role Fit"}
    ]
  },
  "Contradictions": ["only mistaken 'missing' flags or conflicting claims; otherwise an empty array"],
  "Overall Score": 0,
  "Verdict": "Strong Candidate" | "Good Candidate" | "Mixed" | "Weak",
  "GlobalSuggestions": ["3-6 prioritized, high-leverage changes that would raise the Overall Score fastest"]
}

Validation rules:
- JSON only. No markdown, no prose outside the object.
- Every top-level key above is present, spelled exactly as shown.
- Every ImprovementPlan item has issue, change_from, change_to and expected_gain.
- Scores are integers from 0 to 100. Overall Score is the weighted sum of the category scores, rounded to the nearest integer.
- expected_gain values stay realistic and never push a category above 100.

Produce the JSON object now. If any required field would be missing or malformed, fix it before answering.
"#;

/// Builds the scoring prompt for one resume against one job description.
///
/// Both texts are embedded verbatim between delimiter markers. The template is
/// assembled by concatenation, so placeholder-looking input is never expanded.
pub fn build_analysis_prompt(jd_text: &str, resume_text: &str) -> String {
    let mut weights = String::from("\n\nScoring weights (for Overall Score):\n");
    for (category, weight) in CATEGORY_WEIGHTS {
        weights.push_str(&format!("- {category}: {weight}%\n"));
    }

    let mut prompt = String::with_capacity(
        PREAMBLE.len() + BETWEEN.len() + RUBRIC.len() + weights.len() + jd_text.len() + resume_text.len() + 96,
    );
    prompt.push_str(PREAMBLE);
    prompt.push_str("<<<JD_START\n");
    prompt.push_str(jd_text);
    prompt.push_str("\nJD_END>>>");
    prompt.push_str(BETWEEN);
    prompt.push_str("<<<RESUME_START\n");
    prompt.push_str(resume_text);
    prompt.push_str("\nRESUME_END>>>");
    prompt.push_str(&weights);
    prompt.push_str(RUBRIC);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_sum_to_one_hundred() {
        let total: u32 = CATEGORY_WEIGHTS.iter().map(|(_, w)| w).sum();
        assert_eq!(total, 100);
    }

    #[test]
    fn test_inputs_are_embedded_between_markers() {
        let prompt = build_analysis_prompt("Senior Rust Engineer", "Built a tokio service");
        assert!(prompt.contains("<<<JD_START\nSenior Rust Engineer\nJD_END>>>"));
        assert!(prompt.contains("<<<RESUME_START\nBuilt a tokio service\nRESUME_END>>>"));
        let jd_at = prompt.find("JD_START").unwrap();
        let resume_at = prompt.find("RESUME_START").unwrap();
        assert!(jd_at < resume_at);
    }

    #[test]
    fn test_every_category_and_verdict_is_listed() {
        let prompt = build_analysis_prompt("jd", "resume");
        for (category, weight) in CATEGORY_WEIGHTS {
            assert!(prompt.contains(&format!("- {category}: {weight}%")));
            assert!(prompt.contains(&format!("\"{category}\": {{")));
        }
        for verdict in ["Strong Candidate", "Good Candidate", "Mixed", "Weak"] {
            assert!(prompt.contains(verdict));
        }
        assert!(prompt.contains("\"Overall Score\""));
        assert!(prompt.contains("case-insensitively"));
    }

    #[test]
    fn test_placeholder_like_input_is_kept_verbatim() {
        let jd = "Role: {resume_text} and RESUME_START";
        let prompt = build_analysis_prompt(jd, "actual resume");
        assert!(prompt.contains(jd));
        assert_eq!(prompt.matches("actual resume").count(), 1);
    }

    #[test]
    fn test_prompt_is_deterministic() {
        assert_eq!(
            build_analysis_prompt("a", "b"),
            build_analysis_prompt("a", "b")
        );
    }
}
