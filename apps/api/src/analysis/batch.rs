//! Batch Orchestrator: scores every stored resume against one job description.
//!
//! Resumes are processed one at a time. A failed model call (or schema
//! mismatch) for one resume becomes an `error` entry for that resume and the
//! batch moves on. Only successful analyses are written to the store, but every
//! attempt appears in the returned ranking.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::analyze_resume;
use crate::analysis::interpreter::SchemaPolicy;
use crate::db::Store;
use crate::errors::AppError;
use crate::llm_client::CompletionClient;
use crate::models::job_description::JobDescriptionRow;
use crate::models::resume::ResumeText;

pub const DEFAULT_COMPANY_NAME: &str = "Unknown";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchRequest {
    /// Reuse a stored job description instead of creating one.
    pub jd_id: Option<Uuid>,
    pub jd_text: Option<String>,
    pub company_name: Option<String>,
}

/// One resume's outcome. Exactly one of `analysis` / `error` is set.
#[derive(Debug, Clone, Serialize)]
pub struct BatchItem {
    pub resume_id: Uuid,
    pub identifier: String,
    pub overall_score: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Model text as returned, persisted alongside the score.
    #[serde(skip)]
    raw_response: Option<String>,
}

impl BatchItem {
    fn failed(resume: ResumeText, error: String) -> Self {
        Self {
            resume_id: resume.id,
            identifier: resume.identifier,
            overall_score: 0,
            analysis: None,
            error: Some(error),
            raw_response: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BatchOutcome {
    pub jd_id: Uuid,
    pub total_analyzed: usize,
    pub results: Vec<BatchItem>,
}

pub async fn run_batch(
    store: &Store,
    llm: &dyn CompletionClient,
    policy: SchemaPolicy,
    request: BatchRequest,
) -> Result<BatchOutcome, AppError> {
    if store.count_resumes().await? == 0 {
        return Err(AppError::NoResumes);
    }

    let jd = resolve_job_description(store, request).await?;
    let resumes = store.load_resume_texts().await?;
    info!(
        "Analyzing {} resume(s) against job description {} ({})",
        resumes.len(),
        jd.id,
        jd.company_name
    );

    let mut results = Vec::with_capacity(resumes.len());
    for resume in resumes {
        let item = match analyze_resume(llm, policy, &jd.jd_text, &resume.parsed_text).await {
            Ok((completion, interpretation)) => {
                info!(
                    "Resume '{}' scored {}",
                    resume.identifier, interpretation.overall_score
                );
                BatchItem {
                    resume_id: resume.id,
                    identifier: resume.identifier,
                    overall_score: interpretation.overall_score,
                    analysis: Some(interpretation.value),
                    error: None,
                    raw_response: Some(completion.content),
                }
            }
            Err(e) => {
                warn!("Analysis failed for resume '{}': {e}", resume.identifier);
                BatchItem::failed(resume, e.to_string())
            }
        };
        results.push(item);
    }

    rank(&mut results);

    for item in &results {
        if let Some(raw) = item.raw_response.as_deref() {
            store
                .insert_analysis(item.resume_id, jd.id, raw, item.overall_score)
                .await?;
        }
    }

    let failed = results.iter().filter(|r| r.error.is_some()).count();
    info!(
        "Batch for job description {} done: {} analyzed, {} failed",
        jd.id,
        results.len(),
        failed
    );

    Ok(BatchOutcome {
        jd_id: jd.id,
        total_analyzed: results.len(),
        results,
    })
}

/// Uses the stored row when `jd_id` is given, else creates one from `jd_text`.
async fn resolve_job_description(
    store: &Store,
    request: BatchRequest,
) -> Result<JobDescriptionRow, AppError> {
    if let Some(id) = request.jd_id {
        return store
            .get_job_description(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Job description {id} not found")));
    }

    let jd_text = request
        .jd_text
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::Validation("jd_text cannot be empty".to_string()))?;
    let company_name = request
        .company_name
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_COMPANY_NAME.to_string());

    store.insert_job_description(&company_name, &jd_text).await
}

/// Best score first. `sort_by` is stable, so ties keep enumeration order.
fn rank(results: &mut [BatchItem]) {
    results.sort_by(|a, b| b.overall_score.cmp(&a.overall_score));
}
