//! Axum route handlers for job descriptions and analysis.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::analysis::analyze_resume;
use crate::analysis::batch::{run_batch, BatchOutcome, BatchRequest, DEFAULT_COMPANY_NAME};
use crate::analysis::interpreter::interpret;
use crate::errors::AppError;
use crate::resumes::extract::{extract_pdf, looks_like_pdf};
use crate::resumes::handlers::FILE_FIELDS;
use crate::resumes::upload::UploadForm;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateJdRequest {
    pub company_name: Option<String>,
    pub jd_text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateJdResponse {
    pub id: Uuid,
    pub company_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct AnalysisEntry {
    pub id: Uuid,
    pub resume_id: Uuid,
    /// `None` when the resume has since been deleted.
    pub identifier: Option<String>,
    pub overall_score: i64,
    pub analysis: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct SingleAnalysisResponse {
    pub model: String,
    pub analysis: Value,
    pub overall_score: i64,
    pub resume_text: String,
    pub num_pages: usize,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /jds
pub async fn handle_create_jd(
    State(state): State<AppState>,
    Json(request): Json<CreateJdRequest>,
) -> Result<(StatusCode, Json<CreateJdResponse>), AppError> {
    let jd_text = non_blank(request.jd_text)
        .ok_or_else(|| AppError::Validation("jd_text cannot be empty".to_string()))?;
    let company_name =
        non_blank(request.company_name).unwrap_or_else(|| DEFAULT_COMPANY_NAME.to_string());

    let row = state
        .store
        .insert_job_description(&company_name, &jd_text)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateJdResponse {
            id: row.id,
            company_name: row.company_name,
            created_at: row.created_at,
        }),
    ))
}

/// POST /analyze-batch
///
/// Scores every stored resume against the job description and returns them
/// ranked. Per-resume failures are reported inline; the request still succeeds.
pub async fn handle_analyze_batch(
    State(state): State<AppState>,
    Json(request): Json<BatchRequest>,
) -> Result<Json<BatchOutcome>, AppError> {
    if request.jd_id.is_none() && non_blank(request.jd_text.clone()).is_none() {
        return Err(AppError::Validation(
            "jd_text cannot be empty".to_string(),
        ));
    }
    let llm = state.llm()?;

    let outcome = run_batch(&state.store, llm, state.config.schema_policy, request).await?;
    Ok(Json(outcome))
}

/// GET /analysis/:jd_id
pub async fn handle_get_analyses(
    State(state): State<AppState>,
    Path(jd_id): Path<Uuid>,
) -> Result<Json<Vec<AnalysisEntry>>, AppError> {
    if state.store.get_job_description(jd_id).await?.is_none() {
        return Err(AppError::NotFound(format!(
            "Job description {jd_id} not found"
        )));
    }

    let entries = state
        .store
        .list_analyses_for_jd(jd_id)
        .await?
        .into_iter()
        .map(|row| AnalysisEntry {
            analysis: interpret(&row.analysis_json).value,
            id: row.id,
            resume_id: row.resume_id,
            identifier: row.identifier,
            overall_score: row.overall_score,
            created_at: row.created_at,
        })
        .collect();

    Ok(Json(entries))
}

/// POST /analyze
///
/// Ad-hoc analysis of one uploaded resume against one job description.
/// Nothing is persisted.
pub async fn handle_analyze(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<SingleAnalysisResponse>, AppError> {
    let form = UploadForm::read(
        multipart,
        &FILE_FIELDS,
        state.config.max_upload_bytes,
        &state.config.upload_dir,
    )
    .await?;

    let jd_text = form
        .text("jd")
        .ok_or_else(|| AppError::Validation("Missing or invalid `jd` field".to_string()))?
        .to_string();
    let upload = form
        .file
        .as_ref()
        .ok_or_else(|| AppError::Validation("Missing `resume` file upload".to_string()))?;
    let llm = state.llm()?;

    let data = upload.read().await?;
    if !looks_like_pdf(&data) {
        return Err(AppError::Validation(
            "Only PDF files are supported".to_string(),
        ));
    }
    let extracted = extract_pdf(data, state.config.pdf_extraction_timeout).await?;
    info!("Resume text length: {}", extracted.text.len());

    let (completion, interpretation) = analyze_resume(
        llm,
        state.config.schema_policy,
        &jd_text,
        &extracted.text,
    )
    .await?;

    Ok(Json(SingleAnalysisResponse {
        model: completion.model,
        analysis: interpretation.value,
        overall_score: interpretation.overall_score,
        resume_text: extracted.text,
        num_pages: extracted.num_pages,
    }))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
