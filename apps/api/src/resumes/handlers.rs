use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::ResumeSummary;
use crate::resumes::extract::{extract_pdf, looks_like_pdf};
use crate::resumes::upload::UploadForm;
use crate::state::AppState;

/// Multipart names accepted for the PDF part.
pub const FILE_FIELDS: [&str; 2] = ["resume", "file"];

#[derive(Debug, Serialize)]
pub struct UploadResumeResponse {
    pub id: Uuid,
    pub identifier: String,
    pub parsed_length: usize,
    pub num_pages: usize,
}

/// POST /resumes
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResumeResponse>), AppError> {
    let form = UploadForm::read(
        multipart,
        &FILE_FIELDS,
        state.config.max_upload_bytes,
        &state.config.upload_dir,
    )
    .await?;

    let identifier = form
        .text("identifier")
        .ok_or_else(|| AppError::Validation("Missing `identifier` field".to_string()))?
        .to_string();
    let upload = form
        .file
        .as_ref()
        .ok_or_else(|| AppError::Validation("Missing `resume` file upload".to_string()))?;

    let data = upload.read().await?;
    if !looks_like_pdf(&data) {
        return Err(AppError::Validation(
            "Only PDF files are supported".to_string(),
        ));
    }

    let extracted = extract_pdf(data.clone(), state.config.pdf_extraction_timeout).await?;
    info!(
        "Parsed resume '{identifier}' ({:?}, {} bytes): {} chars, {} page(s)",
        upload.file_name,
        upload.len,
        extracted.text.len(),
        extracted.num_pages
    );

    let stored = state
        .store
        .insert_resume(
            &identifier,
            &data,
            &extracted.text,
            extracted.num_pages as i64,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResumeResponse {
            id: stored.id,
            identifier: stored.identifier,
            parsed_length: extracted.text.chars().count(),
            num_pages: extracted.num_pages,
        }),
    ))
}

/// GET /resumes
pub async fn handle_list_resumes(
    State(state): State<AppState>,
) -> Result<Json<Vec<ResumeSummary>>, AppError> {
    Ok(Json(state.store.list_resumes().await?))
}

/// DELETE /resumes/:id
pub async fn handle_delete_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !state.store.delete_resume(id).await? {
        return Err(AppError::NotFound(format!("Resume {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}
