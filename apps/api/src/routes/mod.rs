pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};

use crate::analysis::handlers as analysis;
use crate::resumes::handlers as resumes;
use crate::state::AppState;

/// Headroom over the file cap for multipart boundaries and text fields.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .route("/health", get(health::health_handler))
        // Resumes
        .route(
            "/resumes",
            post(resumes::handle_upload_resume).get(resumes::handle_list_resumes),
        )
        .route("/resumes/:id", delete(resumes::handle_delete_resume))
        // Job descriptions & analysis
        .route("/jds", post(analysis::handle_create_jd))
        .route("/analyze-batch", post(analysis::handle_analyze_batch))
        .route("/analysis/:jd_id", get(analysis::handle_get_analyses))
        .route("/analyze", post(analysis::handle_analyze))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
