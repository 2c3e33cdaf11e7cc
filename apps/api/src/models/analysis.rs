use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AnalysisRow {
    pub id: Uuid,
    pub resume_id: Uuid,
    pub jd_id: Uuid,
    /// Raw model response text, exactly as returned.
    pub analysis_json: String,
    pub overall_score: i64,
    pub created_at: DateTime<Utc>,
}

/// An analysis joined with its resume label. `identifier` is `None` once the
/// resume has been deleted.
#[derive(Debug, Clone, FromRow)]
pub struct AnalysisListing {
    pub id: Uuid,
    pub resume_id: Uuid,
    pub identifier: Option<String>,
    pub analysis_json: String,
    pub overall_score: i64,
    pub created_at: DateTime<Utc>,
}
