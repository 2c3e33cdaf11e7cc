use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Full stored row, read back when a delete may need undoing.
#[derive(Debug, Clone, FromRow)]
pub struct ResumeRow {
    pub seq: i64,
    pub id: Uuid,
    pub identifier: String,
    pub content: Vec<u8>,
    pub parsed_text: String,
    pub num_pages: i64,
    pub created_at: DateTime<Utc>,
}

/// Listing projection: no binary or text payload.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeSummary {
    pub id: Uuid,
    pub identifier: String,
    pub created_at: DateTime<Utc>,
}

/// What the batch orchestrator needs from each resume.
#[derive(Debug, Clone, FromRow)]
pub struct ResumeText {
    pub id: Uuid,
    pub identifier: String,
    pub parsed_text: String,
}
