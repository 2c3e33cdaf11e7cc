use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobDescriptionRow {
    pub id: Uuid,
    pub company_name: String,
    pub jd_text: String,
    pub created_at: DateTime<Utc>,
}
