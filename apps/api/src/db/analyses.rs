use chrono::Utc;
use uuid::Uuid;

use super::Store;
use crate::errors::AppError;
use crate::models::analysis::{AnalysisListing, AnalysisRow};

impl Store {
    pub async fn insert_analysis(
        &self,
        resume_id: Uuid,
        jd_id: Uuid,
        analysis_json: &str,
        overall_score: i64,
    ) -> Result<AnalysisRow, AppError> {
        let row = AnalysisRow {
            id: Uuid::new_v4(),
            resume_id,
            jd_id,
            analysis_json: analysis_json.to_string(),
            overall_score,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO analyses (id, resume_id, jd_id, analysis_json, overall_score, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(row.id)
        .bind(row.resume_id)
        .bind(row.jd_id)
        .bind(&row.analysis_json)
        .bind(row.overall_score)
        .bind(row.created_at)
        .execute(&self.pool)
        .await?;

        self.flush_or_revert(sqlx::query("DELETE FROM analyses WHERE id = ?").bind(row.id))
            .await?;
        Ok(row)
    }

    /// All analyses for a job description, best score first. Orphaned rows
    /// (resume deleted) are included with no identifier.
    pub async fn list_analyses_for_jd(&self, jd_id: Uuid) -> Result<Vec<AnalysisListing>, AppError> {
        Ok(sqlx::query_as::<_, AnalysisListing>(
            r#"
            SELECT a.id, a.resume_id, r.identifier, a.analysis_json, a.overall_score, a.created_at
            FROM analyses a
            LEFT JOIN resumes r ON r.id = a.resume_id
            WHERE a.jd_id = ?
            ORDER BY a.overall_score DESC, a.seq ASC
            "#,
        )
        .bind(jd_id)
        .fetch_all(&self.pool)
        .await?)
    }
}
