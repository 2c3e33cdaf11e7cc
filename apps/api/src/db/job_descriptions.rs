use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use super::Store;
use crate::errors::AppError;
use crate::models::job_description::JobDescriptionRow;

impl Store {
    pub async fn insert_job_description(
        &self,
        company_name: &str,
        jd_text: &str,
    ) -> Result<JobDescriptionRow, AppError> {
        let row = JobDescriptionRow {
            id: Uuid::new_v4(),
            company_name: company_name.to_string(),
            jd_text: jd_text.to_string(),
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO job_descriptions (id, company_name, jd_text, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(row.id)
        .bind(&row.company_name)
        .bind(&row.jd_text)
        .bind(row.created_at)
        .execute(&self.pool)
        .await?;

        self.flush_or_revert(sqlx::query("DELETE FROM job_descriptions WHERE id = ?").bind(row.id))
            .await?;
        info!("Stored job description {} for '{}'", row.id, row.company_name);
        Ok(row)
    }

    pub async fn get_job_description(
        &self,
        id: Uuid,
    ) -> Result<Option<JobDescriptionRow>, AppError> {
        Ok(sqlx::query_as::<_, JobDescriptionRow>(
            "SELECT id, company_name, jd_text, created_at FROM job_descriptions WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    pub async fn count_job_descriptions(&self) -> Result<i64, AppError> {
        Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM job_descriptions")
            .fetch_one(&self.pool)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_then_get() {
        let store = Store::open(None).await.unwrap();
        let row = store
            .insert_job_description("Acme", "Senior Rust Engineer")
            .await
            .unwrap();

        let fetched = store.get_job_description(row.id).await.unwrap().unwrap();
        assert_eq!(fetched.company_name, "Acme");
        assert_eq!(fetched.jd_text, "Senior Rust Engineer");
        assert_eq!(fetched.created_at, row.created_at);
    }

    #[tokio::test]
    async fn test_get_unknown_is_none() {
        let store = Store::open(None).await.unwrap();
        assert!(store
            .get_job_description(Uuid::new_v4())
            .await
            .unwrap()
            .is_none());
    }
}
