use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use super::Store;
use crate::errors::AppError;
use crate::models::resume::{ResumeRow, ResumeSummary, ResumeText};

impl Store {
    /// Stores a resume. A duplicate `identifier` is rejected with `Conflict`.
    pub async fn insert_resume(
        &self,
        identifier: &str,
        content: &[u8],
        parsed_text: &str,
        num_pages: i64,
    ) -> Result<ResumeSummary, AppError> {
        let summary = ResumeSummary {
            id: Uuid::new_v4(),
            identifier: identifier.to_string(),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO resumes (id, identifier, content, parsed_text, num_pages, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(summary.id)
        .bind(identifier)
        .bind(content)
        .bind(parsed_text)
        .bind(num_pages)
        .bind(summary.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::from_insert(e, &format!("Resume '{identifier}'")))?;

        self.flush_or_revert(sqlx::query("DELETE FROM resumes WHERE id = ?").bind(summary.id))
            .await?;
        info!("Stored resume {} ('{identifier}')", summary.id);
        Ok(summary)
    }

    /// Newest first, without payloads.
    pub async fn list_resumes(&self) -> Result<Vec<ResumeSummary>, AppError> {
        Ok(sqlx::query_as::<_, ResumeSummary>(
            "SELECT id, identifier, created_at FROM resumes ORDER BY seq DESC",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn count_resumes(&self) -> Result<i64, AppError> {
        Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM resumes")
            .fetch_one(&self.pool)
            .await?)
    }

    /// Every resume's extracted text, in upload order.
    pub async fn load_resume_texts(&self) -> Result<Vec<ResumeText>, AppError> {
        Ok(sqlx::query_as::<_, ResumeText>(
            "SELECT id, identifier, parsed_text FROM resumes ORDER BY seq ASC",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    /// Returns false when no resume had this id. Analyses referencing it are kept.
    pub async fn delete_resume(&self, id: Uuid) -> Result<bool, AppError> {
        let Some(row) = sqlx::query_as::<_, ResumeRow>(
            r#"
            SELECT seq, id, identifier, content, parsed_text, num_pages, created_at
            FROM resumes WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(false);
        };

        sqlx::query("DELETE FROM resumes WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        // Restored under its old seq so listing order is unchanged.
        let restore = sqlx::query(
            r#"
            INSERT INTO resumes (seq, id, identifier, content, parsed_text, num_pages, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(row.seq)
        .bind(row.id)
        .bind(&row.identifier)
        .bind(&row.content)
        .bind(&row.parsed_text)
        .bind(row.num_pages)
        .bind(row.created_at);
        self.flush_or_revert(restore).await?;

        info!("Deleted resume {id}");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::temp_path;

    #[tokio::test]
    async fn test_uploaded_resume_is_listed_then_gone_after_delete() {
        let store = Store::open(None).await.unwrap();
        let before = Utc::now();

        let stored = store
            .insert_resume("Backend", b"%PDF-1.7", "Rust and Postgres", 2)
            .await
            .unwrap();

        let listed = store.list_resumes().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].identifier, "Backend");
        assert_eq!(listed[0].id, stored.id);
        assert!(listed[0].created_at >= before);

        assert!(store.delete_resume(stored.id).await.unwrap());
        assert!(store.list_resumes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_unknown_id_reports_false() {
        let store = Store::open(None).await.unwrap();
        assert!(!store.delete_resume(Uuid::new_v4()).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_identifier_is_conflict() {
        let store = Store::open(None).await.unwrap();
        store.insert_resume("Backend", b"a", "one", 1).await.unwrap();
        let err = store
            .insert_resume("Backend", b"b", "two", 1)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(store.count_resumes().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_listing_is_newest_first_and_texts_oldest_first() {
        let store = Store::open(None).await.unwrap();
        store.insert_resume("A", b"a", "text a", 1).await.unwrap();
        store.insert_resume("B", b"b", "text b", 1).await.unwrap();

        let listed: Vec<_> = store
            .list_resumes()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.identifier)
            .collect();
        assert_eq!(listed, vec!["B", "A"]);

        let texts = store.load_resume_texts().await.unwrap();
        assert_eq!(texts[0].identifier, "A");
        assert_eq!(texts[0].parsed_text, "text a");
        assert_eq!(texts[1].identifier, "B");
    }

    #[tokio::test]
    async fn test_unflushed_upload_is_not_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ranker.db");
        let store = Store::open(Some(&path)).await.unwrap();

        // A directory squatting on the temp name makes every flush fail.
        std::fs::create_dir(temp_path(&path)).unwrap();
        let err = store
            .insert_resume("Backend", b"%PDF-1.4", "text", 1)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Snapshot(_)));
        assert_eq!(store.count_resumes().await.unwrap(), 0);

        std::fs::remove_dir(temp_path(&path)).unwrap();
        let stored = store
            .insert_resume("Backend", b"%PDF-1.4", "text", 1)
            .await
            .unwrap();
        assert_eq!(stored.identifier, "Backend");
    }

    #[tokio::test]
    async fn test_unflushed_delete_restores_resume_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ranker.db");
        let store = Store::open(Some(&path)).await.unwrap();
        let first = store.insert_resume("A", b"a", "text a", 1).await.unwrap();
        store.insert_resume("B", b"b", "text b", 1).await.unwrap();

        std::fs::create_dir(temp_path(&path)).unwrap();
        assert!(store.delete_resume(first.id).await.is_err());

        let texts = store.load_resume_texts().await.unwrap();
        assert_eq!(texts.len(), 2);
        assert_eq!(texts[0].id, first.id);
        assert_eq!(texts[0].parsed_text, "text a");

        std::fs::remove_dir(temp_path(&path)).unwrap();
        assert!(store.delete_resume(first.id).await.unwrap());
        assert_eq!(store.count_resumes().await.unwrap(), 1);
    }
}
