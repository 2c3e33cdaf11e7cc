//! Multipart form reading with the file field spooled to a temporary file.
//!
//! The temp file is owned by `SpooledUpload` and removed when it is dropped,
//! whichever way the handler exits.

use std::collections::HashMap;
use std::io;
use std::path::Path;

use axum::extract::multipart::{Field, Multipart};
use bytes::Bytes;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;

use crate::errors::AppError;

pub struct SpooledUpload {
    file: NamedTempFile,
    pub file_name: Option<String>,
    pub len: usize,
}

impl SpooledUpload {
    async fn from_field(
        mut field: Field<'_>,
        max_bytes: usize,
        spool_dir: &Path,
    ) -> Result<Self, AppError> {
        let file_name = field.file_name().map(str::to_string);
        let file = NamedTempFile::new_in(spool_dir).map_err(spool_error)?;
        let mut writer = tokio::fs::File::from_std(file.reopen().map_err(spool_error)?);

        let mut len = 0usize;
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::Validation(format!("Invalid file upload: {e}")))?
        {
            len += chunk.len();
            if len > max_bytes {
                return Err(AppError::Validation(format!(
                    "File exceeds the {max_bytes} byte upload limit"
                )));
            }
            writer.write_all(&chunk).await.map_err(spool_error)?;
        }
        writer.flush().await.map_err(spool_error)?;

        Ok(Self {
            file,
            file_name,
            len,
        })
    }

    pub async fn read(&self) -> Result<Bytes, AppError> {
        let data = tokio::fs::read(self.file.path())
            .await
            .map_err(spool_error)?;
        Ok(Bytes::from(data))
    }
}

fn spool_error(e: io::Error) -> AppError {
    AppError::Internal(anyhow::Error::new(e).context("Failed to spool upload to a temporary file"))
}

/// A parsed multipart form: at most one file plus text fields.
#[derive(Default)]
pub struct UploadForm {
    pub file: Option<SpooledUpload>,
    pub fields: HashMap<String, String>,
}

impl UploadForm {
    /// Reads the whole form. Fields named in `file_fields` are spooled into
    /// `spool_dir`; every other field is read as text.
    pub async fn read(
        mut multipart: Multipart,
        file_fields: &[&str],
        max_bytes: usize,
        spool_dir: &Path,
    ) -> Result<Self, AppError> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if file_fields.contains(&name.as_str()) {
                if form.file.is_some() {
                    return Err(AppError::Validation(
                        "Only one file may be uploaded per request".to_string(),
                    ));
                }
                form.file = Some(SpooledUpload::from_field(field, max_bytes, spool_dir).await?);
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid field '{name}': {e}")))?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    /// A text field, trimmed; `None` when missing or blank.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::FromRequest;
    use axum::http::{header, Request};

    const BOUNDARY: &str = "upload-test-boundary";

    async fn multipart(identifier: &str, file: &[u8]) -> Multipart {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"identifier\"\r\n\r\n{identifier}\r\n\
                 --{BOUNDARY}\r\nContent-Disposition: form-data; name=\"resume\"; filename=\"r.pdf\"\r\n\
                 Content-Type: application/pdf\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(file);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        let request = Request::builder()
            .method("POST")
            .uri("/resumes")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        Multipart::from_request(request, &()).await.unwrap()
    }

    fn spooled_files(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test]
    async fn test_spooled_file_is_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let form = UploadForm::read(
            multipart("Backend", b"%PDF-1.4 body").await,
            &["resume"],
            1024,
            dir.path(),
        )
        .await
        .unwrap();

        let upload = form.file.as_ref().unwrap();
        assert!(upload.file.path().starts_with(dir.path()));
        assert_eq!(upload.len, 13);
        assert_eq!(upload.file_name.as_deref(), Some("r.pdf"));
        assert_eq!(&upload.read().await.unwrap()[..], b"%PDF-1.4 body");
        assert_eq!(form.text("identifier"), Some("Backend"));
        assert_eq!(spooled_files(dir.path()), 1);

        drop(form);
        assert_eq!(spooled_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_oversized_file_is_rejected_and_removed() {
        let dir = tempfile::tempdir().unwrap();
        let result = UploadForm::read(
            multipart("Backend", &[b'x'; 2048]).await,
            &["resume"],
            1024,
            dir.path(),
        )
        .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(spooled_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_file_at_the_cap_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let form = UploadForm::read(
            multipart("Backend", &[b'x'; 1024]).await,
            &["resume"],
            1024,
            dir.path(),
        )
        .await
        .unwrap();
        assert_eq!(form.file.unwrap().len, 1024);
    }
}
