//! Document upload and annotated download.

use std::path::Path;

use crate::{DoccanoClient, error::DoccanoError, http::check_response};

impl DoccanoClient {
    /// Upload a local file into a project's documents.
    ///
    /// Returns the HTTP status instead of failing on non-2xx so the caller
    /// can decide what happens to the local file.
    ///
    /// # Errors
    ///
    /// Returns [`DoccanoError::Io`] if the file cannot be read and
    /// [`DoccanoError::Http`] on transport failure.
    pub async fn upload_file(
        &self,
        project_id: u64,
        format: &str,
        path: &Path,
    ) -> Result<u16, DoccanoError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| DoccanoError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map_or_else(|| "upload".to_string(), |n| n.to_string_lossy().into_owned());

        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
        let form = reqwest::multipart::Form::new()
            .text("format", format.to_string())
            .part("file", part);

        let resp = self
            .post(&format!("v1/projects/{project_id}/docs/upload"))
            .multipart(form)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::debug!(project_id, status, body, "doccano upload rejected");
        }
        Ok(status)
    }

    /// Download a project's documents with their annotations.
    ///
    /// `format` is Doccano's export format name, e.g. `jsonl`.
    ///
    /// # Errors
    ///
    /// Returns [`DoccanoError::Api`] on a non-success status.
    pub async fn download(&self, project_id: u64, format: &str) -> Result<String, DoccanoError> {
        let resp = self
            .get(&format!(
                "v1/projects/{project_id}/docs/download?q={}",
                urlencoding::encode(format)
            ))
            .send()
            .await?;
        Ok(check_response(resp).await?.text().await?)
    }
}
