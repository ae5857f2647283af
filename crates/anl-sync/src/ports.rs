//! The two remote systems the service talks to.
//!
//! `DoccanoClient` and `IdolClient` implement these directly; tests plug in
//! in-memory fakes.

use std::path::Path;

use anl_core::query::QueryRecord;
use anl_doccano::{DoccanoClient, DoccanoError, DoccanoProject, DoccanoUser};
use anl_idol::{IdolClient, IdolError, IdolHit};
use async_trait::async_trait;

#[async_trait]
pub trait AnnotationService: Send + Sync {
    async fn me(&self) -> Result<DoccanoUser, DoccanoError>;

    async fn projects(&self) -> Result<Vec<DoccanoProject>, DoccanoError>;

    /// Upload `path` and return the HTTP status.
    async fn upload(&self, project_id: u64, format: &str, path: &Path)
    -> Result<u16, DoccanoError>;

    async fn download(&self, project_id: u64, format: &str) -> Result<String, DoccanoError>;
}

#[async_trait]
pub trait SearchIndex: Send + Sync {
    async fn query(&self, query: &QueryRecord) -> Result<Vec<IdolHit>, IdolError>;

    async fn remove_documents(
        &self,
        references: &[String],
        batch_size: usize,
    ) -> Result<Vec<u64>, IdolError>;

    async fn index_documents(
        &self,
        documents: &[IdolHit],
        database: &str,
        batch_size: usize,
    ) -> Result<Vec<u64>, IdolError>;
}

#[async_trait]
impl AnnotationService for DoccanoClient {
    async fn me(&self) -> Result<DoccanoUser, DoccanoError> {
        self.get_me().await
    }

    async fn projects(&self) -> Result<Vec<DoccanoProject>, DoccanoError> {
        self.list_projects().await
    }

    async fn upload(
        &self,
        project_id: u64,
        format: &str,
        path: &Path,
    ) -> Result<u16, DoccanoError> {
        self.upload_file(project_id, format, path).await
    }

    async fn download(&self, project_id: u64, format: &str) -> Result<String, DoccanoError> {
        Self::download(self, project_id, format).await
    }
}

#[async_trait]
impl SearchIndex for IdolClient {
    async fn query(&self, query: &QueryRecord) -> Result<Vec<IdolHit>, IdolError> {
        Self::query(self, query).await
    }

    async fn remove_documents(
        &self,
        references: &[String],
        batch_size: usize,
    ) -> Result<Vec<u64>, IdolError> {
        Self::remove_documents(self, references, batch_size).await
    }

    async fn index_documents(
        &self,
        documents: &[IdolHit],
        database: &str,
        batch_size: usize,
    ) -> Result<Vec<u64>, IdolError> {
        self.index_into_idol(documents, database, batch_size).await
    }
}
