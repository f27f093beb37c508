use jobdash_core::{
    ApiError, DocumentContent, DocumentId, DownloadedDocument, GeneratedArtifact, JobPosting,
    Profile, SourceDocument,
};

/// One operation per backend capability.
///
/// Implementations must reject empty profile ids with `PreconditionFailed`
/// before touching the network, and must never retry the side-effecting
/// operations (`create_profile`, `upload_source_document`, `generate_artifact`).
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    async fn list_profiles(&self) -> Result<Vec<Profile>, ApiError>;

    async fn get_profile(&self, profile_id: &str) -> Result<Profile, ApiError>;

    async fn create_profile(&self, name: &str) -> Result<Profile, ApiError>;

    async fn list_source_documents(&self, profile_id: &str)
        -> Result<Vec<SourceDocument>, ApiError>;

    async fn upload_source_document(
        &self,
        profile_id: &str,
        file_bytes: Vec<u8>,
        file_name: &str,
    ) -> Result<SourceDocument, ApiError>;

    async fn remove_source_document(
        &self,
        profile_id: &str,
        doc_id: DocumentId,
    ) -> Result<(), ApiError>;

    async fn download_source_document(
        &self,
        profile_id: &str,
        doc_id: DocumentId,
    ) -> Result<DownloadedDocument, ApiError>;

    async fn source_document_content(
        &self,
        profile_id: &str,
        doc_id: DocumentId,
    ) -> Result<DocumentContent, ApiError>;

    /// Triggers a server-side refresh of the shared postings collection.
    async fn search_job_postings(
        &self,
        profile_id: &str,
        keyword: Option<&str>,
    ) -> Result<(), ApiError>;

    async fn list_job_postings(&self, limit: u32) -> Result<Vec<JobPosting>, ApiError>;

    async fn generate_artifact(
        &self,
        profile_id: &str,
        target_keyword: &str,
    ) -> Result<GeneratedArtifact, ApiError>;

    /// The analysis payload is opaque to this crate.
    async fn analyze_fit(&self, profile_id: &str) -> Result<serde_json::Value, ApiError>;
}
