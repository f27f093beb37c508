use std::sync::Arc;

use jobdash_core::{
    ApiError, CacheKey, CacheValue, DocumentContent, DocumentId, DownloadedDocument, JobPosting,
    Profile, ProfileId, SourceDocument,
};
use jobdash_logging::jobdash_info;

use crate::cache::Entry;
use crate::{
    Backend, BackendSource, PipelineController, PipelineOutput, PipelineRequest, ProgressSink,
    ResourceCache, ResourceSource, SelectionContext,
};

/// Result of a pipeline run as seen by the operator.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The run's profile is still selected; show the output.
    Current(PipelineOutput),
    /// The selection moved on while the run was in flight; its output or
    /// failure was discarded.
    Superseded { profile_id: ProfileId },
}

/// Process-wide session: one backend, one cache, one selection, one pipeline.
///
/// Created once at startup and reset only by [`logout`](Self::logout).
pub struct Dashboard {
    backend: Arc<dyn Backend>,
    cache: ResourceCache,
    selection: SelectionContext,
    pipeline: PipelineController,
}

impl Dashboard {
    pub fn new(
        backend: Arc<dyn Backend>,
        postings_limit: u32,
        initial_selection: Option<ProfileId>,
    ) -> Self {
        let source = Arc::new(BackendSource::new(Arc::clone(&backend), postings_limit));
        Self::with_source(backend, source, initial_selection)
    }

    pub fn with_source(
        backend: Arc<dyn Backend>,
        source: Arc<dyn ResourceSource>,
        initial_selection: Option<ProfileId>,
    ) -> Self {
        let cache = ResourceCache::new(source);
        let pipeline = PipelineController::new(Arc::clone(&backend), cache.clone());
        Self {
            backend,
            cache,
            selection: SelectionContext::new(initial_selection),
            pipeline,
        }
    }

    pub fn cache(&self) -> &ResourceCache {
        &self.cache
    }

    pub fn selection(&self) -> &SelectionContext {
        &self.selection
    }

    pub fn pipeline(&self) -> &PipelineController {
        &self.pipeline
    }

    pub fn current_profile(&self) -> Option<ProfileId> {
        self.selection.current_profile()
    }

    pub fn select(&self, profile_id: Option<ProfileId>) {
        self.selection.select(profile_id);
    }

    /// Clears the selection and every cached collection.
    pub fn logout(&self) {
        jobdash_info!("logout: clearing selection and cache");
        self.selection.select(None);
        self.cache.clear();
        self.pipeline.reset();
    }

    fn require_selection(&self) -> Result<ProfileId, ApiError> {
        self.selection
            .current_profile()
            .ok_or_else(|| ApiError::precondition("no profile selected"))
    }

    pub fn profiles(&self) -> Entry {
        self.cache.read(&CacheKey::profiles())
    }

    pub async fn load_profiles(&self) -> Result<Vec<Profile>, ApiError> {
        let value = self.cache.load(&CacheKey::profiles()).await?;
        expect_value(value.as_profiles())
    }

    pub async fn get_profile(&self, profile_id: &str) -> Result<Profile, ApiError> {
        self.backend.get_profile(profile_id).await
    }

    pub async fn create_profile(&self, name: &str) -> Result<Profile, ApiError> {
        let profile = self.backend.create_profile(name).await?;
        jobdash_info!("created profile {}", profile.id);
        self.cache.invalidate(&CacheKey::profiles());
        Ok(profile)
    }

    /// Documents of the active profile, or `None` while nothing is selected.
    pub fn documents(&self) -> Option<Entry> {
        let profile_id = self.selection.current_profile()?;
        Some(self.cache.read(&CacheKey::documents(profile_id)))
    }

    pub async fn load_documents(&self) -> Result<Vec<SourceDocument>, ApiError> {
        let profile_id = self.require_selection()?;
        let value = self.cache.load(&CacheKey::documents(profile_id)).await?;
        expect_value(value.as_documents())
    }

    pub async fn upload_document(
        &self,
        file_bytes: Vec<u8>,
        file_name: &str,
    ) -> Result<SourceDocument, ApiError> {
        let profile_id = self.require_selection()?;
        let document = self
            .backend
            .upload_source_document(&profile_id, file_bytes, file_name)
            .await?;

        let added = document.clone();
        self.cache
            .patch(&CacheKey::documents(profile_id), move |value| {
                if let CacheValue::SourceDocuments(documents) = value {
                    documents.push(added);
                }
            });
        Ok(document)
    }

    pub async fn remove_document(&self, doc_id: DocumentId) -> Result<(), ApiError> {
        let profile_id = self.require_selection()?;
        self.backend
            .remove_source_document(&profile_id, doc_id)
            .await?;

        self.cache
            .patch(&CacheKey::documents(profile_id), move |value| {
                if let CacheValue::SourceDocuments(documents) = value {
                    documents.retain(|document| document.id != doc_id);
                }
            });
        Ok(())
    }

    pub async fn download_document(
        &self,
        doc_id: DocumentId,
    ) -> Result<DownloadedDocument, ApiError> {
        let profile_id = self.require_selection()?;
        self.backend
            .download_source_document(&profile_id, doc_id)
            .await
    }

    pub async fn document_content(&self, doc_id: DocumentId) -> Result<DocumentContent, ApiError> {
        let profile_id = self.require_selection()?;
        self.backend
            .source_document_content(&profile_id, doc_id)
            .await
    }

    pub fn postings(&self) -> Entry {
        self.cache.read(&CacheKey::postings())
    }

    pub async fn load_postings(&self) -> Result<Vec<JobPosting>, ApiError> {
        let value = self.cache.load(&CacheKey::postings()).await?;
        expect_value(value.as_postings())
    }

    /// Asks the server to refresh postings for the active profile.
    pub async fn search_postings(&self, keyword: Option<&str>) -> Result<(), ApiError> {
        let profile_id = self.require_selection()?;
        self.backend
            .search_job_postings(&profile_id, keyword)
            .await?;
        self.cache.invalidate(&CacheKey::postings());
        Ok(())
    }

    /// Runs the pipeline for the profile selected right now. If the selection
    /// moves on before the run ends, its output or stage failure is reported
    /// as [`RunOutcome::Superseded`]. Refusals to start are always returned.
    pub async fn run_pipeline(
        &self,
        request: PipelineRequest,
        sink: &dyn ProgressSink,
    ) -> Result<RunOutcome, ApiError> {
        let result = self
            .pipeline
            .run(self.selection.current_profile(), request, sink)
            .await;
        let run_profile = match &result {
            Ok(output) => Some(output.profile_id.clone()),
            Err(err) if err.is_precondition() => None,
            Err(_) => self
                .pipeline
                .state()
                .snapshot()
                .map(|snapshot| snapshot.profile_id.clone()),
        };

        match run_profile {
            Some(profile_id) if !self.selection.is_current(&profile_id) => {
                jobdash_info!(
                    "discarding run result for {}; selection changed",
                    profile_id
                );
                Ok(RunOutcome::Superseded { profile_id })
            }
            _ => result.map(RunOutcome::Current),
        }
    }
}

fn expect_value<T: Clone>(items: Option<&[T]>) -> Result<Vec<T>, ApiError> {
    items
        .map(<[T]>::to_vec)
        .ok_or_else(|| ApiError::cancelled("cache returned a different resource type"))
}
