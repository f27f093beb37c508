#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

use jobdash_client::{Backend, ResourceSource};
use jobdash_core::{
    require_profile, ApiError, CacheKey, CacheValue, DocumentContent, DocumentId,
    DownloadedDocument, ErrorKind, GeneratedArtifact, JobPosting, Profile, SourceDocument,
};
use tokio::sync::oneshot;

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(jobdash_logging::initialize_for_tests);
}

/// Lets spawned fetch tasks run to their next suspension point.
pub async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

pub fn posting(id: i64, title: &str) -> JobPosting {
    JobPosting {
        id,
        title: title.to_string(),
        company: None,
        location: None,
        description: None,
        posted_at: None,
        source_url: None,
    }
}

pub fn document(id: DocumentId, owner: &str, name: &str) -> SourceDocument {
    SourceDocument {
        id,
        owner_profile_id: owner.to_string(),
        stored_name: format!("uploads/{owner}/{name}"),
        original_name: name.to_string(),
    }
}

/// In-memory backend that records every call as `"operation:profile"`.
#[derive(Default)]
pub struct FakeBackend {
    calls: Mutex<Vec<String>>,
    failures: Mutex<HashMap<&'static str, ApiError>>,
    documents: Mutex<HashMap<String, Vec<SourceDocument>>>,
    postings: Mutex<Vec<JobPosting>>,
    generation_gate: Mutex<Option<oneshot::Receiver<()>>>,
    next_document_id: AtomicI64,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        let backend = Self::default();
        backend.next_document_id.store(100, Ordering::SeqCst);
        Arc::new(backend)
    }

    pub fn fail_on(&self, operation: &'static str, err: ApiError) {
        self.failures.lock().unwrap().insert(operation, err);
    }

    pub fn seed_documents(&self, profile_id: &str, docs: Vec<SourceDocument>) {
        self.documents
            .lock()
            .unwrap()
            .insert(profile_id.to_string(), docs);
    }

    pub fn seed_postings(&self, postings: Vec<JobPosting>) {
        *self.postings.lock().unwrap() = postings;
    }

    /// Holds `generate_artifact` until the returned sender fires.
    pub fn gate_generation(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.generation_gate.lock().unwrap() = Some(rx);
        tx
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.split(':').next() == Some(operation))
            .count()
    }

    fn record(&self, operation: &'static str, profile_id: &str) -> Result<(), ApiError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{operation}:{profile_id}"));
        match self.failures.lock().unwrap().get(operation) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl Backend for FakeBackend {
    async fn list_profiles(&self) -> Result<Vec<Profile>, ApiError> {
        self.record("list_profiles", "")?;
        Ok(vec![Profile {
            id: "u1".to_string(),
            display_name: "Ada".to_string(),
            created_at: None,
        }])
    }

    async fn get_profile(&self, profile_id: &str) -> Result<Profile, ApiError> {
        let profile_id = require_profile(profile_id)?;
        self.record("get_profile", profile_id)?;
        Err(ApiError::new(ErrorKind::NotFound, "no such profile"))
    }

    async fn create_profile(&self, name: &str) -> Result<Profile, ApiError> {
        self.record("create_profile", "")?;
        Ok(Profile {
            id: format!("id-{name}"),
            display_name: name.to_string(),
            created_at: None,
        })
    }

    async fn list_source_documents(
        &self,
        profile_id: &str,
    ) -> Result<Vec<SourceDocument>, ApiError> {
        let profile_id = require_profile(profile_id)?;
        self.record("list_source_documents", profile_id)?;
        Ok(self
            .documents
            .lock()
            .unwrap()
            .get(profile_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn upload_source_document(
        &self,
        profile_id: &str,
        _file_bytes: Vec<u8>,
        file_name: &str,
    ) -> Result<SourceDocument, ApiError> {
        let profile_id = require_profile(profile_id)?;
        self.record("upload_source_document", profile_id)?;
        let id = self.next_document_id.fetch_add(1, Ordering::SeqCst);
        let doc = document(id, profile_id, file_name);
        self.documents
            .lock()
            .unwrap()
            .entry(profile_id.to_string())
            .or_default()
            .push(doc.clone());
        Ok(doc)
    }

    async fn remove_source_document(
        &self,
        profile_id: &str,
        doc_id: DocumentId,
    ) -> Result<(), ApiError> {
        let profile_id = require_profile(profile_id)?;
        self.record("remove_source_document", profile_id)?;
        if let Some(docs) = self.documents.lock().unwrap().get_mut(profile_id) {
            docs.retain(|doc| doc.id != doc_id);
        }
        Ok(())
    }

    async fn download_source_document(
        &self,
        profile_id: &str,
        doc_id: DocumentId,
    ) -> Result<DownloadedDocument, ApiError> {
        let profile_id = require_profile(profile_id)?;
        self.record("download_source_document", profile_id)?;
        Ok(DownloadedDocument {
            file_name: format!("document-{doc_id}"),
            bytes: b"%PDF".to_vec(),
        })
    }

    async fn source_document_content(
        &self,
        profile_id: &str,
        doc_id: DocumentId,
    ) -> Result<DocumentContent, ApiError> {
        let profile_id = require_profile(profile_id)?;
        self.record("source_document_content", profile_id)?;
        Ok(DocumentContent {
            id: doc_id,
            original_name: "cv.md".to_string(),
            content: "# CV".to_string(),
        })
    }

    async fn search_job_postings(
        &self,
        profile_id: &str,
        _keyword: Option<&str>,
    ) -> Result<(), ApiError> {
        let profile_id = require_profile(profile_id)?;
        self.record("search_job_postings", profile_id)
    }

    async fn list_job_postings(&self, _limit: u32) -> Result<Vec<JobPosting>, ApiError> {
        self.record("list_job_postings", "")?;
        Ok(self.postings.lock().unwrap().clone())
    }

    async fn generate_artifact(
        &self,
        profile_id: &str,
        target_keyword: &str,
    ) -> Result<GeneratedArtifact, ApiError> {
        let profile_id = require_profile(profile_id)?;
        self.record("generate_artifact", profile_id)?;
        let gate = self.generation_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        Ok(GeneratedArtifact {
            download_path: format!("out/{profile_id}/{target_keyword}.pdf"),
        })
    }

    async fn analyze_fit(&self, profile_id: &str) -> Result<serde_json::Value, ApiError> {
        let profile_id = require_profile(profile_id)?;
        self.record("analyze_fit", profile_id)?;
        Ok(serde_json::json!({ "score": 0.82 }))
    }
}

/// Source whose every load waits for a reply queued with [`expect_load`](Self::expect_load).
#[derive(Default)]
pub struct ScriptedSource {
    loads: AtomicUsize,
    replies: Mutex<VecDeque<oneshot::Receiver<Result<CacheValue, ApiError>>>>,
}

impl ScriptedSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn expect_load(&self) -> oneshot::Sender<Result<CacheValue, ApiError>> {
        let (tx, rx) = oneshot::channel();
        self.replies.lock().unwrap().push_back(rx);
        tx
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ResourceSource for ScriptedSource {
    async fn load(&self, _key: &CacheKey) -> Result<CacheValue, ApiError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(reply) => reply
                .await
                .unwrap_or_else(|_| Err(ApiError::cancelled("reply dropped"))),
            None => Err(ApiError::cancelled("unexpected load")),
        }
    }
}
