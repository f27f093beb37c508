use std::time::Duration;

use jobdash_core::{
    require_profile, ApiError, DocumentContent, DocumentId, DownloadedDocument, ErrorKind,
    GeneratedArtifact, JobPosting, Profile, SourceDocument,
};
use jobdash_logging::{jobdash_debug, jobdash_warn, Elapsed};
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::Backend;

const MAX_ERROR_DETAIL_CHARS: usize = 200;

/// How the keyword reaches the generate and search endpoints. The backend has
/// shipped both shapes; the query-parameter form is the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RouteStyle {
    #[default]
    QueryParameter,
    PathSegment,
}

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub auth_token: Option<String>,
    pub route_style: RouteStyle,
    pub postings_limit: u32,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            connect_timeout: Duration::from_secs(10),
            // Generation runs an LLM workflow server-side.
            request_timeout: Duration::from_secs(120),
            auth_token: None,
            route_style: RouteStyle::QueryParameter,
            postings_limit: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base: Url,
    settings: ClientSettings,
}

#[derive(Deserialize)]
struct UploadResponse {
    filename: String,
    resume_source_id: DocumentId,
    original_file_name: String,
}

impl HttpBackend {
    pub fn new(settings: ClientSettings) -> Result<Self, ApiError> {
        let base = Url::parse(&settings.base_url).map_err(|err| {
            ApiError::bad_request(format!("invalid base url {}: {err}", settings.base_url))
        })?;
        if base.cannot_be_a_base() {
            return Err(ApiError::bad_request(format!(
                "base url {} cannot carry a path",
                settings.base_url
            )));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(map_reqwest_error)?;

        jobdash_debug!(
            "http backend base={} auth={}",
            base,
            settings
                .auth_token
                .as_deref()
                .map(jobdash_logging::redact_token)
                .unwrap_or_else(|| "none".to_string())
        );

        Ok(Self {
            client,
            base,
            settings,
        })
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| ApiError::bad_request("base url cannot carry a path"))?;
            path.pop_if_empty();
            path.extend(segments);
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.settings.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let request = request.build().map_err(map_reqwest_error)?;
        let timer = Elapsed::start(format!("{} {}", request.method(), request.url().path()));

        let response = match self.client.execute(request).await {
            Ok(response) => response,
            Err(err) => {
                let mapped = map_reqwest_error(err);
                jobdash_warn!("{} failed: {}", timer.label(), mapped);
                timer.finish("failed");
                return Err(mapped);
            }
        };

        let status = response.status();
        timer.finish(status.as_str());
        if status.is_success() {
            return Ok(response);
        }
        let path = response.url().path().to_string();
        let body = response.bytes().await.unwrap_or_default();
        let err = map_status(status, &body);
        jobdash_warn!("{} answered {}: {}", path, status.as_u16(), err);
        Err(err)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = self.send(request).await?;
        read_json(response).await
    }

    fn keyword_route(
        &self,
        profile_id: &str,
        prefix: &[&str],
        tail: &str,
        query_name: &str,
        keyword: Option<&str>,
    ) -> Result<Url, ApiError> {
        let mut segments = vec!["users", profile_id];
        match (self.settings.route_style, keyword) {
            (RouteStyle::PathSegment, Some(keyword)) => {
                segments.extend_from_slice(prefix);
                segments.push(keyword);
                if !tail.is_empty() {
                    segments.push(tail);
                }
                self.endpoint(&segments)
            }
            _ => {
                segments.extend_from_slice(prefix);
                if !tail.is_empty() {
                    segments.push(tail);
                }
                let mut url = self.endpoint(&segments)?;
                if let Some(keyword) = keyword {
                    url.query_pairs_mut().append_pair(query_name, keyword);
                }
                Ok(url)
            }
        }
    }
}

#[async_trait::async_trait]
impl Backend for HttpBackend {
    async fn list_profiles(&self) -> Result<Vec<Profile>, ApiError> {
        let url = self.endpoint(&["users"])?;
        self.send_json(self.request(Method::GET, url)).await
    }

    async fn get_profile(&self, profile_id: &str) -> Result<Profile, ApiError> {
        let profile_id = require_profile(profile_id)?;
        let url = self.endpoint(&["users", profile_id])?;
        self.send_json(self.request(Method::GET, url)).await
    }

    async fn create_profile(&self, name: &str) -> Result<Profile, ApiError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::precondition("profile name is empty"));
        }
        let body = serde_json::to_vec(&serde_json::json!({ "name": name }))
            .map_err(|err| ApiError::bad_request(err.to_string()))?;
        let url = self.endpoint(&["users"])?;
        let request = self
            .request(Method::POST, url)
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        self.send_json(request).await
    }

    async fn list_source_documents(
        &self,
        profile_id: &str,
    ) -> Result<Vec<SourceDocument>, ApiError> {
        let profile_id = require_profile(profile_id)?;
        let url = self.endpoint(&["users", profile_id, "resume-sources"])?;
        self.send_json(self.request(Method::GET, url)).await
    }

    async fn upload_source_document(
        &self,
        profile_id: &str,
        file_bytes: Vec<u8>,
        file_name: &str,
    ) -> Result<SourceDocument, ApiError> {
        let profile_id = require_profile(profile_id)?;
        if file_name.trim().is_empty() {
            return Err(ApiError::precondition("file name is empty"));
        }
        let part = reqwest::multipart::Part::bytes(file_bytes).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);
        let url = self.endpoint(&["users", profile_id, "resume-sources"])?;

        let uploaded: UploadResponse = self
            .send_json(self.request(Method::POST, url).multipart(form))
            .await?;
        Ok(SourceDocument {
            id: uploaded.resume_source_id,
            owner_profile_id: profile_id.to_string(),
            stored_name: uploaded.filename,
            original_name: uploaded.original_file_name,
        })
    }

    async fn remove_source_document(
        &self,
        profile_id: &str,
        doc_id: DocumentId,
    ) -> Result<(), ApiError> {
        let profile_id = require_profile(profile_id)?;
        let doc = doc_id.to_string();
        let url = self.endpoint(&["users", profile_id, "resume-sources", &doc])?;
        self.send(self.request(Method::DELETE, url)).await?;
        Ok(())
    }

    async fn download_source_document(
        &self,
        profile_id: &str,
        doc_id: DocumentId,
    ) -> Result<DownloadedDocument, ApiError> {
        let profile_id = require_profile(profile_id)?;
        let doc = doc_id.to_string();
        let url = self.endpoint(&["users", profile_id, "resume-sources", &doc, "download"])?;
        let response = self.send(self.request(Method::GET, url)).await?;

        let file_name = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(declared_file_name)
            .unwrap_or_else(|| format!("document-{doc_id}"));
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;

        Ok(DownloadedDocument {
            file_name,
            bytes: bytes.to_vec(),
        })
    }

    async fn source_document_content(
        &self,
        profile_id: &str,
        doc_id: DocumentId,
    ) -> Result<DocumentContent, ApiError> {
        let profile_id = require_profile(profile_id)?;
        let doc = doc_id.to_string();
        let url = self.endpoint(&["users", profile_id, "resume-sources", &doc, "content"])?;
        self.send_json(self.request(Method::GET, url)).await
    }

    async fn search_job_postings(
        &self,
        profile_id: &str,
        keyword: Option<&str>,
    ) -> Result<(), ApiError> {
        let profile_id = require_profile(profile_id)?;
        let keyword = keyword.map(str::trim).filter(|k| !k.is_empty());
        let url = self.keyword_route(profile_id, &["job-postings"], "", "keyword", keyword)?;
        self.send(self.request(Method::POST, url)).await?;
        Ok(())
    }

    async fn list_job_postings(&self, limit: u32) -> Result<Vec<JobPosting>, ApiError> {
        let mut url = self.endpoint(&["job-postings"])?;
        url.query_pairs_mut().append_pair("limit", &limit.to_string());
        self.send_json(self.request(Method::GET, url)).await
    }

    async fn generate_artifact(
        &self,
        profile_id: &str,
        target_keyword: &str,
    ) -> Result<GeneratedArtifact, ApiError> {
        let profile_id = require_profile(profile_id)?;
        let keyword = target_keyword.trim();
        if keyword.is_empty() {
            return Err(ApiError::precondition("target keyword is empty"));
        }
        let url = self.keyword_route(profile_id, &[], "resumes", "job_target", Some(keyword))?;

        let response = self.send(self.request(Method::POST, url)).await?;
        let status = response.status();
        let artifact: GeneratedArtifact = read_json(response).await?;
        if artifact.download_path.trim().is_empty() {
            return Err(ApiError::new(
                ErrorKind::ServerError(status.as_u16()),
                "generation returned an empty download path",
            ));
        }
        Ok(artifact)
    }

    async fn analyze_fit(&self, profile_id: &str) -> Result<serde_json::Value, ApiError> {
        let profile_id = require_profile(profile_id)?;
        let url = self.endpoint(&["users", profile_id, "analyze-job"])?;
        let mut body: serde_json::Value = self.send_json(self.request(Method::POST, url)).await?;
        if let Some(result) = body.get_mut("analysis_result") {
            return Ok(result.take());
        }
        Ok(body)
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    let bytes = response.bytes().await.map_err(map_reqwest_error)?;
    serde_json::from_slice(&bytes).map_err(|err| {
        ApiError::new(
            ErrorKind::ServerError(status.as_u16()),
            format!("undecodable response body: {err}"),
        )
    })
}

fn map_status(status: StatusCode, body: &[u8]) -> ApiError {
    let detail = error_detail(status, body);
    if status == StatusCode::NOT_FOUND {
        return ApiError::new(ErrorKind::NotFound, detail);
    }
    if status.is_client_error() {
        return ApiError::bad_request(detail);
    }
    ApiError::new(ErrorKind::ServerError(status.as_u16()), detail)
}

/// Prefers the `detail` field the backend puts in its error bodies.
fn error_detail(status: StatusCode, body: &[u8]) -> String {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) {
        match value.get("detail") {
            Some(serde_json::Value::String(detail)) => return detail.clone(),
            Some(other) => return truncate(&other.to_string()),
            None => {}
        }
    }
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unexpected status")
            .to_string()
    } else {
        truncate(text)
    }
}

fn truncate(text: &str) -> String {
    text.chars().take(MAX_ERROR_DETAIL_CHARS).collect()
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_builder() {
        return ApiError::bad_request(err.to_string());
    }
    // Timeouts, refused connections and broken bodies all look the same to callers.
    ApiError::new(ErrorKind::NetworkUnavailable, err.to_string())
}

/// Extracts the filename from a `Content-Disposition` value, preferring the
/// RFC 5987 `filename*` form. Directory components are dropped.
pub(crate) fn declared_file_name(value: &str) -> Option<String> {
    let mut plain = None;
    for part in value.split(';').map(str::trim) {
        if let Some(encoded) = part.strip_prefix("filename*=") {
            let raw = encoded.rsplit('\'').next().unwrap_or(encoded);
            let decoded: String = url::form_urlencoded::parse(raw.as_bytes())
                .map(|(key, _)| key.into_owned())
                .collect();
            if let Some(name) = base_name(&decoded) {
                return Some(name);
            }
        } else if let Some(name) = part.strip_prefix("filename=") {
            plain = base_name(name.trim_matches('"'));
        }
    }
    plain
}

fn base_name(name: &str) -> Option<String> {
    let name = name.rsplit(['/', '\\']).next().unwrap_or(name).trim();
    if name.is_empty() || name == "." || name == ".." {
        None
    } else {
        Some(name.to_string())
    }
}
