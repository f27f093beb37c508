use serde::{Deserialize, Serialize};

pub type ProfileId = String;
pub type DocumentId = i64;

/// Operator-managed identity that scopes documents and pipeline runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    #[serde(rename = "name")]
    pub display_name: String,
    /// Server-formatted; dates and datetimes both occur.
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    pub id: DocumentId,
    #[serde(rename = "user_id")]
    pub owner_profile_id: ProfileId,
    #[serde(rename = "source_file_name")]
    pub stored_name: String,
    #[serde(rename = "original_file_name")]
    pub original_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub posted_at: Option<String>,
    #[serde(default, rename = "url")]
    pub source_url: Option<String>,
}

/// Result of the generation stage; lives only as long as one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedArtifact {
    #[serde(rename = "resume_path")]
    pub download_path: String,
}

/// Extracted text of a stored source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentContent {
    pub id: DocumentId,
    #[serde(rename = "original_file_name")]
    pub original_name: String,
    pub content: String,
}

/// Raw bytes of a source document together with the filename the server declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedDocument {
    pub file_name: String,
    pub bytes: Vec<u8>,
}
