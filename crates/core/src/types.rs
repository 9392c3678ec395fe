//! Typed records for the documents hub API
//!
//! These are plain data records populated from the vendor's JSON. Every field
//! the server may omit is an `Option`; request serialization drops `None`
//! fields so PATCH bodies only carry what the caller set.

use futures::stream::BoxStream;
use reqwest::Response;
use serde::{Deserialize, Serialize};

use crate::documents::EntryKind;

/// File or folder metadata record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<bool>,
}

impl CloudFile {
    /// Record carrying only a target path (copy and folder-creation bodies)
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Default::default()
        }
    }

    /// Whether this record describes a file or a folder
    pub fn entry_kind(&self) -> EntryKind {
        if self.directory.unwrap_or(false) {
            EntryKind::Folder
        } else {
            EntryKind::File
        }
    }
}

/// Storage quota for the cloud service account
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudStorage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used: Option<i64>,
}

/// Credential-free download links for a file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudLink {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloud_elements_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_view_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_link: Option<String>,
}

/// Response of the hub ping endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pong {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl std::fmt::Display for Pong {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Pong[{},{}]",
            self.date_time.as_deref().unwrap_or(""),
            self.endpoint.as_deref().unwrap_or("")
        )
    }
}

/// Raw file content: declared length, filename from `Content-Disposition`,
/// and the undrained byte stream. Actual transfer is the caller's job.
pub struct FileContent {
    pub content_length: Option<u64>,
    pub file_name: Option<String>,
    stream: BoxStream<'static, reqwest::Result<bytes::Bytes>>,
}

impl FileContent {
    pub(crate) fn from_response(response: Response) -> Self {
        let content_length = response.content_length();
        let file_name = response
            .headers()
            .get(reqwest::header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(disposition_file_name);
        Self {
            content_length,
            file_name,
            stream: Box::pin(response.bytes_stream()),
        }
    }

    /// Consume the content as a byte stream
    pub fn into_stream(self) -> BoxStream<'static, reqwest::Result<bytes::Bytes>> {
        self.stream
    }
}

impl std::fmt::Debug for FileContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileContent")
            .field("content_length", &self.content_length)
            .field("file_name", &self.file_name)
            .finish_non_exhaustive()
    }
}

/// Filename from a `Content-Disposition` header value, unquoted
fn disposition_file_name(value: &str) -> Option<String> {
    value.split(';').find_map(|part| {
        let part = part.trim();
        let name = part.strip_prefix("filename=")?;
        Some(name.trim_matches('"').to_string())
    })
}
