//! Resource operations of the documents hub
//!
//! Each operation is one dispatcher round trip: build a URI from the entry
//! and identifier discriminators, serialize a typed body when the verb needs
//! one, call [`ElementsConnector::execute`], deserialize the JSON (or hand
//! back the raw stream for downloads).

use crate::connector::{ElementsConnector, Payload};
use crate::error::{Error, Result};
use crate::types::{CloudFile, CloudLink, CloudStorage, FileContent};

/// File vs. folder, selecting the URL segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Folder,
}

impl EntryKind {
    fn segment(self) -> &'static str {
        match self {
            EntryKind::File => "files",
            EntryKind::Folder => "folders",
        }
    }
}

/// How an identifier addresses an entry: opaque ID or hierarchical path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileSpec {
    Id,
    Path,
}

/// URI for an entry operation. IDs become a path segment; paths become a
/// `path` query parameter. Both forms take an optional trailing operation
/// segment (`metadata`, `copy`, `links`, `contents`).
fn entry_url(kind: EntryKind, spec: FileSpec, identifier: &str, operation: Option<&str>) -> String {
    let segment = kind.segment();
    let encoded = urlencoding::encode(identifier);
    match (spec, operation) {
        (FileSpec::Id, Some(op)) => format!("hubs/documents/{segment}/{encoded}/{op}"),
        (FileSpec::Id, None) => format!("hubs/documents/{segment}/{encoded}"),
        (FileSpec::Path, Some(op)) => format!("hubs/documents/{segment}/{op}?path={encoded}"),
        (FileSpec::Path, None) => format!("hubs/documents/{segment}?path={encoded}"),
    }
}

/// Append a query parameter to a URI that may or may not have one already
fn append_query(uri: &mut String, key: &str, value: &str) {
    uri.push(if uri.contains('?') { '&' } else { '?' });
    uri.push_str(key);
    uri.push('=');
    uri.push_str(value);
}

/// Upload URI: target path plus optional description, overwrite/size flags
/// and a comma-joined tag list under the encoded `tags[]` key (vendor wire
/// format).
fn upload_uri(
    path: &str,
    description: Option<&str>,
    tags: &[String],
    overwrite: bool,
    size_in_bytes: Option<u64>,
) -> String {
    let mut uri = format!("hubs/documents/files?path={}", urlencoding::encode(path));
    if let Some(description) = description {
        append_query(&mut uri, "description", &urlencoding::encode(description));
    }
    if overwrite {
        append_query(&mut uri, "overwrite", "true");
    }
    if let Some(size) = size_in_bytes {
        append_query(&mut uri, "size", &size.to_string());
    }
    let encoded_tags: Vec<String> = tags
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(|t| urlencoding::encode(t).into_owned())
        .collect();
    if !encoded_tags.is_empty() {
        append_query(&mut uri, "tags%5B%5D", &encoded_tags.join(","));
    }
    uri
}

impl ElementsConnector {
    /// Storage quota of the cloud service account
    pub async fn storage_available(&self) -> Result<CloudStorage> {
        let response = self.get("hubs/documents/storage").await?;
        Ok(response.json().await?)
    }

    /// Metadata for a file or folder addressed by ID or path
    pub async fn entry_metadata(
        &self,
        kind: EntryKind,
        spec: FileSpec,
        identifier: &str,
    ) -> Result<CloudFile> {
        let uri = entry_url(kind, spec, identifier, Some("metadata"));
        let response = self.get(&uri).await?;
        Ok(response.json().await?)
    }

    /// Update metadata (tags, name, path) for a file or folder. Moving an
    /// entry is a metadata patch of its `path` field; size is immutable.
    pub async fn patch_entry_metadata(
        &self,
        kind: EntryKind,
        spec: FileSpec,
        identifier: &str,
        data: &CloudFile,
    ) -> Result<CloudFile> {
        let uri = entry_url(kind, spec, identifier, Some("metadata"));
        let response = self.patch(&uri, Payload::json(data)?).await?;
        Ok(response.json().await?)
    }

    /// Contents of a folder, optionally with tags fetched per entry
    pub async fn list_folder_contents(
        &self,
        spec: FileSpec,
        identifier: &str,
        with_tags: bool,
    ) -> Result<Vec<CloudFile>> {
        let mut uri = entry_url(EntryKind::Folder, spec, identifier, Some("contents"));
        append_query(&mut uri, "fetchTags", if with_tags { "true" } else { "false" });
        let response = self.get(&uri).await?;
        Ok(response.json().await?)
    }

    /// Copy a file or folder to a target path
    pub async fn copy_entry(
        &self,
        kind: EntryKind,
        spec: FileSpec,
        identifier: &str,
        target_path: &str,
    ) -> Result<CloudFile> {
        let uri = entry_url(kind, spec, identifier, Some("copy"));
        let body = CloudFile::with_path(target_path);
        let response = self.post(&uri, Payload::json(&body)?).await?;
        Ok(response.json().await?)
    }

    /// Copy an already-fetched entry by its ID
    pub async fn copy_file(&self, source: &CloudFile, target_path: &str) -> Result<CloudFile> {
        let id = source
            .id
            .as_deref()
            .ok_or_else(|| Error::InvalidInput("source entry has no id".to_string()))?;
        self.copy_entry(source.entry_kind(), FileSpec::Id, id, target_path)
            .await
    }

    /// Create a folder at a full path (must begin with a slash)
    pub async fn create_folder(&self, path: &str, tags: &[String]) -> Result<CloudFile> {
        let mut folder = CloudFile::with_path(path);
        if !tags.is_empty() {
            folder.tags = Some(tags.to_vec());
        }
        self.create_folder_from(&folder).await
    }

    /// Create a folder from a prepared record; its `path` must begin with a
    /// slash
    pub async fn create_folder_from(&self, folder: &CloudFile) -> Result<CloudFile> {
        let path = folder.path.as_deref().unwrap_or("");
        if !path.starts_with('/') {
            return Err(Error::InvalidInput("Path must begin with a slash".to_string()));
        }
        let response = self
            .post("hubs/documents/folders", Payload::json(folder)?)
            .await?;
        Ok(response.json().await?)
    }

    /// Delete a folder by path, optionally emptying the provider trash
    pub async fn delete_folder(&self, path: &str, with_trash: bool) -> Result<CloudFile> {
        let mut uri = entry_url(EntryKind::Folder, FileSpec::Path, path, None);
        append_query(&mut uri, "emptyTrash", if with_trash { "true" } else { "false" });
        let response = self.delete(&uri).await?;
        Ok(response.json().await?)
    }

    /// Folder metadata by ID or path
    pub async fn folder_metadata(&self, spec: FileSpec, identifier: &str) -> Result<CloudFile> {
        self.entry_metadata(EntryKind::Folder, spec, identifier).await
    }

    /// Update folder metadata by ID or path
    pub async fn patch_folder_metadata(
        &self,
        spec: FileSpec,
        identifier: &str,
        data: &CloudFile,
    ) -> Result<CloudFile> {
        self.patch_entry_metadata(EntryKind::Folder, spec, identifier, data)
            .await
    }

    /// Delete a file by ID or path, optionally emptying the provider trash
    pub async fn delete_file(
        &self,
        spec: FileSpec,
        identifier: &str,
        empty_trash: bool,
    ) -> Result<()> {
        let mut uri = entry_url(EntryKind::File, spec, identifier, None);
        append_query(&mut uri, "emptyTrash", if empty_trash { "true" } else { "false" });
        self.delete(&uri).await?;
        Ok(())
    }

    /// Credential-free download links for a file
    pub async fn file_links(&self, spec: FileSpec, identifier: &str) -> Result<CloudLink> {
        let uri = entry_url(EntryKind::File, spec, identifier, Some("links"));
        let response = self.get(&uri).await?;
        Ok(response.json().await?)
    }

    /// File metadata by ID or path
    pub async fn file_metadata(&self, spec: FileSpec, identifier: &str) -> Result<CloudFile> {
        self.entry_metadata(EntryKind::File, spec, identifier).await
    }

    /// Update file metadata by ID or path
    pub async fn patch_file_metadata(
        &self,
        spec: FileSpec,
        identifier: &str,
        data: &CloudFile,
    ) -> Result<CloudFile> {
        self.patch_entry_metadata(EntryKind::File, spec, identifier, data)
            .await
    }

    /// Download a file's content by ID; the byte stream is left for the
    /// caller to drain
    pub async fn get_file(&self, id: &str) -> Result<FileContent> {
        let uri = entry_url(EntryKind::File, FileSpec::Id, id, None);
        let response = self.get(&uri).await?;
        Ok(FileContent::from_response(response))
    }

    /// Upload a file from a byte stream as multipart form data
    ///
    /// `size_in_bytes` is only required by providers that demand a declared
    /// size up front (SharePoint); pass `None` otherwise.
    pub async fn upload_file(
        &self,
        source: impl Into<reqwest::Body>,
        content_type: &str,
        path: &str,
        description: Option<&str>,
        tags: &[String],
        overwrite: bool,
        size_in_bytes: Option<u64>,
    ) -> Result<CloudFile> {
        let uri = upload_uri(path, description, tags, overwrite, size_in_bytes);
        let file_name = path.rsplit('/').next().unwrap_or(path).to_string();
        let part = reqwest::multipart::Part::stream(source.into())
            .file_name(file_name)
            .mime_str(content_type)
            .map_err(|e| Error::InvalidInput(format!("invalid content type: {e}")))?;
        let form = reqwest::multipart::Form::new().part("file", part);
        let response = self.post(&uri, Payload::Multipart(form)).await?;
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_url_by_id_with_operation() {
        assert_eq!(
            entry_url(EntryKind::File, FileSpec::Id, "21794645297", Some("metadata")),
            "hubs/documents/files/21794645297/metadata"
        );
    }

    #[test]
    fn test_entry_url_by_path_with_operation() {
        assert_eq!(
            entry_url(EntryKind::Folder, FileSpec::Path, "/SQL", Some("contents")),
            "hubs/documents/folders/contents?path=%2FSQL"
        );
    }

    #[test]
    fn test_entry_url_bare_forms() {
        assert_eq!(
            entry_url(EntryKind::File, FileSpec::Id, "42", None),
            "hubs/documents/files/42"
        );
        assert_eq!(
            entry_url(EntryKind::File, FileSpec::Path, "/a b.txt", None),
            "hubs/documents/files?path=%2Fa%20b.txt"
        );
    }

    #[test]
    fn test_append_query_picks_separator() {
        let mut bare = "hubs/documents/files/42".to_string();
        append_query(&mut bare, "emptyTrash", "true");
        assert_eq!(bare, "hubs/documents/files/42?emptyTrash=true");

        let mut with_query = "hubs/documents/files?path=%2Fx".to_string();
        append_query(&mut with_query, "emptyTrash", "false");
        assert_eq!(with_query, "hubs/documents/files?path=%2Fx&emptyTrash=false");
    }

    #[test]
    fn test_upload_uri_full() {
        let uri = upload_uri(
            "/reports/q1.pdf",
            Some("quarterly report"),
            &["legal".to_string(), " ops ".to_string(), "".to_string()],
            true,
            Some(2048),
        );
        assert_eq!(
            uri,
            "hubs/documents/files?path=%2Freports%2Fq1.pdf\
             &description=quarterly%20report&overwrite=true&size=2048\
             &tags%5B%5D=legal,ops"
        );
    }

    #[test]
    fn test_upload_uri_minimal() {
        assert_eq!(
            upload_uri("/f.txt", None, &[], false, None),
            "hubs/documents/files?path=%2Ff.txt"
        );
    }

    #[tokio::test]
    async fn test_create_folder_requires_leading_slash() {
        let connector = ElementsConnector::with_base_url("http://127.0.0.1:1/");
        let result = connector.create_folder("no-slash", &[]).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        // Rejected before any HTTP call was attempted
        assert_eq!(connector.statistics_summary(), "No work has been performed");
    }

    #[tokio::test]
    async fn test_copy_file_requires_id() {
        let connector = ElementsConnector::with_base_url("http://127.0.0.1:1/");
        let source = CloudFile::with_path("/only-a-path");
        let result = connector.copy_file(&source, "/target").await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
