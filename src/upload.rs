//! File selection and upload: turn a batch of text files into one remote
//! artifact.
//!
//! A batch is atomic: every file's content must decode as text before any
//! upload happens. That property is enforced at construction time
//! ([`UploadedFile::from_path`] refuses non-UTF-8 bytes with a
//! [`FlowError::ReadError`]), so an invalid batch is unrepresentable and the
//! upload path never has to unwind a partial read.

use crate::client::{ApiClient, CreateObjectRequest};
use crate::config::FlowConfig;
use crate::error::FlowError;
use crate::objects::generate_object_name;
use std::path::Path;
use tracing::{debug, info};

/// A client-selected file, immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Display name (file name without directories for path-based files).
    pub name: String,
    /// Size in bytes of the original content.
    pub size: u64,
    /// Decoded textual content.
    pub content: String,
}

impl UploadedFile {
    /// Build a file from in-memory text.
    pub fn from_text(name: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            name: name.into(),
            size: content.len() as u64,
            content,
        }
    }

    /// Read a file from disk, failing with [`FlowError::ReadError`] if it
    /// does not exist or its bytes are not valid UTF-8.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, FlowError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| FlowError::ReadError {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        let size = bytes.len() as u64;
        let content = String::from_utf8(bytes).map_err(|e| FlowError::ReadError {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        debug!(%name, size, "read file for upload");
        Ok(Self { name, size, content })
    }
}

/// Uploads a batch of files as one remote object.
pub struct UploadService<'a> {
    client: &'a ApiClient,
    config: &'a FlowConfig,
}

impl<'a> UploadService<'a> {
    pub fn new(client: &'a ApiClient, config: &'a FlowConfig) -> Self {
        Self { client, config }
    }

    /// Upload the whole batch as one createObject call.
    ///
    /// Builds a single creation request carrying a generated artifact name,
    /// the configured type tag, and the decoded contents in submission
    /// order. Exactly one remote call is issued (audited pending-then-
    /// resolved by the client). The artifact name is returned only when the
    /// response is 2xx; on a non-2xx the artifact is not considered created.
    pub async fn upload(&self, files: &[UploadedFile]) -> Result<String, FlowError> {
        if files.is_empty() {
            return Err(FlowError::EmptyBatch);
        }

        let request = CreateObjectRequest {
            created_object_name: generate_object_name("uploaded_files"),
            data_type: self.config.data_type.clone(),
            input_data: files.iter().map(|f| f.content.clone()).collect(),
        };
        info!(
            object = %request.created_object_name,
            files = files.len(),
            "uploading batch"
        );

        let response = self.client.create_object(&request).await?;
        if response.is_success() {
            Ok(request.created_object_name)
        } else {
            Err(FlowError::ServiceError {
                target: "/input_data".into(),
                status: response.status,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn from_text_records_byte_size() {
        let file = UploadedFile::from_text("notes.txt", "héllo");
        assert_eq!(file.name, "notes.txt");
        assert_eq!(file.size, 6, "byte length, not char count");
    }

    #[tokio::test]
    async fn from_path_reads_utf8_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.txt");
        std::fs::write(&path, "quarterly numbers").unwrap();

        let file = UploadedFile::from_path(&path).await.unwrap();
        assert_eq!(file.name, "report.txt");
        assert_eq!(file.size, 17);
        assert_eq!(file.content, "quarterly numbers");
    }

    #[tokio::test]
    async fn from_path_rejects_non_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("binary.bin");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(&[0xff, 0xfe, 0x00, 0x42]).unwrap();

        let err = UploadedFile::from_path(&path).await.unwrap_err();
        assert!(matches!(err, FlowError::ReadError { .. }));
    }

    #[tokio::test]
    async fn from_path_rejects_missing_file() {
        let err = UploadedFile::from_path("/definitely/not/here.txt")
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::ReadError { .. }));
    }
}
