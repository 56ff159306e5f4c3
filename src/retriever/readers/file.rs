//! Reader for `file` scheme URIs.

use async_trait::async_trait;
use tracing::debug;

use crate::models::{ResourceRequest, ResourceResponse};

use super::ResourceReader;

/// Reads resources from the local filesystem.
pub struct FileReader;

#[async_trait]
impl ResourceReader for FileReader {
    fn name(&self) -> &str {
        "file"
    }

    fn supports_scheme(&self, scheme: &str) -> bool {
        scheme == "file"
    }

    async fn read(&self, request: &ResourceRequest) -> anyhow::Result<Option<ResourceResponse>> {
        let path = match request.uri().to_file_path() {
            Ok(p) => p,
            Err(()) => {
                debug!("Not a usable file path: {}", request.uri());
                return Ok(None);
            }
        };

        // A missing file is "try the next reader", not a hard error.
        let metadata = match tokio::fs::metadata(&path).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if !metadata.is_file() {
            anyhow::bail!("{} is not a regular file", path.display());
        }

        let file = tokio::fs::File::open(&path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "resource".to_string());

        Ok(Some(ResourceResponse::new(
            name,
            Some(metadata.len()),
            None,
            Box::new(file),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use url::Url;

    #[tokio::test]
    async fn test_read_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.txt");
        tokio::fs::write(&path, b"file contents").await.unwrap();

        let uri = Url::from_file_path(&path).unwrap();
        let response = FileReader
            .read(&ResourceRequest::new(uri))
            .await
            .unwrap()
            .expect("reader should produce the file");

        assert_eq!(response.name, "sample.txt");
        assert_eq!(response.size, Some(13));

        let mut buf = Vec::new();
        response.into_stream().read_to_end(&mut buf).await.unwrap();
        assert_eq!(buf, b"file contents");
    }

    #[tokio::test]
    async fn test_missing_file_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        let uri = Url::from_file_path(dir.path().join("absent.bin")).unwrap();
        let result = FileReader.read(&ResourceRequest::new(uri)).await.unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_supports_only_file_scheme() {
        assert!(FileReader.supports_scheme("file"));
        assert!(!FileReader.supports_scheme("https"));
    }
}
