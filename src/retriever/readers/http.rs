//! Reader for `http` and `https` scheme URIs.

use async_trait::async_trait;

use crate::models::{ResourceRequest, ResourceResponse};
use crate::net::HttpClient;

use super::ResourceReader;

/// Reads resources over HTTP using the shared client.
pub struct HttpReader {
    client: HttpClient,
}

impl HttpReader {
    /// Create a reader around an already-configured client.
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResourceReader for HttpReader {
    fn name(&self) -> &str {
        "http"
    }

    fn supports_scheme(&self, scheme: &str) -> bool {
        scheme == "http" || scheme == "https"
    }

    async fn read(&self, request: &ResourceRequest) -> anyhow::Result<Option<ResourceResponse>> {
        let url = request.uri().as_str();
        let response = self.client.get(url).await?;

        if !response.is_success() {
            anyhow::bail!("HTTP {} for {}", response.status, url);
        }

        let name = response
            .content_disposition_filename()
            .or_else(|| filename_from_uri(request))
            .unwrap_or_else(|| "resource".to_string());
        let size = response.content_length();
        let mime_type = response.content_type().map(|s| s.to_string());

        Ok(Some(ResourceResponse::new(
            name,
            size,
            mime_type,
            response.into_stream(),
        )))
    }
}

/// Derive a display name from the last path segment of the URI.
fn filename_from_uri(request: &ResourceRequest) -> Option<String> {
    request
        .uri()
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}
