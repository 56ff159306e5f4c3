//! Remote retrieval via a federated source.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::models::{ResourceRequest, ResourceResponse};
use crate::net::HttpClient;

use super::{ResourceRetriever, RetrievalError};

/// A federated source that can retrieve resources on our behalf.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Identifier for the source, used in logs and error messages.
    fn id(&self) -> &str;

    /// Retrieve the resource from the remote source.
    async fn retrieve_resource(
        &self,
        request: &ResourceRequest,
    ) -> anyhow::Result<ResourceResponse>;
}

/// Retriever that delegates to a single federated source.
///
/// Every failure mode of the source (I/O, unsupported resource) is mapped
/// uniformly to `NotFound`, matching how federated fetches surface to
/// callers.
pub struct RemoteRetriever {
    source: Arc<dyn RemoteSource>,
}

impl RemoteRetriever {
    /// Create a retriever over the given source.
    pub fn new(source: Arc<dyn RemoteSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl ResourceRetriever for RemoteRetriever {
    async fn retrieve(
        &self,
        request: &ResourceRequest,
    ) -> Result<ResourceResponse, RetrievalError> {
        match self.source.retrieve_resource(request).await {
            Ok(response) => Ok(response),
            Err(e) => {
                warn!(
                    "Remote source '{}' failed for {}: {}",
                    self.source.id(),
                    request.uri(),
                    e
                );
                Err(RetrievalError::NotFound(format!(
                    "source '{}' could not retrieve {}: {}",
                    self.source.id(),
                    request.uri(),
                    e
                )))
            }
        }
    }
}

/// Remote source that fetches over plain HTTP.
pub struct HttpRemoteSource {
    id: String,
    client: HttpClient,
}

impl HttpRemoteSource {
    /// Create an HTTP-backed source.
    pub fn new(id: &str, timeout: Duration, user_agent: Option<&str>) -> anyhow::Result<Self> {
        Ok(Self {
            id: id.to_string(),
            client: HttpClient::new(timeout, Duration::ZERO, user_agent)?,
        })
    }
}

#[async_trait]
impl RemoteSource for HttpRemoteSource {
    fn id(&self) -> &str {
        &self.id
    }

    async fn retrieve_resource(
        &self,
        request: &ResourceRequest,
    ) -> anyhow::Result<ResourceResponse> {
        let url = request.uri().as_str();
        let response = self.client.get(url).await?;
        if !response.is_success() {
            anyhow::bail!("HTTP {} for {}", response.status, url);
        }

        let name = response
            .content_disposition_filename()
            .unwrap_or_else(|| "resource".to_string());
        let size = response.content_length();
        let mime_type = response.content_type().map(|s| s.to_string());

        Ok(ResourceResponse::new(
            name,
            size,
            mime_type,
            response.into_stream(),
        ))
    }
}
