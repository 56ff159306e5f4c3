//! Local retrieval over an ordered list of scheme-specific readers.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::models::{ResourceRequest, ResourceResponse};

use super::readers::ResourceReader;
use super::{ResourceRetriever, RetrievalError};

/// Retriever that tries registered readers in order, first success wins.
///
/// Reader order is registration order and resolution is deterministic:
/// the list is walked front to back and only readers claiming the URI's
/// scheme are consulted.
#[derive(Default)]
pub struct LocalRetriever {
    readers: Vec<Box<dyn ResourceReader>>,
}

impl LocalRetriever {
    /// Create a retriever with no readers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a reader to the resolution order (builder style).
    pub fn with_reader(mut self, reader: Box<dyn ResourceReader>) -> Self {
        self.readers.push(reader);
        self
    }

    /// Append a reader to the resolution order.
    pub fn register(&mut self, reader: Box<dyn ResourceReader>) {
        self.readers.push(reader);
    }

    /// Number of registered readers.
    pub fn reader_count(&self) -> usize {
        self.readers.len()
    }
}

#[async_trait]
impl ResourceRetriever for LocalRetriever {
    async fn retrieve(
        &self,
        request: &ResourceRequest,
    ) -> Result<ResourceResponse, RetrievalError> {
        let scheme = request.scheme();
        let mut matched = false;
        let mut failures: Vec<String> = Vec::new();

        for reader in &self.readers {
            if !reader.supports_scheme(scheme) {
                continue;
            }
            matched = true;

            match reader.read(request).await {
                Ok(Some(response)) => {
                    debug!(
                        "Reader '{}' produced {} ({:?} bytes)",
                        reader.name(),
                        response.name,
                        response.size
                    );
                    return Ok(response);
                }
                Ok(None) => {
                    debug!(
                        "Reader '{}' could not produce {}, trying next",
                        reader.name(),
                        request.uri()
                    );
                }
                Err(e) => {
                    // A single reader failing is recoverable; record it and move on.
                    warn!("Reader '{}' failed for {}: {}", reader.name(), request.uri(), e);
                    failures.push(format!("{}: {}", reader.name(), e));
                }
            }
        }

        if !matched {
            return Err(RetrievalError::NotFound(format!(
                "no reader registered for scheme '{}' ({})",
                scheme,
                request.uri()
            )));
        }

        if failures.is_empty() {
            // Scheme was recognized, but every reader declined the resource.
            Err(RetrievalError::NotSupported(format!(
                "no reader could produce {}",
                request.uri()
            )))
        } else {
            Err(RetrievalError::NotFound(format!(
                "all readers failed for {}: [{}]",
                request.uri(),
                failures.join("; ")
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    struct NullReader;

    #[async_trait]
    impl ResourceReader for NullReader {
        fn name(&self) -> &str {
            "null"
        }

        fn supports_scheme(&self, scheme: &str) -> bool {
            scheme == "x"
        }

        async fn read(
            &self,
            _request: &ResourceRequest,
        ) -> anyhow::Result<Option<ResourceResponse>> {
            Ok(None)
        }
    }

    struct FailingReader;

    #[async_trait]
    impl ResourceReader for FailingReader {
        fn name(&self) -> &str {
            "failing"
        }

        fn supports_scheme(&self, scheme: &str) -> bool {
            scheme == "x"
        }

        async fn read(
            &self,
            _request: &ResourceRequest,
        ) -> anyhow::Result<Option<ResourceResponse>> {
            anyhow::bail!("backend unavailable")
        }
    }

    struct TenByteReader;

    #[async_trait]
    impl ResourceReader for TenByteReader {
        fn name(&self) -> &str {
            "ten-byte"
        }

        fn supports_scheme(&self, scheme: &str) -> bool {
            scheme == "x"
        }

        async fn read(
            &self,
            _request: &ResourceRequest,
        ) -> anyhow::Result<Option<ResourceResponse>> {
            Ok(Some(ResourceResponse::from_bytes(
                "ten.bin",
                vec![7u8; 10],
            )))
        }
    }

    fn request() -> ResourceRequest {
        ResourceRequest::parse("x://resource/1").unwrap()
    }

    #[tokio::test]
    async fn test_no_readers_for_scheme_is_not_found() {
        let retriever = LocalRetriever::new();
        let err = retriever.retrieve(&request()).await.unwrap_err();
        assert!(matches!(err, RetrievalError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_all_readers_failing_wraps_causes() {
        let retriever = LocalRetriever::new().with_reader(Box::new(FailingReader));
        let err = retriever.retrieve(&request()).await.unwrap_err();
        match err {
            RetrievalError::NotFound(msg) => {
                assert!(msg.contains("backend unavailable"), "message: {msg}");
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_first_null_second_wins() {
        let retriever = LocalRetriever::new()
            .with_reader(Box::new(NullReader))
            .with_reader(Box::new(TenByteReader));

        let response = retriever.retrieve(&request()).await.unwrap();
        assert_eq!(response.size, Some(10));

        let mut buf = Vec::new();
        response.into_stream().read_to_end(&mut buf).await.unwrap();
        assert_eq!(buf.len(), 10);
    }

    #[tokio::test]
    async fn test_failure_then_success_recovers() {
        let retriever = LocalRetriever::new()
            .with_reader(Box::new(FailingReader))
            .with_reader(Box::new(TenByteReader));

        let response = retriever.retrieve(&request()).await.unwrap();
        assert_eq!(response.name, "ten.bin");
    }

    #[tokio::test]
    async fn test_exhausted_null_readers_is_not_supported() {
        let retriever = LocalRetriever::new()
            .with_reader(Box::new(NullReader))
            .with_reader(Box::new(NullReader));

        let err = retriever.retrieve(&request()).await.unwrap_err();
        assert!(matches!(err, RetrievalError::NotSupported(_)));
    }
}
