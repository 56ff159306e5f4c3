//! Resource request and response types.

use std::collections::HashMap;

use tokio::io::AsyncRead;
use url::Url;

/// Boxed async byte stream produced by a retriever.
pub type ByteStream = Box<dyn AsyncRead + Send + Unpin>;

/// A resource to retrieve: a URI plus caller-supplied properties.
///
/// Immutable once constructed; the scheme drives reader resolution.
#[derive(Debug, Clone)]
pub struct ResourceRequest {
    uri: Url,
    properties: HashMap<String, String>,
}

impl ResourceRequest {
    /// Create a request with no properties.
    pub fn new(uri: Url) -> Self {
        Self {
            uri,
            properties: HashMap::new(),
        }
    }

    /// Parse a request from a URI string.
    pub fn parse(uri: &str) -> Result<Self, url::ParseError> {
        Url::parse(uri).map(Self::new)
    }

    /// Add a caller-supplied property (builder style, consumed before use).
    pub fn with_property(mut self, key: &str, value: &str) -> Self {
        self.properties.insert(key.to_string(), value.to_string());
        self
    }

    /// The resource URI.
    pub fn uri(&self) -> &Url {
        &self.uri
    }

    /// The URI scheme, lowercased by the URL parser.
    pub fn scheme(&self) -> &str {
        self.uri.scheme()
    }

    /// Look up a caller-supplied property.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(|s| s.as_str())
    }

    /// All caller-supplied properties.
    pub fn properties(&self) -> &HashMap<String, String> {
        &self.properties
    }
}

/// A retrieved resource: an async byte stream plus metadata.
pub struct ResourceResponse {
    /// Display name for the resource (filename when one is known).
    pub name: String,
    /// Size in bytes, when the source reported one.
    pub size: Option<u64>,
    /// MIME type, when the source reported one.
    pub mime_type: Option<String>,
    stream: ByteStream,
}

impl ResourceResponse {
    /// Wrap a stream with its metadata.
    pub fn new(name: String, size: Option<u64>, mime_type: Option<String>, stream: ByteStream) -> Self {
        Self {
            name,
            size,
            mime_type,
            stream,
        }
    }

    /// Build a response from an in-memory buffer. Mostly useful in tests
    /// and for readers that materialize small resources.
    pub fn from_bytes(name: &str, bytes: Vec<u8>) -> Self {
        let size = bytes.len() as u64;
        Self {
            name: name.to_string(),
            size: Some(size),
            mime_type: None,
            stream: Box::new(std::io::Cursor::new(bytes)),
        }
    }

    /// Consume the response, yielding the byte stream.
    pub fn into_stream(self) -> ByteStream {
        self.stream
    }
}

impl std::fmt::Debug for ResourceResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceResponse")
            .field("name", &self.name)
            .field("size", &self.size)
            .field("mime_type", &self.mime_type)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[test]
    fn test_request_scheme() {
        let request = ResourceRequest::parse("https://example.com/doc.pdf").unwrap();
        assert_eq!(request.scheme(), "https");
    }

    #[test]
    fn test_request_properties() {
        let request = ResourceRequest::parse("file:///tmp/a.txt")
            .unwrap()
            .with_property("range", "bytes=0-99");
        assert_eq!(request.property("range"), Some("bytes=0-99"));
        assert_eq!(request.property("missing"), None);
    }

    #[tokio::test]
    async fn test_response_from_bytes() {
        let response = ResourceResponse::from_bytes("hello.txt", b"hello".to_vec());
        assert_eq!(response.size, Some(5));

        let mut buf = Vec::new();
        response.into_stream().read_to_end(&mut buf).await.unwrap();
        assert_eq!(buf, b"hello");
    }
}
