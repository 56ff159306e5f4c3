//! HTTP client shared by the http reader and remote sources.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use anyhow::Context;
use futures::{StreamExt, TryStreamExt};
use reqwest::{Client, StatusCode};
use tokio_util::io::StreamReader;
use tracing::debug;

use crate::models::ByteStream;

/// Default user agent when no override is configured.
pub const USER_AGENT: &str = concat!("courier/", env!("CARGO_PKG_VERSION"));

/// HTTP client with a configurable user agent, timeout, and base delay
/// applied after each request.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    request_delay: Duration,
}

impl HttpClient {
    /// Create a new HTTP client.
    pub fn new(
        timeout: Duration,
        request_delay: Duration,
        user_agent: Option<&str>,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent.unwrap_or(USER_AGENT))
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            request_delay,
        })
    }

    /// Make a GET request, returning a wrapper over the streaming response.
    pub async fn get(&self, url: &str) -> Result<HttpResponse, reqwest::Error> {
        let start = Instant::now();
        let response = self.client.get(url).send().await?;
        debug!(
            "GET {} -> {} in {:?}",
            url,
            response.status(),
            start.elapsed()
        );

        let mut headers = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                headers.insert(name.to_string(), v.to_string());
            }
        }

        if !self.request_delay.is_zero() {
            tokio::time::sleep(self.request_delay).await;
        }

        Ok(HttpResponse {
            status: response.status(),
            headers,
            response,
        })
    }
}

/// HTTP response wrapper exposing the headers courier cares about.
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HashMap<String, String>,
    response: reqwest::Response,
}

impl HttpResponse {
    /// Check if the response is successful.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Get the Content-Type header.
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(|s| s.as_str())
    }

    /// Get the Content-Length header.
    pub fn content_length(&self) -> Option<u64> {
        self.headers
            .get("content-length")
            .and_then(|s| s.parse().ok())
    }

    /// Get the filename from the Content-Disposition header.
    pub fn content_disposition_filename(&self) -> Option<String> {
        self.headers
            .get("content-disposition")
            .and_then(|h| parse_content_disposition_filename(h))
    }

    /// Consume the response, yielding the body as an async byte stream.
    pub fn into_stream(self) -> ByteStream {
        let stream = self
            .response
            .bytes_stream()
            .map_err(std::io::Error::other)
            .boxed();
        Box::new(StreamReader::new(stream))
    }
}

/// Parse a filename from a Content-Disposition header value.
/// Handles both `filename="name.pdf"` and RFC 5987 `filename*=UTF-8''name.pdf`.
pub fn parse_content_disposition_filename(header: &str) -> Option<String> {
    // RFC 5987 encoded form takes precedence
    if let Some(start) = header.find("filename*=") {
        let rest = &header[start + 10..];
        if let Some(sep) = rest.find("''") {
            let encoded = rest[sep + 2..].split([';', ' ']).next()?;
            if let Ok(decoded) = urlencoding::decode(encoded) {
                let name = decoded.trim().to_string();
                if !name.is_empty() {
                    return Some(name);
                }
            }
        }
    }

    if let Some(start) = header.find("filename=") {
        let rest = &header[start + 9..];
        let name = match rest.strip_prefix('"') {
            Some(quoted) => quoted.split('"').next(),
            None => rest.split([';', ' ']).next(),
        };
        if let Some(name) = name {
            let name = name.trim();
            if !name.is_empty() {
                return Some(name.to_string());
            }
        }
    }

    None
}
